//! Keyword tables for tokenized SAM BASIC.
//!
//! Commands and qualifiers are single bytes at the top of the character set.
//! Functions and operators are two bytes: a 0xFF prefix followed by a code.

pub const FIRST_COMMAND: u8 = 0x90;
pub const FIRST_QUALIFIER: u8 = 0x85;
pub const LAST_QUALIFIER: u8 = 0x8f;
pub const FIRST_FUNCTION: u8 = 59;
pub const FUNCTION_PREFIX: u8 = 0xff;

#[rustfmt::skip]
static COMMANDS: [&str; 112] = [
    // 144
    "DIR", "FORMAT", "ERASE", "MOVE", "SAVE", "LOAD", "MERGE", "VERIFY",
    // 152
    "OPEN", "CLOSE", "CIRCLE", "PLOT", "LET", "BLITZ", "BORDER", "CLS",
    // 160
    "PALETTE", "PEN", "PAPER", "FLASH", "BRIGHT", "INVERSE", "OVER", "FATPIX",
    // 168
    "CSIZE", "BLOCKS", "MODE", "GRAB", "PUT", "BEEP", "SOUND", "NEW",
    // 176
    "RUN", "STOP", "CONTINUE", "CLEAR", "GO TO", "GO SUB", "RETURN", "REM",
    // 184
    "READ", "DATA", "RESTORE", "PRINT", "LPRINT", "LIST", "LLIST", "DUMP",
    // 192
    "FOR", "NEXT", "PAUSE", "DRAW", "DEFAULT", "DIM", "INPUT", "RANDOMIZE",
    // 200
    "DEF FN", "DEF KEYCODE", "DEF PROC", "END PROC", "RENUM", "DELETE", "REF", "COPY",
    // 208
    "Reserved", "KEYIN", "LOCAL", "LOOP IF", "DO", "LOOP", "EXIT IF", "IF",
    // 216: short IF, long ELSE, short ELSE
    "IF", "ELSE", "ELSE", "END IF", "KEY", "ON ERROR", "ON", "GET",
    // 224
    "OUT", "POKE", "DPOKE", "RENAME", "CALL", "ROLL", "SCROLL", "SCREEN",
    // 232
    "DISPLAY", "BOOT", "LABEL", "FILL", "WINDOW", "AUTO", "POP", "RECORD",
    // 240
    "DEVICE", "PROTECT", "HIDE", "ZAP", "POW", "BOOM", "ZOOM", "Reserved",
    // 248
    "Reserved", "Reserved", "Reserved", "Reserved", "Reserved", "Reserved", "Reserved",
    "Not usable",
];

static QUALIFIERS: [&str; 11] = [
    "USING", "WRITE", "AT", "TAB", "OFF", "WHILE", "UNTIL", "LINE", "THEN", "TO", "STEP",
];

#[rustfmt::skip]
static FUNCTIONS: [&str; 74] = [
    // 59
    "PI", "RND", "POINT", "FREE", "LENGTH", "ITEM", "ATTR", "FN",
    // 67
    "BIN", "XMOUSE", "YMOUSE", "XPEN", "YPEN", "RAMTOP", "Reserved", "INSTR",
    // 75
    "INKEY$", "SCREEN$", "MEM$", "Reserved", "PATH$", "STRING$", "Reserved", "Reserved",
    // 83
    "SIN", "COS", "TAN", "ASN", "ACS", "ATN", "LN", "EXP",
    // 91
    "ABS", "SGN", "SQR", "INT", "USR", "IN", "PEEK", "LPEEK",
    // 99
    "DVAR", "SVAR", "BUTTON", "EOF", "PTR", "Reserved", "UDG", "Reserved",
    // 107
    "LEN", "CODE", "VAL$", "VAL", "TRUNC$", "CHR$", "STR$", "BIN$",
    // 115
    "HEX$", "USR$", "Reserved", "NOT", "Reserved", "Reserved", "Reserved", "MOD",
    // 123
    "DIV", "BOR", "Reserved", "BAND", "OR", "AND", "<>", "<=",
    // 131
    ">=", "Reserved",
];

fn lookup(table: &'static [&'static str], first: u8, code: u8) -> Option<&'static str> {
    code.checked_sub(first)
        .and_then(|index| table.get(index as usize))
        .copied()
}

/// Look up a single-byte command keyword.
pub fn command(code: u8) -> Option<&'static str> {
    lookup(&COMMANDS, FIRST_COMMAND, code)
}

/// Look up a single-byte qualifier keyword such as `THEN` or `STEP`.
pub fn qualifier(code: u8) -> Option<&'static str> {
    lookup(&QUALIFIERS, FIRST_QUALIFIER, code)
}

/// Look up the code that follows a 0xFF prefix.
pub fn function(code: u8) -> Option<&'static str> {
    lookup(&FUNCTIONS, FIRST_FUNCTION, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands() {
        assert_eq!(command(143), None);
        assert_eq!(command(144), Some("DIR"));
        assert_eq!(command(180), Some("GO TO"));
        assert_eq!(command(187), Some("PRINT"));
        assert_eq!(command(208), Some("Reserved"));
        assert_eq!(command(221), Some("ON ERROR"));
        assert_eq!(command(246), Some("ZOOM"));
        assert_eq!(command(254), Some("Reserved"));
        assert_eq!(command(255), Some("Not usable"));
    }

    #[test]
    fn test_qualifiers() {
        assert_eq!(qualifier(0x84), None);
        assert_eq!(qualifier(133), Some("USING"));
        assert_eq!(qualifier(141), Some("THEN"));
        assert_eq!(qualifier(143), Some("STEP"));
        assert_eq!(qualifier(144), None);
    }

    #[test]
    fn test_functions() {
        assert_eq!(function(58), None);
        assert_eq!(function(59), Some("PI"));
        assert_eq!(function(60), Some("RND"));
        assert_eq!(function(100), Some("SVAR"));
        assert_eq!(function(113), Some("STR$"));
        assert_eq!(function(118), Some("NOT"));
        assert_eq!(function(129), Some("<>"));
        assert_eq!(function(131), Some(">="));
        assert_eq!(function(132), Some("Reserved"));
        assert_eq!(function(133), None);
    }
}
