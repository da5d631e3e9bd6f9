use crate::basic::fpc::{self, NUMBER_SIZE};
use crate::basic::tokens::{self, FIRST_COMMAND, FIRST_QUALIFIER, FUNCTION_PREFIX, LAST_QUALIFIER};
use crate::basic::DecodeError;

/// Ends every program line.
pub const LINE_TERMINATOR: u8 = 0x0d;
/// Precedes the five-byte value cached after a numeric literal.
pub const NUMBER_MARKER: u8 = 0x0e;

pub const BAD_EOL: &str = "<BAD EOL>";

fn push_keyword(text: &mut String, keyword: &str) {
    text.push_str(keyword);
    text.push(' ');
}

/// Render one line body (including its terminator) as text.
///
/// Unknown tokens and control codes are rendered as bracketed placeholders
/// and a missing terminator is flagged with `<BAD EOL>`.  Only a cached
/// number that cannot be decoded fails the line.
pub fn detokenize(body: &[u8]) -> Result<String, DecodeError> {
    let (scan, last) = match body.split_last() {
        Some((&last, scan)) => (scan, Some(last)),
        None => (body, None),
    };

    let mut text = String::new();
    let mut i = 0;
    while i < scan.len() {
        let b = scan[i];
        i += 1;
        match b {
            FUNCTION_PREFIX => {
                let code = *scan.get(i).ok_or(DecodeError::Truncated)?;
                i += 1;
                match tokens::function(code) {
                    Some(keyword) => push_keyword(&mut text, keyword),
                    None => text.push_str(&format!("<function {}>", code)),
                }
            }
            FIRST_COMMAND..=0xff => match tokens::command(b) {
                Some(keyword) => push_keyword(&mut text, keyword),
                None => text.push_str(&format!("<command {}>", b)),
            },
            FIRST_QUALIFIER..=LAST_QUALIFIER => match tokens::qualifier(b) {
                Some(keyword) => {
                    text.push(' ');
                    push_keyword(&mut text, keyword);
                }
                None => text.push_str(&format!("<qualifier {}>", b)),
            },
            NUMBER_MARKER => {
                let bytes = scan
                    .get(i..i + NUMBER_SIZE)
                    .ok_or(DecodeError::Truncated)?;
                i += NUMBER_SIZE;
                text.push_str(&fpc::decode(bytes)?.to_string());
            }
            0x00..=0x1f => text.push_str(&format!("<{}>", b)),
            _ => text.push(b as char),
        }
    }

    if last != Some(LINE_TERMINATOR) {
        text.push_str(BAD_EOL);
    }
    Ok(text)
}
