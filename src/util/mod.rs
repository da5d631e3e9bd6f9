use std::fmt;

/// Write a hexdump of the provided byte slice, sixteen bytes per row.
pub fn hexdump(f: &mut fmt::Formatter, prefix: &str, buffer: &[u8]) -> fmt::Result {
    const COLUMNS: usize = 16;
    if buffer.is_empty() {
        // For a zero-length buffer, at least print an offset instead of
        // nothing.
        return write!(f, "{}{:04x}: ", prefix, 0);
    }
    for (row_number, row) in buffer.chunks(COLUMNS).enumerate() {
        if row_number > 0 {
            writeln!(f)?;
        }
        write!(f, "{}{:04x}: ", prefix, row_number * COLUMNS)?;

        // Print hex representation
        for b in row {
            write!(f, "{:02x} ", b)?;
        }
        for _ in row.len()..COLUMNS {
            write!(f, "   ")?;
        }

        // Print ASCII representation
        for b in row {
            write!(
                f,
                "{}",
                match *b {
                    c @ 0x20..=0x7E => c as char,
                    _ => '.',
                }
            )?;
        }
    }
    Ok(())
}

/// Displays a byte slice as a hexdump.
pub struct Hex<'a> {
    prefix: &'a str,
    bytes: &'a [u8],
}

impl<'a> fmt::Display for Hex<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        hexdump(f, self.prefix, self.bytes)
    }
}

pub fn hex(bytes: &[u8]) -> Hex {
    indented_hex("", bytes)
}

/// A hexdump with every row starting with `prefix`.
pub fn indented_hex<'a>(prefix: &'a str, bytes: &'a [u8]) -> Hex<'a> {
    Hex { prefix, bytes }
}

/// Render bytes as text, passing printable ASCII through and escaping
/// everything else as `\xNN`.
pub fn escape(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            0x20..=0x7E => s.push(b as char),
            _ => s.push_str(&format!("\\x{:02x}", b)),
        }
    }
    s
}
