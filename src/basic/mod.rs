//! Listing of tokenized SAM BASIC programs and their saved variables.
//!
//! A BASIC file holds three regions whose boundaries are recorded in the
//! file-type information of its directory entry:
//!
//! 1. The program: numbered lines ending with a 0xFF sentinel.
//! 2. Numeric variables (`nvar`).
//! 3. After a gap, string and array variables (`svar`).
//!
//! Decoding never fails as a whole.  A line or variable that cannot be
//! decoded is kept in the `Program` as an error next to the items that could.

mod detokenize;
mod error;
pub mod fpc;
pub mod nvar;
pub mod svar;
pub mod tokens;

use std::fmt;
use std::ops::Range;

use log::{debug, warn};

use crate::disk::directory::{paged_length, FILE_TYPE_BASIC};
use crate::disk::file::File;
use crate::util;

pub use self::detokenize::{detokenize, BAD_EOL, LINE_TERMINATOR, NUMBER_MARKER};
pub use self::error::DecodeError;
pub use self::fpc::Number;
pub use self::nvar::NumericVariable;
pub use self::svar::{Array, StringVariable};

/// Marks the end of the program lines.
pub const PROGRAM_END: u8 = 0xff;
const LINE_HEADER_SIZE: usize = 4;

/// A decode failure and the offset within its block where it occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemError {
    pub offset: usize,
    pub error: DecodeError,
}

impl ItemError {
    pub fn new(offset: usize, error: DecodeError) -> ItemError {
        ItemError { offset, error }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "error at {:#06x}: {}", self.offset, self.error)
    }
}

/// Region boundaries within a BASIC file, as offsets from the start of the
/// file's data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub program_end: usize,
    pub nvar_end: usize,
    pub svar_start: usize,
    pub length: usize,
}

impl Layout {
    /// Read the three paged lengths stored in a directory entry's type
    /// information, limiting them to the `length` bytes actually present.
    /// Without any layout information the whole file is treated as program.
    pub fn from_type_info(type_info: &[u8], length: usize) -> Layout {
        let program = paged_length(&type_info[0..3]);
        let nvar = paged_length(&type_info[3..6]);
        let gap = paged_length(&type_info[6..9]);
        if program == 0 && nvar == 0 && gap == 0 {
            warn!("no program layout recorded; treating all {} bytes as program", length);
            return Layout {
                program_end: length,
                nvar_end: length,
                svar_start: length,
                length,
            };
        }

        let program_end = program.min(length);
        let nvar_end = nvar.max(program_end).min(length);
        let svar_start = gap.max(nvar_end).min(length);
        if (program_end, nvar_end, svar_start) != (program, nvar, gap) {
            warn!(
                "inconsistent program layout {}/{}/{} for {} bytes; using {}/{}/{}",
                program, nvar, gap, length, program_end, nvar_end, svar_start
            );
        }
        Layout {
            program_end,
            nvar_end,
            svar_start,
            length,
        }
    }

    pub fn program(&self) -> Range<usize> {
        0..self.program_end
    }

    pub fn nvar(&self) -> Range<usize> {
        self.program_end..self.nvar_end
    }

    pub fn svar(&self) -> Range<usize> {
        self.svar_start..self.length
    }
}

/// One program line and where it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub offset: usize,
    pub number: u16,
    pub text: Result<String, DecodeError>,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x} {:5} ", self.offset, self.number)?;
        match self.text {
            Ok(ref text) => f.write_str(text),
            Err(ref e) => write!(f, "<error: {}>", e),
        }
    }
}

/// Split the program region into lines.  Returns the lines and whatever
/// follows the end sentinel.
fn decode_lines(program: &[u8]) -> (Vec<Line>, Vec<u8>) {
    let mut lines = Vec::new();
    let mut offset = 0;
    while offset < program.len() {
        if program[offset] == PROGRAM_END {
            return (lines, program[offset + 1..].to_vec());
        }
        if offset + LINE_HEADER_SIZE > program.len() {
            warn!("incomplete line header at {:#06x}", offset);
            return (lines, program[offset..].to_vec());
        }
        let number = u16::from_be_bytes([program[offset], program[offset + 1]]);
        let length = u16::from_le_bytes([program[offset + 2], program[offset + 3]]) as usize;
        let body_start = offset + LINE_HEADER_SIZE;
        let body_end = body_start + length;
        let text = match program.get(body_start..body_end) {
            Some(body) => detokenize(body),
            None => Err(DecodeError::Truncated),
        };
        if let Err(ref e) = text {
            warn!("line {} at {:#06x}: {}", number, offset, e);
        }
        lines.push(Line {
            offset,
            number,
            text,
        });
        offset = body_end;
    }
    debug!("program has no end marker");
    (lines, Vec::new())
}

/// A decoded BASIC file.
pub struct Program {
    pub name: String,
    pub layout: Layout,
    pub lines: Vec<Line>,
    /// Bytes between the end sentinel and the end of the program region.
    pub trailing: Vec<u8>,
    pub numeric_variables: Vec<Result<NumericVariable, ItemError>>,
    pub string_variables: Vec<Result<StringVariable, ItemError>>,
}

impl Program {
    /// Decode a file extracted from a disk, taking the region boundaries
    /// from its directory entry.
    pub fn decode(file: &File) -> Program {
        if file.entry.attributes.file_type != FILE_TYPE_BASIC {
            warn!(
                "\"{}\" is a {} file, not BASIC",
                file.entry.filename.trimmed(),
                file.entry.type_label()
            );
        }
        let layout = Layout::from_type_info(&file.entry.type_info, file.data.len());
        Program::from_bytes(&file.entry.filename.trimmed(), &file.data, layout)
    }

    pub fn from_bytes(name: &str, data: &[u8], layout: Layout) -> Program {
        let region = |range: Range<usize>| data.get(range).unwrap_or(&[]);
        let (lines, trailing) = decode_lines(region(layout.program()));
        let numeric_variables = nvar::decode(region(layout.nvar()));
        let string_variables = svar::decode(region(layout.svar()));
        debug!(
            "{}: {} lines, {} numeric and {} string variables",
            name,
            lines.len(),
            numeric_variables.len(),
            string_variables.len()
        );
        Program {
            name: name.to_string(),
            layout,
            lines,
            trailing,
            numeric_variables,
            string_variables,
        }
    }
}

fn write_items<T: fmt::Display>(
    f: &mut fmt::Formatter,
    heading: &str,
    items: &[Result<T, ItemError>],
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "{}:", heading)?;
    for item in items {
        match item {
            Ok(value) => writeln!(f, "  {}", value)?,
            Err(e) => writeln!(f, "  <{}>", e)?,
        }
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Program \"{}\": {} bytes, {} lines",
            self.name,
            self.layout.length,
            self.lines.len()
        )?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        if !self.trailing.is_empty() {
            writeln!(f, "[ {} long data section ]", self.trailing.len())?;
            writeln!(f, "{}", util::indented_hex("  ", &self.trailing))?;
        }
        write_items(f, "Numeric variables", &self.numeric_variables)?;
        write_items(f, "String variables", &self.string_variables)
    }
}
