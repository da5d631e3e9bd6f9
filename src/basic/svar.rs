//! String and array variables saved after a program.
//!
//! Records follow each other until the block is exhausted:
//!
//! ```text
//! +0  flags       bit 7: hidden, bits 5-6: kind, bits 0-4: name length
//! +1  name
//! +n  length      three-byte paged length of the payload
//! +3  payload
//! ```
//!
//! Array payloads start with a dimension count and a little-endian extent
//! per dimension.  Numeric arrays hold five-byte numbers; string arrays hold
//! fixed-width strings as wide as the last extent.

use std::fmt;

use log::warn;

use crate::basic::fpc::{self, Number, NUMBER_SIZE};
use crate::basic::{DecodeError, ItemError};
use crate::disk::directory::paged_length;
use crate::util;

const HIDDEN_FLAG: u8 = 0x80;
const KIND_SHIFT: u8 = 5;
const KIND_MASK: u8 = 0x03;
const NAME_LENGTH_MASK: u8 = 0x1f;
const PAGED_LENGTH_SIZE: usize = 3;

/// A value arranged by the extents of an array.  The outermost dimension is
/// the first level of nesting.
#[derive(Clone, Debug, PartialEq)]
pub enum Array<T> {
    Element(T),
    Nested(Vec<Array<T>>),
}

impl<T> Array<T> {
    /// Arrange `items` by `extents`, consuming one item per element.
    pub fn reshape<I>(items: &mut I, extents: &[usize]) -> Result<Array<T>, DecodeError>
    where
        I: Iterator<Item = T>,
    {
        match extents.split_first() {
            None => items
                .next()
                .map(Array::Element)
                .ok_or(DecodeError::Truncated),
            Some((&extent, inner)) => (0..extent)
                .map(|_| Array::reshape(items, inner))
                .collect::<Result<Vec<_>, _>>()
                .map(Array::Nested),
        }
    }

    fn write(
        &self,
        f: &mut fmt::Formatter,
        element: &dyn Fn(&mut fmt::Formatter, &T) -> fmt::Result,
    ) -> fmt::Result {
        match self {
            Array::Element(value) => element(f, value),
            Array::Nested(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write(f, element)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    NumericArray {
        extents: Vec<usize>,
        values: Array<Number>,
    },
    StringArray {
        extents: Vec<usize>,
        values: Array<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StringVariable {
    pub name: String,
    pub hidden: bool,
    pub value: Value,
}

fn write_extents(f: &mut fmt::Formatter, extents: &[usize]) -> fmt::Result {
    let extents: Vec<String> = extents.iter().map(|e| e.to_string()).collect();
    write!(f, "({})", extents.join(","))
}

impl fmt::Display for StringVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.value {
            Value::String(ref s) => write!(f, "{}$ = \"{}\"", self.name, s)?,
            Value::NumericArray {
                ref extents,
                ref values,
            } => {
                write!(f, "{}", self.name)?;
                write_extents(f, extents)?;
                f.write_str(" = ")?;
                values.write(f, &|f, n| write!(f, "{}", n))?;
            }
            Value::StringArray {
                ref extents,
                ref values,
            } => {
                write!(f, "{}$", self.name)?;
                write_extents(f, extents)?;
                f.write_str(" = ")?;
                values.write(f, &|f, s| write!(f, "\"{}\"", s))?;
            }
        }
        if self.hidden {
            f.write_str(" (hidden)")?;
        }
        Ok(())
    }
}

/// Split an array payload into its extents and element data.
fn array_header(payload: &[u8]) -> Result<(Vec<usize>, &[u8]), DecodeError> {
    let (&count, rest) = payload.split_first().ok_or(DecodeError::Truncated)?;
    if count == 0 {
        return Err(DecodeError::ZeroDimensions);
    }
    let count = count as usize;
    if rest.len() < count * 2 {
        return Err(DecodeError::Truncated);
    }
    let extents = rest[..count * 2]
        .chunks(2)
        .map(|pair| pair[0] as usize | (pair[1] as usize) << 8)
        .collect();
    Ok((extents, &rest[count * 2..]))
}

/// Check that `count` elements of `width` bytes fit in `data`.  Empty
/// elements still count as one byte so that absurd extents are rejected.
fn element_count(extents: &[usize], width: usize, data: &[u8]) -> Result<usize, DecodeError> {
    let count = extents
        .iter()
        .try_fold(1usize, |acc, &e| acc.checked_mul(e))
        .ok_or(DecodeError::Truncated)?;
    match count.checked_mul(width.max(1)) {
        Some(size) if size <= data.len() => Ok(count),
        _ => Err(DecodeError::Truncated),
    }
}

fn decode_value(kind: u8, payload: &[u8]) -> Result<Value, DecodeError> {
    match kind {
        0 => Ok(Value::String(util::escape(payload))),
        1 => {
            let (extents, data) = array_header(payload)?;
            let count = element_count(&extents, NUMBER_SIZE, data)?;
            let numbers = data[..count * NUMBER_SIZE]
                .chunks_exact(NUMBER_SIZE)
                .map(fpc::decode)
                .collect::<Result<Vec<_>, _>>()?;
            let values = Array::reshape(&mut numbers.into_iter(), &extents)?;
            Ok(Value::NumericArray { extents, values })
        }
        2 => {
            let (extents, data) = array_header(payload)?;
            let (&width, outer) = extents.split_last().ok_or(DecodeError::ZeroDimensions)?;
            let count = element_count(outer, width, data)?;
            let mut strings = (0..count).map(|i| util::escape(&data[i * width..(i + 1) * width]));
            let values = Array::reshape(&mut strings, outer)?;
            Ok(Value::StringArray { extents, values })
        }
        _ => Err(DecodeError::BadArrayType),
    }
}

/// Decode records until the block is exhausted.  A record whose payload
/// cannot be decoded is reported and skipped; a record whose header or
/// declared length runs past the block ends it.
pub fn decode(block: &[u8]) -> Vec<Result<StringVariable, ItemError>> {
    let mut items = Vec::new();
    let mut offset = 0;
    while offset < block.len() {
        let flags = block[offset];
        let name_start = offset + 1;
        let name_end = name_start + (flags & NAME_LENGTH_MASK) as usize;
        let payload_start = name_end + PAGED_LENGTH_SIZE;
        if payload_start > block.len() {
            items.push(Err(ItemError::new(offset, DecodeError::Truncated)));
            break;
        }
        let payload_end = payload_start + paged_length(&block[name_end..payload_start]);
        if payload_end > block.len() {
            items.push(Err(ItemError::new(offset, DecodeError::Truncated)));
            break;
        }

        let kind = (flags >> KIND_SHIFT) & KIND_MASK;
        let item = decode_value(kind, &block[payload_start..payload_end])
            .map(|value| StringVariable {
                name: util::escape(&block[name_start..name_end]),
                hidden: flags & HIDDEN_FLAG != 0,
                value,
            })
            .map_err(|error| ItemError::new(offset, error));
        if let Err(ref e) = item {
            warn!("string variable: {}", e);
        }
        items.push(item);
        offset = payload_end;
    }
    items
}
