//! Numeric variables saved after a program.
//!
//! The block starts with 26 little-endian chain heads, one per initial
//! letter.  Each head, and each record's link, is an offset from the start of
//! the block; a high byte of 0xFF marks the end of a chain.  A record is:
//!
//! ```text
//! +0  flags       bit 7: FOR loop variable, bits 0-4: suffix length
//! +1  next        little-endian link to the next record with this letter
//! +3  suffix      the name after its first letter
//! +n  value       five-byte number
//! +5  limit, step, return address, statement  (loop variables only)
//! ```

use std::collections::HashSet;
use std::fmt;

use log::warn;

use crate::basic::fpc::{self, Number, NUMBER_SIZE};
use crate::basic::{DecodeError, ItemError};
use crate::util;

const LETTERS: usize = 26;
pub const HEADS_SIZE: usize = LETTERS * 2;
const RECORD_HEADER_SIZE: usize = 3;
const LOOP_FLAG: u8 = 0x80;
const SUFFIX_LENGTH_MASK: u8 = 0x1f;
const ABSENT: u8 = 0xff;
const LOOP_FIELDS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopState {
    pub limit: Number,
    pub step: Number,
    pub return_address: Number,
    pub statement: Number,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NumericVariable {
    pub name: String,
    pub value: Number,
    pub loop_state: Option<LoopState>,
}

impl fmt::Display for NumericVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)?;
        if let Some(ref state) = self.loop_state {
            write!(
                f,
                " (FOR to {} step {}, return {} statement {})",
                state.limit, state.step, state.return_address, state.statement
            )?;
        }
        Ok(())
    }
}

/// Read a two-byte link, returning `None` for the end of a chain.
fn link(block: &[u8], offset: usize) -> Option<usize> {
    if block[offset + 1] == ABSENT {
        None
    } else {
        Some(block[offset] as usize | (block[offset + 1] as usize) << 8)
    }
}

fn number_at(block: &[u8], offset: usize) -> Result<Number, DecodeError> {
    let bytes = block
        .get(offset..offset + NUMBER_SIZE)
        .ok_or(DecodeError::Truncated)?;
    fpc::decode(bytes)
}

fn decode_record(
    block: &[u8],
    letter: u8,
    offset: usize,
    flags: u8,
) -> Result<NumericVariable, DecodeError> {
    let suffix_start = offset + RECORD_HEADER_SIZE;
    let suffix_length = (flags & SUFFIX_LENGTH_MASK) as usize;
    let suffix = block
        .get(suffix_start..suffix_start + suffix_length)
        .ok_or(DecodeError::Truncated)?;
    let mut position = suffix_start + suffix_length;
    let value = number_at(block, position)?;

    let loop_state = if flags & LOOP_FLAG != 0 {
        let mut fields = [Number::Integer(0); LOOP_FIELDS];
        for field in fields.iter_mut() {
            position += NUMBER_SIZE;
            *field = number_at(block, position)?;
        }
        Some(LoopState {
            limit: fields[0],
            step: fields[1],
            return_address: fields[2],
            statement: fields[3],
        })
    } else {
        None
    };

    let mut name = ((b'a' + letter) as char).to_string();
    name.push_str(&util::escape(suffix));
    Ok(NumericVariable {
        name,
        value,
        loop_state,
    })
}

/// Decode every chain of the block.  A record that cannot be decoded is
/// reported and its chain continues through the record's link; only a
/// record whose link cannot be read (or a loop) ends a chain early.
pub fn decode(block: &[u8]) -> Vec<Result<NumericVariable, ItemError>> {
    let mut items = Vec::new();
    if block.len() < HEADS_SIZE {
        if !block.is_empty() {
            items.push(Err(ItemError::new(0, DecodeError::Truncated)));
        }
        return items;
    }

    for letter in 0..LETTERS {
        let mut visited = HashSet::new();
        let mut next = link(block, letter * 2);
        while let Some(offset) = next {
            if !visited.insert(offset) {
                items.push(Err(ItemError::new(offset, DecodeError::ChainLoop)));
                break;
            }
            if offset >= block.len() {
                items.push(Err(ItemError::new(offset, DecodeError::BadOffset)));
                break;
            }
            if offset + RECORD_HEADER_SIZE > block.len() {
                items.push(Err(ItemError::new(offset, DecodeError::Truncated)));
                break;
            }
            next = link(block, offset + 1);
            let item = decode_record(block, letter as u8, offset, block[offset])
                .map_err(|error| ItemError::new(offset, error));
            if let Err(ref e) = item {
                warn!("numeric variable: {}", e);
            }
            items.push(item);
        }
    }
    items
}
