//! The five-byte number format used by SAM BASIC for cached literals and
//! numeric variables.
//!
//! A first byte of zero selects the "small integer" form:
//!
//! ```text
//! 00 ss lo hi 00      ss = 00 (positive) or ff (negative)
//! ```
//!
//! Any other first byte is the exponent of a floating point value, biased by
//! 128, followed by a big-endian mantissa whose top bit holds the sign in
//! place of the implied leading one.

use std::fmt;

use crate::basic::DecodeError;

pub const NUMBER_SIZE: usize = 5;

const SIGN_POSITIVE: u8 = 0x00;
const SIGN_NEGATIVE: u8 = 0xff;
const EXPONENT_BIAS: i32 = 128;
const SIGN_BIT: u32 = 0x8000_0000;
const MANTISSA_SCALE: f64 = 4_294_967_296.0;

pub const MIN_INTEGER: i32 = -65536;
pub const MAX_INTEGER: i32 = 65535;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i32),
    Float(f64),
}

impl Number {
    pub fn value(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Decode one number.  The input must be exactly five bytes.
pub fn decode(bytes: &[u8]) -> Result<Number, DecodeError> {
    if bytes.len() != NUMBER_SIZE {
        return Err(DecodeError::NumberLength);
    }
    if bytes[0] == 0 {
        let magnitude = bytes[2] as i32 | (bytes[3] as i32) << 8;
        let value = match bytes[1] {
            SIGN_POSITIVE => magnitude,
            SIGN_NEGATIVE => magnitude - 65536,
            _ => return Err(DecodeError::BadSign),
        };
        if bytes[4] != 0 {
            return Err(DecodeError::BadTerminator);
        }
        return Ok(Number::Integer(value));
    }

    let exponent = bytes[0] as i32 - EXPONENT_BIAS;
    let word = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    let mantissa = (word | SIGN_BIT) as f64 / MANTISSA_SCALE;
    let magnitude = mantissa * 2f64.powi(exponent);
    Ok(Number::Float(if word & SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    }))
}

/// Encode a value in the integer form, or return `None` if it is out of
/// range.
pub fn encode_integer(value: i32) -> Option<[u8; NUMBER_SIZE]> {
    if !(MIN_INTEGER..=MAX_INTEGER).contains(&value) {
        return None;
    }
    let (sign, magnitude) = if value < 0 {
        (SIGN_NEGATIVE, value + 65536)
    } else {
        (SIGN_POSITIVE, value)
    };
    Some([0, sign, magnitude as u8, (magnitude >> 8) as u8, 0])
}
