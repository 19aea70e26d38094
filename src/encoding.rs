//! Encoding utilities for the flat buffer and the model file.
//!
//! This module provides:
//! - Fixed-width offset numerals over a configurable character range
//! - Variable-length integers (VarInt) for file headers
//! - Length-prefixed byte strings
//! - Shared prefix length

use crate::config::Config;
use crate::error::{PretreeError, Result};

/// Fixed-width base-`basis` numerals whose digit `k` is the character
/// `low + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCodec {
    low: u32,
    basis: u64,
    width: usize,
}

impl OffsetCodec {
    pub fn new(config: &Config) -> Self {
        Self {
            low: config.low_char,
            basis: config.basis() as u64,
            width: config.offset_width(),
        }
    }

    /// Digits per offset.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Largest offset representable in `width` digits.
    pub fn max_offset(&self) -> u64 {
        self.basis
            .checked_pow(self.width as u32)
            .map_or(u64::MAX, |reach| reach - 1)
    }

    /// Appends the numeral for `offset`, most significant digit first.
    pub fn encode_into(&self, offset: usize, out: &mut Vec<char>) -> Result<()> {
        let offset = offset as u64;
        if offset > self.max_offset() || offset > crate::config::MAX_OFFSET {
            return Err(PretreeError::BufferTooLarge(offset as usize));
        }
        let start = out.len();
        out.resize(start + self.width, '\0');
        let mut rest = offset;
        for slot in out[start..].iter_mut().rev() {
            let digit = (rest % self.basis) as u32;
            rest /= self.basis;
            // low + digit stays inside the validated alphabet.
            *slot = char::from_u32(self.low + digit).unwrap_or(char::REPLACEMENT_CHARACTER);
        }
        Ok(())
    }

    /// Overwrites `width` digits at `pos` with the numeral for `offset`.
    pub fn patch(&self, buf: &mut [char], pos: usize, offset: usize) -> Result<()> {
        let mut digits = Vec::with_capacity(self.width);
        self.encode_into(offset, &mut digits)?;
        buf[pos..pos + self.width].copy_from_slice(&digits);
        Ok(())
    }

    /// Reads the numeral starting at `pos`.
    pub fn decode_at(&self, buf: &[char], pos: usize) -> Result<usize> {
        let digits = buf
            .get(pos..pos + self.width)
            .ok_or_else(|| PretreeError::decode(pos, "truncated offset"))?;
        let mut value: u64 = 0;
        for (i, &c) in digits.iter().enumerate() {
            let k = (c as u32)
                .checked_sub(self.low)
                .map(u64::from)
                .filter(|&k| k < self.basis)
                .ok_or_else(|| PretreeError::decode(pos + i, format!("{c:?} is not an offset digit")))?;
            value = value
                .checked_mul(self.basis)
                .and_then(|v| v.checked_add(k))
                .ok_or_else(|| PretreeError::decode(pos, "offset overflow"))?;
        }
        usize::try_from(value).map_err(|_| PretreeError::decode(pos, "offset overflow"))
    }
}

/// Encode a u64 as a variable-length integer.
///
/// Uses 1-10 bytes depending on the value:
/// - 0-127: 1 byte
/// - 128-16383: 2 bytes
/// - etc.
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Decode a variable-length integer.
///
/// Returns (value, bytes_consumed).
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0;
    let mut i = 0;

    loop {
        let byte = *buf
            .get(i)
            .ok_or_else(|| PretreeError::Format("truncated varint".into()))?;
        if shift > 63 {
            return Err(PretreeError::Format("varint overflow".into()));
        }
        value |= ((byte & 0x7F) as u64) << shift;
        i += 1;

        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    Ok((value, i))
}

/// Encode a length-prefixed byte slice.
pub fn encode_bytes(data: &[u8], buf: &mut Vec<u8>) {
    encode_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

/// Decode a length-prefixed byte slice.
///
/// Returns (data, bytes_consumed).
pub fn decode_bytes(buf: &[u8]) -> Result<(&[u8], usize)> {
    let (len, len_size) = decode_varint(buf)?;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| len_size.checked_add(len))
        .filter(|&end| end <= buf.len())
        .ok_or_else(|| PretreeError::Format("truncated byte string".into()))?;
    Ok((&buf[len_size..end], end))
}

/// Compute the shared prefix length between two slices.
pub fn common_prefix_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
