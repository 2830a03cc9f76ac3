//! Fixed-length bit strings used as classical conditions and basis states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops;
use std::str::FromStr;

use crate::error::{IrError, IrResult};

/// Bit ordering used when converting to and from integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Endianness {
    /// Bit 0 is the least significant binary digit, so `"100"` reads as 1.
    #[default]
    Big,
    /// Bit 0 is the most significant binary digit, so `"100"` reads as 4.
    Little,
}

/// A fixed-length sequence of bits.
///
/// Equality and hashing are by content. Binary bitwise operators require
/// both operands to have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BitString {
    bits: Vec<bool>,
}

impl BitString {
    /// All-zero bit string of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Parse a literal such as `"0110"`.
    pub fn parse(s: &str) -> IrResult<Self> {
        s.parse()
    }

    /// Build from a length and the indices of the set bits.
    pub fn from_nonzeros(len: usize, nonzeros: &[usize]) -> IrResult<Self> {
        let mut bits = vec![false; len];
        for &i in nonzeros {
            if i >= len {
                return Err(IrError::Index {
                    index: i as i64,
                    bound: Some(len),
                });
            }
            bits[i] = true;
        }
        Ok(Self { bits })
    }

    /// Build by evaluating `f` on every index.
    pub fn from_fn(len: usize, f: impl FnMut(usize) -> bool) -> Self {
        Self {
            bits: (0..len).map(f).collect(),
        }
    }

    /// Encode an integer in `len` bits.
    pub fn from_integer(value: u64, len: usize, endianness: Endianness) -> Self {
        Self::from_fn(len, |i| {
            let pos = match endianness {
                Endianness::Big => i,
                Endianness::Little => len - 1 - i,
            };
            pos < 64 && (value >> pos) & 1 == 1
        })
    }

    /// Build from raw bits.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Unpack from bytes, bit `i` taken from byte `i / 8` at position `i % 8`.
    pub fn from_bytes(len: usize, bytes: &[u8]) -> IrResult<Self> {
        let needed = len.div_ceil(8);
        if bytes.len() < needed {
            return Err(IrError::LengthMismatch {
                context: "bit vector data".into(),
                left: needed,
                right: bytes.len(),
            });
        }
        Ok(Self::from_fn(len, |i| (bytes[i / 8] >> (i % 8)) & 1 == 1))
    }

    /// Pack into bytes, inverse of [`BitString::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.bits.len().div_ceil(8)];
        for i in self.nonzeros() {
            out[i / 8] |= 1 << (i % 8);
        }
        out
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if there are no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Get bit `i`.
    pub fn get(&self, i: usize) -> Option<bool> {
        self.bits.get(i).copied()
    }

    /// Set bit `i` in place.
    pub fn set(&mut self, i: usize, value: bool) -> IrResult<()> {
        let len = self.bits.len();
        let bit = self.bits.get_mut(i).ok_or(IrError::Index {
            index: i as i64,
            bound: Some(len),
        })?;
        *bit = value;
        Ok(())
    }

    /// Copy with bit `i` set to `value`.
    pub fn with(&self, i: usize, value: bool) -> IrResult<Self> {
        let mut out = self.clone();
        out.set(i, value)?;
        Ok(out)
    }

    /// Indices of the set bits.
    pub fn nonzeros(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Iterate over the bits.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Raw bits.
    pub fn as_bits(&self) -> &[bool] {
        &self.bits
    }

    /// Interpret as an unsigned integer.
    pub fn to_integer(&self, endianness: Endianness) -> IrResult<u64> {
        if self.bits.len() > 64 {
            return Err(IrError::Domain(format!(
                "bit string of length {} does not fit in 64 bits",
                self.bits.len()
            )));
        }
        let ordered: Box<dyn Iterator<Item = &bool>> = match endianness {
            Endianness::Big => Box::new(self.bits.iter().rev()),
            Endianness::Little => Box::new(self.bits.iter()),
        };
        Ok(ordered.fold(0u64, |acc, &b| (acc << 1) | u64::from(b)))
    }

    fn zip_with(&self, other: &Self, op: &str, f: impl Fn(bool, bool) -> bool) -> IrResult<Self> {
        if self.len() != other.len() {
            return Err(IrError::LengthMismatch {
                context: format!("bitwise {op}"),
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(Self::from_fn(self.len(), |i| f(self.bits[i], other.bits[i])))
    }

    /// Bitwise AND.
    pub fn and(&self, other: &Self) -> IrResult<Self> {
        self.zip_with(other, "and", |a, b| a & b)
    }

    /// Bitwise OR.
    pub fn or(&self, other: &Self) -> IrResult<Self> {
        self.zip_with(other, "or", |a, b| a | b)
    }

    /// Bitwise XOR.
    pub fn xor(&self, other: &Self) -> IrResult<Self> {
        self.zip_with(other, "xor", |a, b| a ^ b)
    }

    /// Concatenate, `self` first.
    pub fn concat(&self, other: &Self) -> Self {
        let mut bits = self.bits.clone();
        bits.extend_from_slice(&other.bits);
        Self { bits }
    }

    /// Tile `n` times.
    pub fn repeat(&self, n: usize) -> Self {
        Self {
            bits: self.bits.repeat(n),
        }
    }
}

impl FromStr for BitString {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(IrError::Parse(format!(
                    "invalid character '{other}' in bit string \"{s}\""
                ))),
            })
            .collect::<IrResult<Vec<_>>>()
            .map(Self::from_bits)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl ops::Not for &BitString {
    type Output = BitString;

    fn not(self) -> BitString {
        BitString {
            bits: self.bits.iter().map(|b| !b).collect(),
        }
    }
}

impl ops::Not for BitString {
    type Output = BitString;

    fn not(self) -> BitString {
        !&self
    }
}

impl ops::BitAnd for &BitString {
    type Output = IrResult<BitString>;

    fn bitand(self, rhs: &BitString) -> IrResult<BitString> {
        self.and(rhs)
    }
}

impl ops::BitOr for &BitString {
    type Output = IrResult<BitString>;

    fn bitor(self, rhs: &BitString) -> IrResult<BitString> {
        self.or(rhs)
    }
}

impl ops::BitXor for &BitString {
    type Output = IrResult<BitString>;

    fn bitxor(self, rhs: &BitString) -> IrResult<BitString> {
        self.xor(rhs)
    }
}

/// `result[i] = self[i + n]`, zero filled.
impl ops::Shl<usize> for &BitString {
    type Output = BitString;

    fn shl(self, n: usize) -> BitString {
        BitString::from_fn(self.len(), |i| {
            i.checked_add(n)
                .and_then(|j| self.get(j))
                .unwrap_or(false)
        })
    }
}

/// `result[i] = self[i - n]`, zero filled.
impl ops::Shr<usize> for &BitString {
    type Output = BitString;

    fn shr(self, n: usize) -> BitString {
        BitString::from_fn(self.len(), |i| {
            i.checked_sub(n).and_then(|j| self.get(j)).unwrap_or(false)
        })
    }
}

impl ops::Add for &BitString {
    type Output = BitString;

    fn add(self, rhs: &BitString) -> BitString {
        self.concat(rhs)
    }
}

impl From<Vec<bool>> for BitString {
    fn from(bits: Vec<bool>) -> Self {
        Self::from_bits(bits)
    }
}
