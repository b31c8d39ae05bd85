use crate::buffer::{BitBuffer, Endianness};
use crate::result::{Error, Result};

/// Integer carrier for a bit-level signal, any width up to 64 bits.
pub trait Word: Copy {
    const SIGNED: bool;
    const MAX_BITS: u32;

    fn from_word(word: u64) -> Self;
    fn to_word(self) -> u64;
}

macro_rules! impl_word {
    ($signed:expr => $($ty:ty),+) => {
        $(impl Word for $ty {
            const SIGNED: bool = $signed;
            const MAX_BITS: u32 = <$ty>::BITS;

            #[inline]
            fn from_word(word: u64) -> Self {
                word as $ty
            }

            #[inline]
            fn to_word(self) -> u64 {
                self as u64
            }
        })+
    };
}

impl_word!(false => u8, u16, u32, u64);
impl_word!(true => i8, i16, i32, i64);

pub fn decode_int<T: Word>(buffer: &mut BitBuffer, bits: u32, endianness: Endianness) -> Result<T> {
    if bits == 0 || bits > T::MAX_BITS {
        return Err(Error::WidthMismatch {
            kind: "integer",
            bits: bits as u8,
        });
    }
    let mut word = buffer.get_word(bits, T::SIGNED, endianness)?;
    if T::SIGNED {
        // a big-endian swap masks the word back down to `bits`, so the
        // extension has to be redone from the low bits
        word = sign_extend(word, bits);
    }
    Ok(T::from_word(word))
}

pub fn encode_int<T: Word>(value: T, buffer: &mut BitBuffer, bits: u32, endianness: Endianness) {
    buffer.push_word(value.to_word(), bits, endianness);
}

pub fn decode_f32(buffer: &mut BitBuffer, endianness: Endianness) -> Result<f32> {
    let word = buffer.get_word(32, false, endianness)?;
    Ok(f32::from_bits(word as u32))
}

pub fn encode_f32(value: f32, buffer: &mut BitBuffer, endianness: Endianness) {
    buffer.push_word(value.to_bits().into(), 32, endianness);
}

pub fn decode_f64(buffer: &mut BitBuffer, endianness: Endianness) -> Result<f64> {
    let word = buffer.get_word(64, false, endianness)?;
    Ok(f64::from_bits(word))
}

pub fn encode_f64(value: f64, buffer: &mut BitBuffer, endianness: Endianness) {
    buffer.push_word(value.to_bits(), 64, endianness);
}

pub fn decode_bool(buffer: &mut BitBuffer) -> Result<bool> {
    Ok(buffer.get_word(8, false, Endianness::Little)? != 0)
}

pub fn encode_bool(value: bool, buffer: &mut BitBuffer) {
    buffer.push_word(value as u64, 8, Endianness::Little);
}

/// The length prefix of strings and dynamic arrays is a u32 and stays
/// little-endian no matter what the container's element endianness is.
pub fn decode_len(buffer: &mut BitBuffer) -> Result<u32> {
    Ok(buffer.get_word(32, false, Endianness::Little)? as u32)
}

pub fn encode_len(buffer: &mut BitBuffer, len: u32) {
    buffer.push_word(len.into(), 32, Endianness::Little);
}

pub fn decode_str(buffer: &mut BitBuffer) -> Result<String> {
    let len = decode_len(buffer)?;
    let mut bytes = Vec::with_capacity(len.min(4096) as usize);
    for _ in 0..len {
        bytes.push(buffer.get_word(8, false, Endianness::Little)? as u8);
    }
    String::from_utf8(bytes).map_err(|_| Error::TypeMismatch {
        expected: "UTF-8 string bytes",
    })
}

pub fn encode_str(value: &str, buffer: &mut BitBuffer) {
    encode_len(buffer, value.len() as u32);
    for byte in value.bytes() {
        buffer.push_word(byte.into(), 8, Endianness::Little);
    }
}

pub fn decode_many<T, F>(buffer: &mut BitBuffer, mut element: F) -> Result<Vec<T>>
where
    F: FnMut(&mut BitBuffer) -> Result<T>,
{
    let len = decode_len(buffer)?;
    let mut items = Vec::with_capacity(len.min(4096) as usize);
    for _ in 0..len {
        items.push(element(buffer)?);
    }
    Ok(items)
}

pub fn decode_optional<T, F>(buffer: &mut BitBuffer, element: F) -> Result<Option<T>>
where
    F: FnOnce(&mut BitBuffer) -> Result<T>,
{
    let tag = buffer.get_word(8, false, Endianness::Little)?;
    if tag == 0 {
        Ok(None)
    } else {
        element(buffer).map(Some)
    }
}

pub fn encode_optional<T, F>(value: Option<&T>, buffer: &mut BitBuffer, element: F) -> Result<()>
where
    F: FnOnce(&T, &mut BitBuffer) -> Result<()>,
{
    match value {
        Some(inner) => {
            buffer.push_word(1, 8, Endianness::Little);
            element(inner, buffer)
        }
        None => {
            buffer.push_word(0, 8, Endianness::Little);
            Ok(())
        }
    }
}

fn sign_extend(word: u64, bits: u32) -> u64 {
    if bits >= 64 {
        return word;
    }
    let shift = 64 - bits;
    (((word << shift) as i64) >> shift) as u64
}

/// Affine map between raw wire integers and physical values,
/// `physical = scale * raw + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub scale: f64,
    pub offset: f64,
}

impl Scaling {
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    /// With identity scaling the integer path never touches floats.
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }

    pub fn decode_to_f64(&self, raw: f64) -> f64 {
        self.scale * raw + self.offset
    }

    pub fn encode_from_f64(&self, physical: f64) -> f64 {
        if self.scale != 1.0 {
            (physical - self.offset) / self.scale
        } else {
            physical - self.offset
        }
    }

    /// Offset truncated for the integer-only path taken when `scale == 1`.
    pub fn integer_offset(&self) -> i64 {
        self.offset as i64
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}
