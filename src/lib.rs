use std::fmt;

pub mod buffer;
pub mod builders;
pub mod can;
pub mod codec;
mod codecs;
mod constants;
pub mod dynamic;
pub mod result;
pub mod schema;
pub mod static_schema;
pub mod types;
pub mod value;

/// Bus identifier: up to four ASCII characters, zero-padded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusName([u8; 4]);

impl BusName {
    pub fn new(name: &str) -> Self {
        let mut bytes = [0u8; 4];
        for (slot, byte) in bytes.iter_mut().zip(name.bytes()) {
            *slot = byte;
        }
        Self(bytes)
    }

    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(4);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl From<&str> for BusName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for BusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct IdOutOfRange;

/// Standard-frame message identifier; the upper five bits of the carrier
/// u16 are always clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u16);

impl TryFrom<u16> for MessageId {
    type Error = IdOutOfRange;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value > constants::MAX_MESSAGE_ID {
            return Err(IdOutOfRange);
        }
        Ok(Self(value))
    }
}

impl From<MessageId> for u16 {
    #[inline]
    fn from(id: MessageId) -> Self {
        id.0
    }
}
