use crate::buffer::BitBuffer;
use crate::result::{Error, Result};
use crate::value::Value;
use crate::MessageId;

/// A message type known at generation time: it lays itself out on a bit
/// buffer and converts to and from the value tree.
pub trait Message: Sized {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()>;
    fn decode(buffer: &mut BitBuffer) -> Result<Self>;
    fn to_value(&self) -> Value;
    fn from_value(value: &Value) -> Result<Self>;
}

/// One row of the generated dispatch table. The codec entry points are
/// monomorphized per message type and stored as plain function pointers.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    name: &'static str,
    id: MessageId,
    bus: &'static str,
    encode_value: fn(&Value) -> Result<Vec<u8>>,
    decode_bytes: fn(&[u8]) -> Result<Value>,
}

impl MessageEntry {
    pub fn of<M: Message>(name: &'static str, id: MessageId, bus: &'static str) -> Self {
        Self {
            name,
            id,
            bus,
            encode_value: encode_through::<M>,
            decode_bytes: decode_through::<M>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn bus(&self) -> &'static str {
        self.bus
    }
}

fn encode_through<M: Message>(value: &Value) -> Result<Vec<u8>> {
    let message = M::from_value(value)?;
    let mut buffer = BitBuffer::new();
    message.encode(&mut buffer)?;
    Ok(buffer.into_bytes())
}

fn decode_through<M: Message>(bytes: &[u8]) -> Result<Value> {
    let mut buffer = BitBuffer::from_bytes(bytes.to_vec());
    Ok(M::decode(&mut buffer)?.to_value())
}

/// The generated face of the codec: a fixed table of message types with
/// their CAN bindings baked in.
#[derive(Debug, Default)]
pub struct StaticSchema {
    entries: Vec<MessageEntry>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<M: Message>(mut self, name: &'static str, id: MessageId, bus: &'static str) -> Self {
        self.entries.push(MessageEntry::of::<M>(name, id, bus));
        self
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn encode_value(&self, name: &str, value: &Value) -> Result<Vec<u8>> {
        let entry = self
            .entry(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        (entry.encode_value)(value)
    }

    pub fn decode_value(&self, name: &str, bytes: &[u8]) -> Result<Value> {
        let entry = self
            .entry(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        (entry.decode_bytes)(bytes)
    }

    pub fn name_for(&self, id: u16, bus: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| u16::from(entry.id) == id && entry.bus == bus)
            .map(|entry| entry.name)
    }

    pub fn id_for(&self, name: &str) -> Option<MessageId> {
        self.entry(name).map(|entry| entry.id)
    }

    pub fn bus_for(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|entry| entry.bus)
    }

    fn entry(&self, name: &str) -> Option<&MessageEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}
