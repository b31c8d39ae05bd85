use crate::constants;
use crate::dynamic::DynamicSchema;
use crate::result::{Error, Result};
use crate::static_schema::StaticSchema;
use crate::value::Value;
use crate::{BusName, MessageId};

/// Field-bus transport record: up to eight payload octets addressed by an
/// 11-bit identifier on a named bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub bus: BusName,
    pub sid: u16,
    pub dlc: u8,
    pub data: [u8; constants::FRAME_PAYLOAD_BYTES],
}

/// Either codec face behind one interface: callers can swap the generated
/// and the interpreted schema and observe identical frames.
pub trait CanSchema {
    /// Dispatches an inbound frame by its `(bus, id)` pair. An unknown pair
    /// is `Ok(None)`, never an error.
    fn decode_frame(&self, frame: &Frame) -> Result<Option<(String, Value)>>;

    fn encode_frame(&self, name: &str, value: &Value) -> Result<Frame>;
}

/// Thin dispatcher owning one schema face.
pub struct Can {
    schema: Box<dyn CanSchema>,
}

impl Can {
    pub fn new(schema: Box<dyn CanSchema>) -> Self {
        Self { schema }
    }

    pub fn decode(&self, frame: &Frame) -> Result<Option<(String, Value)>> {
        self.schema.decode_frame(frame)
    }

    pub fn encode(&self, name: &str, value: &Value) -> Result<Frame> {
        self.schema.encode_frame(name, value)
    }
}

fn assemble_frame(bus: &str, id: MessageId, payload: &[u8]) -> Result<Frame> {
    if payload.len() > constants::FRAME_PAYLOAD_BYTES {
        return Err(Error::OversizedFrame(payload.len()));
    }
    let mut data = [0u8; constants::FRAME_PAYLOAD_BYTES];
    data[..payload.len()].copy_from_slice(payload);
    Ok(Frame {
        bus: BusName::new(bus),
        sid: id.into(),
        dlc: payload.len() as u8,
        data,
    })
}

impl CanSchema for StaticSchema {
    fn decode_frame(&self, frame: &Frame) -> Result<Option<(String, Value)>> {
        let name = match self.name_for(frame.sid, frame.bus.as_str()) {
            Some(name) => name.to_owned(),
            None => return Ok(None),
        };
        let value = self.decode_value(&name, &frame.data[..frame.dlc as usize])?;
        Ok(Some((name, value)))
    }

    fn encode_frame(&self, name: &str, value: &Value) -> Result<Frame> {
        let payload = self.encode_value(name, value)?;
        let id = self
            .id_for(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        let bus = self
            .bus_for(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        assemble_frame(bus, id, &payload)
    }
}

impl CanSchema for DynamicSchema {
    fn decode_frame(&self, frame: &Frame) -> Result<Option<(String, Value)>> {
        let name = match self.registry().message_name_for(frame.sid, frame.bus.as_str()) {
            Some(name) => name.to_owned(),
            None => return Ok(None),
        };
        let value = self.decode_value(&name, &frame.data[..frame.dlc as usize])?;
        Ok(Some((name, value)))
    }

    fn encode_frame(&self, name: &str, value: &Value) -> Result<Frame> {
        let payload = self.encode_value(name, value)?;
        let binding = self
            .registry()
            .can_impl(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        // validated at load time, so both fields are present and in range
        let id = binding
            .can_id()
            .and_then(|id| MessageId::try_from(id).ok())
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        let bus = binding
            .can_bus()
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        assemble_frame(bus, id, &payload)
    }
}
