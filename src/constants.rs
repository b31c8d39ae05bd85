use declio::ctx::Endian;

pub const ENDIANESS: Endian = Endian::Little;

pub const DT_PRIMITIVE: u8 = 0x00;
pub const DT_ENUM: u8 = 0x01;
pub const DT_STRUCT: u8 = 0x02;
pub const DT_FIXED_ARRAY: u8 = 0x03;
pub const DT_DYNAMIC_ARRAY: u8 = 0x04;
pub const DT_STRING: u8 = 0x05;
pub const DT_OPTIONAL: u8 = 0x06;

/// Maximum nesting of composite descriptors accepted from a schema blob.
pub const MAX_DESCRIPTOR_DEPTH: u8 = 32;

pub const CAN_PROTOCOL: &str = "can";
pub const CAN_ID_FIELD: &str = "id";
pub const CAN_BUS_FIELD: &str = "bus";

pub const FRAME_PAYLOAD_BYTES: usize = 8;
pub const MAX_MESSAGE_ID: u16 = 0x7ff;
