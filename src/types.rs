use std::io;

use declio::{Decode, Encode};
use modular_bitfield::prelude::*;

use crate::buffer::Endianness;
use crate::codec::Scaling;
use crate::{codecs, constants, MessageId};

/// Recursive wire-layout description of a named type.
///
/// A descriptor owns its children outright; nesting is acyclic by
/// construction, so a struct field holding another struct simply embeds a
/// copy of that struct's descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Primitive(PrimitiveDef),
    Enum(EnumDef),
    Struct(StructDef),
    FixedArray { element: Box<Descriptor>, len: u32 },
    DynamicArray(Box<Descriptor>),
    Str,
    Optional(Box<Descriptor>),
}

impl Descriptor {
    pub fn unsigned(bits: u8) -> Self {
        Descriptor::Primitive(PrimitiveDef::new(PrimitiveKind::Unsigned, bits))
    }

    pub fn signed(bits: u8) -> Self {
        Descriptor::Primitive(PrimitiveDef::new(PrimitiveKind::Signed, bits))
    }

    pub fn float() -> Self {
        Descriptor::Primitive(PrimitiveDef::new(PrimitiveKind::F32, 32))
    }

    pub fn double() -> Self {
        Descriptor::Primitive(PrimitiveDef::new(PrimitiveKind::F64, 64))
    }

    pub fn boolean() -> Self {
        Descriptor::Primitive(PrimitiveDef::new(PrimitiveKind::Bool, 8))
    }

    pub fn string() -> Self {
        Descriptor::Str
    }

    pub fn fixed_array(element: Descriptor, len: u32) -> Self {
        Descriptor::FixedArray {
            element: Box::new(element),
            len,
        }
    }

    pub fn dynamic_array(element: Descriptor) -> Self {
        Descriptor::DynamicArray(Box::new(element))
    }

    pub fn optional(element: Descriptor) -> Self {
        Descriptor::Optional(Box::new(element))
    }

    /// Sets the byte order of a primitive; no-op for composites, whose
    /// layout has no byte order of its own.
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        if let Descriptor::Primitive(def) = &mut self {
            def.properties = def.properties.with_endianness(endianness);
        }
        self
    }

    pub fn with_scaling(mut self, scale: f64, offset: f64) -> Self {
        if let Descriptor::Primitive(def) = &mut self {
            def.scaling = Scaling::new(scale, offset);
        }
        self
    }

    fn decode_at_depth<R>(reader: &mut R, depth: u8) -> Result<Self, declio::Error>
    where
        R: io::Read,
    {
        if depth > constants::MAX_DESCRIPTOR_DEPTH {
            return Err(declio::Error::new("descriptor nesting too deep"));
        }
        match u8::decode((), reader)? {
            constants::DT_PRIMITIVE => {
                let raw = u8::decode((), reader)?;
                if raw & 0b111 > PrimitiveKind::Bool as u8 {
                    return Err(declio::Error::new("invalid primitive kind"));
                }
                let properties = PrimitiveProperties::from_bytes([raw]);
                let bits = u8::decode((), reader)?;
                let scale = codecs::f64_bits::decode((), reader)?;
                let offset = codecs::f64_bits::decode((), reader)?;
                Ok(Descriptor::Primitive(PrimitiveDef {
                    properties,
                    bits,
                    scaling: Scaling::new(scale, offset),
                }))
            }
            constants::DT_ENUM => Ok(Descriptor::Enum(EnumDef::decode((), reader)?)),
            constants::DT_STRUCT => Ok(Descriptor::Struct(StructDef::decode_at_depth(reader, depth)?)),
            constants::DT_FIXED_ARRAY => {
                let element = Self::decode_at_depth(reader, depth + 1)?;
                let len = u32::decode(constants::ENDIANESS, reader)?;
                Ok(Descriptor::FixedArray {
                    element: Box::new(element),
                    len,
                })
            }
            constants::DT_DYNAMIC_ARRAY => {
                let element = Self::decode_at_depth(reader, depth + 1)?;
                Ok(Descriptor::DynamicArray(Box::new(element)))
            }
            constants::DT_STRING => Ok(Descriptor::Str),
            constants::DT_OPTIONAL => {
                let element = Self::decode_at_depth(reader, depth + 1)?;
                Ok(Descriptor::Optional(Box::new(element)))
            }
            tag => Err(declio::Error::new(format!("unknown descriptor tag {}", tag))),
        }
    }
}

impl<Ctx: Copy> Encode<Ctx> for Descriptor {
    fn encode<W>(&self, ctx: Ctx, writer: &mut W) -> Result<(), declio::Error>
    where
        W: io::Write,
    {
        match self {
            Descriptor::Primitive(def) => {
                constants::DT_PRIMITIVE.encode((), writer)?;
                writer.write_all(&def.properties.into_bytes())?;
                def.bits.encode((), writer)?;
                codecs::f64_bits::encode(&def.scaling.scale, (), writer)?;
                codecs::f64_bits::encode(&def.scaling.offset, (), writer)
            }
            Descriptor::Enum(def) => {
                constants::DT_ENUM.encode((), writer)?;
                def.encode((), writer)
            }
            Descriptor::Struct(def) => {
                constants::DT_STRUCT.encode((), writer)?;
                def.encode((), writer)
            }
            Descriptor::FixedArray { element, len } => {
                constants::DT_FIXED_ARRAY.encode((), writer)?;
                element.as_ref().encode(ctx, writer)?;
                len.encode(constants::ENDIANESS, writer)
            }
            Descriptor::DynamicArray(element) => {
                constants::DT_DYNAMIC_ARRAY.encode((), writer)?;
                element.as_ref().encode(ctx, writer)
            }
            Descriptor::Str => constants::DT_STRING.encode((), writer),
            Descriptor::Optional(element) => {
                constants::DT_OPTIONAL.encode((), writer)?;
                element.as_ref().encode(ctx, writer)
            }
        }
    }
}

impl<Ctx: Copy> Decode<Ctx> for Descriptor {
    fn decode<R>(_ctx: Ctx, reader: &mut R) -> Result<Self, declio::Error>
    where
        R: io::Read,
    {
        Self::decode_at_depth(reader, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BitfieldSpecifier)]
#[bits = 3]
pub enum PrimitiveKind {
    Unsigned = 0,
    Signed = 1,
    F32 = 2,
    F64 = 3,
    Bool = 4,
}

#[bitfield(bits = 8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveProperties {
    pub kind: PrimitiveKind,
    pub endianness: Endianness,
    #[skip]
    unused: B4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveDef {
    pub properties: PrimitiveProperties,
    pub bits: u8,
    pub scaling: Scaling,
}

impl PrimitiveDef {
    pub fn new(kind: PrimitiveKind, bits: u8) -> Self {
        Self {
            properties: PrimitiveProperties::new().with_kind(kind),
            bits,
            scaling: Scaling::default(),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.properties.kind()
    }

    pub fn endianness(&self) -> Endianness {
        self.properties.endianness()
    }
}

#[derive(Debug, Clone, PartialEq, Encode)]
pub struct StructDef {
    #[declio(with = "codecs::short_str")]
    pub name: String,
    #[declio(with = "codecs::counted")]
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
        }
    }

    pub fn field<S: Into<String>>(mut self, name: S, descriptor: Descriptor) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            descriptor,
        });
        self
    }

    fn decode_at_depth<R>(reader: &mut R, depth: u8) -> Result<Self, declio::Error>
    where
        R: io::Read,
    {
        let name = codecs::short_str::decode((), reader)?;
        let len = u32::decode(constants::ENDIANESS, reader)?;
        let mut fields = Vec::with_capacity(len.min(4096) as usize);
        for _ in 0..len {
            fields.push(FieldDef::decode_at_depth(reader, depth)?);
        }
        Ok(Self { name, fields })
    }
}

impl<Ctx: Copy> Decode<Ctx> for StructDef {
    fn decode<R>(_ctx: Ctx, reader: &mut R) -> Result<Self, declio::Error>
    where
        R: io::Read,
    {
        Self::decode_at_depth(reader, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Encode)]
pub struct FieldDef {
    #[declio(with = "codecs::short_str")]
    pub name: String,
    pub descriptor: Descriptor,
}

impl FieldDef {
    fn decode_at_depth<R>(reader: &mut R, depth: u8) -> Result<Self, declio::Error>
    where
        R: io::Read,
    {
        let name = codecs::short_str::decode((), reader)?;
        let descriptor = Descriptor::decode_at_depth(reader, depth + 1)?;
        Ok(Self { name, descriptor })
    }
}

impl<Ctx: Copy> Decode<Ctx> for FieldDef {
    fn decode<R>(_ctx: Ctx, reader: &mut R) -> Result<Self, declio::Error>
    where
        R: io::Read,
    {
        Self::decode_at_depth(reader, 0)
    }
}

/// Enumeration definition: raw unsigned tag of `bits` width on the wire,
/// variant name at the value level.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct EnumDef {
    #[declio(with = "codecs::short_str")]
    pub name: String,
    pub bits: u8,
    #[declio(with = "codecs::counted")]
    pub variants: Vec<EnumVariant>,
}

impl EnumDef {
    pub fn new<S: Into<String>>(name: S, bits: u8) -> Self {
        Self {
            name: name.into(),
            bits,
            variants: vec![],
        }
    }

    pub fn variant<S: Into<String>>(mut self, name: S, value: u64) -> Self {
        self.variants.push(EnumVariant {
            name: name.into(),
            value,
        });
        self
    }

    pub fn tag_of(&self, name: &str) -> Option<u64> {
        self.variants.iter().find(|v| v.name == name).map(|v| v.value)
    }

    pub fn name_of(&self, tag: u64) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.value == tag)
            .map(|v| v.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct EnumVariant {
    #[declio(with = "codecs::short_str")]
    pub name: String,
    #[declio(ctx = "constants::ENDIANESS")]
    pub value: u64,
}

/// Protocol binding of a named type: free-form string fields keyed by
/// protocol convention. The CAN protocol uses `id` (decimal) and `bus`.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ImplEntry {
    #[declio(with = "codecs::short_str")]
    pub protocol: String,
    #[declio(with = "codecs::short_str")]
    pub name: String,
    #[declio(with = "codecs::counted")]
    pub fields: Vec<ImplField>,
}

impl ImplEntry {
    pub fn can<S: Into<String>>(name: S, id: MessageId, bus: &str) -> Self {
        Self {
            protocol: constants::CAN_PROTOCOL.to_owned(),
            name: name.into(),
            fields: vec![
                ImplField {
                    key: constants::CAN_ID_FIELD.to_owned(),
                    value: u16::from(id).to_string(),
                },
                ImplField {
                    key: constants::CAN_BUS_FIELD.to_owned(),
                    value: bus.to_owned(),
                },
            ],
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    pub fn can_id(&self) -> Option<u16> {
        self.field(constants::CAN_ID_FIELD)?.parse().ok()
    }

    pub fn can_bus(&self) -> Option<&str> {
        self.field(constants::CAN_BUS_FIELD)
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ImplField {
    #[declio(with = "codecs::short_str")]
    pub key: String,
    #[declio(with = "codecs::short_str")]
    pub value: String,
}
