use std::io;

use derive_getters::Getters;

use crate::buffer::{BitBuffer, Endianness};
use crate::codec::{self, Scaling};
use crate::result::{Error, Result};
use crate::schema::SchemaRegistry;
use crate::types::{Descriptor, EnumDef, PrimitiveDef, PrimitiveKind, StructDef};
use crate::value::Value;

/// Schema-driven codec: walks descriptor trees loaded at runtime and is
/// bit-exact with the generated face for the same descriptors.
#[derive(Debug, Getters)]
pub struct DynamicSchema {
    registry: SchemaRegistry,
}

impl DynamicSchema {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn load<R>(reader: R) -> Result<Self>
    where
        R: io::Read,
    {
        Ok(Self::new(SchemaRegistry::read(reader)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(bytes)
    }

    pub fn decode_value(&self, name: &str, bytes: &[u8]) -> Result<Value> {
        let def = self
            .registry
            .lookup(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        let mut buffer = BitBuffer::from_bytes(bytes.to_vec());
        decode_struct(def, &mut buffer)
    }

    pub fn encode_value(&self, name: &str, value: &Value) -> Result<Vec<u8>> {
        let def = self
            .registry
            .lookup(name)
            .ok_or_else(|| Error::UnknownType(name.to_owned()))?;
        let mut buffer = BitBuffer::new();
        encode_struct(def, value, &mut buffer)?;
        Ok(buffer.into_bytes())
    }
}

fn decode_struct(def: &StructDef, buffer: &mut BitBuffer) -> Result<Value> {
    let mut fields = std::collections::BTreeMap::new();
    for field in &def.fields {
        fields.insert(field.name.clone(), decode_descriptor(&field.descriptor, buffer)?);
    }
    Ok(Value::Record(fields))
}

fn encode_struct(def: &StructDef, value: &Value, buffer: &mut BitBuffer) -> Result<()> {
    let record = value.as_record().ok_or(Error::TypeMismatch {
        expected: "mapping of field names",
    })?;
    // field order comes from the descriptor, never from the input mapping
    for field in &def.fields {
        let field_value = record
            .get(&field.name)
            .ok_or_else(|| Error::MissingField(field.name.clone()))?;
        encode_descriptor(&field.descriptor, field_value, buffer)?;
    }
    Ok(())
}

fn decode_descriptor(descriptor: &Descriptor, buffer: &mut BitBuffer) -> Result<Value> {
    match descriptor {
        Descriptor::Primitive(def) => decode_primitive(def, buffer),
        Descriptor::Enum(def) => decode_enum(def, buffer),
        Descriptor::Struct(def) => decode_struct(def, buffer),
        Descriptor::FixedArray { element, len } => {
            let mut items = Vec::with_capacity((*len).min(4096) as usize);
            for _ in 0..*len {
                items.push(decode_descriptor(element, buffer)?);
            }
            Ok(Value::Sequence(items))
        }
        Descriptor::DynamicArray(element) => {
            let items = codec::decode_many(buffer, |buffer| decode_descriptor(element, buffer))?;
            Ok(Value::Sequence(items))
        }
        Descriptor::Str => Ok(Value::Text(codec::decode_str(buffer)?)),
        Descriptor::Optional(element) => {
            let inner = codec::decode_optional(buffer, |buffer| decode_descriptor(element, buffer))?;
            Ok(inner.unwrap_or(Value::Null))
        }
    }
}

fn encode_descriptor(descriptor: &Descriptor, value: &Value, buffer: &mut BitBuffer) -> Result<()> {
    match descriptor {
        Descriptor::Primitive(def) => encode_primitive(def, value, buffer),
        Descriptor::Enum(def) => encode_enum(def, value, buffer),
        Descriptor::Struct(def) => encode_struct(def, value, buffer),
        Descriptor::FixedArray { element, len } => {
            let items = value.as_sequence().ok_or(Error::TypeMismatch {
                expected: "sequence",
            })?;
            if items.len() != *len as usize {
                return Err(Error::TypeMismatch {
                    expected: "sequence of the declared length",
                });
            }
            for item in items {
                encode_descriptor(element, item, buffer)?;
            }
            Ok(())
        }
        Descriptor::DynamicArray(element) => {
            let items = value.as_sequence().ok_or(Error::TypeMismatch {
                expected: "sequence",
            })?;
            codec::encode_len(buffer, items.len() as u32);
            for item in items {
                encode_descriptor(element, item, buffer)?;
            }
            Ok(())
        }
        Descriptor::Str => {
            let text = value.as_str().ok_or(Error::TypeMismatch { expected: "string" })?;
            codec::encode_str(text, buffer);
            Ok(())
        }
        Descriptor::Optional(element) => {
            if value.is_null() {
                buffer.push_word(0, 8, Endianness::Little);
                Ok(())
            } else {
                buffer.push_word(1, 8, Endianness::Little);
                encode_descriptor(element, value, buffer)
            }
        }
    }
}

fn decode_primitive(def: &PrimitiveDef, buffer: &mut BitBuffer) -> Result<Value> {
    let scaling = &def.scaling;
    match def.kind() {
        PrimitiveKind::Unsigned => {
            let raw: u64 = codec::decode_int(buffer, def.bits.into(), def.endianness())?;
            Ok(scale_unsigned(scaling, raw))
        }
        PrimitiveKind::Signed => {
            let raw: i64 = codec::decode_int(buffer, def.bits.into(), def.endianness())?;
            Ok(scale_signed(scaling, raw))
        }
        PrimitiveKind::F32 => {
            require_bits(def.bits, 32, "f32")?;
            let raw = codec::decode_f32(buffer, def.endianness())?;
            Ok(Value::Double(scale_float(scaling, raw.into())))
        }
        PrimitiveKind::F64 => {
            require_bits(def.bits, 64, "f64")?;
            let raw = codec::decode_f64(buffer, def.endianness())?;
            Ok(Value::Double(scale_float(scaling, raw)))
        }
        PrimitiveKind::Bool => {
            require_bits(def.bits, 8, "bool")?;
            Ok(Value::Bool(codec::decode_bool(buffer)?))
        }
    }
}

fn encode_primitive(def: &PrimitiveDef, value: &Value, buffer: &mut BitBuffer) -> Result<()> {
    let scaling = &def.scaling;
    match def.kind() {
        PrimitiveKind::Unsigned => {
            let raw = unsigned_raw(scaling, value)?;
            codec::encode_int(raw, buffer, check_int_width(def.bits)?, def.endianness());
            Ok(())
        }
        PrimitiveKind::Signed => {
            let raw = signed_raw(scaling, value)?;
            codec::encode_int(raw, buffer, check_int_width(def.bits)?, def.endianness());
            Ok(())
        }
        PrimitiveKind::F32 => {
            require_bits(def.bits, 32, "f32")?;
            let physical = value.as_f64().ok_or(Error::TypeMismatch { expected: "number" })?;
            codec::encode_f32(scaling.encode_from_f64(physical) as f32, buffer, def.endianness());
            Ok(())
        }
        PrimitiveKind::F64 => {
            require_bits(def.bits, 64, "f64")?;
            let physical = value.as_f64().ok_or(Error::TypeMismatch { expected: "number" })?;
            codec::encode_f64(scaling.encode_from_f64(physical), buffer, def.endianness());
            Ok(())
        }
        PrimitiveKind::Bool => {
            require_bits(def.bits, 8, "bool")?;
            let flag = value.as_bool().ok_or(Error::TypeMismatch { expected: "boolean" })?;
            codec::encode_bool(flag, buffer);
            Ok(())
        }
    }
}

fn decode_enum(def: &EnumDef, buffer: &mut BitBuffer) -> Result<Value> {
    let tag = buffer.get_word(check_int_width(def.bits)?, false, Endianness::Little)?;
    match def.name_of(tag) {
        Some(name) => Ok(Value::Text(name.to_owned())),
        None => Err(Error::UnknownEnumTag {
            enumeration: def.name.clone(),
            tag,
        }),
    }
}

fn encode_enum(def: &EnumDef, value: &Value, buffer: &mut BitBuffer) -> Result<()> {
    let name = value.as_str().ok_or(Error::TypeMismatch {
        expected: "enum variant name",
    })?;
    let tag = def.tag_of(name).ok_or_else(|| Error::UnknownEnumName {
        enumeration: def.name.clone(),
        name: name.to_owned(),
    })?;
    buffer.push_word(tag, check_int_width(def.bits)?, Endianness::Little);
    Ok(())
}

fn scale_unsigned(scaling: &Scaling, raw: u64) -> Value {
    if scaling.is_identity() {
        Value::Unsigned(raw)
    } else if scaling.scale == 1.0 {
        Value::Unsigned(raw.wrapping_add(scaling.integer_offset() as u64))
    } else {
        Value::Double(scaling.decode_to_f64(raw as f64))
    }
}

fn scale_signed(scaling: &Scaling, raw: i64) -> Value {
    if scaling.is_identity() {
        Value::Signed(raw)
    } else if scaling.scale == 1.0 {
        Value::Signed(raw.wrapping_add(scaling.integer_offset()))
    } else {
        Value::Double(scaling.decode_to_f64(raw as f64))
    }
}

fn scale_float(scaling: &Scaling, raw: f64) -> f64 {
    if scaling.is_identity() {
        raw
    } else {
        scaling.decode_to_f64(raw)
    }
}

fn unsigned_raw(scaling: &Scaling, value: &Value) -> Result<u64> {
    if scaling.is_identity() {
        value.as_u64().ok_or(Error::TypeMismatch {
            expected: "unsigned integer",
        })
    } else if scaling.scale == 1.0 {
        let physical = value.as_u64().ok_or(Error::TypeMismatch {
            expected: "unsigned integer",
        })?;
        Ok(physical.wrapping_sub(scaling.integer_offset() as u64))
    } else {
        let physical = value.as_f64().ok_or(Error::TypeMismatch { expected: "number" })?;
        Ok(float_to_raw(scaling.encode_from_f64(physical)))
    }
}

fn signed_raw(scaling: &Scaling, value: &Value) -> Result<i64> {
    if scaling.is_identity() {
        value.as_i64().ok_or(Error::TypeMismatch {
            expected: "signed integer",
        })
    } else if scaling.scale == 1.0 {
        let physical = value.as_i64().ok_or(Error::TypeMismatch {
            expected: "signed integer",
        })?;
        Ok(physical.wrapping_sub(scaling.integer_offset()))
    } else {
        let physical = value.as_f64().ok_or(Error::TypeMismatch { expected: "number" })?;
        Ok(scaling.encode_from_f64(physical) as i64)
    }
}

/// Out-of-range raw values are truncated to the target's low bits, never
/// rejected.
fn float_to_raw(raw: f64) -> u64 {
    if raw < 0.0 {
        raw as i64 as u64
    } else {
        raw as u64
    }
}

fn check_int_width(bits: u8) -> Result<u32> {
    if bits == 0 || bits > 64 {
        return Err(Error::WidthMismatch {
            kind: "integer",
            bits,
        });
    }
    Ok(bits.into())
}

fn require_bits(bits: u8, expected: u8, kind: &'static str) -> Result<()> {
    if bits != expected {
        return Err(Error::WidthMismatch { kind, bits });
    }
    Ok(())
}
