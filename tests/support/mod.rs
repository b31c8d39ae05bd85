//! Message set for a small powertrain ECU, written out the way the code
//! generator emits it: one struct per message with hand-expanded codec and
//! value-tree conversions, plus the matching descriptor registry so the
//! interpreted face can be driven against the same wire layout.

use std::collections::BTreeMap;

use fcp_sdk::buffer::{BitBuffer, Endianness};
use fcp_sdk::builders::SchemaBuilder;
use fcp_sdk::codec::{self, Scaling};
use fcp_sdk::dynamic::DynamicSchema;
use fcp_sdk::result::{Error, Result};
use fcp_sdk::static_schema::{Message, StaticSchema};
use fcp_sdk::types::{Descriptor, EnumDef, StructDef};
use fcp_sdk::value::Value;
use fcp_sdk::MessageId;

pub fn id(raw: u16) -> MessageId {
    MessageId::try_from(raw).unwrap()
}

fn record_of(value: &Value) -> Result<&BTreeMap<String, Value>> {
    value.as_record().ok_or(Error::TypeMismatch {
        expected: "mapping of field names",
    })
}

fn field<'a>(record: &'a BTreeMap<String, Value>, name: &str) -> Result<&'a Value> {
    record
        .get(name)
        .ok_or_else(|| Error::MissingField(name.to_owned()))
}

fn unsigned_field(record: &BTreeMap<String, Value>, name: &str) -> Result<u64> {
    field(record, name)?.as_u64().ok_or(Error::TypeMismatch {
        expected: "unsigned integer",
    })
}

fn signed_field(record: &BTreeMap<String, Value>, name: &str) -> Result<i64> {
    field(record, name)?.as_i64().ok_or(Error::TypeMismatch {
        expected: "signed integer",
    })
}

fn float_field(record: &BTreeMap<String, Value>, name: &str) -> Result<f64> {
    field(record, name)?
        .as_f64()
        .ok_or(Error::TypeMismatch { expected: "number" })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    Off = 0,
    Idle = 1,
    Active = 2,
}

impl DriveMode {
    pub const BITS: u32 = 2;

    pub fn from_tag(tag: u64) -> Result<Self> {
        match tag {
            0 => Ok(DriveMode::Off),
            1 => Ok(DriveMode::Idle),
            2 => Ok(DriveMode::Active),
            tag => Err(Error::UnknownEnumTag {
                enumeration: "DriveMode".to_owned(),
                tag,
            }),
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "Off" => Ok(DriveMode::Off),
            "Idle" => Ok(DriveMode::Idle),
            "Active" => Ok(DriveMode::Active),
            name => Err(Error::UnknownEnumName {
                enumeration: "DriveMode".to_owned(),
                name: name.to_owned(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DriveMode::Off => "Off",
            DriveMode::Idle => "Idle",
            DriveMode::Active => "Active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryState {
    pub soc: u8,
    pub health: u8,
}

impl Message for BatteryState {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_int(self.soc, buffer, 8, Endianness::Little);
        codec::encode_int(self.health, buffer, 8, Endianness::Little);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            soc: codec::decode_int(buffer, 8, Endianness::Little)?,
            health: codec::decode_int(buffer, 8, Endianness::Little)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([
            ("soc", Value::Unsigned(self.soc.into())),
            ("health", Value::Unsigned(self.health.into())),
        ])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        Ok(Self {
            soc: unsigned_field(record, "soc")? as u8,
            health: unsigned_field(record, "health")? as u8,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorCalibration {
    pub gain0: u8,
    pub bias0: i8,
    pub gain1: u16,
    pub bias1: i16,
    pub gain2: u32,
    pub bias2: i32,
    pub gain3: u32,
    pub bias3: i32,
    pub gain4: u64,
    pub bias4: i64,
}

impl Message for SensorCalibration {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_int(self.gain0, buffer, 8, Endianness::Little);
        codec::encode_int(self.bias0, buffer, 8, Endianness::Little);
        codec::encode_int(self.gain1, buffer, 16, Endianness::Little);
        codec::encode_int(self.bias1, buffer, 16, Endianness::Little);
        codec::encode_int(self.gain2, buffer, 24, Endianness::Little);
        codec::encode_int(self.bias2, buffer, 24, Endianness::Little);
        codec::encode_int(self.gain3, buffer, 32, Endianness::Little);
        codec::encode_int(self.bias3, buffer, 32, Endianness::Little);
        codec::encode_int(self.gain4, buffer, 64, Endianness::Little);
        codec::encode_int(self.bias4, buffer, 64, Endianness::Little);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            gain0: codec::decode_int(buffer, 8, Endianness::Little)?,
            bias0: codec::decode_int(buffer, 8, Endianness::Little)?,
            gain1: codec::decode_int(buffer, 16, Endianness::Little)?,
            bias1: codec::decode_int(buffer, 16, Endianness::Little)?,
            gain2: codec::decode_int(buffer, 24, Endianness::Little)?,
            bias2: codec::decode_int(buffer, 24, Endianness::Little)?,
            gain3: codec::decode_int(buffer, 32, Endianness::Little)?,
            bias3: codec::decode_int(buffer, 32, Endianness::Little)?,
            gain4: codec::decode_int(buffer, 64, Endianness::Little)?,
            bias4: codec::decode_int(buffer, 64, Endianness::Little)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([
            ("gain0", Value::Unsigned(self.gain0.into())),
            ("bias0", Value::Signed(self.bias0.into())),
            ("gain1", Value::Unsigned(self.gain1.into())),
            ("bias1", Value::Signed(self.bias1.into())),
            ("gain2", Value::Unsigned(self.gain2.into())),
            ("bias2", Value::Signed(self.bias2.into())),
            ("gain3", Value::Unsigned(self.gain3.into())),
            ("bias3", Value::Signed(self.bias3.into())),
            ("gain4", Value::Unsigned(self.gain4)),
            ("bias4", Value::Signed(self.bias4)),
        ])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        Ok(Self {
            gain0: unsigned_field(record, "gain0")? as u8,
            bias0: signed_field(record, "bias0")? as i8,
            gain1: unsigned_field(record, "gain1")? as u16,
            bias1: signed_field(record, "bias1")? as i16,
            gain2: unsigned_field(record, "gain2")? as u32,
            bias2: signed_field(record, "bias2")? as i32,
            gain3: unsigned_field(record, "gain3")? as u32,
            bias3: signed_field(record, "bias3")? as i32,
            gain4: unsigned_field(record, "gain4")?,
            bias4: signed_field(record, "bias4")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub tag: String,
}

impl Message for DeviceInfo {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_str(&self.tag, buffer);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            tag: codec::decode_str(buffer)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([("tag", Value::Text(self.tag.clone()))])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        let tag = field(record, "tag")?
            .as_str()
            .ok_or(Error::TypeMismatch { expected: "string" })?;
        Ok(Self { tag: tag.to_owned() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdcBurst {
    pub samples: [u8; 4],
    pub seq: u8,
    pub flags: u8,
}

impl Message for AdcBurst {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        for sample in &self.samples {
            codec::encode_int(*sample, buffer, 8, Endianness::Little);
        }
        codec::encode_int(self.seq, buffer, 8, Endianness::Little);
        codec::encode_int(self.flags, buffer, 8, Endianness::Little);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        let mut samples = [0u8; 4];
        for sample in &mut samples {
            *sample = codec::decode_int(buffer, 8, Endianness::Little)?;
        }
        Ok(Self {
            samples,
            seq: codec::decode_int(buffer, 8, Endianness::Little)?,
            flags: codec::decode_int(buffer, 8, Endianness::Little)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([
            (
                "samples",
                Value::sequence(self.samples.iter().map(|&s| Value::Unsigned(s.into()))),
            ),
            ("seq", Value::Unsigned(self.seq.into())),
            ("flags", Value::Unsigned(self.flags.into())),
        ])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        let items = field(record, "samples")?
            .as_sequence()
            .ok_or(Error::TypeMismatch { expected: "sequence" })?;
        if items.len() != 4 {
            return Err(Error::TypeMismatch {
                expected: "sequence of the declared length",
            });
        }
        let mut samples = [0u8; 4];
        for (slot, item) in samples.iter_mut().zip(items) {
            *slot = item.as_u64().ok_or(Error::TypeMismatch {
                expected: "unsigned integer",
            })? as u8;
        }
        Ok(Self {
            samples,
            seq: unsigned_field(record, "seq")? as u8,
            flags: unsigned_field(record, "flags")? as u8,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heartbeat {
    pub fault: Option<u8>,
}

impl Message for Heartbeat {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_optional(self.fault.as_ref(), buffer, |fault, buffer| {
            codec::encode_int(*fault, buffer, 8, Endianness::Little);
            Ok(())
        })
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            fault: codec::decode_optional(buffer, |buffer| {
                codec::decode_int(buffer, 8, Endianness::Little)
            })?,
        })
    }

    fn to_value(&self) -> Value {
        let fault = match self.fault {
            Some(code) => Value::Unsigned(code.into()),
            None => Value::Null,
        };
        Value::record([("fault", fault)])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        let fault = match field(record, "fault")? {
            Value::Null => None,
            value => Some(value.as_u64().ok_or(Error::TypeMismatch {
                expected: "unsigned integer",
            })? as u8),
        };
        Ok(Self { fault })
    }
}

/// Wire counter shared with big-endian devices on the aux bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetCounter {
    pub count: u16,
}

impl Message for NetCounter {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_int(self.count, buffer, 16, Endianness::Big);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            count: codec::decode_int(buffer, 16, Endianness::Big)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([("count", Value::Unsigned(self.count.into()))])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        Ok(Self {
            count: unsigned_field(record, "count")? as u16,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeReport {
    pub history: [DriveMode; 4],
    pub aux: u8,
    pub crc: u8,
}

impl Message for ModeReport {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        for mode in &self.history {
            buffer.push_word(*mode as u64, DriveMode::BITS, Endianness::Little);
        }
        codec::encode_int(self.aux, buffer, 8, Endianness::Little);
        codec::encode_int(self.crc, buffer, 8, Endianness::Little);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        let mut history = [DriveMode::Off; 4];
        for slot in &mut history {
            *slot = DriveMode::from_tag(buffer.get_word(DriveMode::BITS, false, Endianness::Little)?)?;
        }
        Ok(Self {
            history,
            aux: codec::decode_int(buffer, 8, Endianness::Little)?,
            crc: codec::decode_int(buffer, 8, Endianness::Little)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([
            (
                "history",
                Value::sequence(self.history.iter().map(|mode| Value::Text(mode.name().to_owned()))),
            ),
            ("aux", Value::Unsigned(self.aux.into())),
            ("crc", Value::Unsigned(self.crc.into())),
        ])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        let items = field(record, "history")?
            .as_sequence()
            .ok_or(Error::TypeMismatch { expected: "sequence" })?;
        if items.len() != 4 {
            return Err(Error::TypeMismatch {
                expected: "sequence of the declared length",
            });
        }
        let mut history = [DriveMode::Off; 4];
        for (slot, item) in history.iter_mut().zip(items) {
            let name = item.as_str().ok_or(Error::TypeMismatch {
                expected: "enum variant name",
            })?;
            *slot = DriveMode::from_name(name)?;
        }
        Ok(Self {
            history,
            aux: unsigned_field(record, "aux")? as u8,
            crc: unsigned_field(record, "crc")? as u8,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attitude {
    pub roll: f32,
    pub pitch: f64,
}

impl Message for Attitude {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_f32(self.roll, buffer, Endianness::Little);
        codec::encode_f64(self.pitch, buffer, Endianness::Little);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            roll: codec::decode_f32(buffer, Endianness::Little)?,
            pitch: codec::decode_f64(buffer, Endianness::Little)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([
            ("roll", Value::Double(self.roll.into())),
            ("pitch", Value::Double(self.pitch)),
        ])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        Ok(Self {
            roll: float_field(record, "roll")? as f32,
            pitch: float_field(record, "pitch")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorLog {
    pub codes: Vec<u8>,
}

impl Message for ErrorLog {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_len(buffer, self.codes.len() as u32);
        for code in &self.codes {
            codec::encode_int(*code, buffer, 8, Endianness::Little);
        }
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            codes: codec::decode_many(buffer, |buffer| {
                codec::decode_int(buffer, 8, Endianness::Little)
            })?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([(
            "codes",
            Value::sequence(self.codes.iter().map(|&c| Value::Unsigned(c.into()))),
        )])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        let items = field(record, "codes")?
            .as_sequence()
            .ok_or(Error::TypeMismatch { expected: "sequence" })?;
        let codes = items
            .iter()
            .map(|item| {
                item.as_u64().map(|c| c as u8).ok_or(Error::TypeMismatch {
                    expected: "unsigned integer",
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { codes })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackReport {
    pub battery: BatteryState,
}

impl Message for PackReport {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        self.battery.encode(buffer)
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            battery: BatteryState::decode(buffer)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([("battery", self.battery.to_value())])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        Ok(Self {
            battery: BatteryState::from_value(field(record, "battery")?)?,
        })
    }
}

/// Coolant probe: one raw octet at 0.5 degC per count, 40 degC below zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thermo {
    pub temp: f64,
}

impl Thermo {
    const SCALING: Scaling = Scaling {
        scale: 0.5,
        offset: -40.0,
    };
}

impl Message for Thermo {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        let raw = Self::SCALING.encode_from_f64(self.temp) as u8;
        codec::encode_int(raw, buffer, 8, Endianness::Little);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        let raw: u8 = codec::decode_int(buffer, 8, Endianness::Little)?;
        Ok(Self {
            temp: Self::SCALING.decode_to_f64(raw.into()),
        })
    }

    fn to_value(&self) -> Value {
        Value::record([("temp", Value::Double(self.temp))])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        Ok(Self {
            temp: float_field(record, "temp")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub armed: bool,
    pub code: u8,
}

impl Message for Status {
    fn encode(&self, buffer: &mut BitBuffer) -> Result<()> {
        codec::encode_bool(self.armed, buffer);
        codec::encode_int(self.code, buffer, 8, Endianness::Little);
        Ok(())
    }

    fn decode(buffer: &mut BitBuffer) -> Result<Self> {
        Ok(Self {
            armed: codec::decode_bool(buffer)?,
            code: codec::decode_int(buffer, 8, Endianness::Little)?,
        })
    }

    fn to_value(&self) -> Value {
        Value::record([
            ("armed", Value::Bool(self.armed)),
            ("code", Value::Unsigned(self.code.into())),
        ])
    }

    fn from_value(value: &Value) -> Result<Self> {
        let record = record_of(value)?;
        Ok(Self {
            armed: field(record, "armed")?
                .as_bool()
                .ok_or(Error::TypeMismatch { expected: "boolean" })?,
            code: unsigned_field(record, "code")? as u8,
        })
    }
}

pub fn static_schema() -> StaticSchema {
    StaticSchema::new()
        .with::<BatteryState>("BatteryState", id(10), "pwt")
        .with::<SensorCalibration>("SensorCalibration", id(11), "pwt")
        .with::<DeviceInfo>("DeviceInfo", id(12), "pwt")
        .with::<AdcBurst>("AdcBurst", id(13), "pwt")
        .with::<Heartbeat>("Heartbeat", id(14), "pwt")
        .with::<NetCounter>("NetCounter", id(15), "aux")
        .with::<ModeReport>("ModeReport", id(16), "pwt")
        .with::<Attitude>("Attitude", id(17), "aux")
        .with::<ErrorLog>("ErrorLog", id(18), "aux")
        .with::<PackReport>("PackReport", id(19), "pwt")
        .with::<Thermo>("Thermo", id(20), "aux")
        .with::<Status>("Status", id(21), "aux")
}

fn drive_mode() -> EnumDef {
    EnumDef::new("DriveMode", 2)
        .variant("Off", 0)
        .variant("Idle", 1)
        .variant("Active", 2)
}

fn battery_state() -> StructDef {
    StructDef::new("BatteryState")
        .field("soc", Descriptor::unsigned(8))
        .field("health", Descriptor::unsigned(8))
}

/// Mirror of the generated message set as runtime descriptors.
pub fn schema_blob() -> Vec<u8> {
    let mut builder = SchemaBuilder::default();
    builder
        .add_enum(drive_mode())
        .add_struct(battery_state())
        .add_struct(
            StructDef::new("SensorCalibration")
                .field("gain0", Descriptor::unsigned(8))
                .field("bias0", Descriptor::signed(8))
                .field("gain1", Descriptor::unsigned(16))
                .field("bias1", Descriptor::signed(16))
                .field("gain2", Descriptor::unsigned(24))
                .field("bias2", Descriptor::signed(24))
                .field("gain3", Descriptor::unsigned(32))
                .field("bias3", Descriptor::signed(32))
                .field("gain4", Descriptor::unsigned(64))
                .field("bias4", Descriptor::signed(64)),
        )
        .add_struct(StructDef::new("DeviceInfo").field("tag", Descriptor::string()))
        .add_struct(
            StructDef::new("AdcBurst")
                .field("samples", Descriptor::fixed_array(Descriptor::unsigned(8), 4))
                .field("seq", Descriptor::unsigned(8))
                .field("flags", Descriptor::unsigned(8)),
        )
        .add_struct(
            StructDef::new("Heartbeat").field("fault", Descriptor::optional(Descriptor::unsigned(8))),
        )
        .add_struct(
            StructDef::new("NetCounter")
                .field("count", Descriptor::unsigned(16).with_endianness(Endianness::Big)),
        )
        .add_struct(
            StructDef::new("ModeReport")
                .field(
                    "history",
                    Descriptor::fixed_array(Descriptor::Enum(drive_mode()), 4),
                )
                .field("aux", Descriptor::unsigned(8))
                .field("crc", Descriptor::unsigned(8)),
        )
        .add_struct(
            StructDef::new("Attitude")
                .field("roll", Descriptor::float())
                .field("pitch", Descriptor::double()),
        )
        .add_struct(
            StructDef::new("ErrorLog")
                .field("codes", Descriptor::dynamic_array(Descriptor::unsigned(8))),
        )
        .add_struct(
            StructDef::new("PackReport").field("battery", Descriptor::Struct(battery_state())),
        )
        .add_struct(
            StructDef::new("Thermo")
                .field("temp", Descriptor::unsigned(8).with_scaling(0.5, -40.0)),
        )
        .add_struct(
            StructDef::new("Status")
                .field("armed", Descriptor::boolean())
                .field("code", Descriptor::unsigned(8)),
        )
        .bind_can_message("BatteryState", id(10), "pwt")
        .bind_can_message("SensorCalibration", id(11), "pwt")
        .bind_can_message("DeviceInfo", id(12), "pwt")
        .bind_can_message("AdcBurst", id(13), "pwt")
        .bind_can_message("Heartbeat", id(14), "pwt")
        .bind_can_message("NetCounter", id(15), "aux")
        .bind_can_message("ModeReport", id(16), "pwt")
        .bind_can_message("Attitude", id(17), "aux")
        .bind_can_message("ErrorLog", id(18), "aux")
        .bind_can_message("PackReport", id(19), "pwt")
        .bind_can_message("Thermo", id(20), "aux")
        .bind_can_message("Status", id(21), "aux");

    let mut blob = Vec::new();
    builder.commit(&mut blob).unwrap();
    blob
}

pub fn dynamic_schema() -> DynamicSchema {
    DynamicSchema::from_bytes(&schema_blob()).unwrap()
}
