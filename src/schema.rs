use std::collections::BTreeSet;
use std::io;

use declio::{magic_bytes, Decode, Encode};
use derive_getters::Getters;

use crate::result::{Error, Result};
use crate::types::{EnumDef, ImplEntry, StructDef};
use crate::{codecs, constants};

magic_bytes! {
    #[derive(Debug)]
    pub(crate) SchemaSignature(b"FCPS\x01");
}

/// Immutable collection of named type descriptors, enumerations and
/// protocol bindings. Built once (from a blob or a builder) and shared
/// read-only afterwards; nothing here mutates after construction.
#[derive(Debug, Default, Getters)]
pub struct SchemaRegistry {
    types: Vec<StructDef>,
    enums: Vec<EnumDef>,
    impls: Vec<ImplEntry>,
}

impl SchemaRegistry {
    pub fn new(types: Vec<StructDef>, enums: Vec<EnumDef>, impls: Vec<ImplEntry>) -> Result<Self> {
        let registry = Self { types, enums, impls };
        registry.validate()?;
        Ok(registry)
    }

    pub fn read<R>(mut reader: R) -> Result<Self>
    where
        R: io::Read,
    {
        SchemaSignature::decode((), &mut reader)
            .map_err(|_| Error::SchemaLoadFailed("bad signature"))?;
        let types = codecs::counted::decode((), &mut reader)
            .map_err(|_| Error::SchemaLoadFailed("malformed type table"))?;
        let enums = codecs::counted::decode((), &mut reader)
            .map_err(|_| Error::SchemaLoadFailed("malformed enum table"))?;
        let impls = codecs::counted::decode((), &mut reader)
            .map_err(|_| Error::SchemaLoadFailed("malformed impl table"))?;
        Self::new(types, enums, impls)
    }

    pub fn write<W>(&self, mut writer: W) -> Result<()>
    where
        W: io::Write,
    {
        SchemaSignature.encode((), &mut writer)?;
        codecs::counted::encode(&self.types, (), &mut writer)?;
        codecs::counted::encode(&self.enums, (), &mut writer)?;
        codecs::counted::encode(&self.impls, (), &mut writer)?;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&StructDef> {
        self.types.iter().find(|def| def.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|def| def.name == name)
    }

    pub fn impls_for<'a>(&'a self, protocol: &'a str) -> impl Iterator<Item = &'a ImplEntry> {
        self.impls.iter().filter(move |entry| entry.protocol == protocol)
    }

    /// Reverse lookup of an inbound frame's `(id, bus)` pair.
    pub fn message_name_for(&self, id: u16, bus: &str) -> Option<&str> {
        self.impls_for(constants::CAN_PROTOCOL)
            .find(|entry| entry.can_id() == Some(id) && entry.can_bus() == Some(bus))
            .map(|entry| entry.name.as_str())
    }

    pub fn can_impl(&self, name: &str) -> Option<&ImplEntry> {
        self.impls_for(constants::CAN_PROTOCOL)
            .find(|entry| entry.name == name)
    }

    fn validate(&self) -> Result<()> {
        let mut names = BTreeSet::new();
        for def in &self.types {
            if !names.insert(def.name.as_str()) {
                return Err(Error::SchemaLoadFailed("duplicate type name"));
            }
        }
        let mut enum_names = BTreeSet::new();
        for def in &self.enums {
            if !enum_names.insert(def.name.as_str()) {
                return Err(Error::SchemaLoadFailed("duplicate enum name"));
            }
        }

        let mut bindings = BTreeSet::new();
        for entry in self.impls_for(constants::CAN_PROTOCOL) {
            let id = entry
                .can_id()
                .ok_or(Error::SchemaLoadFailed("can impl without numeric id"))?;
            if id > constants::MAX_MESSAGE_ID {
                return Err(Error::SchemaLoadFailed("can id exceeds 11 bits"));
            }
            let bus = entry
                .can_bus()
                .ok_or(Error::SchemaLoadFailed("can impl without bus"))?;
            if bus.len() > 4 {
                return Err(Error::SchemaLoadFailed("bus name longer than 4 chars"));
            }
            if !bindings.insert((id, bus)) {
                return Err(Error::SchemaLoadFailed("duplicate (id, bus) binding"));
            }
        }
        Ok(())
    }
}
