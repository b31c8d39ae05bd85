use std::io;

use crate::result::Result;
use crate::schema::SchemaRegistry;
use crate::types::{EnumDef, ImplEntry, StructDef};
use crate::MessageId;

/// Accumulates type, enumeration and protocol-binding definitions and
/// produces either an in-memory registry or the serialized schema blob the
/// dynamic codec loads.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: Vec<StructDef>,
    enums: Vec<EnumDef>,
    impls: Vec<ImplEntry>,
}

impl SchemaBuilder {
    pub fn add_struct(&mut self, def: StructDef) -> &mut Self {
        self.types.push(def);
        self
    }

    pub fn add_enum(&mut self, def: EnumDef) -> &mut Self {
        self.enums.push(def);
        self
    }

    /// Binds a named type to the CAN protocol under `(id, bus)`.
    pub fn bind_can_message(&mut self, name: &str, id: MessageId, bus: &str) -> &mut Self {
        self.impls.push(ImplEntry::can(name, id, bus));
        self
    }

    /// Validates the accumulated definitions and freezes them into a
    /// registry.
    pub fn build(self) -> Result<SchemaRegistry> {
        SchemaRegistry::new(self.types, self.enums, self.impls)
    }

    /// Serializes the registry as a schema blob to `sink`.
    pub fn commit<W>(self, sink: W) -> Result<()>
    where
        W: io::Write,
    {
        self.build()?.write(sink)
    }
}
