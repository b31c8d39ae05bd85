use thiserror::Error;

pub type Result<A, E = Error> = std::result::Result<A, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoFailed(#[from] std::io::Error),
    #[error("schema encoding error: {0}")]
    EncodingFailed(#[from] declio::Error),
    #[error("input truncated: needed {needed} bits, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("invalid bit width {bits} for {kind}")]
    WidthMismatch { kind: &'static str, bits: u8 },
    #[error("value does not match descriptor: expected {expected}")]
    TypeMismatch { expected: &'static str },
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("unknown variant name {name} in enum {enumeration}")]
    UnknownEnumName { enumeration: String, name: String },
    #[error("unknown tag {tag} in enum {enumeration}")]
    UnknownEnumTag { enumeration: String, tag: u64 },
    #[error("missing struct field: {0}")]
    MissingField(String),
    #[error("frame payload of {0} bytes exceeds 8")]
    OversizedFrame(usize),
    #[error("malformed schema: {0}")]
    SchemaLoadFailed(&'static str),
}
