#![allow(missing_docs)]

use std::io::{Error, ErrorKind};

#[inline(always)]
pub(crate) fn io_err(msg: &str) -> Error {
    Error::new(ErrorKind::InvalidData, msg)
}

pub type ResolveResult<T> = Result<T, ResolveErr>;

/// Errors returned from avresolve
#[derive(thiserror::Error, Debug)]
pub enum ResolveErr {
    // Resolution errors
    #[error("Cannot read {context}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Writer schema does not resolve to reader schema")]
    IncompatibleSchema,
    #[error("Invalid union discriminant value: {0}")]
    InvalidDiscriminant(i64),
    #[error("No compatible branch in reader's union schema")]
    NoCompatibleBranch,
    #[error("Reader field `{0}` is absent from the writer schema and carries no default")]
    MissingDefaultForReaderField(String),
    #[error("Default value does not match the field's schema")]
    InvalidDefault,
    #[error("Refusing to allocate {0} bytes declared on the wire")]
    AllocationFailure(i64),
    #[error("Unknown schema type")]
    UnknownType,

    // Value errors
    #[error("Operation does not apply to the value's type")]
    UnexpectedType,
    #[error("Mismatch in fixed value length: found {found}, expected {expected}")]
    FixedValueLenMismatch { found: usize, expected: usize },

    // Schema parse errors
    #[error("Failed to parse avro schema")]
    SchemaParseErr(#[source] std::io::Error),
    #[error("Unknown schema, expecting a required `type` field in schema")]
    SchemaParseFailed,
    #[error("Expected the avro schema to be as one of json string, object or an array")]
    UnknownSchema,
    #[error("Primitive schema must be a string")]
    InvalidPrimitiveSchema,
    #[error("Record schema does not a have a required field named `name`")]
    RecordNameNotFound,
    #[error("Record schema does not a have a required field named `type`")]
    RecordTypeNotFound,
    #[error("Expected record field to be a json array")]
    ExpectedFieldsJsonArray,
    #[error("Record's field json schema must be an object")]
    InvalidRecordFieldType,
    #[error("Could not parse name from json value")]
    NameParseFailed,
    #[error("Duplicate definition of named schema")]
    DuplicateSchema,
    #[error("Unions cannot have multiple schemas of same type or immediate unions")]
    DuplicateSchemaInUnion,
    #[error("Failed to parse symbol from enum's symbols field")]
    EnumSymbolParseErr,
    #[error("Enum schema must contain required `symbols` field")]
    EnumSymbolsMissing,
    #[error("Enum schema parsing failed, found: {0}")]
    EnumParseErr(String),
    #[error("Fixed schema `size` field must be a number")]
    FixedSizeNotNumber,
    #[error("Fixed schema `size` field missing")]
    FixedSizeNotFound,
    #[error("namespaces must either be empty or follow the grammer <name>[(<dot><name>)*")]
    InvalidNamespace,
    #[error("Field name must be [A-Za-z_] and subsequently contain only [A-Za-z0-9_]")]
    InvalidName,
}

impl ResolveErr {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        ResolveErr::Io { context, source }
    }
}
