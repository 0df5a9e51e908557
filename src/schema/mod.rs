//! Contains routines for parsing and validating an Avro schema.
//! Schemas in avro are written as JSON and can be provided as .avsc files
//! or as JSON strings.

pub mod common;
pub mod parser;
#[cfg(test)]
mod tests;

pub(crate) use parser::Registry;

use crate::error::ResolveErr;
use crate::error::ResolveResult;
use common::{Field, Name};
use indexmap::IndexMap;
use serde_json::{self, Value as JsonValue};
use std::fmt::Debug;
use std::fs::OpenOptions;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Variant {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    Str,
    Record {
        name: Name,
        fields: IndexMap<String, Field>,
    },
    Fixed {
        name: Name,
        size: usize,
    },
    Enum {
        name: Name,
        symbols: Vec<String>,
    },
    Map {
        values: Box<Variant>,
    },
    Array {
        items: Box<Variant>,
    },
    Union {
        variants: Vec<Variant>,
    },
    Named(String),
}

/// Represents a parsed avro schema, either the writer's schema a binary
/// payload was produced under or the reader's schema a consumer decodes into.
#[derive(Debug)]
pub struct Schema {
    // Schema context that has a lookup table to resolve named schema references
    pub(crate) cxt: Registry,
    // typed and stripped version of schema used internally.
    pub(crate) variant: Variant,
}

impl std::str::FromStr for Schema {
    type Err = ResolveErr;
    /// Parse an avro schema from a JSON string.
    /// One can use Rust's raw string syntax (r##""##) to pass schema.
    fn from_str(schema: &str) -> Result<Self, Self::Err> {
        let schema_json =
            serde_json::from_str(schema).map_err(|e| ResolveErr::SchemaParseErr(e.into()))?;
        Schema::parse_imp(schema_json)
    }
}

impl Schema {
    /// Parses an avro schema from a JSON schema in a file.
    /// Alternatively, one can use the [`FromStr`](https://doc.rust-lang.org/std/str/trait.FromStr.html)
    /// impl to create the Schema from a JSON string:
    /// ```
    /// use std::str::FromStr;
    /// use avresolve::Schema;
    ///
    /// let schema = Schema::from_str(r##""null""##).unwrap();
    /// ```
    pub fn from_path<P: AsRef<Path> + Debug>(path: P) -> ResolveResult<Self> {
        let schema_file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(ResolveErr::SchemaParseErr)?;
        let value = serde_json::from_reader(schema_file)
            .map_err(|e| ResolveErr::SchemaParseErr(e.into()))?;
        Schema::parse_imp(value)
    }

    fn parse_imp(schema_json: JsonValue) -> ResolveResult<Self> {
        let mut parser = Registry::new();
        let variant = parser.parse_schema(&schema_json, None)?;
        Ok(Schema {
            cxt: parser,
            variant,
        })
    }

    pub(crate) fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Returns true if binary data written under `self` can be resolved into
    /// a value of the `reader` schema, per Avro's schema resolution rules.
    pub fn matches(&self, reader: &Schema) -> bool {
        schema_match(&self.variant, &reader.variant, &self.cxt, &reader.cxt)
    }
}

// The compatibility predicate between a writer and a reader schema node.
// Numeric widenings and the bytes/string coercion are accepted both per Avro's
// promotion table; named types are compared by fullname (fixed also by size);
// arrays and maps recurse. Any pairing involving a union is answered
// affirmatively here, the union resolver re-checks per branch.
pub(crate) fn schema_match(w: &Variant, r: &Variant, w_cxt: &Registry, r_cxt: &Registry) -> bool {
    let w = w_cxt.resolve(w);
    let r = r_cxt.resolve(r);

    match (w, r) {
        (Variant::Union { .. }, _) | (_, Variant::Union { .. }) => true,
        (Variant::Null, Variant::Null)
        | (Variant::Boolean, Variant::Boolean)
        | (Variant::Int, Variant::Int)
        | (Variant::Int, Variant::Long)
        | (Variant::Int, Variant::Float)
        | (Variant::Int, Variant::Double)
        | (Variant::Long, Variant::Long)
        | (Variant::Long, Variant::Float)
        | (Variant::Long, Variant::Double)
        | (Variant::Float, Variant::Float)
        | (Variant::Float, Variant::Double)
        | (Variant::Double, Variant::Double)
        | (Variant::Bytes, Variant::Bytes)
        | (Variant::Bytes, Variant::Str)
        | (Variant::Str, Variant::Str)
        | (Variant::Str, Variant::Bytes) => true,
        (Variant::Enum { name: w_name, .. }, Variant::Enum { name: r_name, .. }) => {
            w_name == r_name
        }
        (
            Variant::Fixed {
                name: w_name,
                size: w_size,
            },
            Variant::Fixed {
                name: r_name,
                size: r_size,
            },
        ) => w_name == r_name && w_size == r_size,
        (Variant::Array { items: w_items }, Variant::Array { items: r_items }) => {
            schema_match(w_items, r_items, w_cxt, r_cxt)
        }
        (Variant::Map { values: w_values }, Variant::Map { values: r_values }) => {
            schema_match(w_values, r_values, w_cxt, r_cxt)
        }
        (Variant::Record { name: w_name, .. }, Variant::Record { name: r_name, .. }) => {
            w_name == r_name
        }
        _ => false,
    }
}

impl Variant {
    fn get_named_mut(&mut self) -> Option<&mut Name> {
        match self {
            Variant::Record { name, .. }
            | Variant::Fixed { name, .. }
            | Variant::Enum { name, .. } => Some(name),
            _ => None,
        }
    }
}
