//! Avresolve is a schema resolution reader for [Apache Avro](https://avro.apache.org/docs/current/spec.html)
//! binary data.
//!
//! Avro payloads are written under a *writer's schema*; a consumer decodes
//! them into values of a *reader's schema*. When the two differ, Avro's
//! [schema resolution](https://avro.apache.org/docs/current/spec.html#Schema+Resolution)
//! rules reconcile them: numeric and bytes/string promotions, union branch
//! reselection, skipping of writer-only record fields and injection of
//! reader-side field defaults. This crate implements that resolution as a
//! single recursive pass over the writer schema and the byte stream.
//!
//! ## Resolving a value
//!
//!```rust
//! use avresolve::{resolve, Schema, Value};
//! use std::str::FromStr;
//! use anyhow::Error;
//!
//! fn main() -> Result<(), Error> {
//!     // The schema the bytes were produced under
//!     let writer = Schema::from_str(
//!         r##"{"type": "record", "name": "point", "fields": [
//!             {"name": "a", "type": "int"}
//!         ]}"##,
//!     )?;
//!     // The schema we want to decode into: `a` widened to double, plus a
//!     // defaulted field the writer never knew about
//!     let reader = Schema::from_str(
//!         r##"{"type": "record", "name": "point", "fields": [
//!             {"name": "a", "type": "double"},
//!             {"name": "b", "type": "string", "default": "origin"}
//!         ]}"##,
//!     )?;
//!
//!     let mut src = Value::new(&writer);
//!     let mut dst = Value::new(&reader);
//!
//!     // zigzag varint encoding of the int 1
//!     let mut wire: &[u8] = &[0x02];
//!     resolve(&mut wire, &mut src, &mut dst)?;
//!
//!     assert_eq!(dst.field_by_name("a").unwrap().as_double()?, 1.0);
//!     assert_eq!(dst.field_by_name("b").unwrap().as_str()?, "origin");
//!     Ok(())
//! }
//!```

#![deny(missing_docs)]
#![recursion_limit = "1024"]
#![deny(unused_must_use)]
#![deny(rust_2018_idioms)]

pub mod config;
mod decode;
mod error;
mod resolve;
mod schema;
mod value;

pub use error::ResolveErr;
pub use error::ResolveResult;
pub use resolve::resolve;
pub use resolve::resolve_array;
pub use resolve::resolve_map;
pub use resolve::resolve_record;
pub use resolve::resolve_union;
pub use schema::Schema;
pub use value::Value;
