//! The generic in-memory value a resolution populates.
//!
//! A [`Value`] is a tree shaped by the schema it was built from. Freshly
//! constructed values are empty: scalars hold their zero value, buffers and
//! containers are empty, records carry one empty child per field and unions
//! have no branch selected. Union branches are built lazily on
//! [`Value::set_branch`], which is what keeps values of recursive schemas
//! finite.

use crate::error::{ResolveErr, ResolveResult};
use crate::schema::{Registry, Schema, Variant};
use indexmap::IndexMap;

/// An avro value tree borrowing the [`Schema`](crate::Schema) that shapes it.
#[derive(Debug, Clone)]
pub struct Value<'s> {
    schema: &'s Variant,
    cxt: &'s Registry,
    datum: Datum<'s>,
}

// The type-tagged payload of a value. The tag always agrees with the schema
// the enclosing Value was constructed from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Datum<'s> {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Str(String),
    Fixed(Vec<u8>),
    Enum(usize),
    Array(Vec<Value<'s>>),
    Map(IndexMap<String, Value<'s>>),
    Record(Vec<Value<'s>>),
    Union(Option<(usize, Box<Value<'s>>)>),
}

impl<'s> Datum<'s> {
    fn empty(variant: &'s Variant, cxt: &'s Registry) -> Datum<'s> {
        match variant {
            Variant::Null => Datum::Null,
            Variant::Boolean => Datum::Boolean(false),
            Variant::Int => Datum::Int(0),
            Variant::Long => Datum::Long(0),
            Variant::Float => Datum::Float(0.0),
            Variant::Double => Datum::Double(0.0),
            Variant::Bytes => Datum::Bytes(Vec::new()),
            Variant::Str => Datum::Str(String::new()),
            Variant::Fixed { .. } => Datum::Fixed(Vec::new()),
            Variant::Enum { .. } => Datum::Enum(0),
            Variant::Array { .. } => Datum::Array(Vec::new()),
            Variant::Map { .. } => Datum::Map(IndexMap::new()),
            Variant::Record { fields, .. } => Datum::Record(
                fields
                    .values()
                    .map(|f| Value::from_variant(&f.ty, cxt))
                    .collect(),
            ),
            Variant::Union { .. } => Datum::Union(None),
            // dangling named reference, inert
            Variant::Named(_) => Datum::Null,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.datum == other.datum
    }
}

impl<'s> Value<'s> {
    /// Creates an empty value shaped by the given schema.
    pub fn new(schema: &'s Schema) -> Self {
        Value::from_variant(&schema.variant, &schema.cxt)
    }

    pub(crate) fn from_variant(variant: &'s Variant, cxt: &'s Registry) -> Self {
        let variant = cxt.resolve(variant);
        Value {
            schema: variant,
            cxt,
            datum: Datum::empty(variant, cxt),
        }
    }

    pub(crate) fn schema(&self) -> &'s Variant {
        self.schema
    }

    pub(crate) fn registry(&self) -> &'s Registry {
        self.cxt
    }

    /// Structurally clears the value: containers lose their children, union
    /// branch selection is forgotten and scalars return to their zero value.
    pub fn reset(&mut self) {
        self.datum = Datum::empty(self.schema, self.cxt);
    }

    /// Number of children: array items, map entries or record fields.
    /// Zero for scalar values.
    pub fn size(&self) -> usize {
        match &self.datum {
            Datum::Array(items) => items.len(),
            Datum::Map(entries) => entries.len(),
            Datum::Record(fields) => fields.len(),
            _ => 0,
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Setters
    ///////////////////////////////////////////////////////////////////////////

    /// Sets a null value. The value must be of the null type.
    pub fn set_null(&mut self) -> ResolveResult<()> {
        match self.datum {
            Datum::Null => Ok(()),
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Sets a boolean value.
    pub fn set_boolean(&mut self, value: bool) -> ResolveResult<()> {
        match &mut self.datum {
            Datum::Boolean(b) => {
                *b = value;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Sets an int value.
    pub fn set_int(&mut self, value: i32) -> ResolveResult<()> {
        match &mut self.datum {
            Datum::Int(i) => {
                *i = value;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Sets a long value.
    pub fn set_long(&mut self, value: i64) -> ResolveResult<()> {
        match &mut self.datum {
            Datum::Long(l) => {
                *l = value;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Sets a float value.
    pub fn set_float(&mut self, value: f32) -> ResolveResult<()> {
        match &mut self.datum {
            Datum::Float(f) => {
                *f = value;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Sets a double value.
    pub fn set_double(&mut self, value: f64) -> ResolveResult<()> {
        match &mut self.datum {
            Datum::Double(d) => {
                *d = value;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Moves a byte buffer into a bytes value without copying it.
    pub fn give_bytes(&mut self, buf: Vec<u8>) -> ResolveResult<()> {
        match &mut self.datum {
            Datum::Bytes(b) => {
                *b = buf;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Moves a string into a string value without copying it.
    pub fn give_string(&mut self, s: String) -> ResolveResult<()> {
        match &mut self.datum {
            Datum::Str(v) => {
                *v = s;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Moves a byte buffer into a fixed value. The buffer length must equal
    /// the schema's fixed size.
    pub fn give_fixed(&mut self, buf: Vec<u8>) -> ResolveResult<()> {
        let schema = self.schema;
        let size = match schema {
            Variant::Fixed { size, .. } => *size,
            _ => return Err(ResolveErr::UnexpectedType),
        };
        if buf.len() != size {
            return Err(ResolveErr::FixedValueLenMismatch {
                found: buf.len(),
                expected: size,
            });
        }
        match &mut self.datum {
            Datum::Fixed(b) => {
                *b = buf;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Selects the enum symbol at `index` in this value's symbol list.
    pub fn set_enum(&mut self, index: usize) -> ResolveResult<()> {
        let schema = self.schema;
        let symbols = match schema {
            Variant::Enum { symbols, .. } => symbols,
            _ => return Err(ResolveErr::UnexpectedType),
        };
        if index >= symbols.len() {
            return Err(ResolveErr::IncompatibleSchema);
        }
        match &mut self.datum {
            Datum::Enum(i) => {
                *i = index;
                Ok(())
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Union operations
    ///////////////////////////////////////////////////////////////////////////

    /// Selects union branch `index`, building its value lazily, and returns
    /// the branch value. Re-selecting the current branch keeps its value.
    pub fn set_branch(&mut self, index: usize) -> ResolveResult<&mut Value<'s>> {
        let schema = self.schema;
        let cxt = self.cxt;
        let variants = match schema {
            Variant::Union { variants } => variants,
            _ => return Err(ResolveErr::UnexpectedType),
        };
        let branch_schema = variants
            .get(index)
            .ok_or_else(|| ResolveErr::InvalidDiscriminant(index as i64))?;
        match &mut self.datum {
            Datum::Union(slot) => {
                let stale = match slot {
                    Some((current, _)) => *current != index,
                    None => true,
                };
                if stale {
                    *slot = Some((index, Box::new(Value::from_variant(branch_schema, cxt))));
                }
                match slot {
                    Some((_, value)) => Ok(value),
                    None => Err(ResolveErr::UnexpectedType),
                }
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Returns the selected branch index and value of a union, or `None` if
    /// no branch has been selected yet (or the value is not a union).
    pub fn current_branch(&self) -> Option<(usize, &Value<'s>)> {
        match &self.datum {
            Datum::Union(Some((index, value))) => Some((*index, value)),
            _ => None,
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Composite operations
    ///////////////////////////////////////////////////////////////////////////

    /// Appends an empty item to an array value and returns it.
    pub fn append(&mut self) -> ResolveResult<&mut Value<'s>> {
        let schema = self.schema;
        let cxt = self.cxt;
        let items = match schema {
            Variant::Array { items } => &**items,
            _ => return Err(ResolveErr::UnexpectedType),
        };
        match &mut self.datum {
            Datum::Array(values) => {
                let index = values.len();
                values.push(Value::from_variant(items, cxt));
                Ok(&mut values[index])
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Adds an empty entry under `key` to a map value and returns it. An
    /// existing entry under the same key is replaced.
    pub fn add(&mut self, key: &str) -> ResolveResult<&mut Value<'s>> {
        let schema = self.schema;
        let cxt = self.cxt;
        let values = match schema {
            Variant::Map { values } => &**values,
            _ => return Err(ResolveErr::UnexpectedType),
        };
        match &mut self.datum {
            Datum::Map(entries) => {
                entries.insert(key.to_string(), Value::from_variant(values, cxt));
                entries.get_mut(key).ok_or(ResolveErr::UnexpectedType)
            }
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Returns the record field value at declaration index `index`.
    pub fn field_at(&self, index: usize) -> Option<&Value<'s>> {
        match &self.datum {
            Datum::Record(fields) => fields.get(index),
            _ => None,
        }
    }

    pub(crate) fn field_at_mut(&mut self, index: usize) -> ResolveResult<&mut Value<'s>> {
        match &mut self.datum {
            Datum::Record(fields) => fields.get_mut(index).ok_or(ResolveErr::UnexpectedType),
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Returns the record field value with the given name.
    pub fn field_by_name(&self, name: &str) -> Option<&Value<'s>> {
        let schema = self.schema;
        let fields = match schema {
            Variant::Record { fields, .. } => fields,
            _ => return None,
        };
        let index = fields.get_index_of(name)?;
        self.field_at(index)
    }

    /// Iterates a record's fields as `(name, value)` pairs in declaration
    /// order. Empty for non-record values.
    pub fn fields<'a>(&'a self) -> impl Iterator<Item = (&'a str, &'a Value<'s>)> {
        let schema = self.schema;
        let names = match schema {
            Variant::Record { fields, .. } => Some(fields.keys()),
            _ => None,
        };
        let children = match &self.datum {
            Datum::Record(values) => Some(values.iter()),
            _ => None,
        };
        names
            .into_iter()
            .flatten()
            .map(|n| n.as_str())
            .zip(children.into_iter().flatten())
    }

    ///////////////////////////////////////////////////////////////////////////
    // Value -> Rust value
    ///////////////////////////////////////////////////////////////////////////

    /// Try to retrieve an avro null
    pub fn as_null(&self) -> ResolveResult<()> {
        if let Datum::Null = self.datum {
            Ok(())
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro boolean
    pub fn as_boolean(&self) -> ResolveResult<bool> {
        if let Datum::Boolean(b) = self.datum {
            Ok(b)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro int
    pub fn as_int(&self) -> ResolveResult<i32> {
        if let Datum::Int(v) = self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro long
    pub fn as_long(&self) -> ResolveResult<i64> {
        if let Datum::Long(v) = self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro float
    pub fn as_float(&self) -> ResolveResult<f32> {
        if let Datum::Float(v) = self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro double
    pub fn as_double(&self) -> ResolveResult<f64> {
        if let Datum::Double(v) = self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro bytes
    pub fn as_bytes(&self) -> ResolveResult<&[u8]> {
        if let Datum::Bytes(v) = &self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro string
    pub fn as_str(&self) -> ResolveResult<&str> {
        if let Datum::Str(v) = &self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro fixed
    pub fn as_fixed(&self) -> ResolveResult<&[u8]> {
        if let Datum::Fixed(v) = &self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve the symbol index of an avro enum
    pub fn enum_index(&self) -> ResolveResult<usize> {
        if let Datum::Enum(v) = self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve the selected symbol of an avro enum
    pub fn enum_symbol(&self) -> ResolveResult<&str> {
        let schema = self.schema;
        let index = self.enum_index()?;
        match schema {
            Variant::Enum { symbols, .. } => symbols
                .get(index)
                .map(|s| s.as_str())
                .ok_or(ResolveErr::UnexpectedType),
            _ => Err(ResolveErr::UnexpectedType),
        }
    }

    /// Try to retrieve an avro array
    pub fn as_array(&self) -> ResolveResult<&[Value<'s>]> {
        if let Datum::Array(v) = &self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }

    /// Try to retrieve an avro map
    pub fn as_map(&self) -> ResolveResult<&IndexMap<String, Value<'s>>> {
        if let Datum::Map(v) = &self.datum {
            Ok(v)
        } else {
            Err(ResolveErr::UnexpectedType)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Schema;
    use crate::Value;
    use std::str::FromStr;

    #[test]
    fn record_scaffolds_empty_children() {
        let schema = Schema::from_str(
            r##"{
                "type": "record",
                "name": "rec",
                "fields": [
                    {"name": "a", "type": "int"},
                    {"name": "b", "type": "string"},
                    {"name": "c", "type": ["null", "double"]}
                ]
            }"##,
        )
        .unwrap();

        let value = Value::new(&schema);
        assert_eq!(value.size(), 3);
        assert_eq!(value.field_by_name("a").unwrap().as_int().unwrap(), 0);
        assert_eq!(value.field_by_name("b").unwrap().as_str().unwrap(), "");
        // unions start with no branch selected
        assert!(value.field_by_name("c").unwrap().current_branch().is_none());
    }

    #[test]
    fn recursive_schema_builds_finite_value() {
        let schema = Schema::from_str(
            r##"{
                "type": "record",
                "name": "LongList",
                "fields" : [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"]}
                ]
            }"##,
        )
        .unwrap();

        let mut value = Value::new(&schema);
        let next = value.field_at_mut(1).unwrap();
        let tail = next.set_branch(1).unwrap();
        assert_eq!(tail.field_by_name("value").unwrap().as_long().unwrap(), 0);
    }

    #[test]
    fn set_branch_keeps_current_branch_value() {
        let schema = Schema::from_str(r##"["null", "int"]"##).unwrap();
        let mut value = Value::new(&schema);
        value.set_branch(1).unwrap().set_int(42).unwrap();
        // same index: the existing branch value is kept
        assert_eq!(value.set_branch(1).unwrap().as_int().unwrap(), 42);
        // different index: the previous branch value is discarded
        value.set_branch(0).unwrap().set_null().unwrap();
        value.set_branch(1).unwrap();
        assert_eq!(value.current_branch().unwrap().1.as_int().unwrap(), 0);
    }

    #[test]
    fn map_add_last_write_wins() {
        let schema = Schema::from_str(r##"{"type": "map", "values": "int"}"##).unwrap();
        let mut value = Value::new(&schema);
        value.add("k").unwrap().set_int(1).unwrap();
        value.add("k").unwrap().set_int(2).unwrap();
        assert_eq!(value.size(), 1);
        assert_eq!(value.as_map().unwrap()["k"].as_int().unwrap(), 2);
    }

    #[test]
    fn reset_clears_structure() {
        let schema = Schema::from_str(r##"{"type": "array", "items": "int"}"##).unwrap();
        let mut value = Value::new(&schema);
        value.append().unwrap().set_int(7).unwrap();
        assert_eq!(value.size(), 1);
        value.reset();
        assert_eq!(value.size(), 0);
    }

    #[test]
    fn fixed_rejects_wrong_length() {
        let schema = Schema::from_str(r##"{"type": "fixed", "name": "md5", "size": 4}"##).unwrap();
        let mut value = Value::new(&schema);
        assert!(value.give_fixed(vec![1, 2, 3]).is_err());
        assert!(value.give_fixed(vec![1, 2, 3, 4]).is_ok());
        assert_eq!(value.as_fixed().unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn enum_index_validated_against_symbols() {
        let schema =
            Schema::from_str(r##"{"type": "enum", "name": "Foo", "symbols": ["A", "B"]}"##)
                .unwrap();
        let mut value = Value::new(&schema);
        assert!(value.set_enum(2).is_err());
        value.set_enum(1).unwrap();
        assert_eq!(value.enum_symbol().unwrap(), "B");
    }
}
