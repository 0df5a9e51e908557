use super::common::{validate_name, Field, Name};
use super::Variant;
use crate::error::io_err;
use crate::error::ResolveErr;
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

// Wraps a { name -> schema } lookup table to aid parsing named references in complex schemas.
// During parsing, the value for each key may get updated as the parser discovers
// more information about the schema.
#[derive(Debug, Clone)]
pub(crate) struct Registry {
    pub(crate) cxt: HashMap<String, Variant>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            cxt: HashMap::new(),
        }
    }

    pub(crate) fn get<'a>(&'a self, name: &str) -> Option<&'a Variant> {
        self.cxt.get(name)
    }

    // Follows named references until a concrete schema is found. A dangling
    // reference resolves to itself; operations on it fail downstream.
    pub(crate) fn resolve<'a>(&'a self, mut variant: &'a Variant) -> &'a Variant {
        while let Variant::Named(name) = variant {
            match self.cxt.get(name) {
                Some(Variant::Named(next)) if next == name => break,
                Some(resolved) => variant = resolved,
                None => break,
            }
        }
        variant
    }

    pub(crate) fn parse_schema(
        &mut self,
        value: &JsonValue,
        enclosing_namespace: Option<&str>,
    ) -> Result<Variant, ResolveErr> {
        match value {
            // Parse a complex schema
            JsonValue::Object(ref schema) => self.parse_object(schema, enclosing_namespace),
            // Parse a primitive schema, could also be a named schema reference
            JsonValue::String(ref schema) => self.parse_primitive(&schema, enclosing_namespace),
            // Parse a union schema
            JsonValue::Array(ref schema) => self.parse_union(schema, enclosing_namespace),
            _ => Err(ResolveErr::UnknownSchema),
        }
    }

    fn parse_union(
        &mut self,
        schema: &[JsonValue],
        enclosing_namespace: Option<&str>,
    ) -> Result<Variant, ResolveErr> {
        let mut union_schema = vec![];
        for s in schema {
            let parsed_schema = self.parse_schema(s, enclosing_namespace)?;
            match parsed_schema {
                Variant::Union { .. } => {
                    return Err(ResolveErr::DuplicateSchemaInUnion);
                }
                _ => {
                    if union_schema.contains(&parsed_schema) {
                        return Err(ResolveErr::DuplicateSchemaInUnion);
                    } else {
                        union_schema.push(parsed_schema);
                    }
                }
            }
        }
        Ok(Variant::Union {
            variants: union_schema,
        })
    }

    fn get_fullname(&self, name: &str, enclosing_namespace: Option<&str>) -> String {
        if let Some(namespace) = enclosing_namespace {
            format!("{}.{}", namespace, name)
        } else {
            name.to_string()
        }
    }

    /// Parse a `serde_json::Value` representing a primitive Avro type into a `Variant`.
    fn parse_primitive(
        &mut self,
        schema: &str,
        enclosing_namespace: Option<&str>,
    ) -> Result<Variant, ResolveErr> {
        match schema {
            "null" => Ok(Variant::Null),
            "boolean" => Ok(Variant::Boolean),
            "int" => Ok(Variant::Int),
            "long" => Ok(Variant::Long),
            "double" => Ok(Variant::Double),
            "float" => Ok(Variant::Float),
            "bytes" => Ok(Variant::Bytes),
            "string" => Ok(Variant::Str),
            other if !other.is_empty() => {
                let name = self.get_fullname(other, enclosing_namespace);
                if self.cxt.contains_key(&name) {
                    Ok(Variant::Named(name))
                } else {
                    Err(ResolveErr::SchemaParseErr(io_err(&format!(
                        "named schema `{}` must be defined before use",
                        other
                    ))))
                }
            }
            _ => Err(ResolveErr::InvalidPrimitiveSchema),
        }
    }

    fn parse_record_fields(
        &mut self,
        fields: &[serde_json::Value],
        enclosing_namespace: Option<&str>,
    ) -> Result<IndexMap<String, Field>, ResolveErr> {
        let mut fields_parsed = IndexMap::with_capacity(fields.len());
        for field_obj in fields {
            match field_obj {
                JsonValue::Object(o) => {
                    let name = o
                        .get("name")
                        .and_then(|a| a.as_str())
                        .ok_or(ResolveErr::RecordNameNotFound)?;

                    let ty: &JsonValue = o.get("type").ok_or(ResolveErr::RecordTypeNotFound)?;
                    let mut ty = self.parse_schema(ty, enclosing_namespace)?;

                    // if ty is named use enclosing namespace to construct the fullname
                    if let Some(name) = ty.get_named_mut() {
                        // if parsed type has its own namespace
                        if name.namespace().is_none() {
                            if let Some(namespace) = enclosing_namespace {
                                name.set_namespace(namespace)?;
                            }
                        }
                    }

                    // The default stays a json literal. Interpreting it needs the
                    // destination value's type, which is only known at resolution time.
                    let default = o.get("default").cloned();

                    fields_parsed.insert(name.to_string(), Field::new(name, ty, default)?);
                }
                _ => return Err(ResolveErr::InvalidRecordFieldType),
            }
        }

        Ok(fields_parsed)
    }

    fn parse_object(
        &mut self,
        value: &Map<String, JsonValue>,
        enclosing_namespace: Option<&str>,
    ) -> Result<Variant, ResolveErr> {
        match value.get("type") {
            Some(&JsonValue::String(ref s)) if s == "record" => {
                let rec_name = Name::from_json(value, enclosing_namespace)?;

                // Insert a named reference to support recursive schema definitions.
                self.cxt
                    .insert(rec_name.to_string(), Variant::Named(rec_name.to_string()));

                let fields = if let Some(JsonValue::Array(ref fields_vec)) = value.get("fields") {
                    fields_vec
                } else {
                    return Err(ResolveErr::ExpectedFieldsJsonArray);
                };

                let fields = self.parse_record_fields(fields, {
                    if rec_name.namespace().is_some() {
                        // Most tightly enclosing namespace, which is this namespace
                        rec_name.namespace()
                    } else {
                        enclosing_namespace
                    }
                })?;

                let rec = Variant::Record {
                    name: rec_name.clone(),
                    fields,
                };

                let rec_for_registry = rec.clone();
                let rec_name = rec_name.to_string();

                // if a record schema is being redefined throw an error.
                if let Some(Variant::Named(_)) = self.cxt.get(&rec_name) {
                    self.cxt.insert(rec_name, rec_for_registry);
                } else {
                    return Err(ResolveErr::DuplicateSchema);
                }

                Ok(rec)
            }
            Some(&JsonValue::String(ref s)) if s == "enum" => {
                let name = Name::from_json(value, enclosing_namespace)?;
                let mut symbols = vec![];

                if let Some(v) = value.get("symbols") {
                    match v {
                        JsonValue::Array(sym) => {
                            for v in sym {
                                let symbol = v.as_str().ok_or(ResolveErr::EnumSymbolParseErr)?;
                                validate_name(0, symbol)?;
                                symbols.push(symbol.to_string());
                            }
                        }
                        other => {
                            return Err(ResolveErr::EnumParseErr(format!("{:?}", other)));
                        }
                    }
                } else {
                    return Err(ResolveErr::EnumSymbolsMissing);
                }

                let name_str = name.fullname();

                let enum_schema = Variant::Enum { name, symbols };

                self.cxt.insert(name_str, enum_schema.clone());

                Ok(enum_schema)
            }
            Some(&JsonValue::String(ref s)) if s == "array" => {
                let item_missing_err = ResolveErr::SchemaParseErr(io_err(
                    "Array schema must have `items` field defined",
                ));
                let items_schema = value.get("items").ok_or(item_missing_err)?;
                let parsed_items = self.parse_schema(items_schema, enclosing_namespace)?;
                Ok(Variant::Array {
                    items: Box::new(parsed_items),
                })
            }
            Some(&JsonValue::String(ref s)) if s == "map" => {
                let item_missing_err = ResolveErr::SchemaParseErr(io_err(
                    "Map schema must have `values` field defined",
                ));
                let items_schema = value.get("values").ok_or(item_missing_err)?;
                let parsed_items = self.parse_schema(items_schema, enclosing_namespace)?;
                Ok(Variant::Map {
                    values: Box::new(parsed_items),
                })
            }
            Some(&JsonValue::String(ref s)) if s == "fixed" => {
                let name = Name::from_json(value, enclosing_namespace)?;
                let size = value.get("size").ok_or(ResolveErr::FixedSizeNotFound)?;
                let name_str = name.fullname();

                let fixed_schema = Variant::Fixed {
                    name,
                    size: size.as_u64().ok_or(ResolveErr::FixedSizeNotNumber)? as usize,
                };

                self.cxt.insert(name_str, fixed_schema.clone());

                Ok(fixed_schema)
            }
            Some(JsonValue::String(ref s)) if s == "null" => Ok(Variant::Null),
            Some(JsonValue::String(ref s)) if s == "boolean" => Ok(Variant::Boolean),
            Some(JsonValue::String(ref s)) if s == "int" => Ok(Variant::Int),
            Some(JsonValue::String(ref s)) if s == "long" => Ok(Variant::Long),
            Some(JsonValue::String(ref s)) if s == "float" => Ok(Variant::Float),
            Some(JsonValue::String(ref s)) if s == "double" => Ok(Variant::Double),
            Some(JsonValue::String(ref s)) if s == "bytes" => Ok(Variant::Bytes),
            Some(JsonValue::String(ref s)) if s == "string" => Ok(Variant::Str),
            _other => Err(ResolveErr::SchemaParseFailed),
        }
    }
}
