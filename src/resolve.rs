//! The schema resolution reader.
//!
//! Resolution walks the writer's schema and the byte stream in lockstep and
//! populates a destination [`Value`] shaped by the reader's schema. The
//! writer's schema dictates what is on the wire, so recursion is directed by
//! the source side; the destination side is consulted at every node to pick a
//! reconciliation: promote a primitive, reselect a union branch, skip a
//! writer-only record field or inject a reader-side default.

use crate::decode;
use crate::error::{io_err, ResolveErr, ResolveResult};
use crate::schema::{schema_match, Variant};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::convert::TryFrom;
use std::io::Read;

/// Resolves one value from `reader` written under `src`'s schema into `dst`.
///
/// `dst` is structurally cleared first. The root schemas must be compatible
/// per Avro's resolution rules, else [`ResolveErr::IncompatibleSchema`] is
/// returned before any byte is consumed. On error the destination value is
/// left in an unspecified state and should be discarded.
pub fn resolve<R: Read>(
    reader: &mut R,
    src: &mut Value<'_>,
    dst: &mut Value<'_>,
) -> ResolveResult<()> {
    dst.reset();
    if !schema_match(src.schema(), dst.schema(), src.registry(), dst.registry()) {
        return Err(ResolveErr::IncompatibleSchema);
    }
    resolve_value(reader, src, dst)
}

// The recursive dispatcher. Same as `resolve`, minus the reset and the root
// compatibility check (both already done by the entry point).
fn resolve_value<R: Read>(
    reader: &mut R,
    src: &mut Value<'_>,
    dst: &mut Value<'_>,
) -> ResolveResult<()> {
    if let Variant::Union { .. } = src.schema() {
        return resolve_union(reader, src, dst);
    }
    if let Variant::Union { .. } = dst.schema() {
        return resolve_union(reader, src, dst);
    }

    match src.schema() {
        Variant::Null => {
            decode::read_null(reader)?;
            match dst.schema() {
                Variant::Null => dst.set_null(),
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        Variant::Boolean => {
            let val = decode::read_boolean(reader, "boolean value")?;
            match dst.schema() {
                Variant::Boolean => dst.set_boolean(val),
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        // int is promotable to long, float or double; promotion is a cast
        // into whichever of them the reader asked for
        Variant::Int => {
            let val = decode::read_int(reader, "int value")?;
            match dst.schema() {
                Variant::Int => dst.set_int(val),
                Variant::Long => dst.set_long(i64::from(val)),
                Variant::Float => dst.set_float(val as f32),
                Variant::Double => dst.set_double(f64::from(val)),
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        // long is promotable to float or double
        Variant::Long => {
            let val = decode::read_long(reader, "long value")?;
            match dst.schema() {
                Variant::Long => dst.set_long(val),
                Variant::Float => dst.set_float(val as f32),
                Variant::Double => dst.set_double(val as f64),
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        // float is promotable to double
        Variant::Float => {
            let val = decode::read_float(reader, "float value")?;
            match dst.schema() {
                Variant::Float => dst.set_float(val),
                Variant::Double => dst.set_double(f64::from(val)),
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        Variant::Double => {
            let val = decode::read_double(reader, "double value")?;
            match dst.schema() {
                Variant::Double => dst.set_double(val),
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        // bytes is promotable to string; the payload moves into the
        // destination either way
        Variant::Bytes => {
            let buf = decode::read_bytes(reader, "bytes value")?;
            match dst.schema() {
                Variant::Bytes => dst.give_bytes(buf),
                Variant::Str => {
                    let s = String::from_utf8(buf).map_err(|_| {
                        ResolveErr::io("bytes value", io_err("payload is not valid UTF-8"))
                    })?;
                    dst.give_string(s)
                }
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        // string is promotable to bytes
        Variant::Str => {
            let buf = decode::read_bytes(reader, "string value")?;
            match dst.schema() {
                Variant::Str => {
                    let s = String::from_utf8(buf).map_err(|_| {
                        ResolveErr::io("string value", io_err("payload is not valid UTF-8"))
                    })?;
                    dst.give_string(s)
                }
                Variant::Bytes => dst.give_bytes(buf),
                _ => Err(ResolveErr::IncompatibleSchema),
            }
        }
        Variant::Enum { .. } => {
            let index = decode::read_long(reader, "enum value")?;
            let symbols = match dst.schema() {
                Variant::Enum { symbols, .. } => symbols,
                _ => return Err(ResolveErr::IncompatibleSchema),
            };
            // the wire index must name a symbol in the reader's list
            if index < 0 || index as usize >= symbols.len() {
                return Err(ResolveErr::IncompatibleSchema);
            }
            dst.set_enum(index as usize)
        }
        Variant::Fixed { .. } => {
            // equal sizes are guaranteed by the compatibility predicate, so
            // the destination's size is the amount on the wire
            let size = match dst.schema() {
                Variant::Fixed { size, .. } => *size,
                _ => return Err(ResolveErr::IncompatibleSchema),
            };
            let buf = decode::read_raw(reader, size, "fixed value")?;
            dst.give_fixed(buf)
        }
        Variant::Array { .. } => resolve_array(reader, src, dst),
        Variant::Map { .. } => resolve_map(reader, src, dst),
        Variant::Record { .. } => resolve_record(reader, src, dst),
        Variant::Union { .. } | Variant::Named(_) => Err(ResolveErr::UnknownType),
    }
}

/// Resolves the union cross-cases: writer union and/or reader union. With
/// neither side a union the call simply delegates to the plain resolvers.
pub fn resolve_union<R: Read>(
    reader: &mut R,
    src: &mut Value<'_>,
    dst: &mut Value<'_>,
) -> ResolveResult<()> {
    let w_schema = src.schema();
    let w_cxt = src.registry();
    let r_cxt = dst.registry();
    match (w_schema, dst.schema()) {
        (Variant::Union { .. }, Variant::Union { .. }) => resolve_unions(reader, src, dst),
        // writer is a union, reader is not: the discriminant picks the
        // written branch, which must then resolve into the reader type
        (Variant::Union { variants }, _) => {
            let discriminant = decode::read_long(reader, "union discriminant")?;
            if discriminant < 0 || discriminant as usize >= variants.len() {
                return Err(ResolveErr::InvalidDiscriminant(discriminant));
            }
            let branch = src.set_branch(discriminant as usize)?;
            resolve_value(reader, branch, dst)
        }
        // reader is a union, writer is not: nothing on the wire selects a
        // branch, the first reader branch compatible with the writer wins
        (_, Variant::Union { variants }) => {
            let index = variants
                .iter()
                .position(|branch| schema_match(w_schema, branch, w_cxt, r_cxt))
                .ok_or(ResolveErr::NoCompatibleBranch)?;
            let branch = dst.set_branch(index)?;
            resolve_value(reader, src, branch)
        }
        _ => resolve_value(reader, src, dst),
    }
}

// Both sides are unions. The discriminant selects the writer branch; the
// first reader branch compatible with it is selected and resolved into.
fn resolve_unions<R: Read>(
    reader: &mut R,
    src: &mut Value<'_>,
    dst: &mut Value<'_>,
) -> ResolveResult<()> {
    let discriminant = decode::read_long(reader, "union discriminant")?;
    let w_variants = match src.schema() {
        Variant::Union { variants } => variants,
        _ => return Err(ResolveErr::UnexpectedType),
    };
    if discriminant < 0 || discriminant as usize >= w_variants.len() {
        return Err(ResolveErr::InvalidDiscriminant(discriminant));
    }
    let r_variants = match dst.schema() {
        Variant::Union { variants } => variants,
        _ => return Err(ResolveErr::UnexpectedType),
    };

    let w_cxt = src.registry();
    let r_cxt = dst.registry();
    let branch_src = src.set_branch(discriminant as usize)?;
    let branch_schema = branch_src.schema();

    let index = r_variants
        .iter()
        .position(|branch| schema_match(branch_schema, branch, w_cxt, r_cxt))
        .ok_or(ResolveErr::NoCompatibleBranch)?;
    let branch_dst = dst.set_branch(index)?;
    resolve_value(reader, branch_src, branch_dst)
}

/// Resolves a block-framed array, recursing into the item resolver. Children
/// are appended to the destination and to the source scaffold in lockstep so
/// the item recursion sees both schemas.
pub fn resolve_array<R: Read>(
    reader: &mut R,
    src: &mut Value<'_>,
    dst: &mut Value<'_>,
) -> ResolveResult<()> {
    let mut block_count = decode::read_long(reader, "array block count")?;
    while block_count != 0 {
        if block_count < 0 {
            block_count = block_count
                .checked_neg()
                .ok_or_else(|| ResolveErr::io("array block count", io_err("count out of range")))?;
            // the block's byte size; item recursion does not need it
            let _block_size = decode::read_long(reader, "array block size")?;
        }
        for _ in 0..block_count {
            let src_child = src.append()?;
            let dst_child = dst.append()?;
            resolve_value(reader, src_child, dst_child)?;
        }
        block_count = decode::read_long(reader, "array block count")?;
    }
    Ok(())
}

/// Resolves a block-framed map. Per entry the string key is decoded and a
/// child is added under it on both sides; a repeated key overwrites the
/// earlier entry.
pub fn resolve_map<R: Read>(
    reader: &mut R,
    src: &mut Value<'_>,
    dst: &mut Value<'_>,
) -> ResolveResult<()> {
    let mut block_count = decode::read_long(reader, "map block count")?;
    while block_count != 0 {
        if block_count < 0 {
            block_count = block_count
                .checked_neg()
                .ok_or_else(|| ResolveErr::io("map block count", io_err("count out of range")))?;
            let _block_size = decode::read_long(reader, "map block size")?;
        }
        for _ in 0..block_count {
            let key = decode::read_string(reader, "map key")?;
            let src_child = src.add(&key)?;
            let dst_child = dst.add(&key)?;
            resolve_value(reader, src_child, dst_child)?;
        }
        block_count = decode::read_long(reader, "map block count")?;
    }
    Ok(())
}

/// Resolves a record against a reader record with possibly different fields.
///
/// Writer fields are decoded in writer declaration order; fields the reader
/// shares (by name) recurse into the resolver, fields the reader lacks are
/// skipped off the stream. Reader fields the writer never populated must
/// carry a default, which is injected after all writer bytes for the record
/// have been consumed.
pub fn resolve_record<R: Read>(
    reader: &mut R,
    src: &mut Value<'_>,
    dst: &mut Value<'_>,
) -> ResolveResult<()> {
    let w_fields = match src.schema() {
        Variant::Record { fields, .. } => fields,
        _ => return Err(ResolveErr::UnexpectedType),
    };
    let r_fields = match dst.schema() {
        Variant::Record { fields, .. } => fields,
        _ => return Err(ResolveErr::UnexpectedType),
    };
    let w_cxt = src.registry();

    let mut populated = vec![false; r_fields.len()];

    for (w_index, (w_name, w_field)) in w_fields.iter().enumerate() {
        match r_fields.get_index_of(w_name.as_str()) {
            Some(r_index) => {
                let src_child = src.field_at_mut(w_index)?;
                let dst_child = dst.field_at_mut(r_index)?;
                resolve_value(reader, src_child, dst_child)?;
                populated[r_index] = true;
            }
            None => {
                // the reader does not want this field
                decode::skip_value(reader, &w_field.ty, w_cxt)?;
            }
        }
    }

    for (r_index, (r_name, r_field)) in r_fields.iter().enumerate() {
        if populated[r_index] {
            continue;
        }
        let literal = r_field
            .default
            .as_ref()
            .ok_or_else(|| ResolveErr::MissingDefaultForReaderField(r_name.clone()))?;
        inject_default(literal, dst.field_at_mut(r_index)?)?;
    }

    Ok(())
}

// Materializes a reader-schema default literal into a destination value
// without consuming any bytes. A union destination takes the default on its
// first branch, per the Avro rules for union field defaults.
fn inject_default(literal: &JsonValue, dst: &mut Value<'_>) -> ResolveResult<()> {
    match dst.schema() {
        Variant::Union { .. } => {
            let branch = dst.set_branch(0)?;
            inject_default(literal, branch)
        }
        Variant::Null => {
            if literal.is_null() {
                dst.set_null()
            } else {
                Err(ResolveErr::InvalidDefault)
            }
        }
        Variant::Boolean => {
            let val = literal.as_bool().ok_or(ResolveErr::InvalidDefault)?;
            dst.set_boolean(val)
        }
        Variant::Int => {
            let val = literal.as_i64().ok_or(ResolveErr::InvalidDefault)?;
            let val = i32::try_from(val).map_err(|_| ResolveErr::InvalidDefault)?;
            dst.set_int(val)
        }
        Variant::Long => {
            let val = literal.as_i64().ok_or(ResolveErr::InvalidDefault)?;
            dst.set_long(val)
        }
        Variant::Float => {
            let val = literal.as_f64().ok_or(ResolveErr::InvalidDefault)?;
            dst.set_float(val as f32)
        }
        Variant::Double => {
            let val = literal.as_f64().ok_or(ResolveErr::InvalidDefault)?;
            dst.set_double(val)
        }
        Variant::Str => {
            let val = literal.as_str().ok_or(ResolveErr::InvalidDefault)?;
            dst.give_string(val.to_string())
        }
        Variant::Bytes => {
            let val = literal.as_str().ok_or(ResolveErr::InvalidDefault)?;
            dst.give_bytes(val.as_bytes().to_vec())
        }
        Variant::Fixed { size, .. } => {
            let val = literal.as_str().ok_or(ResolveErr::InvalidDefault)?;
            let buf = val.as_bytes().to_vec();
            if buf.len() != *size {
                return Err(ResolveErr::InvalidDefault);
            }
            dst.give_fixed(buf)
        }
        Variant::Enum { symbols, .. } => {
            let symbol = literal.as_str().ok_or(ResolveErr::InvalidDefault)?;
            let index = symbols
                .iter()
                .position(|s| s == symbol)
                .ok_or(ResolveErr::InvalidDefault)?;
            dst.set_enum(index)
        }
        Variant::Array { .. } => {
            let items = literal.as_array().ok_or(ResolveErr::InvalidDefault)?;
            for item in items {
                let child = dst.append()?;
                inject_default(item, child)?;
            }
            Ok(())
        }
        Variant::Map { .. } => {
            let entries = literal.as_object().ok_or(ResolveErr::InvalidDefault)?;
            for (key, entry) in entries {
                let child = dst.add(key)?;
                inject_default(entry, child)?;
            }
            Ok(())
        }
        Variant::Record { fields, .. } => {
            let members = literal.as_object().ok_or(ResolveErr::InvalidDefault)?;
            for (index, name) in fields.keys().enumerate() {
                let member = members.get(name).ok_or(ResolveErr::InvalidDefault)?;
                inject_default(member, dst.field_at_mut(index)?)?;
            }
            Ok(())
        }
        Variant::Named(_) => Err(ResolveErr::UnknownType),
    }
}
