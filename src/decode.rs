//! Primitive decoders for the Avro binary encoding, and the schema-directed
//! skip used to discard writer-only data without materializing it.

use crate::config::MAX_ALLOC_SIZE;
use crate::error::{io_err, ResolveErr, ResolveResult};
use crate::schema::{Registry, Variant};
use byteorder::{LittleEndian, ReadBytesExt};
use integer_encoding::VarIntReader;
use std::io::Read;

// Null values occupy no space on the wire.
pub(crate) fn read_null<R: Read>(_reader: &mut R) -> ResolveResult<()> {
    Ok(())
}

pub(crate) fn read_boolean<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<bool> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf)
        .map_err(|e| ResolveErr::io(context, e))?;
    match buf {
        [0x00] => Ok(false),
        [0x01] => Ok(true),
        _ => Err(ResolveErr::io(
            context,
            io_err("expecting a 0x00 or 0x01 as a byte for boolean value"),
        )),
    }
}

pub(crate) fn read_int<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<i32> {
    reader
        .read_varint::<i32>()
        .map_err(|e| ResolveErr::io(context, e))
}

pub(crate) fn read_long<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<i64> {
    reader
        .read_varint::<i64>()
        .map_err(|e| ResolveErr::io(context, e))
}

pub(crate) fn read_float<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<f32> {
    reader
        .read_f32::<LittleEndian>()
        .map_err(|e| ResolveErr::io(context, e))
}

pub(crate) fn read_double<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<f64> {
    reader
        .read_f64::<LittleEndian>()
        .map_err(|e| ResolveErr::io(context, e))
}

// Reads a wire-declared length and refuses to trust sizes the input could not
// plausibly back.
fn read_len<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<usize> {
    let len = read_long(reader, context)?;
    if len < 0 || len as u64 > MAX_ALLOC_SIZE as u64 {
        return Err(ResolveErr::AllocationFailure(len));
    }
    Ok(len as usize)
}

pub(crate) fn read_bytes<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<Vec<u8>> {
    let len = read_len(reader, context)?;
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(|e| ResolveErr::io(context, e))?;
    Ok(buf)
}

pub(crate) fn read_string<R: Read>(reader: &mut R, context: &'static str) -> ResolveResult<String> {
    let buf = read_bytes(reader, context)?;
    String::from_utf8(buf)
        .map_err(|_| ResolveErr::io(context, io_err("string payload is not valid UTF-8")))
}

pub(crate) fn read_raw<R: Read>(
    reader: &mut R,
    size: usize,
    context: &'static str,
) -> ResolveResult<Vec<u8>> {
    if size > MAX_ALLOC_SIZE {
        return Err(ResolveErr::AllocationFailure(size as i64));
    }
    let mut buf = vec![0u8; size];
    reader
        .read_exact(&mut buf)
        .map_err(|e| ResolveErr::io(context, e))?;
    Ok(buf)
}

pub(crate) fn skip_exact<R: Read>(
    reader: &mut R,
    len: u64,
    context: &'static str,
) -> ResolveResult<()> {
    let skipped = std::io::copy(&mut reader.by_ref().take(len), &mut std::io::sink())
        .map_err(|e| ResolveErr::io(context, e))?;
    if skipped != len {
        return Err(ResolveErr::io(context, io_err("unexpected end of input")));
    }
    Ok(())
}

/// Discards one complete value described by `schema` from the byte stream.
/// Array and map blocks that carry a byte size on the wire are skipped
/// wholesale without visiting their items.
pub(crate) fn skip_value<R: Read>(
    reader: &mut R,
    schema: &Variant,
    cxt: &Registry,
) -> ResolveResult<()> {
    match schema {
        Variant::Null => Ok(()),
        Variant::Boolean => read_boolean(reader, "boolean value").map(|_| ()),
        Variant::Int => read_int(reader, "int value").map(|_| ()),
        Variant::Long => read_long(reader, "long value").map(|_| ()),
        Variant::Float => skip_exact(reader, 4, "float value"),
        Variant::Double => skip_exact(reader, 8, "double value"),
        Variant::Bytes => {
            let len = read_len(reader, "bytes value")?;
            skip_exact(reader, len as u64, "bytes value")
        }
        Variant::Str => {
            let len = read_len(reader, "string value")?;
            skip_exact(reader, len as u64, "string value")
        }
        Variant::Fixed { size, .. } => skip_exact(reader, *size as u64, "fixed value"),
        Variant::Enum { .. } => read_long(reader, "enum value").map(|_| ()),
        Variant::Union { variants } => {
            let discriminant = read_long(reader, "union discriminant")?;
            if discriminant < 0 || discriminant as usize >= variants.len() {
                return Err(ResolveErr::InvalidDiscriminant(discriminant));
            }
            skip_value(reader, &variants[discriminant as usize], cxt)
        }
        Variant::Array { items } => skip_blocks(
            reader,
            "array block count",
            "array block size",
            |reader| skip_value(reader, items, cxt),
        ),
        Variant::Map { values } => {
            skip_blocks(reader, "map block count", "map block size", |reader| {
                let len = read_len(reader, "map key")?;
                skip_exact(reader, len as u64, "map key")?;
                skip_value(reader, values, cxt)
            })
        }
        Variant::Record { fields, .. } => {
            for field in fields.values() {
                skip_value(reader, &field.ty, cxt)?;
            }
            Ok(())
        }
        Variant::Named(name) => {
            let resolved = cxt.get(name).ok_or(ResolveErr::UnknownType)?;
            skip_value(reader, resolved, cxt)
        }
    }
}

fn skip_blocks<R: Read, F>(
    reader: &mut R,
    count_context: &'static str,
    size_context: &'static str,
    mut skip_item: F,
) -> ResolveResult<()>
where
    F: FnMut(&mut R) -> ResolveResult<()>,
{
    let mut block_count = read_long(reader, count_context)?;
    while block_count != 0 {
        if block_count < 0 {
            // a byte size follows the negated count, letting us skip the
            // whole block without decoding its items
            let block_size = read_long(reader, size_context)?;
            if block_size < 0 {
                return Err(ResolveErr::io(size_context, io_err("negative block size")));
            }
            skip_exact(reader, block_size as u64, size_context)?;
        } else {
            for _ in 0..block_count {
                skip_item(reader)?;
            }
        }
        block_count = read_long(reader, count_context)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use integer_encoding::VarIntWriter;

    #[test]
    fn varints_are_zigzag_encoded() {
        // 1 zigzags to 2, -3 to 5
        let buf = [0x02u8];
        assert_eq!(read_int(&mut buf.as_ref(), "int value").unwrap(), 1);
        let buf = [0x05u8];
        assert_eq!(read_long(&mut buf.as_ref(), "long value").unwrap(), -3);
    }

    #[test]
    fn boolean_rejects_junk_bytes() {
        let buf = [0x01u8];
        assert!(read_boolean(&mut buf.as_ref(), "boolean value").unwrap());
        let buf = [0x02u8];
        assert!(read_boolean(&mut buf.as_ref(), "boolean value").is_err());
    }

    #[test]
    fn bytes_rejects_negative_and_oversized_lengths() {
        let mut buf = vec![];
        buf.write_varint(-1i64).unwrap();
        match read_bytes(&mut buf.as_slice(), "bytes value") {
            Err(ResolveErr::AllocationFailure(-1)) => {}
            other => panic!("expected allocation failure, got {:?}", other),
        }

        let mut buf = vec![];
        buf.write_varint((crate::config::MAX_ALLOC_SIZE as i64) + 1).unwrap();
        assert!(matches!(
            read_bytes(&mut buf.as_slice(), "bytes value"),
            Err(ResolveErr::AllocationFailure(_))
        ));
    }

    #[test]
    fn string_requires_utf8() {
        let mut buf = vec![];
        buf.write_varint(2i64).unwrap();
        buf.extend_from_slice(&[0xff, 0xfe]);
        assert!(read_string(&mut buf.as_slice(), "string value").is_err());
    }

    #[test]
    fn skip_array_with_sized_blocks() {
        let schema = Variant::Array {
            items: Box::new(Variant::Int),
        };
        let cxt = Registry::new();

        let mut buf = vec![];
        // one block of 2 items with a byte size, then end marker
        buf.write_varint(-2i64).unwrap();
        buf.write_varint(2i64).unwrap();
        buf.write_varint(1i32).unwrap();
        buf.write_varint(2i32).unwrap();
        buf.write_varint(0i64).unwrap();
        // trailing long to prove alignment
        buf.write_varint(99i64).unwrap();

        let mut reader = buf.as_slice();
        skip_value(&mut reader, &schema, &cxt).unwrap();
        assert_eq!(read_long(&mut reader, "long value").unwrap(), 99);
    }

    #[test]
    fn skip_record_spans_all_fields() {
        use crate::Schema;
        use std::str::FromStr;

        let schema = Schema::from_str(
            r##"{
                "type": "record",
                "name": "rec",
                "fields": [
                    {"name": "a", "type": "int"},
                    {"name": "b", "type": "string"},
                    {"name": "c", "type": "double"}
                ]
            }"##,
        )
        .unwrap();

        let mut buf = vec![];
        buf.write_varint(7i32).unwrap();
        buf.write_varint(2i64).unwrap();
        buf.extend_from_slice(b"hi");
        buf.write_f64::<byteorder::LittleEndian>(1.5).unwrap();
        buf.write_varint(42i64).unwrap();

        let mut reader = buf.as_slice();
        skip_value(&mut reader, schema.variant(), &schema.cxt).unwrap();
        assert_eq!(read_long(&mut reader, "long value").unwrap(), 42);
    }

    #[test]
    fn skip_union_validates_discriminant() {
        let schema = Variant::Union {
            variants: vec![Variant::Null, Variant::Int],
        };
        let cxt = Registry::new();
        let mut buf = vec![];
        buf.write_varint(7i64).unwrap();
        assert!(matches!(
            skip_value(&mut buf.as_slice(), &schema, &cxt),
            Err(ResolveErr::InvalidDiscriminant(7))
        ));
    }
}
