#![allow(dead_code)]

//! Hand encoders for Avro wire bytes used by the resolution tests.

use avresolve::Schema;
use byteorder::{LittleEndian, WriteBytesExt};
use integer_encoding::VarIntWriter;
use std::str::FromStr;

pub fn schema(s: &str) -> Schema {
    Schema::from_str(s).unwrap()
}

pub fn long(buf: &mut Vec<u8>, value: i64) {
    buf.write_varint(value).unwrap();
}

pub fn int(buf: &mut Vec<u8>, value: i32) {
    buf.write_varint(value).unwrap();
}

pub fn float(buf: &mut Vec<u8>, value: f32) {
    buf.write_f32::<LittleEndian>(value).unwrap();
}

pub fn double(buf: &mut Vec<u8>, value: f64) {
    buf.write_f64::<LittleEndian>(value).unwrap();
}

pub fn boolean(buf: &mut Vec<u8>, value: bool) {
    buf.push(value as u8);
}

pub fn bytes(buf: &mut Vec<u8>, value: &[u8]) {
    long(buf, value.len() as i64);
    buf.extend_from_slice(value);
}

pub fn string(buf: &mut Vec<u8>, value: &str) {
    bytes(buf, value.as_bytes());
}

/// Encodes a single-block array of ints followed by the end marker.
pub fn int_array(buf: &mut Vec<u8>, values: &[i32]) {
    if !values.is_empty() {
        long(buf, values.len() as i64);
        for v in values {
            int(buf, *v);
        }
    }
    long(buf, 0);
}
