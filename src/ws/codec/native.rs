//! Hand-rolled MessagePack backend
//!
//! Writes frames straight from `rmp` encode primitives and parses them with a
//! bounds-checked cursor over the raw bytes, with no intermediate serde model.

use std::collections::BTreeMap;

use bytes::Bytes;
use rmp::Marker;

use super::{check_finite, wire_uint, CodecError, FallbackCodec, WireCodec, MAX_DEPTH};
use crate::ws::value::WireValue;

/// Fast-path codec
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl NativeCodec {
    pub fn new() -> Self {
        Self
    }

    /// Build the codec after checking it agrees with the reference backend on
    /// a probe frame
    pub fn probe() -> Result<Self, CodecError> {
        let codec = Self::new();
        let reference = FallbackCodec::new();
        let fields = [100.0, 100.5, -120.0, 0.0];

        let ours = codec
            .encode("Move", &fields)
            .map_err(|e| CodecError::BackendUnavailable(e.to_string()))?;
        let theirs = reference
            .encode("Move", &fields)
            .map_err(|e| CodecError::BackendUnavailable(e.to_string()))?;
        if ours != theirs {
            return Err(CodecError::BackendUnavailable(
                "probe frame differs from reference encoding".to_string(),
            ));
        }

        let decoded = codec
            .decode(&ours)
            .map_err(|e| CodecError::BackendUnavailable(e.to_string()))?;
        let reference_decoded = reference
            .decode(&theirs)
            .map_err(|e| CodecError::BackendUnavailable(e.to_string()))?;
        if decoded != reference_decoded {
            return Err(CodecError::BackendUnavailable(
                "probe frame decodes differently from reference".to_string(),
            ));
        }

        Ok(codec)
    }
}

impl WireCodec for NativeCodec {
    fn name(&self) -> &'static str {
        "native"
    }

    fn encode(&self, tag: &str, fields: &[f64]) -> Result<Bytes, CodecError> {
        check_finite(tag, fields)?;

        let encode_err = |e: rmp::encode::ValueWriteError| CodecError::Encode {
            tag: tag.to_string(),
            reason: e.to_string(),
        };

        // Tag, then up to 9 bytes per number
        let mut buf = Vec::with_capacity(tag.len() + 2 + fields.len() * 9);
        rmp::encode::write_array_len(&mut buf, fields.len() as u32 + 1).map_err(encode_err)?;
        rmp::encode::write_str(&mut buf, tag).map_err(encode_err)?;

        for &n in fields {
            match wire_uint(n) {
                Some(u) => {
                    rmp::encode::write_uint(&mut buf, u).map_err(encode_err)?;
                }
                None => rmp::encode::write_f64(&mut buf, n).map_err(encode_err)?,
            }
        }

        Ok(Bytes::from(buf))
    }

    fn decode(&self, frame: &[u8]) -> Result<WireValue, CodecError> {
        let mut reader = Reader { buf: frame, pos: 0 };
        reader.value(0)
    }
}

/// Bounds-checked cursor over a frame
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                CodecError::Malformed(format!(
                    "needed {n} bytes at offset {}, frame is {} bytes",
                    self.pos,
                    self.buf.len()
                ))
            })?;

        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        self.array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        self.array().map(u32::from_be_bytes)
    }

    fn value(&mut self, depth: usize) -> Result<WireValue, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::Malformed("nesting too deep".to_string()));
        }

        let offset = self.pos;
        let marker = Marker::from_u8(self.u8()?);

        let value = match marker {
            Marker::Null => WireValue::Nil,
            Marker::True => WireValue::Bool(true),
            Marker::False => WireValue::Bool(false),

            Marker::FixPos(n) => WireValue::Int(i64::from(n)),
            Marker::FixNeg(n) => WireValue::Int(i64::from(n)),
            Marker::U8 => WireValue::Int(i64::from(self.u8()?)),
            Marker::U16 => WireValue::Int(i64::from(self.u16()?)),
            Marker::U32 => WireValue::Int(i64::from(self.u32()?)),
            Marker::U64 => {
                let n = u64::from_be_bytes(self.array()?);
                match i64::try_from(n) {
                    Ok(i) => WireValue::Int(i),
                    Err(_) => WireValue::Float(n as f64),
                }
            }
            Marker::I8 => WireValue::Int(i64::from(i8::from_be_bytes(self.array()?))),
            Marker::I16 => WireValue::Int(i64::from(i16::from_be_bytes(self.array()?))),
            Marker::I32 => WireValue::Int(i64::from(i32::from_be_bytes(self.array()?))),
            Marker::I64 => WireValue::Int(i64::from_be_bytes(self.array()?)),
            Marker::F32 => WireValue::float(f64::from(f32::from_be_bytes(self.array()?))),
            Marker::F64 => WireValue::float(f64::from_be_bytes(self.array()?)),

            Marker::FixStr(len) => self.string(usize::from(len))?,
            Marker::Str8 => {
                let len = usize::from(self.u8()?);
                self.string(len)?
            }
            Marker::Str16 => {
                let len = usize::from(self.u16()?);
                self.string(len)?
            }
            Marker::Str32 => {
                let len = self.u32()? as usize;
                self.string(len)?
            }

            Marker::FixArray(len) => self.seq(usize::from(len), depth)?,
            Marker::Array16 => {
                let len = usize::from(self.u16()?);
                self.seq(len, depth)?
            }
            Marker::Array32 => {
                let len = self.u32()? as usize;
                self.seq(len, depth)?
            }

            Marker::FixMap(len) => self.map(usize::from(len), depth)?,
            Marker::Map16 => {
                let len = usize::from(self.u16()?);
                self.map(len, depth)?
            }
            Marker::Map32 => {
                let len = self.u32()? as usize;
                self.map(len, depth)?
            }

            other => {
                return Err(CodecError::Malformed(format!(
                    "unsupported marker {other:?} at offset {offset}"
                )))
            }
        };

        Ok(value)
    }

    fn string(&mut self, len: usize) -> Result<WireValue, CodecError> {
        let bytes = self.take(len)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::Malformed(format!("invalid UTF-8 in string: {e}")))?;
        Ok(WireValue::Str(s.to_string()))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn seq(&mut self, len: usize, depth: usize) -> Result<WireValue, CodecError> {
        // Every element takes at least one byte
        if len > self.remaining() {
            return Err(CodecError::Malformed(format!(
                "array of {len} elements in {} remaining bytes",
                self.remaining()
            )));
        }

        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.value(depth + 1)?);
        }
        Ok(WireValue::Array(items))
    }

    fn map(&mut self, len: usize, depth: usize) -> Result<WireValue, CodecError> {
        if len.saturating_mul(2) > self.remaining() {
            return Err(CodecError::Malformed(format!(
                "map of {len} entries in {} remaining bytes",
                self.remaining()
            )));
        }

        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = match self.value(depth + 1)? {
                WireValue::Str(key) => key,
                other => {
                    return Err(CodecError::Malformed(format!(
                        "map key must be a string, got {}",
                        other.kind()
                    )))
                }
            };
            let value = self.value(depth + 1)?;
            map.insert(key, value);
        }
        Ok(WireValue::Map(map))
    }
}
