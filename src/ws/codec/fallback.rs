//! Pure serde backend: `rmp-serde` over `serde_json::Value`

use bytes::Bytes;
use serde_json::{Number, Value};

use super::{check_finite, wire_uint, CodecError, WireCodec, MAX_DEPTH};
use crate::ws::value::WireValue;

/// Reference codec, always available
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackCodec;

impl FallbackCodec {
    pub fn new() -> Self {
        Self
    }
}

impl WireCodec for FallbackCodec {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn encode(&self, tag: &str, fields: &[f64]) -> Result<Bytes, CodecError> {
        check_finite(tag, fields)?;

        let mut items = Vec::with_capacity(fields.len() + 1);
        items.push(Value::String(tag.to_string()));
        for (index, &n) in fields.iter().enumerate() {
            let number = match wire_uint(n) {
                Some(u) => Number::from(u),
                None => Number::from_f64(n)
                    .ok_or_else(|| CodecError::NonFinite { tag: tag.to_string(), index })?,
            };
            items.push(Value::Number(number));
        }

        rmp_serde::to_vec(&Value::Array(items))
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode {
                tag: tag.to_string(),
                reason: e.to_string(),
            })
    }

    fn decode(&self, frame: &[u8]) -> Result<WireValue, CodecError> {
        let value = rmp_serde::from_slice::<Value>(frame)
            .map(WireValue::from)
            .map_err(|e| CodecError::Malformed(e.to_string()))?;

        if value.depth() > MAX_DEPTH {
            return Err(CodecError::Malformed("nesting too deep".to_string()));
        }
        Ok(value)
    }
}
