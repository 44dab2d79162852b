//! Wire codec adapter
//!
//! Frames travel as MessagePack, either as a tagged array
//! `[tag, field0, field1, ...]` or as a keyed map `{type, ...fields}`. A
//! [`WireCodec`] backend turns bytes into a raw [`WireValue`] and back;
//! [`normalize`] rewrites tagged arrays into keyed maps using the per-tag
//! schemas in [`crate::ws::protocol`], and [`CodecAdapter`] ties the two
//! together for the session.
//!
//! Two backends exist and must stay byte-compatible: [`NativeCodec`] writes and
//! parses MessagePack directly on `rmp` primitives, [`FallbackCodec`] goes
//! through `rmp-serde` and `serde_json::Value`. The backend is picked once at
//! startup by [`select_codec`].

mod fallback;
mod native;

pub use fallback::FallbackCodec;
pub use native::NativeCodec;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use tracing::{info, warn};

use crate::ws::protocol::{ClientMsg, Direction, ProtocolError, ServerMsg, TYPE_KEY};
use crate::ws::value::WireValue;

/// Deepest container nesting either backend accepts; protocol frames use two levels
pub(crate) const MAX_DEPTH: usize = 16;

/// A MessagePack backend
pub trait WireCodec: Send {
    /// Backend name for logs and the debug HUD
    fn name(&self) -> &'static str;

    /// Encode `[tag, fields...]` as a tagged array frame
    fn encode(&self, tag: &str, fields: &[f64]) -> Result<Bytes, CodecError>;

    /// Decode one frame into a raw value
    fn decode(&self, frame: &[u8]) -> Result<WireValue, CodecError>;
}

/// Codec errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("Codec backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Non-finite value in {tag} field {index}")]
    NonFinite { tag: String, index: usize },

    #[error("Failed to encode {tag}: {reason}")]
    Encode { tag: String, reason: String },

    #[error("Malformed frame: {0}")]
    Malformed(String),
}

/// Anything that stops an inbound frame from becoming a [`ServerMsg`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Which backend to prefer at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecBackend {
    #[default]
    Native,
    Fallback,
}

impl FromStr for CodecBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown codec backend {other:?}")),
        }
    }
}

impl fmt::Display for CodecBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Pick the session's backend.
///
/// The native backend must pass a self-test first; if it does not, the pure
/// fallback is used and the session carries on.
pub fn select_codec(preferred: CodecBackend) -> Box<dyn WireCodec> {
    select_codec_with(preferred, NativeCodec::probe)
}

/// [`select_codec`] with the native self-test supplied by the caller
pub fn select_codec_with<P>(preferred: CodecBackend, probe: P) -> Box<dyn WireCodec>
where
    P: FnOnce() -> Result<NativeCodec, CodecError>,
{
    if preferred == CodecBackend::Native {
        match probe() {
            Ok(codec) => {
                info!(backend = codec.name(), "MessagePack codec ready");
                return Box::new(codec);
            }
            Err(e) => {
                warn!(error = %e, "Native codec failed its self-test, using fallback");
            }
        }
    }

    let codec = FallbackCodec::new();
    info!(backend = codec.name(), "MessagePack codec ready");
    Box::new(codec)
}

/// Rewrite a tagged array into keyed form using the schema for `direction`.
///
/// Maps, unknown tags and arrays shorter than their schema are returned
/// unchanged. Extra trailing array elements are ignored.
pub fn normalize(value: WireValue, direction: Direction) -> WireValue {
    let WireValue::Array(items) = value else {
        return value;
    };

    let schema = items
        .first()
        .and_then(WireValue::as_str)
        .and_then(|tag| direction.schema_for(tag));

    let Some(schema) = schema else {
        return WireValue::Array(items);
    };
    if items.len() < schema.array_len() {
        return WireValue::Array(items);
    }

    let mut items = items.into_iter();
    let mut map = std::collections::BTreeMap::new();
    if let Some(tag) = items.next() {
        map.insert(TYPE_KEY.to_string(), tag);
    }
    for (name, value) in schema.fields.iter().zip(items) {
        map.insert((*name).to_string(), value);
    }

    WireValue::Map(map)
}

/// Numbers written as MessagePack unsigned ints; everything else is float64
pub(crate) fn wire_uint(n: f64) -> Option<u64> {
    (n.fract() == 0.0 && n >= 0.0 && n <= f64::from(u32::MAX)).then_some(n as u64)
}

pub(crate) fn check_finite(tag: &str, fields: &[f64]) -> Result<(), CodecError> {
    match fields.iter().position(|n| !n.is_finite()) {
        Some(index) => Err(CodecError::NonFinite { tag: tag.to_string(), index }),
        None => Ok(()),
    }
}

/// The session's view of the wire: backend plus normalization
pub struct CodecAdapter {
    backend: Box<dyn WireCodec>,
}

impl CodecAdapter {
    pub fn new(backend: Box<dyn WireCodec>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Decode and normalize a frame travelling in `direction`
    pub fn decode(&self, frame: &[u8], direction: Direction) -> Result<WireValue, CodecError> {
        self.backend.decode(frame).map(|v| normalize(v, direction))
    }

    /// Decode an inbound frame all the way to a canonical message
    pub fn decode_inbound(&self, frame: &[u8]) -> Result<ServerMsg, FrameError> {
        let value = self.decode(frame, Direction::Inbound)?;
        Ok(ServerMsg::from_wire(value)?)
    }

    /// Encode an outbound message in tagged-array form
    pub fn encode(&self, msg: &ClientMsg) -> Result<Bytes, CodecError> {
        self.backend.encode(msg.tag(), &msg.fields())
    }
}

impl fmt::Debug for CodecAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecAdapter")
            .field("backend", &self.backend.name())
            .finish()
    }
}
