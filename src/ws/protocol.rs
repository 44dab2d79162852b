//! Wire protocol message definitions
//! These are the canonical types for client-relay communication

use std::collections::BTreeMap;

use crate::ws::value::WireValue;

/// Player identifier assigned by the relay
pub type PlayerId = u32;

/// Key carrying the message tag in keyed-map form
pub const TYPE_KEY: &str = "type";

/// Positional field names for one tag in tagged-array form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSchema {
    pub tag: &'static str,
    /// Field names for array positions 1..=fields.len()
    pub fields: &'static [&'static str],
}

impl MessageSchema {
    /// Minimum array length (tag included) needed to normalize this message
    pub fn array_len(&self) -> usize {
        self.fields.len() + 1
    }
}

/// Messages the relay sends to clients
pub const INBOUND_SCHEMAS: &[MessageSchema] = &[
    MessageSchema { tag: "Init", fields: &["id"] },
    MessageSchema { tag: "Joined", fields: &["id"] },
    MessageSchema { tag: "PlayerMove", fields: &["id", "x", "y", "vel_x", "vel_y"] },
    MessageSchema { tag: "Kick", fields: &["id", "x", "y", "dirX", "dirY"] },
    MessageSchema { tag: "Left", fields: &["id"] },
];

/// Messages clients send to the relay
pub const OUTBOUND_SCHEMAS: &[MessageSchema] = &[
    MessageSchema { tag: "Move", fields: &["x", "y", "vel_x", "vel_y"] },
    MessageSchema { tag: "Kick", fields: &["x", "y", "dirX", "dirY"] },
];

/// Which side of the relay a frame travels towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Relay -> client
    Inbound,
    /// Client -> relay
    Outbound,
}

impl Direction {
    pub fn schemas(self) -> &'static [MessageSchema] {
        match self {
            Self::Inbound => INBOUND_SCHEMAS,
            Self::Outbound => OUTBOUND_SCHEMAS,
        }
    }

    pub fn schema_for(self, tag: &str) -> Option<&'static MessageSchema> {
        self.schemas().iter().find(|s| s.tag == tag)
    }
}

/// Messages sent from client to relay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientMsg {
    /// Local player position and velocity
    Move { x: f64, y: f64, vel_x: f64, vel_y: f64 },

    /// Local kick: ball position at the kick and unit direction
    Kick { x: f64, y: f64, dir_x: f64, dir_y: f64 },
}

impl ClientMsg {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Move { .. } => "Move",
            Self::Kick { .. } => "Kick",
        }
    }

    /// Numeric fields in wire order
    pub fn fields(&self) -> [f64; 4] {
        match *self {
            Self::Move { x, y, vel_x, vel_y } => [x, y, vel_x, vel_y],
            Self::Kick { x, y, dir_x, dir_y } => [x, y, dir_x, dir_y],
        }
    }
}

/// Messages sent from relay to client, after validation
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMsg {
    /// Identity assignment for this client
    Init { id: PlayerId },

    /// Another client connected
    Joined { id: PlayerId },

    /// Another client disconnected
    Left { id: PlayerId },

    /// Peer movement; absent or non-numeric fields are `None`
    PlayerMove {
        id: PlayerId,
        x: Option<f64>,
        y: Option<f64>,
        vel_x: Option<f64>,
        vel_y: Option<f64>,
    },

    /// Ball kick from any client, including our own echo
    Kick {
        id: Option<PlayerId>,
        x: Option<f64>,
        y: Option<f64>,
        dir_x: Option<f64>,
        dir_y: Option<f64>,
    },
}

impl ServerMsg {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Init { .. } => "Init",
            Self::Joined { .. } => "Joined",
            Self::Left { .. } => "Left",
            Self::PlayerMove { .. } => "PlayerMove",
            Self::Kick { .. } => "Kick",
        }
    }

    /// Validate a normalized wire value into a canonical message
    pub fn from_wire(value: WireValue) -> Result<Self, ProtocolError> {
        let fields = match value {
            WireValue::Map(fields) => fields,
            // Arrays left over from normalization: say why it did not apply
            WireValue::Array(items) => {
                let tag = items
                    .first()
                    .and_then(WireValue::as_str)
                    .ok_or(ProtocolError::MissingType)?;
                if Direction::Inbound.schema_for(tag).is_none() {
                    return Err(ProtocolError::UnknownTag(tag.to_string()));
                }
                return Err(ProtocolError::ShortArray {
                    tag: tag.to_string(),
                    len: items.len(),
                });
            }
            other => return Err(ProtocolError::NotAMessage(other.kind())),
        };

        let tag = fields
            .get(TYPE_KEY)
            .and_then(WireValue::as_str)
            .ok_or(ProtocolError::MissingType)?;

        match tag {
            "Init" => Ok(Self::Init { id: required_id(&fields, tag)? }),
            "Joined" => Ok(Self::Joined { id: required_id(&fields, tag)? }),
            "Left" => Ok(Self::Left { id: required_id(&fields, tag)? }),
            "PlayerMove" => Ok(Self::PlayerMove {
                id: required_id(&fields, tag)?,
                x: number(&fields, &["x"]),
                y: number(&fields, &["y"]),
                vel_x: number(&fields, &["vel_x"]),
                vel_y: number(&fields, &["vel_y"]),
            }),
            "Kick" => Ok(Self::Kick {
                id: optional_id(&fields, tag)?,
                x: number(&fields, &["x"]),
                y: number(&fields, &["y"]),
                dir_x: number(&fields, &["dirX", "dir_x"]),
                dir_y: number(&fields, &["dirY", "dir_y"]),
            }),
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }
}

/// First numeric field among the accepted spellings
fn number(fields: &BTreeMap<String, WireValue>, names: &[&str]) -> Option<f64> {
    names
        .iter()
        .find_map(|name| fields.get(*name).and_then(WireValue::as_number))
}

fn optional_id(
    fields: &BTreeMap<String, WireValue>,
    tag: &str,
) -> Result<Option<PlayerId>, ProtocolError> {
    let Some(raw) = fields.get("id").filter(|v| !v.is_nil()) else {
        return Ok(None);
    };

    let invalid = || ProtocolError::InvalidIdentifier {
        tag: tag.to_string(),
        value: format!("{raw:?}"),
    };

    let n = raw.coerce_number().ok_or_else(invalid)?;
    if n.fract() != 0.0 || n < 0.0 || n > f64::from(PlayerId::MAX) {
        return Err(invalid());
    }

    Ok(Some(n as PlayerId))
}

fn required_id(fields: &BTreeMap<String, WireValue>, tag: &str) -> Result<PlayerId, ProtocolError> {
    optional_id(fields, tag)?.ok_or_else(|| ProtocolError::MissingIdentifier(tag.to_string()))
}

/// Message validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Expected a keyed message, got {0}")]
    NotAMessage(&'static str),

    #[error("Array message {tag:?} too short to normalize ({len} elements)")]
    ShortArray { tag: String, len: usize },

    #[error("Message has no string `type` field")]
    MissingType,

    #[error("Unknown message type: {0}")]
    UnknownTag(String),

    #[error("{0} message has no identifier")]
    MissingIdentifier(String),

    #[error("Invalid identifier in {tag} message: {value}")]
    InvalidIdentifier { tag: String, value: String },
}

impl ProtocolError {
    /// Whether this is an identifier problem rather than a malformed frame
    pub fn is_identifier_error(&self) -> bool {
        matches!(self, Self::MissingIdentifier(_) | Self::InvalidIdentifier { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(pairs: &[(&str, WireValue)]) -> WireValue {
        WireValue::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn s(v: &str) -> WireValue {
        WireValue::Str(v.to_string())
    }

    #[test]
    fn parses_player_move_with_partial_fields() {
        let msg = ServerMsg::from_wire(keyed(&[
            ("type", s("PlayerMove")),
            ("id", WireValue::Int(3)),
            ("x", WireValue::Float(12.5)),
            ("vel_y", s("not a number")),
        ]))
        .unwrap();

        assert_eq!(
            msg,
            ServerMsg::PlayerMove {
                id: 3,
                x: Some(12.5),
                y: None,
                vel_x: None,
                vel_y: None,
            }
        );
    }

    #[test]
    fn string_ids_are_coerced() {
        let msg = ServerMsg::from_wire(keyed(&[("type", s("Joined")), ("id", s("12"))])).unwrap();
        assert_eq!(msg, ServerMsg::Joined { id: 12 });
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        let err = ServerMsg::from_wire(keyed(&[("type", s("Left")), ("id", s("bob"))])).unwrap_err();
        assert!(err.is_identifier_error());

        let err = ServerMsg::from_wire(keyed(&[("type", s("Left")), ("id", WireValue::Float(1.5))]))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidIdentifier { .. }));
    }

    #[test]
    fn missing_id_is_rejected_except_for_kick() {
        let err = ServerMsg::from_wire(keyed(&[("type", s("Joined"))])).unwrap_err();
        assert_eq!(err, ProtocolError::MissingIdentifier("Joined".into()));

        let msg = ServerMsg::from_wire(keyed(&[
            ("type", s("Kick")),
            ("x", WireValue::Int(10)),
            ("y", WireValue::Int(20)),
            ("dir_x", WireValue::Float(0.6)),
            ("dirY", WireValue::Float(0.8)),
        ]))
        .unwrap();
        assert_eq!(
            msg,
            ServerMsg::Kick {
                id: None,
                x: Some(10.0),
                y: Some(20.0),
                dir_x: Some(0.6),
                dir_y: Some(0.8),
            }
        );
    }

    #[test]
    fn kick_with_bad_id_is_rejected() {
        let err = ServerMsg::from_wire(keyed(&[("type", s("Kick")), ("id", s("x"))])).unwrap_err();
        assert!(err.is_identifier_error());
    }

    #[test]
    fn camel_case_direction_wins_when_both_numeric() {
        let msg = ServerMsg::from_wire(keyed(&[
            ("type", s("Kick")),
            ("dirX", WireValue::Int(1)),
            ("dir_x", WireValue::Int(-1)),
            ("dirY", s("bad")),
            ("dir_y", WireValue::Int(2)),
        ]))
        .unwrap();
        let ServerMsg::Kick { dir_x, dir_y, .. } = msg else {
            panic!("expected kick");
        };
        assert_eq!(dir_x, Some(1.0));
        assert_eq!(dir_y, Some(2.0));
    }

    #[test]
    fn rejects_unknown_tags_and_short_arrays() {
        let err = ServerMsg::from_wire(keyed(&[("type", s("Teleport"))])).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownTag("Teleport".into()));

        let err = ServerMsg::from_wire(WireValue::Array(vec![s("PlayerMove"), WireValue::Int(1)]))
            .unwrap_err();
        assert_eq!(err, ProtocolError::ShortArray { tag: "PlayerMove".into(), len: 2 });

        let err = ServerMsg::from_wire(WireValue::Int(4)).unwrap_err();
        assert_eq!(err, ProtocolError::NotAMessage("int"));
    }

    #[test]
    fn unnormalized_arrays_report_the_real_cause() {
        let err = ServerMsg::from_wire(WireValue::Array(vec![s("Dance"), WireValue::Int(1)]))
            .unwrap_err();
        assert_eq!(err, ProtocolError::UnknownTag("Dance".into()));

        let err = ServerMsg::from_wire(WireValue::Array(vec![WireValue::Int(9), WireValue::Int(1)]))
            .unwrap_err();
        assert_eq!(err, ProtocolError::MissingType);

        let err = ServerMsg::from_wire(WireValue::Array(vec![])).unwrap_err();
        assert_eq!(err, ProtocolError::MissingType);
    }

    #[test]
    fn client_fields_follow_wire_order() {
        let msg = ClientMsg::Kick { x: 1.0, y: 2.0, dir_x: 3.0, dir_y: 4.0 };
        assert_eq!(msg.tag(), "Kick");
        assert_eq!(msg.fields(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Direction::Outbound.schema_for("Move").unwrap().array_len(), 5);
        assert_eq!(Direction::Inbound.schema_for("Kick").unwrap().array_len(), 6);
    }
}
