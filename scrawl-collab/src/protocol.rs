//! Length-framed binary protocol for scene synchronization.
//!
//! Wire format, one frame per message:
//! ```text
//! ┌──────────────┬──────────────┬───────────────────────┐
//! │ length       │ discriminant │ body                  │
//! │ 4 bytes (BE) │ 1 byte       │ bincode, per variant  │
//! └──────────────┴──────────────┴───────────────────────┘
//! ```
//! The length header counts discriminant + body, so partial reads can be
//! resumed without ambiguity. Shape payloads inside message bodies are
//! opaque bytes produced by `scrawl_core::codec` and travel next to their
//! type tag; this layer never inspects them.
//!
//! The protocol is not strictly request/response ordered: either side may
//! push `ClearObjects` or `ResponseObject` unsolicited at any time.

use serde::{Deserialize, Serialize};

/// Length header width in bytes.
pub const HEADER_LEN: usize = 4;

/// Upper bound on one frame's payload. A header above this is taken as a
/// desynchronized or corrupt stream, not a huge message.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

const CLEAR_OBJECTS: u8 = 1;
const RESPONSE_OBJECT: u8 = 2;
const RESPONSE_OBJECT_BY_INDEX: u8 = 3;
const RESPONSE_OBJECT_LIST_SIZE: u8 = 4;
const RESPONSE_OBJECT_LIST: u8 = 5;
const REQUEST_OBJECT_LIST: u8 = 6;
const REQUEST_OBJECT_LIST_SIZE: u8 = 7;
const REQUEST_OBJECT_BY_INDEX: u8 = 8;

/// One encoded shape: its type tag plus the codec payload.
pub type TaggedShape = (String, Vec<u8>);

/// The closed protocol vocabulary.
///
/// A `Message` is a value: constructed, serialized, sent, discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Unsolicited: empty the peer's scene.
    ClearObjects,
    /// Unsolicited broadcast of one locally-edited shape.
    ResponseObject { tag: String, payload: Vec<u8> },
    /// Reply to `RequestObjectByIndex`.
    ResponseObjectByIndex { index: u32, tag: String, payload: Vec<u8> },
    /// Reply to `RequestObjectListSize`.
    ResponseObjectListSize { size: u32 },
    /// Reply to `RequestObjectList`.
    ResponseObjectList { objects: Vec<TaggedShape> },
    /// Pull the peer's full scene.
    RequestObjectList,
    /// Pull the peer's shape count.
    RequestObjectListSize,
    /// Pull one shape; the requester checks index validity beforehand.
    RequestObjectByIndex { index: u32 },
}

/// Framing and message-body failures.
#[derive(Debug)]
pub enum WireError {
    /// Corrupt length header or truncated frame. Connection-fatal: the
    /// stream is assumed desynchronized.
    Framing(String),
    /// Discriminant not in the protocol vocabulary. Non-fatal for the
    /// session; the frame boundary is already known.
    UnknownVariant(u8),
    /// Variant body failed to decode. Non-fatal per message.
    Body(String),
    /// Shape payload failed to decode.
    Codec(scrawl_core::CodecError),
    /// The link is gone.
    Closed,
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Framing(e) => write!(f, "Framing error: {e}"),
            Self::UnknownVariant(d) => write!(f, "Unknown message discriminant: {d}"),
            Self::Body(e) => write!(f, "Message body error: {e}"),
            Self::Codec(e) => write!(f, "Shape codec error: {e}"),
            Self::Closed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for WireError {}

impl From<scrawl_core::CodecError> for WireError {
    fn from(e: scrawl_core::CodecError) -> Self {
        Self::Codec(e)
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| WireError::Body(e.to_string()))
}

fn from_body<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, WireError> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| WireError::Body(e.to_string()))?;
    Ok(value)
}

impl Message {
    /// Wire discriminant identifying this variant.
    pub const fn discriminant(&self) -> u8 {
        match self {
            Self::ClearObjects => CLEAR_OBJECTS,
            Self::ResponseObject { .. } => RESPONSE_OBJECT,
            Self::ResponseObjectByIndex { .. } => RESPONSE_OBJECT_BY_INDEX,
            Self::ResponseObjectListSize { .. } => RESPONSE_OBJECT_LIST_SIZE,
            Self::ResponseObjectList { .. } => RESPONSE_OBJECT_LIST,
            Self::RequestObjectList => REQUEST_OBJECT_LIST,
            Self::RequestObjectListSize => REQUEST_OBJECT_LIST_SIZE,
            Self::RequestObjectByIndex { .. } => REQUEST_OBJECT_BY_INDEX,
        }
    }

    /// Serialize to one complete frame, length header included.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let body = self.encode_body()?;
        let payload_len = 1 + body.len();
        if payload_len > MAX_FRAME_LEN {
            return Err(WireError::Framing(format!("payload of {payload_len} bytes exceeds frame limit")));
        }
        let mut frame = Vec::with_capacity(HEADER_LEN + payload_len);
        frame.extend_from_slice(&(payload_len as u32).to_be_bytes());
        frame.push(self.discriminant());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Deserialize one complete frame, length header included.
    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        if frame.len() < HEADER_LEN {
            return Err(WireError::Framing("truncated length header".to_string()));
        }
        let declared =
            u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        if declared > MAX_FRAME_LEN {
            return Err(WireError::Framing(format!("length header {declared} exceeds frame limit")));
        }
        let payload = &frame[HEADER_LEN..];
        if payload.len() != declared {
            return Err(WireError::Framing(format!(
                "frame carries {} payload bytes, header declares {declared}",
                payload.len()
            )));
        }
        Self::decode_payload(payload)
    }

    /// Deserialize a frame payload whose length header was already consumed.
    pub fn decode_payload(payload: &[u8]) -> Result<Self, WireError> {
        let (&disc, body) = payload
            .split_first()
            .ok_or_else(|| WireError::Framing("empty frame payload".to_string()))?;
        match disc {
            CLEAR_OBJECTS => Ok(Self::ClearObjects),
            RESPONSE_OBJECT => {
                let (tag, payload) = from_body::<TaggedShape>(body)?;
                Ok(Self::ResponseObject { tag, payload })
            }
            RESPONSE_OBJECT_BY_INDEX => {
                let (index, tag, payload) = from_body::<(u32, String, Vec<u8>)>(body)?;
                Ok(Self::ResponseObjectByIndex { index, tag, payload })
            }
            RESPONSE_OBJECT_LIST_SIZE => {
                let size = from_body::<u32>(body)?;
                Ok(Self::ResponseObjectListSize { size })
            }
            RESPONSE_OBJECT_LIST => {
                let objects = from_body::<Vec<TaggedShape>>(body)?;
                Ok(Self::ResponseObjectList { objects })
            }
            REQUEST_OBJECT_LIST => Ok(Self::RequestObjectList),
            REQUEST_OBJECT_LIST_SIZE => Ok(Self::RequestObjectListSize),
            REQUEST_OBJECT_BY_INDEX => {
                let index = from_body::<u32>(body)?;
                Ok(Self::RequestObjectByIndex { index })
            }
            other => Err(WireError::UnknownVariant(other)),
        }
    }

    fn encode_body(&self) -> Result<Vec<u8>, WireError> {
        match self {
            Self::ClearObjects | Self::RequestObjectList | Self::RequestObjectListSize => {
                Ok(Vec::new())
            }
            Self::ResponseObject { tag, payload } => to_body(&(tag, payload)),
            Self::ResponseObjectByIndex { index, tag, payload } => {
                to_body(&(index, tag, payload))
            }
            Self::ResponseObjectListSize { size } => to_body(size),
            Self::ResponseObjectList { objects } => to_body(objects),
            Self::RequestObjectByIndex { index } => to_body(index),
        }
    }
}
