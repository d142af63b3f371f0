//! Shape wire codec: fixed-field binary and self-describing JSON.
//!
//! Both forms carry the same field set and round-trip every encoded field:
//!
//! ```text
//! Binary (big-endian):
//! ┌────┬────┬───────┬────────┬───┬───┬───┬──────────────────┐
//! │ x  │ y  │ width │ height │ r │ g │ b │ variant trailing │
//! │ i32│ i32│ i32   │ i32    │i32│i32│i32│ Star: i32 + f64  │
//! └────┴────┴───────┴────────┴───┴───┴───┴ Smiley: f64 ─────┘
//!
//! JSON: { "x", "y", "width", "height", "r", "g", "b",
//!         "vertices" (Star only), "angle" }
//! ```
//!
//! Decode always dispatches on the explicit type tag next to the payload,
//! never on the payload itself. The `moving`/`outline` flags are local
//! state and are not wire fields; decoded shapes get constructor defaults.

use serde::{Deserialize, Serialize};

use crate::{Rgb, Shape, ShapeKind};

/// Which of the two payload encodings a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Fixed-order big-endian fields.
    Binary,
    /// Named-field JSON object.
    Json,
}

/// Shape payload decode failures.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Type tag is not in the registered variant set.
    UnknownShapeType(String),
    /// Binary payload ended before the fixed field set was complete.
    Truncated,
    /// Payload parsed but a field was out of range or missing.
    Malformed(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownShapeType(tag) => write!(f, "Unknown shape type: {tag}"),
            Self::Truncated => write!(f, "Truncated shape payload"),
            Self::Malformed(e) => write!(f, "Malformed shape payload: {e}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Flat serde view of a shape payload, shared by both Star and Smiley.
#[derive(Serialize, Deserialize)]
struct JsonShape {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    r: u8,
    g: u8,
    b: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    vertices: Option<i32>,
    #[serde(default)]
    angle: f64,
}

/// Encode one shape payload. The type tag travels separately.
pub fn encode(shape: &Shape, format: WireFormat) -> Result<Vec<u8>, CodecError> {
    match format {
        WireFormat::Binary => Ok(encode_binary(shape)),
        WireFormat::Json => encode_json(shape),
    }
}

/// Decode one shape payload, dispatching on `tag`.
pub fn decode(tag: &str, bytes: &[u8], format: WireFormat) -> Result<Shape, CodecError> {
    if tag != "Star" && tag != "Smiley" {
        return Err(CodecError::UnknownShapeType(tag.to_string()));
    }
    match format {
        WireFormat::Binary => decode_binary(tag, bytes),
        WireFormat::Json => decode_json(tag, bytes),
    }
}

fn encode_binary(shape: &Shape) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44);
    buf.extend_from_slice(&shape.x.to_be_bytes());
    buf.extend_from_slice(&shape.y.to_be_bytes());
    buf.extend_from_slice(&shape.width.to_be_bytes());
    buf.extend_from_slice(&shape.height.to_be_bytes());
    buf.extend_from_slice(&i32::from(shape.color.r).to_be_bytes());
    buf.extend_from_slice(&i32::from(shape.color.g).to_be_bytes());
    buf.extend_from_slice(&i32::from(shape.color.b).to_be_bytes());
    match shape.kind {
        ShapeKind::Star { vertices, angle } => {
            buf.extend_from_slice(&vertices.to_be_bytes());
            buf.extend_from_slice(&angle.to_be_bytes());
        }
        ShapeKind::Smiley { angle } => {
            buf.extend_from_slice(&angle.to_be_bytes());
        }
    }
    buf
}

fn decode_binary(tag: &str, bytes: &[u8]) -> Result<Shape, CodecError> {
    let mut pos = 0;
    let x = read_i32(bytes, &mut pos)?;
    let y = read_i32(bytes, &mut pos)?;
    let width = read_i32(bytes, &mut pos)?;
    let height = read_i32(bytes, &mut pos)?;
    let r = read_channel(bytes, &mut pos)?;
    let g = read_channel(bytes, &mut pos)?;
    let b = read_channel(bytes, &mut pos)?;

    let kind = match tag {
        "Star" => {
            let vertices = read_i32(bytes, &mut pos)?;
            let angle = read_f64(bytes, &mut pos)?;
            ShapeKind::Star { vertices, angle }
        }
        _ => {
            let angle = read_f64(bytes, &mut pos)?;
            ShapeKind::Smiley { angle }
        }
    };

    build(x, y, width, height, Rgb::new(r, g, b), kind)
}

fn encode_json(shape: &Shape) -> Result<Vec<u8>, CodecError> {
    let (vertices, angle) = match shape.kind {
        ShapeKind::Star { vertices, angle } => (Some(vertices), angle),
        ShapeKind::Smiley { angle } => (None, angle),
    };
    let repr = JsonShape {
        x: shape.x,
        y: shape.y,
        width: shape.width,
        height: shape.height,
        r: shape.color.r,
        g: shape.color.g,
        b: shape.color.b,
        vertices,
        angle,
    };
    serde_json::to_vec(&repr).map_err(|e| CodecError::Malformed(e.to_string()))
}

fn decode_json(tag: &str, bytes: &[u8]) -> Result<Shape, CodecError> {
    let repr: JsonShape =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let kind = match tag {
        "Star" => {
            let vertices = repr
                .vertices
                .ok_or_else(|| CodecError::Malformed("Star without vertices".to_string()))?;
            ShapeKind::Star { vertices, angle: repr.angle }
        }
        _ => ShapeKind::Smiley { angle: repr.angle },
    };
    build(
        repr.x,
        repr.y,
        repr.width,
        repr.height,
        Rgb::new(repr.r, repr.g, repr.b),
        kind,
    )
}

fn build(x: i32, y: i32, width: i32, height: i32, color: Rgb, kind: ShapeKind) -> Result<Shape, CodecError> {
    if width < 0 || height < 0 {
        return Err(CodecError::Malformed(format!("negative size {width}x{height}")));
    }
    if let ShapeKind::Star { vertices, .. } = kind {
        if vertices < 3 {
            return Err(CodecError::Malformed(format!("star with {vertices} vertices")));
        }
    }
    Ok(Shape {
        x,
        y,
        width,
        height,
        color,
        moving: true,
        outline: false,
        kind,
    })
}

fn read_i32(bytes: &[u8], pos: &mut usize) -> Result<i32, CodecError> {
    let end = *pos + 4;
    let slice = bytes.get(*pos..end).ok_or(CodecError::Truncated)?;
    *pos = end;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(slice);
    Ok(i32::from_be_bytes(raw))
}

fn read_f64(bytes: &[u8], pos: &mut usize) -> Result<f64, CodecError> {
    let end = *pos + 8;
    let slice = bytes.get(*pos..end).ok_or(CodecError::Truncated)?;
    *pos = end;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(slice);
    Ok(f64::from_be_bytes(raw))
}

fn read_channel(bytes: &[u8], pos: &mut usize) -> Result<u8, CodecError> {
    let v = read_i32(bytes, pos)?;
    u8::try_from(v).map_err(|_| CodecError::Malformed(format!("color channel {v} out of range")))
}
