pub mod codec;
pub mod store;

pub use codec::{CodecError, WireFormat};
pub use store::{SceneStore, StoreError};

/// Rotation applied to a moving shape on each animation tick, in radians.
pub const ROTATION_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Variant-specific geometry parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeKind {
    Star { vertices: i32, angle: f64 },
    Smiley { angle: f64 },
}

/// A drawable entity: position, size, color, and variant geometry.
///
/// `x`/`y` is the shape center; `contains` tests the axis-aligned box
/// around it. `moving` and `outline` are local presentation state and are
/// never carried on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub color: Rgb,
    pub moving: bool,
    pub outline: bool,
    pub kind: ShapeKind,
}

impl Shape {
    pub fn star(x: i32, y: i32, width: i32, height: i32, color: Rgb, vertices: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color,
            moving: true,
            outline: false,
            kind: ShapeKind::Star { vertices, angle: 0.0 },
        }
    }

    pub fn smiley(x: i32, y: i32, width: i32, height: i32, color: Rgb) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color,
            moving: true,
            outline: false,
            kind: ShapeKind::Smiley { angle: 0.0 },
        }
    }

    /// The tag carried next to every encoded payload of this shape.
    pub fn type_tag(&self) -> &'static str {
        match self.kind {
            ShapeKind::Star { .. } => "Star",
            ShapeKind::Smiley { .. } => "Smiley",
        }
    }

    pub fn stop(&mut self) {
        self.moving = false;
    }

    pub fn resume(&mut self) {
        self.moving = true;
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn show_outline(&mut self) {
        self.outline = true;
    }

    pub fn hide_outline(&mut self) {
        self.outline = false;
    }

    pub fn outline_visible(&self) -> bool {
        self.outline
    }

    pub fn angle(&self) -> f64 {
        match self.kind {
            ShapeKind::Star { angle, .. } | ShapeKind::Smiley { angle } => angle,
        }
    }

    /// Hit test against the center-based bounding box.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x - self.width / 2
            && px <= self.x + self.width / 2
            && py >= self.y - self.height / 2
            && py <= self.y + self.height / 2
    }

    /// One animation tick. Stopped shapes hold their angle.
    pub fn advance(&mut self) {
        if !self.moving {
            return;
        }
        match &mut self.kind {
            ShapeKind::Star { angle, .. } | ShapeKind::Smiley { angle } => {
                *angle += ROTATION_STEP;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_creation() {
        let star = Shape::star(100, 100, 80, 80, Rgb::new(255, 0, 0), 6);
        assert_eq!(star.type_tag(), "Star");
        assert!(star.is_moving());
        assert!(!star.outline_visible());
        assert_eq!(star.angle(), 0.0);
        match star.kind {
            ShapeKind::Star { vertices, .. } => assert_eq!(vertices, 6),
            _ => panic!("Wrong shape kind"),
        }
    }

    #[test]
    fn test_smiley_creation() {
        let smiley = Shape::smiley(50, 50, 50, 50, Rgb::new(0, 255, 255));
        assert_eq!(smiley.type_tag(), "Smiley");
        assert_eq!(smiley.angle(), 0.0);
    }

    #[test]
    fn test_contains_center_box() {
        let shape = Shape::smiley(100, 100, 50, 50, Rgb::new(0, 255, 255));
        assert!(shape.contains(100, 100));
        assert!(shape.contains(75, 75));
        assert!(shape.contains(125, 125));
        assert!(!shape.contains(126, 100));
        assert!(!shape.contains(100, 74));
    }

    #[test]
    fn test_advance_rotates_moving_shape() {
        let mut star = Shape::star(0, 0, 10, 10, Rgb::new(255, 0, 0), 5);
        star.advance();
        star.advance();
        assert!((star.angle() - 2.0 * ROTATION_STEP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_advance_holds_stopped_shape() {
        let mut smiley = Shape::smiley(0, 0, 10, 10, Rgb::new(0, 255, 255));
        smiley.stop();
        smiley.advance();
        assert_eq!(smiley.angle(), 0.0);

        smiley.resume();
        smiley.advance();
        assert!(smiley.angle() > 0.0);
    }

    #[test]
    fn test_outline_toggles() {
        let mut shape = Shape::star(0, 0, 10, 10, Rgb::new(255, 0, 0), 5);
        shape.show_outline();
        assert!(shape.outline_visible());
        shape.hide_outline();
        assert!(!shape.outline_visible());
    }
}
