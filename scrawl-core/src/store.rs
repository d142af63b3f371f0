//! The shared, ordered shape collection each endpoint keeps locally.
//!
//! All mutation and all iteration for rendering or motion goes through
//! this type, so the redraw loop, the animation tick, and the network
//! receive loop contend on exactly one lock. Readers take `snapshot()`
//! and never observe a partially-applied mutation; every operation holds
//! the lock for its full extent, so each inbound-message handler is
//! atomic.
//!
//! Insertion order is the sole index identity used by index-addressed
//! protocol operations. Indices are stable within one handling turn but
//! shift after `clear` or removal.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Shape;

/// Mutation addressed at a stale or invalid index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreError {
    pub index: usize,
    pub len: usize,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Index {} out of range for {} shapes", self.index, self.len)
    }
}

impl std::error::Error for StoreError {}

/// Ordered, index-addressable collection of shapes.
#[derive(Debug, Default)]
pub struct SceneStore {
    shapes: RwLock<Vec<Shape>>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Shape>> {
        self.shapes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Shape>> {
        self.shapes.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, shape: Shape) {
        self.write().push(shape);
    }

    pub fn replace_at(&self, index: usize, shape: Shape) -> Result<(), StoreError> {
        let mut shapes = self.write();
        match shapes.get_mut(index) {
            Some(slot) => {
                *slot = shape;
                Ok(())
            }
            None => Err(StoreError { index, len: shapes.len() }),
        }
    }

    /// Remove every shape matching the predicate; returns how many went.
    pub fn remove_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&Shape) -> bool,
    {
        let mut shapes = self.write();
        let before = shapes.len();
        shapes.retain(|s| !pred(s));
        let removed = before - shapes.len();
        if removed > 0 {
            log::debug!("Removed {removed} of {before} shapes");
        }
        removed
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Read-only copy, safe to iterate while mutation continues elsewhere.
    pub fn snapshot(&self) -> Vec<Shape> {
        self.read().clone()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn shape_at(&self, index: usize) -> Option<Shape> {
        self.read().get(index).cloned()
    }

    /// One animation tick over every moving shape.
    pub fn advance_motion(&self) {
        for shape in self.write().iter_mut() {
            shape.advance();
        }
    }

    pub fn stop_all(&self) {
        for shape in self.write().iter_mut() {
            shape.stop();
        }
    }

    pub fn resume_all(&self) {
        for shape in self.write().iter_mut() {
            shape.resume();
        }
    }

    pub fn set_outline_all(&self, visible: bool) {
        for shape in self.write().iter_mut() {
            if visible {
                shape.show_outline();
            } else {
                shape.hide_outline();
            }
        }
    }

    /// Remove every shape whose bounding box contains the point.
    pub fn remove_at_point(&self, x: i32, y: i32) -> usize {
        self.remove_where(|s| s.contains(x, y))
    }

    /// Toggle motion on the first shape containing the point.
    pub fn toggle_motion_at_point(&self, x: i32, y: i32) -> bool {
        let mut shapes = self.write();
        if let Some(shape) = shapes.iter_mut().find(|s| s.contains(x, y)) {
            if shape.is_moving() {
                shape.stop();
            } else {
                shape.resume();
            }
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rgb, ROTATION_STEP};

    fn store_with(n: usize) -> SceneStore {
        let store = SceneStore::new();
        for i in 0..n {
            store.append(Shape::smiley(i as i32 * 10, 0, 50, 50, Rgb::new(0, 255, 255)));
        }
        store
    }

    #[test]
    fn test_append_and_count() {
        let store = store_with(3);
        assert_eq!(store.count(), 3);
        assert_eq!(store.snapshot().len(), 3);
    }

    #[test]
    fn test_insertion_order_is_index_identity() {
        let store = SceneStore::new();
        store.append(Shape::star(1, 0, 10, 10, Rgb::new(255, 0, 0), 5));
        store.append(Shape::smiley(2, 0, 10, 10, Rgb::new(0, 255, 255)));
        let snap = store.snapshot();
        assert_eq!(snap[0].x, 1);
        assert_eq!(snap[1].x, 2);
        assert_eq!(store.shape_at(1).unwrap().type_tag(), "Smiley");
    }

    #[test]
    fn test_replace_at_in_bounds() {
        let store = store_with(2);
        let star = Shape::star(99, 99, 10, 10, Rgb::new(255, 0, 0), 7);
        store.replace_at(1, star).unwrap();
        assert_eq!(store.shape_at(1).unwrap().type_tag(), "Star");
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_replace_at_out_of_range() {
        let store = store_with(2);
        let star = Shape::star(0, 0, 10, 10, Rgb::new(255, 0, 0), 5);
        let err = store.replace_at(2, star.clone()).unwrap_err();
        assert_eq!(err, StoreError { index: 2, len: 2 });
        assert!(store.replace_at(12, star).is_err());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = store_with(4);
        store.clear();
        assert_eq!(store.count(), 0);
        store.clear();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_remove_where() {
        let store = SceneStore::new();
        store.append(Shape::star(0, 0, 10, 10, Rgb::new(255, 0, 0), 5));
        store.append(Shape::smiley(100, 0, 10, 10, Rgb::new(0, 255, 255)));
        let removed = store.remove_where(|s| s.type_tag() == "Star");
        assert_eq!(removed, 1);
        assert_eq!(store.count(), 1);
        assert_eq!(store.shape_at(0).unwrap().type_tag(), "Smiley");
    }

    #[test]
    fn test_remove_at_point() {
        let store = store_with(2);
        // Shapes at x=0 and x=10 with 50x50 boxes overlap both points
        assert_eq!(store.remove_at_point(5, 5), 2);
        assert_eq!(store.count(), 0);
        assert_eq!(store.remove_at_point(5, 5), 0);
    }

    #[test]
    fn test_advance_motion_skips_stopped() {
        let store = store_with(2);
        store.toggle_motion_at_point(0, 0);
        store.advance_motion();
        let snap = store.snapshot();
        // First shape contains (0,0) and was stopped before the tick
        assert_eq!(snap[0].angle(), 0.0);
        assert!((snap[1].angle() - ROTATION_STEP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stop_resume_all() {
        let store = store_with(3);
        store.stop_all();
        assert!(store.snapshot().iter().all(|s| !s.is_moving()));
        store.resume_all();
        assert!(store.snapshot().iter().all(|s| s.is_moving()));
    }

    #[test]
    fn test_outline_sweep() {
        let store = store_with(2);
        store.set_outline_all(true);
        assert!(store.snapshot().iter().all(|s| s.outline_visible()));
        store.set_outline_all(false);
        assert!(store.snapshot().iter().all(|s| !s.outline_visible()));
    }

    #[test]
    fn test_toggle_motion_miss() {
        let store = store_with(1);
        assert!(!store.toggle_motion_at_point(1000, 1000));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = store_with(1);
        let snap = store.snapshot();
        store.clear();
        assert_eq!(snap.len(), 1);
        assert_eq!(store.count(), 0);
    }
}
