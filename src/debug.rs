use crate::math::Point2d;
#[cfg(feature = "debug")]
use once_cell::sync::Lazy;
#[cfg(feature = "debug")]
use parking_lot::Mutex;
#[cfg(feature = "debug")]
use serde_json::json;

// Shared by all workers of the stage.
#[cfg(feature = "debug")]
static DEBUG_FRAME: Lazy<Mutex<Vec<serde_json::Value>>> = Lazy::new(Default::default);

#[allow(unused)]
pub fn debug_line(name: &str, p1: Point2d, p2: Point2d) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.lock().push(json!({
        "type": "line",
        "name": name,
        "p1": [p1.x, p1.y],
        "p2": [p2.x, p2.y],
    }))
}

/// Records the edges of a boundary as lines.
#[allow(unused)]
pub fn debug_boundary(name: &str, boundary: &[Point2d]) {
    #[cfg(feature = "debug")]
    for [p1, p2] in crate::math::edges(boundary) {
        debug_line(name, p1, p2);
    }
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(std::mem::take(&mut *DEBUG_FRAME.lock()))
}
