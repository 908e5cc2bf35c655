//! Map camera state and drag-to-rotate.
//!
//! Dragging near an edge of the map rotates it like grabbing the rim of a
//! turntable: horizontal motion above the center turns the bearing one way
//! and below the center the other way, vertical motion likewise depends on
//! the side of the center the finger is on.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{GeoPoint, Result, Store};

/// Degrees of bearing per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.1;

pub const INCLINED_TILT: f32 = 60.0;
pub const STRAIGHT_TILT: f32 = 0.0;

pub const MIN_ZOOM: f32 = 12.0;
pub const MAX_ZOOM: f32 = 20.0;

const CAMERA_KEY: &str = "camera";

/// Size of the map on screen, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Viewport {
        Viewport { width, height }
    }

    /// Center on the pixel grid: odd sizes round down.
    pub fn center(&self) -> (f32, f32) {
        ((self.width / 2) as f32, (self.height / 2) as f32)
    }
}

/// One drag update: where the finger is and how far it moved since the last
/// update, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Drag {
    pub fn new(x: f32, y: f32, dx: f32, dy: f32) -> Drag {
        Drag { x, y, dx, dy }
    }

    /// Same touch point, opposite motion.
    pub fn inverse(&self) -> Drag {
        Drag::new(self.x, self.y, -self.dx, -self.dy)
    }
}

/// Maps any angle into `[0, 360)`. Non-finite input maps to north.
pub fn normalize_bearing(bearing: f32) -> f32 {
    if !bearing.is_finite() {
        return 0.0;
    }
    let b = bearing.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Folds a drag into a bearing.
pub fn update_bearing(bearing: f32, drag: &Drag, viewport: &Viewport) -> f32 {
    let bearing = normalize_bearing(bearing);
    if !drag.dx.is_finite() || !drag.dy.is_finite() {
        return bearing;
    }

    let (center_x, center_y) = viewport.center();
    let is_above_center = drag.y < center_y;
    let is_left_of_center = drag.x < center_x;

    let bearing = if is_above_center {
        normalize_bearing(bearing - drag.dx * DRAG_SENSITIVITY)
    } else {
        normalize_bearing(bearing + drag.dx * DRAG_SENSITIVITY)
    };

    if is_left_of_center {
        normalize_bearing(bearing + drag.dy * DRAG_SENSITIVITY)
    } else {
        normalize_bearing(bearing - drag.dy * DRAG_SENSITIVITY)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CameraPosition {
    pub target: GeoPoint,
    pub zoom: f32,
    pub tilt: f32,
    pub bearing: f32,
}

impl Default for CameraPosition {
    fn default() -> Self {
        CameraPosition {
            target: GeoPoint::default(),
            zoom: 0.0,
            tilt: INCLINED_TILT,
            bearing: 0.0,
        }
    }
}

impl CameraPosition {
    pub fn new(target: GeoPoint, zoom: f32, tilt: f32, bearing: f32) -> CameraPosition {
        CameraPosition {
            target,
            zoom,
            tilt,
            bearing: normalize_bearing(bearing),
        }
    }

    pub fn apply_drag(&mut self, drag: &Drag, viewport: &Viewport) {
        self.bearing = update_bearing(self.bearing, drag, viewport);
    }

    pub fn apply_drags<'a, I>(&mut self, drags: I, viewport: &Viewport)
    where
        I: IntoIterator<Item = &'a Drag>,
    {
        for drag in drags {
            self.apply_drag(drag, viewport);
        }
    }

    pub fn move_to(&mut self, target: GeoPoint) {
        self.target = target;
    }

    /// Non-finite zoom is ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn incline(&mut self) {
        self.tilt = INCLINED_TILT;
    }

    pub fn straighten(&mut self) {
        self.tilt = STRAIGHT_TILT;
    }

    pub fn is_inclined(&self) -> bool {
        self.tilt != STRAIGHT_TILT
    }
}

// Tilt is not persisted: the map always reopens inclined.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
struct SavedCamera {
    latitude: f64,
    longitude: f64,
    zoom: f32,
    bearing: f32,
}

pub fn save_camera(store: &Store, camera: &CameraPosition) -> Result<()> {
    let saved = SavedCamera {
        latitude: camera.target.latitude,
        longitude: camera.target.longitude,
        zoom: camera.zoom,
        bearing: camera.bearing,
    };
    store.write(CAMERA_KEY, &saved)?;
    info!(
        center = %camera.target,
        zoom = camera.zoom,
        bearing = camera.bearing,
        "camera saved"
    );
    Ok(())
}

pub fn load_camera(store: &Store) -> Result<CameraPosition> {
    let saved: SavedCamera = store.read(CAMERA_KEY)?.unwrap_or_default();
    Ok(CameraPosition::new(
        GeoPoint::new(saved.latitude, saved.longitude),
        saved.zoom,
        INCLINED_TILT,
        saved.bearing,
    ))
}
