//! Pan/zoom mapping between the display viewport and a floor image.
//!
//! The visible window is the part of image space currently shown; its size is
//! the image size divided by the zoom factor, and its top-left corner is
//! `(tx, ty)`. Every screen/image conversion in the crate goes through here.

use crate::constants::{MAX_ZOOM, MIN_ZOOM, PAN_SPEED};
use egui::{Pos2, Rect, Vec2};

/// Zoom factor and pan offset for one viewport over one floor image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Current zoom level (1.0 = whole image fills the viewport)
    pub scale: f32,
    /// Left edge of the visible window in image space
    pub tx: f32,
    /// Top edge of the visible window in image space
    pub ty: f32,
    viewport: Vec2,
    image_size: Vec2,
    min_scale: f32,
    max_scale: f32,
    pan_speed: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(
            egui::vec2(1.0, 1.0),
            egui::vec2(1.0, 1.0),
        )
    }
}

impl ViewTransform {
    /// An unzoomed, unpanned view of `image_size` shown in `viewport`.
    pub fn new(viewport: Vec2, image_size: Vec2) -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
            viewport: at_least_one(viewport),
            image_size: at_least_one(image_size),
            min_scale: MIN_ZOOM,
            max_scale: MAX_ZOOM,
            pan_speed: PAN_SPEED,
        }
    }

    /// Sets the zoom clamp range.
    pub fn with_zoom_limits(mut self, min_scale: f32, max_scale: f32) -> Self {
        self.min_scale = min_scale.min(max_scale);
        self.max_scale = max_scale.max(min_scale);
        self.scale = self.clamp_scale(self.scale);
        self
    }

    /// Sets the pan multiplier.
    pub fn with_pan_speed(mut self, pan_speed: f32) -> Self {
        self.pan_speed = pan_speed;
        self
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn image_size(&self) -> Vec2 {
        self.image_size
    }

    /// Updates the display size, e.g. after the window was resized.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = at_least_one(viewport);
    }

    /// Updates the image geometry, e.g. after switching floors.
    pub fn set_image_size(&mut self, image_size: Vec2) {
        self.image_size = at_least_one(image_size);
    }

    /// Back to zoom 1 with the image's top-left corner at the viewport's.
    pub fn reset(&mut self) {
        self.scale = self.clamp_scale(1.0);
        self.tx = 0.0;
        self.ty = 0.0;
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    /// Size of the visible window in image units.
    pub fn visible_window_size(&self) -> Vec2 {
        self.image_size / self.scale
    }

    /// The visible window in image space.
    pub fn visible_window(&self) -> Rect {
        Rect::from_min_size(egui::pos2(self.tx, self.ty), self.visible_window_size())
    }

    /// Converts viewport coordinates to image coordinates.
    ///
    /// # Arguments
    ///
    /// * `screen_pos` - Position relative to the viewport's top-left corner (pixels)
    ///
    /// # Returns
    ///
    /// The corresponding position in the floor image's intrinsic space
    pub fn screen_to_image(&self, screen_pos: Pos2) -> Pos2 {
        let window = self.visible_window_size();
        egui::pos2(
            self.tx + (screen_pos.x / self.viewport.x) * window.x,
            self.ty + (screen_pos.y / self.viewport.y) * window.y,
        )
    }

    /// Converts image coordinates to viewport coordinates; the inverse of
    /// [`Self::screen_to_image`].
    pub fn image_to_screen(&self, image_pos: Pos2) -> Pos2 {
        let window = self.visible_window_size();
        egui::pos2(
            (image_pos.x - self.tx) / window.x * self.viewport.x,
            (image_pos.y - self.ty) / window.y * self.viewport.y,
        )
    }

    /// Whether an image-space point lies on the image.
    pub fn contains_image_point(&self, image_pos: Pos2) -> bool {
        Rect::from_min_size(Pos2::ZERO, self.image_size).contains(image_pos)
    }

    /// Multiplies the zoom by `factor`, keeping the image point under `anchor` in place.
    ///
    /// # Returns
    ///
    /// `true` if the zoom level changed (it may not at the clamp limits, and
    /// never does for a non-finite or non-positive factor)
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let old_scale = self.scale;
        let new_scale = self.clamp_scale(old_scale * factor);
        if (new_scale - old_scale).abs() <= f32::EPSILON {
            return false;
        }

        // Image point under the pointer before the zoom
        let image_pos = self.screen_to_image(anchor);
        let rel = egui::vec2(anchor.x / self.viewport.x, anchor.y / self.viewport.y);

        self.scale = new_scale;
        let window = self.visible_window_size();
        self.tx = image_pos.x - rel.x * window.x;
        self.ty = image_pos.y - rel.y * window.y;
        true
    }

    /// One wheel notch of zoom in or out around `anchor`.
    pub fn zoom_step(&mut self, anchor: Pos2, step: f32, zoom_in: bool) -> bool {
        let factor = if zoom_in { step } else { 1.0 / step };
        self.zoom_at(anchor, factor)
    }

    /// Moves the view by a screen-space drag delta.
    ///
    /// Dragging right moves the window left, so the image follows the pointer.
    /// The delta is converted at the current zoom level.
    pub fn pan_by(&mut self, delta: Vec2) {
        let window = self.visible_window_size();
        self.tx -= delta.x * (window.x / self.viewport.x) * self.pan_speed;
        self.ty -= delta.y * (window.y / self.viewport.y) * self.pan_speed;
    }

    /// Zoom as a whole percentage, for status displays.
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }
}

fn at_least_one(size: Vec2) -> Vec2 {
    egui::vec2(size.x.max(1.0), size.y.max(1.0))
}
