//! Zoom and pan
//!
//! `screen = world * k + (x, y)`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::bounds::{Bounds, Point, Size};

/// Allowed zoom scale range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 0.1, max: 8.0 }
    }
}

impl ZoomRange {
    pub fn clamp(&self, k: f64) -> f64 {
        k.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Scale by `factor`, keeping the world point under `anchor` fixed
    pub fn zoom_at(&mut self, factor: f64, anchor: Point, range: ZoomRange) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let new_k = range.clamp(self.k * factor);
        let ratio = new_k / self.k;
        self.x = anchor.x - (anchor.x - self.x) * ratio;
        self.y = anchor.y - (anchor.y - self.y) * ratio;
        self.k = new_k;
    }

    /// Transform placing world point `center` in the middle of the viewport
    pub fn centered_on(center: Point, viewport: Size, k: f64) -> Self {
        Self::new(
            viewport.width / 2.0 - center.x * k,
            viewport.height / 2.0 - center.y * k,
            k,
        )
    }

    /// Fit `bounds` (grown by `padding`) into the viewport, never zooming in
    /// past `max_k`; zero-extent bounds get scale 1
    pub fn fit(bounds: Bounds, viewport: Size, padding: f64, max_k: f64, range: ZoomRange) -> Self {
        let k = if bounds.is_degenerate() {
            1.0
        } else {
            let padded = bounds.padded(padding);
            (viewport.width / padded.width())
                .min(viewport.height / padded.height())
                .min(max_k)
        };
        Self::centered_on(bounds.center(), viewport, range.clamp(k))
    }

    /// World rectangle currently visible
    pub fn visible_world(&self, viewport: Size) -> Bounds {
        let a = self.screen_to_world(Point::new(0.0, 0.0));
        let b = self.screen_to_world(Point::new(viewport.width, viewport.height));
        Bounds::new(a.x, a.y, b.x, b.y)
    }

    pub fn lerp(&self, to: &ViewTransform, t: f64) -> ViewTransform {
        ViewTransform::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.k + (to.k - self.k) * t,
        )
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Eased transition between two transforms
#[derive(Debug, Clone, PartialEq)]
pub struct TransformAnimation {
    from: ViewTransform,
    to: ViewTransform,
    duration: Duration,
    elapsed: Duration,
}

impl TransformAnimation {
    pub fn new(from: ViewTransform, to: ViewTransform, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Step forward and return the transform for the new time
    pub fn advance(&mut self, dt: Duration) -> ViewTransform {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.current()
    }

    pub fn current(&self) -> ViewTransform {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp(&self.to, ease_out_cubic(t))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn target(&self) -> ViewTransform {
        self.to
    }
}
