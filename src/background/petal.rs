use super::{
    Viewport,
    color::{Color, hsl_to_rgb},
    surface::DrawingSurface,
};
use fastrand::Rng;
use std::{f32::consts::TAU, ops::Range};

/// How far below the viewport a petal falls before it's recycled.
pub(crate) const RESET_MARGIN: f32 = 100.0;

/// How far above the viewport recycled petals start.
pub(crate) const SPAWN_HEIGHT: f32 = 100.0;

const SIZE: Range<f32> = 5.0..20.0;
const SPEED: Range<f32> = 0.5..1.5;
const ROTATION_SPEED: Range<f32> = -1.0..1.0;
const SWING_AMOUNT: Range<f32> = 0.0..3.0;
const SWING_SPEED: Range<f32> = 0.0..0.02;
const OPACITY: Range<f32> = 0.4..1.0;
const HUE: Range<f32> = 330.0..360.0;

const SATURATION: f32 = 100.0;
const LIGHTNESS: f32 = 80.0;

fn uniform(rng: &mut Rng, range: Range<f32>) -> f32 {
    range.start + rng.f32() * (range.end - range.start)
}

/// A single falling petal.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Petal {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) size: f32,
    /// Vertical distance covered per frame.
    pub(crate) speed: f32,
    /// Rotation in degrees.
    pub(crate) rotation: f32,
    pub(crate) rotation_speed: f32,
    /// Horizontal swing amplitude.
    pub(crate) swing_amount: f32,
    /// Swing angular frequency, applied to the vertical position.
    pub(crate) swing_speed: f32,
    pub(crate) swing_offset: f32,
    pub(crate) opacity: f32,
    pub(crate) hue: f32,
}

impl Petal {
    /// Create a petal somewhere above the viewport with randomized parameters.
    pub(crate) fn spawn(rng: &mut Rng, viewport: &Viewport) -> Self {
        Self {
            x: uniform(rng, 0.0..viewport.width),
            y: uniform(rng, -SPAWN_HEIGHT..0.0),
            size: uniform(rng, SIZE),
            speed: uniform(rng, SPEED),
            rotation: uniform(rng, 0.0..360.0),
            rotation_speed: uniform(rng, ROTATION_SPEED),
            swing_amount: uniform(rng, SWING_AMOUNT),
            swing_speed: uniform(rng, SWING_SPEED),
            swing_offset: uniform(rng, 0.0..TAU),
            opacity: uniform(rng, OPACITY),
            hue: uniform(rng, HUE),
        }
    }

    /// Advance this petal by one frame.
    pub(crate) fn update(&mut self, rng: &mut Rng, viewport: &Viewport) {
        self.y += self.speed;
        self.x += (self.y * self.swing_speed + self.swing_offset).sin() * self.swing_amount;
        self.rotation += self.rotation_speed;

        if self.y > viewport.height + RESET_MARGIN {
            self.y = uniform(rng, -SPAWN_HEIGHT..0.0);
            self.x = uniform(rng, 0.0..viewport.width);
        }
    }

    pub(crate) fn color(&self) -> Color {
        hsl_to_rgb(self.hue, SATURATION, LIGHTNESS)
    }

    pub(crate) fn draw<S: DrawingSurface + ?Sized>(&self, surface: &mut S) {
        surface.save();
        surface.translate(self.x, self.y);
        surface.rotate(self.rotation.to_radians());
        surface.set_global_alpha(self.opacity);
        surface.fill_ellipse(0.0, 0.0, self.size, self.size / 2.0, self.color(), self.opacity);
        surface.restore();
    }
}
