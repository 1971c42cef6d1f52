//! The falling-petal background.

mod color;
mod petal;
mod surface;

pub(crate) use color::Color;
pub(crate) use petal::Petal;
pub(crate) use surface::{DrawingSurface, Raster};

#[cfg(test)]
pub(crate) use surface::tests as surface_tests;

use fastrand::Rng;

/// Default number of viewport units of width per petal.
pub(crate) const DEFAULT_DENSITY: f32 = 15.0;

/// The size of the visible area, in viewport units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Continuously animates a fixed set of petals onto a drawing surface.
pub(crate) struct PetalAnimation<S> {
    surface: S,
    viewport: Viewport,
    petals: Vec<Petal>,
    rng: Rng,
}

impl<S: DrawingSurface> PetalAnimation<S> {
    /// Size the surface to the viewport and populate the petals.
    ///
    /// The number of petals is proportional to the viewport's width and never changes after
    /// this point.
    pub(crate) fn initialize(mut surface: S, viewport: Viewport, density: f32, mut rng: Rng) -> Self {
        surface.resize(viewport.width, viewport.height);
        let count = petal_count(viewport.width, density);
        let petals = (0..count).map(|_| Petal::spawn(&mut rng, &viewport)).collect();
        tracing::debug!(count, width = viewport.width, height = viewport.height, "petal animation initialized");
        Self { surface, viewport, petals, rng }
    }

    /// Resize the surface. Existing petals are kept as they are.
    pub(crate) fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.surface.resize(viewport.width, viewport.height);
    }

    /// Advance every petal by one frame and redraw the surface.
    pub(crate) fn tick(&mut self) {
        for petal in &mut self.petals {
            petal.update(&mut self.rng, &self.viewport);
        }

        self.surface.clear_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
        for petal in &self.petals {
            petal.draw(&mut self.surface);
        }
    }

    pub(crate) fn surface(&self) -> &S {
        &self.surface
    }

    pub(crate) fn petals(&self) -> &[Petal] {
        &self.petals
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }
}

fn petal_count(width: f32, density: f32) -> usize {
    if density <= 0.0 || width <= 0.0 {
        return 0;
    }
    (width / density).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::{petal::RESET_MARGIN, surface::tests::RecordingSurface, *};
    use rstest::rstest;

    fn animation(width: f32, height: f32) -> PetalAnimation<RecordingSurface> {
        let viewport = Viewport { width, height };
        PetalAnimation::initialize(RecordingSurface::default(), viewport, DEFAULT_DENSITY, Rng::with_seed(42))
    }

    #[rstest]
    #[case(1500.0, 100)]
    #[case(640.0, 42)]
    #[case(14.0, 0)]
    #[case(0.0, 0)]
    fn petal_count_follows_width(#[case] width: f32, #[case] expected: usize) {
        assert_eq!(animation(width, 400.0).petals().len(), expected);
    }

    #[test]
    fn initialize_sizes_surface() {
        let animation = animation(300.0, 200.0);
        assert_eq!(animation.surface().calls, ["resize 300 200"]);
    }

    #[test]
    fn resize_keeps_petals() {
        let mut animation = animation(300.0, 200.0);
        let petals = animation.petals().to_vec();
        animation.resize(Viewport { width: 900.0, height: 500.0 });
        assert_eq!(animation.petals(), petals.as_slice());
        assert_eq!(animation.viewport(), Viewport { width: 900.0, height: 500.0 });
        assert_eq!(animation.surface().calls.last().map(String::as_str), Some("resize 900 500"));
    }

    #[test]
    fn tick_clears_then_draws_every_petal() {
        let mut animation = animation(150.0, 100.0);
        animation.tick();
        let calls = &animation.surface().calls[1..];
        assert_eq!(calls[0], "clear 0 0 150 100");
        let ellipses = calls.iter().filter(|call| *call == "ellipse").count();
        assert_eq!(ellipses, 10);
    }

    #[test]
    fn petals_stay_within_cycle() {
        let height = 120.0;
        let mut animation = animation(300.0, height);
        for _ in 0..5_000 {
            animation.tick();
            for petal in animation.petals() {
                // At most one frame's fall past the reset line, since resets happen in the same tick.
                assert!(petal.y <= height + RESET_MARGIN);
                assert!(petal.y >= -100.0);
            }
        }
    }

    #[test]
    fn petals_eventually_wrap() {
        let mut animation = animation(300.0, 50.0);
        let mut wrapped = false;
        let mut previous: Vec<f32> = animation.petals().iter().map(|p| p.y).collect();
        for _ in 0..1_000 {
            animation.tick();
            for (petal, before) in animation.petals().iter().zip(&previous) {
                if petal.y < *before {
                    assert!(petal.y < 0.0);
                    wrapped = true;
                }
            }
            previous = animation.petals().iter().map(|p| p.y).collect();
        }
        assert!(wrapped);
    }

    #[test]
    fn raster_backed_animation_paints() {
        let backdrop = Color::new(0, 0, 0);
        let viewport = Viewport { width: 1500.0, height: 160.0 };
        let mut animation = PetalAnimation::initialize(Raster::new(2.0, backdrop), viewport, 15.0, Rng::with_seed(9));
        for _ in 0..300 {
            animation.tick();
        }
        let raster = animation.surface();
        let painted = (0..raster.rows())
            .flat_map(|row| (0..raster.columns()).map(move |column| (column, row)))
            .filter(|(column, row)| raster.pixel(*column, *row) != Some(backdrop))
            .count();
        assert!(painted > 0);
    }
}
