use super::color::Color;

/// A 2D drawing surface the background is painted on.
///
/// All coordinates are expressed in viewport units. Transformations apply to every
/// subsequent fill until the matching [DrawingSurface::restore].
pub(crate) trait DrawingSurface {
    /// Resize the surface, discarding its contents.
    fn resize(&mut self, width: f32, height: f32);

    /// Clear a rectangle back to the surface's backdrop.
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Push the current transform and alpha.
    fn save(&mut self);

    /// Pop the last saved transform and alpha. Unbalanced calls are ignored.
    fn restore(&mut self);

    fn translate(&mut self, x: f32, y: f32);

    /// Rotate by the given angle in radians.
    fn rotate(&mut self, radians: f32);

    fn set_global_alpha(&mut self, alpha: f32);

    /// Fill an axis aligned (in the current transform) ellipse centered at `(x, y)`.
    fn fill_ellipse(&mut self, x: f32, y: f32, radius_x: f32, radius_y: f32, color: Color, alpha: f32);
}

/// A 2D affine transform in the same layout canvas APIs use: `[a, b, c, d, e, f]`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Transform {
    const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn translate(self, x: f32, y: f32) -> Self {
        Self { e: self.a * x + self.c * y + self.e, f: self.b * x + self.d * y + self.f, ..self }
    }

    fn rotate(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..self
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        let e = -(a * self.e + c * self.f);
        let f = -(b * self.e + d * self.f);
        Some(Self { a, b, c, d, e, f })
    }
}

#[derive(Clone, Copy, Debug)]
struct DrawState {
    transform: Transform,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self { transform: Transform::IDENTITY, alpha: 1.0 }
    }
}

/// A software rasterizer backing the terminal background.
///
/// Each pixel covers a `pixel_size` x `pixel_size` square of viewport units and is sampled at
/// its center.
#[derive(Clone, Debug)]
pub(crate) struct Raster {
    width: f32,
    height: f32,
    pixel_size: f32,
    columns: usize,
    rows: usize,
    backdrop: Color,
    pixels: Vec<Color>,
    state: DrawState,
    saved: Vec<DrawState>,
}

impl Raster {
    pub(crate) fn new(pixel_size: f32, backdrop: Color) -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_size: pixel_size.max(1.0),
            columns: 0,
            rows: 0,
            backdrop,
            pixels: Vec::new(),
            state: DrawState::default(),
            saved: Vec::new(),
        }
    }

    pub(crate) fn columns(&self) -> usize {
        self.columns
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    /// Get the color at a pixel, if it's within bounds.
    pub(crate) fn pixel(&self, column: usize, row: usize) -> Option<Color> {
        if column >= self.columns {
            return None;
        }
        self.pixels.get(row * self.columns + column).copied()
    }

    fn pixel_range(&self, start: f32, end: f32, limit: usize) -> (usize, usize) {
        let first = (start / self.pixel_size).floor().max(0.0) as usize;
        let last = ((end / self.pixel_size).ceil().max(0.0) as usize).min(limit);
        let first = first.min(limit);
        (first, last.max(first))
    }
}

impl DrawingSurface for Raster {
    fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.columns = (self.width / self.pixel_size).ceil() as usize;
        self.rows = (self.height / self.pixel_size).ceil() as usize;
        self.pixels = vec![self.backdrop; self.columns * self.rows];
        self.state = DrawState::default();
        self.saved.clear();
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let (first_column, last_column) = self.pixel_range(x, x + width, self.columns);
        let (first_row, last_row) = self.pixel_range(y, y + height, self.rows);
        for row in first_row..last_row {
            let offset = row * self.columns;
            self.pixels[offset + first_column..offset + last_column].fill(self.backdrop);
        }
    }

    fn save(&mut self) {
        self.saved.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.translate(x, y);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform.rotate(radians);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill_ellipse(&mut self, x: f32, y: f32, radius_x: f32, radius_y: f32, color: Color, alpha: f32) {
        if radius_x <= 0.0 || radius_y <= 0.0 {
            return;
        }
        let transform = self.state.transform.translate(x, y);
        let Some(inverse) = transform.invert() else {
            return;
        };
        let alpha = (alpha * self.state.alpha).clamp(0.0, 1.0);

        // Bounding box of the transformed ellipse, taken from its transformed bounding square.
        let reach = radius_x.max(radius_y);
        let corners = [(-reach, -reach), (reach, -reach), (-reach, reach), (reach, reach)];
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (cx, cy) in corners {
            let (px, py) = transform.apply(cx, cy);
            min_x = min_x.min(px);
            min_y = min_y.min(py);
            max_x = max_x.max(px);
            max_y = max_y.max(py);
        }
        let (first_column, last_column) = self.pixel_range(min_x, max_x, self.columns);
        let (first_row, last_row) = self.pixel_range(min_y, max_y, self.rows);

        for row in first_row..last_row {
            for column in first_column..last_column {
                let sample_x = (column as f32 + 0.5) * self.pixel_size;
                let sample_y = (row as f32 + 0.5) * self.pixel_size;
                let (local_x, local_y) = inverse.apply(sample_x, sample_y);
                let distance = (local_x / radius_x).powi(2) + (local_y / radius_y).powi(2);
                if distance <= 1.0 {
                    let index = row * self.columns + column;
                    self.pixels[index] = self.pixels[index].blend(color, alpha);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    /// A surface that records every call, used to assert on draw order.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) calls: Vec<String>,
    }

    impl DrawingSurface for RecordingSurface {
        fn resize(&mut self, width: f32, height: f32) {
            self.calls.push(format!("resize {width} {height}"));
        }

        fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
            self.calls.push(format!("clear {x} {y} {width} {height}"));
        }

        fn save(&mut self) {
            self.calls.push("save".into());
        }

        fn restore(&mut self) {
            self.calls.push("restore".into());
        }

        fn translate(&mut self, _x: f32, _y: f32) {
            self.calls.push("translate".into());
        }

        fn rotate(&mut self, _radians: f32) {
            self.calls.push("rotate".into());
        }

        fn set_global_alpha(&mut self, _alpha: f32) {
            self.calls.push("alpha".into());
        }

        fn fill_ellipse(&mut self, _x: f32, _y: f32, _rx: f32, _ry: f32, _color: Color, _alpha: f32) {
            self.calls.push("ellipse".into());
        }
    }

    const BLACK: Color = Color::new(0, 0, 0);
    const WHITE: Color = Color::new(255, 255, 255);

    fn raster() -> Raster {
        let mut raster = Raster::new(1.0, BLACK);
        raster.resize(20.0, 10.0);
        raster
    }

    #[test]
    fn resize_allocates_backdrop() {
        let raster = raster();
        assert_eq!((raster.columns(), raster.rows()), (20, 10));
        assert_eq!(raster.pixel(19, 9), Some(BLACK));
        assert_eq!(raster.pixel(20, 0), None);
    }

    #[test]
    fn wide_ellipse() {
        let mut raster = raster();
        raster.fill_ellipse(10.0, 5.0, 6.0, 2.0, WHITE, 1.0);
        assert_eq!(raster.pixel(10, 5), Some(WHITE));
        assert_eq!(raster.pixel(14, 5), Some(WHITE));
        // Taller than its vertical radius.
        assert_eq!(raster.pixel(10, 8), Some(BLACK));
    }

    #[test]
    fn rotation_swaps_axes() {
        let mut raster = raster();
        raster.save();
        raster.translate(10.0, 5.0);
        raster.rotate(FRAC_PI_2);
        raster.fill_ellipse(0.0, 0.0, 4.0, 1.0, WHITE, 1.0);
        raster.restore();
        assert_eq!(raster.pixel(10, 7), Some(WHITE));
        assert_eq!(raster.pixel(13, 5), Some(BLACK));
    }

    #[test]
    fn global_alpha_multiplies() {
        let mut raster = raster();
        raster.set_global_alpha(0.5);
        raster.fill_ellipse(10.0, 5.0, 3.0, 3.0, WHITE, 1.0);
        assert_eq!(raster.pixel(10, 5), Some(Color::new(128, 128, 128)));
    }

    #[test]
    fn restore_resets_state() {
        let mut raster = raster();
        raster.save();
        raster.translate(100.0, 100.0);
        raster.set_global_alpha(0.0);
        raster.restore();
        raster.fill_ellipse(2.0, 2.0, 1.5, 1.5, WHITE, 1.0);
        assert_eq!(raster.pixel(2, 2), Some(WHITE));
    }

    #[test]
    fn clear_restores_backdrop() {
        let mut raster = raster();
        raster.fill_ellipse(10.0, 5.0, 5.0, 5.0, WHITE, 1.0);
        raster.clear_rect(0.0, 0.0, 20.0, 10.0);
        assert!((0..10).all(|row| (0..20).all(|column| raster.pixel(column, row) == Some(BLACK))));
    }

    #[test]
    fn offscreen_ellipse_is_clipped() {
        let mut raster = raster();
        raster.fill_ellipse(-50.0, -50.0, 5.0, 5.0, WHITE, 1.0);
        raster.fill_ellipse(19.5, 9.5, 3.0, 3.0, WHITE, 1.0);
        assert_eq!(raster.pixel(19, 9), Some(WHITE));
        assert_eq!(raster.pixel(0, 0), Some(BLACK));
    }
}
