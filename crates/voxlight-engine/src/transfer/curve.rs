//! Piecewise-linear color and opacity curves.
//!
//! These are what a transfer-function editor produces. Evaluation clamps to the
//! first/last control point outside the covered range.

/// Maps a scalar intensity to straight (non-premultiplied) RGB in `[0, 1]`.
pub trait ColorCurve {
    fn color_at(&self, x: f64) -> [f64; 3];
}

/// Maps a scalar intensity to opacity in `[0, 1]`.
pub trait OpacityCurve {
    fn opacity_at(&self, x: f64) -> f64;
}

impl<F: Fn(f64) -> [f64; 3]> ColorCurve for F {
    fn color_at(&self, x: f64) -> [f64; 3] {
        self(x)
    }
}

impl<F: Fn(f64) -> f64> OpacityCurve for F {
    fn opacity_at(&self, x: f64) -> f64 {
        self(x)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorPoint {
    pub x: f64,
    pub rgb: [f64; 3],
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OpacityPoint {
    pub x: f64,
    pub opacity: f64,
}

/// Color curve through RGB control points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorFunction {
    points: Vec<ColorPoint>,
}

impl ColorFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a control point, replacing any point at the same `x`.
    pub fn add_point(&mut self, x: f64, rgb: [f64; 3]) -> &mut Self {
        let rgb = rgb.map(|c| c.clamp(0.0, 1.0));
        insert_sorted(&mut self.points, ColorPoint { x, rgb }, |p| p.x);
        self
    }

    pub fn with_point(mut self, x: f64, rgb: [f64; 3]) -> Self {
        self.add_point(x, rgb);
        self
    }

    pub fn points(&self) -> &[ColorPoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl ColorCurve for ColorFunction {
    fn color_at(&self, x: f64) -> [f64; 3] {
        match segment(&self.points, x, |p| p.x) {
            Segment::Empty => [0.0; 3],
            Segment::Clamped(p) => p.rgb,
            Segment::Between(a, b, t) => {
                [0, 1, 2].map(|i| a.rgb[i] + (b.rgb[i] - a.rgb[i]) * t)
            }
        }
    }
}

/// Opacity curve through scalar control points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpacityFunction {
    points: Vec<OpacityPoint>,
}

impl OpacityFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a control point, replacing any point at the same `x`.
    pub fn add_point(&mut self, x: f64, opacity: f64) -> &mut Self {
        let opacity = opacity.clamp(0.0, 1.0);
        insert_sorted(&mut self.points, OpacityPoint { x, opacity }, |p| p.x);
        self
    }

    pub fn with_point(mut self, x: f64, opacity: f64) -> Self {
        self.add_point(x, opacity);
        self
    }

    pub fn points(&self) -> &[OpacityPoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl OpacityCurve for OpacityFunction {
    fn opacity_at(&self, x: f64) -> f64 {
        match segment(&self.points, x, |p| p.x) {
            Segment::Empty => 0.0,
            Segment::Clamped(p) => p.opacity,
            Segment::Between(a, b, t) => a.opacity + (b.opacity - a.opacity) * t,
        }
    }
}

/// A color + opacity curve pair, as attached to a volume node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferFunction {
    pub color: ColorFunction,
    pub opacity: OpacityFunction,
}

impl TransferFunction {
    pub fn new(color: ColorFunction, opacity: OpacityFunction) -> Self {
        Self { color, opacity }
    }
}

enum Segment<'a, P> {
    Empty,
    Clamped(&'a P),
    Between(&'a P, &'a P, f64),
}

fn segment<P>(points: &[P], x: f64, key: impl Fn(&P) -> f64) -> Segment<'_, P> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Segment::Empty;
    };
    if x <= key(first) {
        return Segment::Clamped(first);
    }
    if x >= key(last) {
        return Segment::Clamped(last);
    }

    // First point strictly right of x; exists because x < key(last).
    let hi = points.partition_point(|p| key(p) <= x);
    let (a, b) = (&points[hi - 1], &points[hi]);
    let span = key(b) - key(a);
    let t = if span > 0.0 { (x - key(a)) / span } else { 0.0 };
    Segment::Between(a, b, t)
}

fn insert_sorted<P>(points: &mut Vec<P>, point: P, key: impl Fn(&P) -> f64) {
    let x = key(&point);
    match points.iter().position(|p| key(p) >= x) {
        Some(i) if key(&points[i]) == x => points[i] = point,
        Some(i) => points.insert(i, point),
        None => points.push(point),
    }
}
