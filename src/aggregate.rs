// Point aggregator: reduces one depth frame to a single cursor position.
// Visual expectation: a hand resting on the surface becomes one steady dot,
// and a frame with too few points means "nobody is touching".

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Centroid, Point};

/// Frames with this many points or fewer are not an interaction.
pub const DEFAULT_MIN_POINTS: usize = 40;

/// Significant digits kept on every centroid axis.
/// Dwell stability compares these rounded values, so they must stay exact.
pub const CENTROID_PRECISION: u32 = 3;

/// Average the frame into a centroid, or None when `frame.len() <= min_points`.
/// An empty frame is always None, so there is no division by zero.
pub fn aggregate(frame: &[Point], min_points: usize) -> Option<Centroid> {
    if frame.len() <= min_points {
        return None;
    }

    let n = frame.len() as f64;
    let (sx, sy) = frame.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));

    // z only counts when every point has one; mixed frames are treated as 2D.
    let z = frame
        .iter()
        .map(|p| p.z)
        .sum::<Option<f64>>()
        .map(|sz| round_significant(sz / n, CENTROID_PRECISION));

    Some(Centroid {
        x: round_significant(sx / n, CENTROID_PRECISION),
        y: round_significant(sy / n, CENTROID_PRECISION),
        z,
    })
}

/// Round to `digits` significant digits, judged on the exact decimal value of
/// the stored double, ties away from zero.
/// So 0.1235 (stored as 0.12349999...) gives 0.123 while 1.125 gives 1.13.
/// Values outside `Decimal`'s range pass through unrounded.
pub fn round_significant(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    Decimal::from_f64_retain(value)
        .filter(|d| !d.is_zero())
        .and_then(|d| d.round_sf_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero))
        // Back through text: the parse picks the double nearest the rounded decimal.
        .and_then(|d| d.to_string().parse().ok())
        .unwrap_or(value)
}
