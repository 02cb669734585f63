use geo::LineString;

/// Shoelace sum of a ring: `Σ (x_{i+1} - x_i)(y_{i+1} + y_i)`.
///
/// Negative means counter-clockwise; clockwise rings encode solid interiors
/// throughout the pipeline.
pub fn shoelace_sum(ring: &LineString<f64>) -> f64 {
    let mut sum = 0.0;

    for i in 1..ring.0.len() {
        let p1 = ring.0[i - 1];
        let p2 = ring.0[i];
        sum += (p2.x - p1.x) * (p2.y + p1.y);
    }

    sum
}

pub fn is_clockwise(ring: &LineString<f64>) -> bool {
    shoelace_sum(ring) >= 0.0
}

/// Reverses the ring in place if it is counter-clockwise.
pub fn make_clockwise(ring: &mut LineString<f64>) {
    if shoelace_sum(ring) < 0.0 {
        ring.0.reverse();
    }
}
