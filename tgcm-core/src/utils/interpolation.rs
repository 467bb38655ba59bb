//! One-dimensional interpolation helpers

/// Locate `x` between two nodes of an ascending, uniformly or non-uniformly spaced axis.
///
/// Returns `(lower, upper, weight)` such that the interpolated value is
/// `(1 - weight) * f[lower] + weight * f[upper]`. Targets outside the axis clamp
/// to the nearest end node.
pub fn bracket(nodes: &[f64], x: f64) -> (usize, usize, f64) {
    let n = nodes.len();
    assert!(n > 0, "cannot bracket on an empty axis");
    if n == 1 || x <= nodes[0] {
        return (0, 0, 0.0);
    }
    if x >= nodes[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    // partition_point gives the first node strictly greater than x
    let upper = nodes.partition_point(|&node| node <= x);
    let lower = upper - 1;
    let span = nodes[upper] - nodes[lower];
    (lower, upper, (x - nodes[lower]) / span)
}

/// Piecewise linear interpolation of `(xp, fp)` at `x`, clamped at both ends.
///
/// `xp` must be ascending.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    assert_eq!(
        xp.len(),
        fp.len(),
        "interpolation nodes and values must have the same length"
    );
    let (lower, upper, weight) = bracket(xp, x);
    (1.0 - weight) * fp[lower] + weight * fp[upper]
}

/// Fractional position of a longitude on a periodic cell-centred axis.
///
/// Returns the two neighbouring columns (wrapping at the date line) and the
/// weight of the second.
pub fn periodic_bracket(lon: f64, spacing: f64, n: usize) -> (usize, usize, f64) {
    let position = lon / spacing - 0.5;
    let floor = position.floor();
    let lower = (floor as i64).rem_euclid(n as i64) as usize;
    (lower, (lower + 1) % n, position - floor)
}

/// Nearest column on a periodic cell-centred axis.
pub fn periodic_nearest(lon: f64, spacing: f64, n: usize) -> usize {
    ((lon / spacing - 0.5).round() as i64).rem_euclid(n as i64) as usize
}
