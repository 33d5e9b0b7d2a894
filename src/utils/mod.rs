/// Enumerations for reference-axis policies and daughter legs.
pub mod enums;
/// Traits which treat [`nalgebra::Vector3`] and [`nalgebra::Vector4`] as three- and
/// four-momenta.
pub mod vectors;

/// A helper method to get histogram edges from evenly-spaced `bins` over a given `range`.
pub fn get_bin_edges(bins: usize, range: (f64, f64)) -> Vec<f64> {
    let bin_width = (range.1 - range.0) / (bins as f64);
    (0..=bins)
        .map(|i| range.0 + (i as f64 * bin_width))
        .collect()
}

/// Locate `value` in a monotonically increasing set of bin edges.
///
/// Returns the index `i` such that `edges[i] <= value < edges[i + 1]`, or [`None`] if
/// `value` falls outside the configured edges (the "no bin" sentinel). NaN never has
/// a bin.
pub fn find_bin(edges: &[f64], value: f64) -> Option<usize> {
    if edges.len() < 2 || value.is_nan() {
        return None;
    }
    if value < edges[0] || value >= edges[edges.len() - 1] {
        return None;
    }
    // partition_point gives the first edge strictly greater than value
    let idx = edges.partition_point(|&e| e <= value);
    Some(idx - 1)
}

/// Check that a slice of bin edges is strictly increasing and has at least two entries.
pub fn edges_are_monotonic(edges: &[f64]) -> bool {
    edges.len() >= 2 && edges.windows(2).all(|w| w[0] < w[1])
}
