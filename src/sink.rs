use indexmap::IndexMap;

use crate::utils::{find_bin, get_bin_edges};

/// The output seam of the crate: derived observables and selection-status counters are
/// pushed through this trait rather than into any storage owned by the analysis.
///
/// Names identify logical output channels (for example `mass_pair_same`); an
/// implementation is free to route them to histograms, tables, or nothing at all.
pub trait ObservableSink {
    /// Record one entry of a named observable tuple.
    fn record(&mut self, name: &str, values: &[f64]);

    /// Increment a named cut-flow counter at the given stage.
    fn count(&mut self, name: &str, stage: usize) {
        self.record(name, &[stage as f64]);
    }
}

/// A sink which drops everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl ObservableSink for NullSink {
    fn record(&mut self, _name: &str, _values: &[f64]) {}
}

/// An in-memory sink retaining every recorded entry in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    entries: IndexMap<String, Vec<Vec<f64>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }
    /// All entries recorded under `name` (empty if the channel was never filled).
    pub fn entries(&self, name: &str) -> &[Vec<f64>] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
    /// Number of entries recorded under `name`.
    pub fn len(&self, name: &str) -> usize {
        self.entries(name).len()
    }
    /// Whether nothing at all has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
    /// Names of all channels that have been filled, in first-fill order.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl ObservableSink for MemorySink {
    fn record(&mut self, name: &str, values: &[f64]) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .push(values.to_vec());
    }
}

/// A one-dimensional counting histogram with uniform bins.
///
/// Offered for offline inspection of a single sink channel column; entries outside
/// the range land in the underflow/overflow counters.
#[derive(Clone, Debug)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
}

impl Histogram {
    /// Create a histogram with `bins` uniform bins over `range`.
    pub fn new(bins: usize, range: (f64, f64)) -> Self {
        Self {
            edges: get_bin_edges(bins, range),
            counts: vec![0; bins],
            underflow: 0,
            overflow: 0,
        }
    }

    /// Count one value. NaN entries are dropped; infinities land in the
    /// underflow/overflow counters.
    pub fn fill(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        match find_bin(&self.edges, value) {
            Some(bin) => self.counts[bin] += 1,
            None if value < self.edges[0] => self.underflow += 1,
            None => self.overflow += 1,
        }
    }

    /// The bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Per-bin counts, excluding underflow and overflow.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Entries below the first edge.
    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    /// Entries at or above the last edge.
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Total number of entries, including underflow and overflow.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.underflow + self.overflow
    }
}

impl<S: ObservableSink + ?Sized> ObservableSink for &mut S {
    fn record(&mut self, name: &str, values: &[f64]) {
        (**self).record(name, values)
    }
    fn count(&mut self, name: &str, stage: usize) {
        (**self).count(name, stage)
    }
}
