use std::collections::VecDeque;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::Event;
use crate::utils::{edges_are_monotonic, find_bin};
use crate::{GlueballError, GlueballResult};

fn default_vertex_z_edges() -> Vec<f64> {
    vec![-10.0, -5.0, 0.0, 5.0, 10.0]
}
fn default_multiplicity_edges() -> Vec<f64> {
    vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
}
fn default_depth() -> usize {
    5
}
fn default_max_partners() -> usize {
    5
}

/// Binning and retention settings for the event-mixing pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingConfig {
    /// Vertex-z bin edges (strictly increasing).
    pub vertex_z_edges: Vec<f64>,
    /// Multiplicity bin edges (strictly increasing).
    pub multiplicity_edges: Vec<f64>,
    /// How many past events each bin retains.
    pub depth: usize,
    /// How many partner events one primary event is mixed with.
    pub max_partners: usize,
}

impl Default for MixingConfig {
    fn default() -> Self {
        Self {
            vertex_z_edges: default_vertex_z_edges(),
            multiplicity_edges: default_multiplicity_edges(),
            depth: default_depth(),
            max_partners: default_max_partners(),
        }
    }
}

impl MixingConfig {
    /// Check edge monotonicity and a nonzero retention depth.
    pub fn validate(&self) -> GlueballResult<()> {
        if !edges_are_monotonic(&self.vertex_z_edges) {
            return Err(GlueballError::Config(
                "mixing vertex-z edges must be strictly increasing with at least two entries"
                    .into(),
            ));
        }
        if !edges_are_monotonic(&self.multiplicity_edges) {
            return Err(GlueballError::Config(
                "mixing multiplicity edges must be strictly increasing with at least two entries"
                    .into(),
            ));
        }
        if self.depth == 0 {
            return Err(GlueballError::Config("mixing depth must be nonzero".into()));
        }
        Ok(())
    }
}

/// A pool of past events bucketed by (vertex-z, multiplicity) bin.
///
/// Events landing outside the configured binning are never stored, so mixing only
/// joins events with compatible collision geometry. Each bucket keeps at most
/// `depth` events, evicting the oldest first.
#[derive(Clone, Debug)]
pub struct MixingPool<C> {
    config: MixingConfig,
    buckets: IndexMap<(usize, usize), VecDeque<Event<C>>>,
}

impl<C> MixingPool<C> {
    /// Build an empty pool from a validated configuration.
    pub fn new(config: MixingConfig) -> GlueballResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            buckets: IndexMap::new(),
        })
    }

    fn bin(&self, event: &Event<C>) -> Option<(usize, usize)> {
        let z = find_bin(&self.config.vertex_z_edges, event.vertex_z)?;
        let m = find_bin(&self.config.multiplicity_edges, event.multiplicity)?;
        Some((z, m))
    }

    /// Partner events for `event`: up to `max_partners` events from the same bin,
    /// most recent first, never the event itself.
    pub fn partners(&self, event: &Event<C>) -> Vec<&Event<C>> {
        let Some(bin) = self.bin(event) else {
            return Vec::new();
        };
        self.buckets
            .get(&bin)
            .map(|bucket| {
                bucket
                    .iter()
                    .rev()
                    .filter(|partner| partner.id != event.id)
                    .take(self.config.max_partners)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Store `event` for future mixing. Events outside the binning are dropped.
    pub fn push(&mut self, event: Event<C>) {
        let Some(bin) = self.bin(&event) else {
            return;
        };
        let bucket = self.buckets.entry(bin).or_default();
        bucket.push_back(event);
        while bucket.len() > self.config.depth {
            bucket.pop_front();
        }
    }

    /// Total number of stored events across all bins.
    pub fn len(&self) -> usize {
        self.buckets.values().map(VecDeque::len).sum()
    }

    /// Whether no events are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
