use serde::{Deserialize, Serialize};

use crate::data::CandidateRecord;
use crate::observables::{K0S_MASS, LAMBDA_MASS};
use crate::sink::ObservableSink;
use crate::utils::{edges_are_monotonic, find_bin};
use crate::utils::enums::Leg;
use crate::{GlueballError, GlueballResult};

/// Cut-flow channel filled once per stage a candidate survives.
pub const CANDIDATE_CUT_FLOW: &str = "candidate_cut_flow";
/// Cut-flow channel filled once per stage a daughter track survives.
pub const DAUGHTER_CUT_FLOW: &str = "daughter_cut_flow";

/// Topological and mass-window thresholds for one transverse-momentum bin.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CutValues {
    /// Maximum |DCA| of the candidate to the primary vertex; `None` disables the cut.
    pub max_dca_to_pv: Option<f64>,
    /// Maximum |rapidity| under the K0s hypothesis.
    pub max_rapidity: f64,
    /// Minimum candidate transverse momentum.
    pub min_pt: f64,
    /// Maximum DCA between the daughter tracks.
    pub max_dca_daughters: f64,
    /// Minimum cosine of the pointing angle.
    pub min_cos_pa: f64,
    /// Minimum transverse decay radius.
    pub min_transverse_radius: f64,
    /// Maximum transverse decay radius.
    pub max_transverse_radius: f64,
    /// Maximum |proper lifetime| (c*tau).
    pub max_lifetime: f64,
    /// Reject candidates whose (anti-)Lambda mass lies within this margin of the
    /// Lambda mass; `None` disables the competing-mass rejection.
    pub competing_mass_margin: Option<f64>,
    /// Center of the accepted K0s mass window.
    pub mass_center: f64,
    /// Assumed K0s peak width.
    pub mass_width: f64,
    /// Half-width of the mass window in units of `mass_width`.
    pub mass_sigma: f64,
}

impl Default for CutValues {
    fn default() -> Self {
        Self {
            max_dca_to_pv: None,
            max_rapidity: 0.5,
            min_pt: 0.0,
            max_dca_daughters: 1.0,
            min_cos_pa: 0.97,
            min_transverse_radius: 0.5,
            max_transverse_radius: 200.0,
            max_lifetime: 15.0,
            competing_mass_margin: None,
            mass_center: 0.497,
            mass_width: 0.005,
            mass_sigma: 4.0,
        }
    }
}

/// Track-quality and PID thresholds applied to each daughter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DaughterCuts {
    /// Require the track to have TPC information.
    pub require_tpc: bool,
    /// Use the global-track flag instead of the individual TPC quality cuts.
    pub require_global: bool,
    /// Minimum TPC crossed rows.
    pub min_crossed_rows: f64,
    /// Minimum crossed rows over findable clusters.
    pub min_crossed_rows_over_findable: f64,
    /// Minimum TPC clusters found.
    pub min_tpc_clusters: f64,
    /// Maximum |pseudorapidity|.
    pub max_eta: f64,
    /// Maximum |n-sigma| of the pion PID deviation.
    pub max_nsigma_pi: f64,
}

impl Default for DaughterCuts {
    fn default() -> Self {
        Self {
            require_tpc: false,
            require_global: false,
            min_crossed_rows: 70.0,
            min_crossed_rows_over_findable: 0.8,
            min_tpc_clusters: 70.0,
            max_eta: 0.8,
            max_nsigma_pi: 5.0,
        }
    }
}

/// The full selection cut-set: per-pT-bin candidate cuts plus daughter track cuts.
///
/// Loaded once at startup and immutable thereafter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CutSet {
    /// Monotonic transverse-momentum bin edges; candidates outside are rejected.
    pub pt_bin_edges: Vec<f64>,
    /// One set of thresholds per pT bin (`pt_bin_edges.len() - 1` entries).
    pub bins: Vec<CutValues>,
    /// Track-level cuts shared by all bins.
    pub daughters: DaughterCuts,
}

impl Default for CutSet {
    fn default() -> Self {
        Self {
            pt_bin_edges: vec![0.0, 50.0],
            bins: vec![CutValues::default()],
            daughters: DaughterCuts::default(),
        }
    }
}

impl CutSet {
    /// Check bin-edge monotonicity and edge/bin count consistency.
    pub fn validate(&self) -> GlueballResult<()> {
        if !edges_are_monotonic(&self.pt_bin_edges) {
            return Err(GlueballError::Config(
                "pt_bin_edges must be strictly increasing with at least two entries".to_string(),
            ));
        }
        if self.bins.len() + 1 != self.pt_bin_edges.len() {
            return Err(GlueballError::Config(format!(
                "expected {} cut bins for {} pt bin edges, got {}",
                self.pt_bin_edges.len() - 1,
                self.pt_bin_edges.len(),
                self.bins.len()
            )));
        }
        Ok(())
    }
}

/// Applies the selection cut-set to single candidates.
///
/// Cuts are evaluated in a fixed order with logical-AND short-circuit; the first
/// failing cut aborts the evaluation. Each passed stage increments a cut-flow counter
/// on the sink, so the order is observable even though it cannot change the final
/// boolean. Out-of-range pT bins and missing PID responses are selection failures,
/// never errors.
#[derive(Clone, Debug)]
pub struct Selector {
    cuts: CutSet,
}

impl Selector {
    /// Build a selector from a validated cut-set.
    pub fn new(cuts: CutSet) -> GlueballResult<Self> {
        cuts.validate()?;
        Ok(Self { cuts })
    }

    /// The cut-set this selector applies.
    pub fn cuts(&self) -> &CutSet {
        &self.cuts
    }

    /// Apply the candidate-level and daughter-level cuts to a single candidate.
    pub fn accepts<C: CandidateRecord, S: ObservableSink>(
        &self,
        candidate: &C,
        sink: &mut S,
    ) -> bool {
        let mut stage = 0;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        let Some(bin) = find_bin(&self.cuts.pt_bin_edges, candidate.pt()) else {
            return false;
        };
        let cuts = &self.cuts.bins[bin];
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if let Some(max_dca) = cuts.max_dca_to_pv {
            if candidate.dca_to_pv().abs() > max_dca {
                return false;
            }
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if candidate.rapidity(K0S_MASS).abs() >= cuts.max_rapidity {
            return false;
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if candidate.pt() < cuts.min_pt {
            return false;
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if candidate.dca_daughters() > cuts.max_dca_daughters {
            return false;
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if candidate.cos_pa() < cuts.min_cos_pa {
            return false;
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if candidate.transverse_radius() < cuts.min_transverse_radius
            || candidate.transverse_radius() > cuts.max_transverse_radius
        {
            return false;
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if candidate.lifetime().abs() > cuts.max_lifetime {
            return false;
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        if let Some(margin) = cuts.competing_mass_margin {
            if (candidate.m_lambda() - LAMBDA_MASS).abs() <= margin
                || (candidate.m_anti_lambda() - LAMBDA_MASS).abs() <= margin
            {
                return false;
            }
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        let half_window = cuts.mass_width * cuts.mass_sigma;
        if candidate.m_k0s() < cuts.mass_center - half_window
            || candidate.m_k0s() > cuts.mass_center + half_window
        {
            return false;
        }
        stage += 1;
        sink.count(CANDIDATE_CUT_FLOW, stage);

        self.accepts_daughter(candidate.daughter(Leg::Positive), Leg::Positive, sink)
            && self.accepts_daughter(candidate.daughter(Leg::Negative), Leg::Negative, sink)
    }

    fn accepts_daughter<S: ObservableSink>(
        &self,
        track: crate::data::DaughterTrack,
        leg: Leg,
        sink: &mut S,
    ) -> bool {
        let cuts = &self.cuts.daughters;
        let mut stage = 0;
        sink.count(DAUGHTER_CUT_FLOW, stage);

        if cuts.require_tpc && !track.has_tpc {
            return false;
        }
        stage += 1;
        sink.count(DAUGHTER_CUT_FLOW, stage);

        if cuts.require_global {
            if !track.is_global {
                return false;
            }
        } else {
            if track.tpc_crossed_rows < cuts.min_crossed_rows {
                return false;
            }
            if track.crossed_rows_over_findable < cuts.min_crossed_rows_over_findable {
                return false;
            }
            if track.tpc_clusters < cuts.min_tpc_clusters {
                return false;
            }
        }
        stage += 1;
        sink.count(DAUGHTER_CUT_FLOW, stage);

        if track.sign != leg.sign() {
            return false;
        }
        stage += 1;
        sink.count(DAUGHTER_CUT_FLOW, stage);

        if track.eta.abs() > cuts.max_eta {
            return false;
        }
        stage += 1;
        sink.count(DAUGHTER_CUT_FLOW, stage);

        match track.nsigma_pi {
            Some(nsigma) if nsigma.abs() <= cuts.max_nsigma_pi => {
                stage += 1;
                sink.count(DAUGHTER_CUT_FLOW, stage);
                true
            }
            // missing PID rejects the track, it is not an error
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{test_v0, CandidateRecord};
    use crate::sink::{MemorySink, NullSink};

    fn selector() -> Selector {
        Selector::new(CutSet::default()).unwrap()
    }

    #[test]
    fn baseline_candidate_is_accepted() {
        assert!(selector().accepts(&test_v0(0, 0.4, 0.1, 0.1, 1, 2), &mut NullSink));
    }

    #[test]
    fn pt_below_lowest_edge_is_always_rejected() {
        let cuts = CutSet {
            pt_bin_edges: vec![0.5, 2.0, 50.0],
            bins: vec![CutValues::default(), CutValues::default()],
            ..CutSet::default()
        };
        let selector = Selector::new(cuts).unwrap();
        // pt = 0.3, below the lowest edge, perfect in every other respect
        let v0 = test_v0(0, 0.3, 0.0, 0.0, 1, 2);
        assert!(v0.pt() < 0.5);
        assert!(!selector.accepts(&v0, &mut NullSink));
    }

    #[test]
    fn mass_window_rejects_sidebands() {
        let mut v0 = test_v0(0, 0.4, 0.1, 0.1, 1, 2);
        v0.m_k0s = 0.53;
        assert!(!selector().accepts(&v0, &mut NullSink));
    }

    #[test]
    fn missing_pid_rejects_candidate() {
        let mut v0 = test_v0(0, 0.4, 0.1, 0.1, 1, 2);
        v0.pos_daughter.nsigma_pi = None;
        assert!(!selector().accepts(&v0, &mut NullSink));
    }

    #[test]
    fn competing_mass_rejection() {
        let cuts = CutSet {
            bins: vec![CutValues {
                competing_mass_margin: Some(0.005),
                ..CutValues::default()
            }],
            ..CutSet::default()
        };
        let selector = Selector::new(cuts).unwrap();
        let mut v0 = test_v0(0, 0.4, 0.1, 0.1, 1, 2);
        v0.m_lambda = LAMBDA_MASS + 0.001;
        assert!(!selector.accepts(&v0, &mut NullSink));
    }

    #[test]
    fn cut_flow_counts_stages_in_order() {
        let mut sink = MemorySink::new();
        let mut v0 = test_v0(0, 0.4, 0.1, 0.1, 1, 2);
        v0.cos_pa = 0.5;
        assert!(!selector().accepts(&v0, &mut sink));
        // entered, bin found, dca-to-pv, rapidity, pt, daughter dca, then cos_pa fails
        let stages: Vec<f64> = sink
            .entries(CANDIDATE_CUT_FLOW)
            .iter()
            .map(|v| v[0])
            .collect();
        assert_eq!(stages, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn invalid_cut_set_fails_fast() {
        assert!(Selector::new(CutSet {
            pt_bin_edges: vec![1.0, 1.0],
            ..CutSet::default()
        })
        .is_err());
        assert!(Selector::new(CutSet {
            pt_bin_edges: vec![0.0, 1.0, 2.0],
            bins: vec![CutValues::default()],
            ..CutSet::default()
        })
        .is_err());
    }
}
