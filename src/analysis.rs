use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{CandidateRecord, Event};
use crate::mixing::{MixingConfig, MixingPool};
use crate::observables::{ObservableCalculator, PairObservables, K0S_MASS, PROTON_MASS};
use crate::pairing::{angular_separation, Combiner};
use crate::selection::{CutSet, Selector};
use crate::sink::ObservableSink;
use crate::utils::enums::PolarizationAxis;
use crate::{GlueballError, GlueballResult};

/// Cut-flow channel filled once per stage an event survives.
pub const EVENT_CUT_FLOW: &str = "event_cut_flow";
/// Number of selected candidates per accepted event.
pub const CANDIDATES_PER_EVENT: &str = "candidates_per_event";
/// Same-event pair observables: `[multiplicity, pt, mass, cos_theta_star, phi]`.
pub const MASS_PAIR_SAME: &str = "mass_pair_same";
/// Mixed-event pair observables, same layout as [`MASS_PAIR_SAME`].
pub const MASS_PAIR_MIXED: &str = "mass_pair_mixed";
/// Rotational-background pair observables, same layout as [`MASS_PAIR_SAME`].
pub const MASS_PAIR_ROTATED: &str = "mass_pair_rotated";
/// Angular separation of each accepted same-event pair.
pub const PAIR_ANGULAR_SEPARATION: &str = "pair_angular_separation";

fn default_vertex_z_limit() -> f64 {
    10.0
}
fn default_axis() -> PolarizationAxis {
    PolarizationAxis::Beam
}
fn default_sqrt_s() -> f64 {
    13600.0
}
fn default_pair_rapidity_limit() -> f64 {
    0.5
}
fn default_rotations() -> usize {
    3
}
fn default_rotational_cut() -> f64 {
    10.0
}
fn default_mass_hypothesis() -> f64 {
    K0S_MASS
}

/// Full configuration of the pair-analysis pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Candidate and daughter selection cuts.
    pub cuts: CutSet,
    /// Accept events with |vertex z| below this limit (cm).
    pub vertex_z_limit: f64,
    /// Reference-axis policy for the polarization observables.
    pub polarization_axis: PolarizationAxis,
    /// Center-of-mass energy (GeV), used to build the beam four-vectors.
    pub sqrt_s: f64,
    /// Record pairs only when the composite |rapidity| is below this limit.
    pub pair_rapidity_limit: f64,
    /// Rotational-background samples drawn per same-event pair.
    pub rotations: usize,
    /// Width parameter of the rotation window `[pi - pi/cut, pi + pi/cut]`.
    pub rotational_cut: f64,
    /// Reject pairs with angular separation above this value, if set.
    pub max_angular_separation: Option<f64>,
    /// Pair an event only when exactly two of its candidates are selected.
    pub select_two_only: bool,
    /// Event-mixing binning and retention.
    pub mixing: MixingConfig,
    /// Daughter mass hypothesis used to promote momenta to four-vectors.
    pub mass_hypothesis: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cuts: CutSet::default(),
            vertex_z_limit: default_vertex_z_limit(),
            polarization_axis: default_axis(),
            sqrt_s: default_sqrt_s(),
            pair_rapidity_limit: default_pair_rapidity_limit(),
            rotations: default_rotations(),
            rotational_cut: default_rotational_cut(),
            max_angular_separation: None,
            select_two_only: false,
            mixing: MixingConfig::default(),
            mass_hypothesis: default_mass_hypothesis(),
        }
    }
}

impl AnalysisConfig {
    /// Check every sub-configuration; misconfiguration fails at startup, not mid-run.
    pub fn validate(&self) -> GlueballResult<()> {
        self.cuts.validate()?;
        self.mixing.validate()?;
        // one-sided threshold comparisons would let NaN slip through
        for (name, value) in [
            ("vertex_z_limit", self.vertex_z_limit),
            ("sqrt_s", self.sqrt_s),
            ("pair_rapidity_limit", self.pair_rapidity_limit),
            ("rotational_cut", self.rotational_cut),
            ("mass_hypothesis", self.mass_hypothesis),
        ] {
            if !value.is_finite() {
                return Err(GlueballError::Config(format!("{name} must be finite")));
            }
        }
        if let Some(separation) = self.max_angular_separation {
            if !separation.is_finite() || separation <= 0.0 {
                return Err(GlueballError::Config(
                    "max_angular_separation must be finite and positive".into(),
                ));
            }
        }
        if self.vertex_z_limit <= 0.0 {
            return Err(GlueballError::Config(
                "vertex_z_limit must be positive".into(),
            ));
        }
        if self.pair_rapidity_limit <= 0.0 {
            return Err(GlueballError::Config(
                "pair_rapidity_limit must be positive".into(),
            ));
        }
        if self.rotational_cut <= 1.0 {
            return Err(GlueballError::Config(
                "rotational_cut must exceed 1 so the rotation window stays away from zero".into(),
            ));
        }
        if self.sqrt_s <= 2.0 * PROTON_MASS {
            return Err(GlueballError::Config(
                "sqrt_s must exceed twice the proton mass".into(),
            ));
        }
        if self.mass_hypothesis <= 0.0 {
            return Err(GlueballError::Config(
                "mass_hypothesis must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// The event-by-event analysis driver.
///
/// Owns the selector, combiner, calculator, and mixing pool built from one
/// [`AnalysisConfig`], plus an injected random generator and observable sink. Events
/// are consumed one at a time through [`process_event`](Analysis::process_event);
/// every derived quantity leaves through the sink.
#[derive(Clone, Debug)]
pub struct Analysis<C, R, S> {
    config: AnalysisConfig,
    selector: Selector,
    calculator: ObservableCalculator,
    combiner: Combiner,
    pool: MixingPool<C>,
    rng: R,
    sink: S,
}

impl<C, R, S> Analysis<C, R, S>
where
    C: CandidateRecord + Clone,
    R: Rng,
    S: ObservableSink,
{
    /// Build a driver from a validated configuration, a seeded random generator, and
    /// an output sink.
    pub fn new(config: AnalysisConfig, rng: R, sink: S) -> GlueballResult<Self> {
        config.validate()?;
        let selector = Selector::new(config.cuts.clone())?;
        let calculator = ObservableCalculator::new(
            config.polarization_axis,
            config.mass_hypothesis,
            config.sqrt_s,
        );
        let combiner = Combiner::new(config.max_angular_separation);
        let pool = MixingPool::new(config.mixing.clone())?;
        tracing::info!(
            axis = %config.polarization_axis,
            sqrt_s = config.sqrt_s,
            rotations = config.rotations,
            "analysis configured"
        );
        Ok(Self {
            config,
            selector,
            calculator,
            combiner,
            pool,
            rng,
            sink,
        })
    }

    /// The configuration this driver was built from.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The sink, for inspection mid-run.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the driver and return the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process one event: event gate, candidate selection, same-event and rotated
    /// fills, mixed-event fills against the pool, then pool update.
    ///
    /// Only selected candidates are stored for mixing, so mixed pairs never
    /// re-evaluate the selection.
    pub fn process_event(&mut self, event: Event<C>) {
        let Self {
            config,
            selector,
            calculator,
            combiner,
            pool,
            rng,
            sink,
        } = self;

        sink.count(EVENT_CUT_FLOW, 0);
        if event.vertex_z.abs() > config.vertex_z_limit {
            return;
        }
        sink.count(EVENT_CUT_FLOW, 1);

        let selected: Vec<bool> = event
            .candidates
            .iter()
            .map(|candidate| selector.accepts(candidate, sink))
            .collect();
        let n_selected = selected.iter().filter(|&&keep| keep).count();
        sink.record(CANDIDATES_PER_EVENT, &[n_selected as f64]);

        let pairing_enabled = !config.select_two_only || n_selected == 2;
        let kept: Vec<C> = event
            .candidates
            .iter()
            .zip(&selected)
            .filter(|(_, &keep)| keep)
            .map(|(candidate, _)| candidate.clone())
            .collect();

        if pairing_enabled {
            for (a, b) in combiner.same_event_pairs(&event.candidates, &selected) {
                sink.record(PAIR_ANGULAR_SEPARATION, &[angular_separation(a, b)]);
                let d1 = calculator.daughter_p4(a.momentum());
                let d2 = calculator.daughter_p4(b.momentum());
                let obs = calculator.compute(d1, d2, rng);
                record_pair(sink, MASS_PAIR_SAME, event.multiplicity, &obs, config);
                for _ in 0..config.rotations {
                    let rot = calculator.rotated(d1, d2, &obs, config.rotational_cut, rng);
                    record_pair(sink, MASS_PAIR_ROTATED, event.multiplicity, &rot, config);
                }
            }

            let kept_flags = vec![true; kept.len()];
            for partner in pool.partners(&event) {
                let partner_flags = vec![true; partner.candidates.len()];
                for (a, b) in
                    combiner.mixed_pairs(&kept, &kept_flags, &partner.candidates, &partner_flags)
                {
                    let d1 = calculator.daughter_p4(a.momentum());
                    let d2 = calculator.daughter_p4(b.momentum());
                    let obs = calculator.compute(d1, d2, rng);
                    record_pair(sink, MASS_PAIR_MIXED, event.multiplicity, &obs, config);
                }
            }
        }

        pool.push(Event {
            id: event.id,
            vertex_z: event.vertex_z,
            multiplicity: event.multiplicity,
            candidates: kept,
        });
    }
}

fn record_pair<S: ObservableSink>(
    sink: &mut S,
    channel: &str,
    multiplicity: f64,
    obs: &PairObservables,
    config: &AnalysisConfig,
) {
    if obs.rapidity.abs() < config.pair_rapidity_limit {
        sink.record(
            channel,
            &[multiplicity, obs.pt, obs.mass, obs.cos_theta_star, obs.phi],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ToyCandidate;
    use crate::sink::{Histogram, MemorySink};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn driver(config: AnalysisConfig) -> Analysis<ToyCandidate, ChaCha8Rng, MemorySink> {
        Analysis::new(config, ChaCha8Rng::seed_from_u64(7), MemorySink::new()).unwrap()
    }

    fn event(id: u64, first_track: u64) -> Event<ToyCandidate> {
        Event {
            id,
            vertex_z: 1.5,
            multiplicity: 30.0,
            candidates: vec![
                ToyCandidate::new(2 * id, 0.4, 0.1, 0.05, [first_track, first_track + 1]),
                ToyCandidate::new(2 * id + 1, -0.3, 0.5, -0.02, [first_track + 2, first_track + 3]),
            ],
        }
    }

    #[test]
    fn same_event_pair_is_recorded_with_rotations() {
        let mut analysis = driver(AnalysisConfig::default());
        analysis.process_event(event(0, 10));
        let sink = analysis.sink();
        assert_eq!(sink.len(MASS_PAIR_SAME), 1);
        assert_eq!(sink.entries(MASS_PAIR_SAME)[0].len(), 5);
        assert_eq!(sink.len(MASS_PAIR_ROTATED), 3);
        assert_eq!(sink.len(PAIR_ANGULAR_SEPARATION), 1);
        assert_eq!(sink.entries(CANDIDATES_PER_EVENT), &[vec![2.0]]);
    }

    #[test]
    fn shared_track_candidates_never_pair() {
        let mut analysis = driver(AnalysisConfig::default());
        let mut shared = event(0, 10);
        shared.candidates[1].tracks = [10, 13];
        analysis.process_event(shared);
        assert_eq!(analysis.sink().len(MASS_PAIR_SAME), 0);
    }

    #[test]
    fn mixed_pairs_come_only_from_earlier_events() {
        let mut analysis = driver(AnalysisConfig::default());
        analysis.process_event(event(0, 10));
        assert_eq!(analysis.sink().len(MASS_PAIR_MIXED), 0);
        analysis.process_event(event(1, 20));
        // two selected candidates crossed with two stored ones
        assert_eq!(analysis.sink().len(MASS_PAIR_MIXED), 4);
    }

    #[test]
    fn out_of_range_vertex_skips_the_event() {
        let mut analysis = driver(AnalysisConfig::default());
        let mut far = event(0, 10);
        far.vertex_z = 14.0;
        analysis.process_event(far);
        let sink = analysis.sink();
        assert_eq!(sink.entries(EVENT_CUT_FLOW), &[vec![0.0]]);
        assert_eq!(sink.len(CANDIDATES_PER_EVENT), 0);
        assert_eq!(sink.len(MASS_PAIR_SAME), 0);
    }

    #[test]
    fn select_two_only_skips_other_counts() {
        let config = AnalysisConfig {
            select_two_only: true,
            ..AnalysisConfig::default()
        };
        let mut analysis = driver(config);
        let mut three = event(0, 10);
        three
            .candidates
            .push(ToyCandidate::new(5, 0.2, -0.4, 0.1, [30, 31]));
        analysis.process_event(three);
        assert_eq!(analysis.sink().len(MASS_PAIR_SAME), 0);
        analysis.process_event(event(1, 40));
        assert_eq!(analysis.sink().len(MASS_PAIR_SAME), 1);
    }

    #[test]
    fn degenerate_pair_phi_bins_without_panic() {
        let mut analysis = driver(AnalysisConfig::default());
        // back to back: total momentum is zero, so the rest-frame phi is undefined
        let at_rest = Event {
            id: 0,
            vertex_z: 1.5,
            multiplicity: 30.0,
            candidates: vec![
                ToyCandidate::new(0, 1.0, 0.0, 0.0, [10, 11]),
                ToyCandidate::new(1, -1.0, 0.0, 0.0, [12, 13]),
            ],
        };
        analysis.process_event(at_rest);
        let entries = analysis.sink().entries(MASS_PAIR_SAME);
        assert_eq!(entries.len(), 1);
        assert!(entries[0][4].is_nan());
        let mut hist = Histogram::new(10, (0.0, std::f64::consts::TAU));
        for entry in entries {
            hist.fill(entry[4]);
        }
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn misconfiguration_fails_at_construction() {
        let config = AnalysisConfig {
            rotational_cut: 0.5,
            ..AnalysisConfig::default()
        };
        let result = Analysis::<ToyCandidate, ChaCha8Rng, MemorySink>::new(
            config,
            ChaCha8Rng::seed_from_u64(0),
            MemorySink::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn non_finite_configuration_fails_at_construction() {
        let configs = [
            AnalysisConfig {
                rotational_cut: f64::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                rotational_cut: f64::INFINITY,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                sqrt_s: f64::INFINITY,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                vertex_z_limit: f64::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                pair_rapidity_limit: f64::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                mass_hypothesis: f64::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                max_angular_separation: Some(f64::NAN),
                ..AnalysisConfig::default()
            },
        ];
        for config in configs {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn rotated_fills_share_angles_with_the_base_pair_for_fixed_axes() {
        let mut analysis = driver(AnalysisConfig::default());
        analysis.process_event(event(0, 10));
        let sink = analysis.sink();
        let base = &sink.entries(MASS_PAIR_SAME)[0];
        for rotated in sink.entries(MASS_PAIR_ROTATED) {
            assert_eq!(rotated[3], base[3]);
            assert_eq!(rotated[4], base[4]);
        }
    }
}
