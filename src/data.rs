use nalgebra::Vector3;

use crate::utils::enums::Leg;
use crate::utils::vectors::ThreeMomentum;

/// A daughter track of a two-prong candidate.
///
/// Carries the track quality and PID information consumed by the
/// [`Selector`](crate::selection::Selector). A missing PID response is represented by
/// `nsigma_pi = None` and is treated as a selection failure, never an error.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DaughterTrack {
    /// Global track index (provenance).
    pub id: u64,
    /// Charge sign of the track.
    pub sign: i8,
    /// Pseudorapidity of the track.
    pub eta: f64,
    /// Whether the track has TPC information.
    pub has_tpc: bool,
    /// Whether the track passes the global-track selection.
    pub is_global: bool,
    /// Number of TPC crossed rows.
    pub tpc_crossed_rows: f64,
    /// Ratio of crossed rows over findable clusters.
    pub crossed_rows_over_findable: f64,
    /// Number of TPC clusters found.
    pub tpc_clusters: f64,
    /// TPC PID deviation under the pion hypothesis, if a PID response exists.
    pub nsigma_pi: Option<f64>,
}

/// The capability set a reconstructed candidate must expose to be selected and paired.
///
/// Implementors supply a momentum, provenance indices, and the topological and PID
/// quantities the [`Selector`](crate::selection::Selector) cuts on. The two provided
/// implementations are [`V0`] (a full reconstructed record) and [`ToyCandidate`] (a
/// minimal record for tests and toy studies).
pub trait CandidateRecord {
    /// Global candidate index, unique within an event.
    fn global_index(&self) -> u64;
    /// The lab-frame momentum three-vector.
    fn momentum(&self) -> Vector3<f64>;
    /// The daughter track on the given leg.
    fn daughter(&self, leg: Leg) -> DaughterTrack;
    /// Distance of closest approach between the two daughter tracks.
    fn dca_daughters(&self) -> f64;
    /// Distance of closest approach of the candidate to the primary vertex.
    fn dca_to_pv(&self) -> f64;
    /// Cosine of the pointing angle.
    fn cos_pa(&self) -> f64;
    /// Transverse radius of the decay vertex.
    fn transverse_radius(&self) -> f64;
    /// Proper lifetime estimate (c*tau) under the analysis mass hypothesis.
    fn lifetime(&self) -> f64;
    /// Invariant mass under the K0s hypothesis.
    fn m_k0s(&self) -> f64;
    /// Invariant mass under the Lambda hypothesis.
    fn m_lambda(&self) -> f64;
    /// Invariant mass under the anti-Lambda hypothesis.
    fn m_anti_lambda(&self) -> f64;

    /// Transverse momentum.
    fn pt(&self) -> f64 {
        self.momentum().pt()
    }
    /// Pseudorapidity.
    fn eta(&self) -> f64 {
        self.momentum().eta()
    }
    /// Azimuthal angle.
    fn phi(&self) -> f64 {
        self.momentum().phi()
    }
    /// Rapidity under the given mass hypothesis.
    fn rapidity(&self, mass: f64) -> f64 {
        use crate::utils::vectors::FourMomentum;
        self.momentum().with_mass(mass).rapidity()
    }
    /// Constituent track indices, positive leg first.
    fn track_ids(&self) -> [u64; 2] {
        [self.daughter(Leg::Positive).id, self.daughter(Leg::Negative).id]
    }
    /// Whether this candidate shares a constituent track with another.
    fn shares_track_with<C: CandidateRecord + ?Sized>(&self, other: &C) -> bool {
        let [p1, n1] = self.track_ids();
        let [p2, n2] = other.track_ids();
        p1 == p2 || n1 == n2
    }
}

/// A reconstructed V0 candidate with the full set of topological and PID quantities.
#[derive(Clone, Debug)]
pub struct V0 {
    /// Global candidate index.
    pub index: u64,
    /// Lab-frame momentum.
    pub momentum: Vector3<f64>,
    /// Positive-leg daughter track.
    pub pos_daughter: DaughterTrack,
    /// Negative-leg daughter track.
    pub neg_daughter: DaughterTrack,
    /// DCA between the daughters.
    pub dca_daughters: f64,
    /// DCA of the V0 to the primary vertex.
    pub dca_to_pv: f64,
    /// Cosine of the pointing angle.
    pub cos_pa: f64,
    /// Transverse decay radius.
    pub transverse_radius: f64,
    /// Proper lifetime (c*tau) under the K0s hypothesis.
    pub lifetime: f64,
    /// Invariant mass under the K0s hypothesis.
    pub m_k0s: f64,
    /// Invariant mass under the Lambda hypothesis.
    pub m_lambda: f64,
    /// Invariant mass under the anti-Lambda hypothesis.
    pub m_anti_lambda: f64,
}

impl CandidateRecord for V0 {
    fn global_index(&self) -> u64 {
        self.index
    }
    fn momentum(&self) -> Vector3<f64> {
        self.momentum
    }
    fn daughter(&self, leg: Leg) -> DaughterTrack {
        match leg {
            Leg::Positive => self.pos_daughter,
            Leg::Negative => self.neg_daughter,
        }
    }
    fn dca_daughters(&self) -> f64 {
        self.dca_daughters
    }
    fn dca_to_pv(&self) -> f64 {
        self.dca_to_pv
    }
    fn cos_pa(&self) -> f64 {
        self.cos_pa
    }
    fn transverse_radius(&self) -> f64 {
        self.transverse_radius
    }
    fn lifetime(&self) -> f64 {
        self.lifetime
    }
    fn m_k0s(&self) -> f64 {
        self.m_k0s
    }
    fn m_lambda(&self) -> f64 {
        self.m_lambda
    }
    fn m_anti_lambda(&self) -> f64 {
        self.m_anti_lambda
    }
}

/// A minimal candidate carrying only momentum and provenance.
///
/// All topological getters return values which pass the default cut-set, which makes
/// this type convenient for pairing and observable tests and for toy studies where
/// the detector response is not modeled.
#[derive(Clone, Debug)]
pub struct ToyCandidate {
    /// Global candidate index.
    pub index: u64,
    /// Lab-frame momentum.
    pub momentum: Vector3<f64>,
    /// Constituent track indices, positive leg first.
    pub tracks: [u64; 2],
    /// Invariant mass under the K0s hypothesis.
    pub m_k0s: f64,
}

impl ToyCandidate {
    /// Build a toy candidate from an index, momentum components, and track indices.
    pub fn new(index: u64, px: f64, py: f64, pz: f64, tracks: [u64; 2]) -> Self {
        Self {
            index,
            momentum: Vector3::new(px, py, pz),
            tracks,
            m_k0s: crate::observables::K0S_MASS,
        }
    }
}

impl CandidateRecord for ToyCandidate {
    fn global_index(&self) -> u64 {
        self.index
    }
    fn momentum(&self) -> Vector3<f64> {
        self.momentum
    }
    fn daughter(&self, leg: Leg) -> DaughterTrack {
        let (id, sign) = match leg {
            Leg::Positive => (self.tracks[0], 1),
            Leg::Negative => (self.tracks[1], -1),
        };
        DaughterTrack {
            id,
            sign,
            eta: 0.0,
            has_tpc: true,
            is_global: true,
            tpc_crossed_rows: 160.0,
            crossed_rows_over_findable: 1.0,
            tpc_clusters: 160.0,
            nsigma_pi: Some(0.0),
        }
    }
    fn dca_daughters(&self) -> f64 {
        0.0
    }
    fn dca_to_pv(&self) -> f64 {
        0.0
    }
    fn cos_pa(&self) -> f64 {
        1.0
    }
    fn transverse_radius(&self) -> f64 {
        1.0
    }
    fn lifetime(&self) -> f64 {
        0.0
    }
    fn m_k0s(&self) -> f64 {
        self.m_k0s
    }
    fn m_lambda(&self) -> f64 {
        0.0
    }
    fn m_anti_lambda(&self) -> f64 {
        0.0
    }
}

/// One collision event: identification, mixing-bin coordinates, and its candidates.
#[derive(Clone, Debug)]
pub struct Event<C> {
    /// Global event index.
    pub id: u64,
    /// Longitudinal position of the primary vertex (cm).
    pub vertex_z: f64,
    /// Multiplicity (or centrality percentile) estimator used for mixing bins.
    pub multiplicity: f64,
    /// Reconstructed candidates belonging to this event.
    pub candidates: Vec<C>,
}

/// A V0 with values typical of a selected K0s, usable as a baseline in tests.
pub fn test_v0(index: u64, px: f64, py: f64, pz: f64, pos_id: u64, neg_id: u64) -> V0 {
    V0 {
        index,
        momentum: Vector3::new(px, py, pz),
        pos_daughter: DaughterTrack {
            id: pos_id,
            sign: 1,
            eta: 0.3,
            has_tpc: true,
            is_global: true,
            tpc_crossed_rows: 110.0,
            crossed_rows_over_findable: 0.95,
            tpc_clusters: 95.0,
            nsigma_pi: Some(1.2),
        },
        neg_daughter: DaughterTrack {
            id: neg_id,
            sign: -1,
            eta: -0.2,
            has_tpc: true,
            is_global: true,
            tpc_crossed_rows: 104.0,
            crossed_rows_over_findable: 0.91,
            tpc_clusters: 88.0,
            nsigma_pi: Some(-0.8),
        },
        dca_daughters: 0.4,
        dca_to_pv: 0.2,
        cos_pa: 0.995,
        transverse_radius: 4.5,
        lifetime: 6.0,
        m_k0s: 0.4971,
        m_lambda: 1.18,
        m_anti_lambda: 1.19,
    }
}

/// An event holding two well-separated test V0s.
pub fn test_event() -> Event<V0> {
    Event {
        id: 0,
        vertex_z: 2.3,
        multiplicity: 35.0,
        candidates: vec![
            test_v0(0, 0.4, 0.1, 0.1, 10, 11),
            test_v0(1, -0.3, 0.5, -0.2, 12, 13),
        ],
    }
}
