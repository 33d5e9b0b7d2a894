//! `glueball` is a library for resonance-pair analyses of reconstructed two-prong
//! candidates: candidate selection, same-event and mixed-event pair combination, and
//! invariant-mass and polarization observables measured against a configurable
//! reference axis.
//!
//! The pipeline is event-by-event. An [`Analysis`] driver is built once from an
//! [`AnalysisConfig`], a seeded random generator, and an [`ObservableSink`]; each
//! [`Event`] pushed through [`Analysis::process_event`] is gated, its candidates
//! selected by the [`Selector`], selected candidates combined by the
//! [`Combiner`] (same-event, rotated-background, and mixed-event against the
//! [`MixingPool`]), and every derived quantity leaves through the sink. Nothing in
//! the crate owns histograms or files; a sink implementation decides where entries
//! go.
//!
//! # Example
//!
//! ```
//! use glueball::{Analysis, AnalysisConfig, MemorySink, MASS_PAIR_SAME};
//! use glueball::data::test_event;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut analysis = Analysis::new(
//!     AnalysisConfig::default(),
//!     ChaCha8Rng::seed_from_u64(0),
//!     MemorySink::new(),
//! )?;
//! analysis.process_event(test_event());
//! assert_eq!(analysis.sink().len(MASS_PAIR_SAME), 1);
//! # Ok::<(), glueball::GlueballError>(())
//! ```
#![warn(clippy::perf, clippy::style)]

use thiserror::Error;

/// The driver tying selection, pairing, mixing, and observables together.
pub mod analysis;
/// Candidate, daughter-track, and event records.
pub mod data;
/// The event-mixing pool.
pub mod mixing;
/// Invariant-mass and polarization observables.
pub mod observables;
/// Same-event and mixed-event pair combination.
pub mod pairing;
/// Candidate and daughter-track selection.
pub mod selection;
/// The observable output seam.
pub mod sink;
/// Vector extension traits, enums, and binning helpers.
pub mod utils;

pub use crate::analysis::{
    Analysis, AnalysisConfig, CANDIDATES_PER_EVENT, EVENT_CUT_FLOW, MASS_PAIR_MIXED,
    MASS_PAIR_ROTATED, MASS_PAIR_SAME, PAIR_ANGULAR_SEPARATION,
};
pub use crate::data::{CandidateRecord, DaughterTrack, Event, ToyCandidate, V0};
pub use crate::mixing::{MixingConfig, MixingPool};
pub use crate::observables::{
    ObservableCalculator, PairObservables, K0S_MASS, LAMBDA_MASS, PROTON_MASS,
};
pub use crate::pairing::Combiner;
pub use crate::selection::{CutSet, CutValues, DaughterCuts, Selector};
pub use crate::sink::{Histogram, MemorySink, NullSink, ObservableSink};
pub use crate::utils::enums::{Leg, PolarizationAxis};
pub use crate::utils::vectors::{FourMomentum, ThreeMomentum};

/// The error type used by the crate. See individual variants for details.
#[derive(Error, Debug)]
pub enum GlueballError {
    /// A configuration value or combination of values is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error type which occurs when parsing a value from a string fails.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which failed to parse.
        name: String,
        /// The name of the type being parsed.
        object: String,
    },
}

/// A shorthand for a `Result` with this crate's error type.
pub type GlueballResult<T> = Result<T, GlueballError>;
