use crate::data::CandidateRecord;

/// Forms candidate pairs within an event and across mixed events.
///
/// Pairing never re-evaluates selections; the caller passes one selection flag per
/// candidate and the combiner only joins candidates whose flags are set. Same-event
/// pairs are emitted in exactly one ordering, and candidates sharing a constituent
/// track are never paired with each other.
#[derive(Copy, Clone, Debug, Default)]
pub struct Combiner {
    /// Reject pairs whose angular separation exceeds this value, if set.
    pub max_angular_separation: Option<f64>,
}

/// Angular separation of two candidates, `sqrt(d_eta^2 + d_phi^2)` with the raw
/// azimuthal difference.
pub fn angular_separation<C: CandidateRecord>(a: &C, b: &C) -> f64 {
    let d_eta = a.eta() - b.eta();
    let d_phi = a.phi() - b.phi();
    (d_eta * d_eta + d_phi * d_phi).sqrt()
}

impl Combiner {
    /// Build a combiner with an optional pairwise angular-separation cut.
    pub fn new(max_angular_separation: Option<f64>) -> Self {
        Self {
            max_angular_separation,
        }
    }

    fn passes_separation<C: CandidateRecord>(&self, a: &C, b: &C) -> bool {
        match self.max_angular_separation {
            Some(cut) => angular_separation(a, b) <= cut,
            None => true,
        }
    }

    /// All distinct pairs of selected candidates from one event.
    ///
    /// Each unordered pair appears exactly once, in slice order. Pairs sharing a
    /// constituent track (including a candidate with itself) are excluded.
    pub fn same_event_pairs<'a, C: CandidateRecord>(
        &self,
        candidates: &'a [C],
        selected: &[bool],
    ) -> Vec<(&'a C, &'a C)> {
        let mut pairs = Vec::new();
        for (i, a) in candidates.iter().enumerate() {
            if !selected[i] {
                continue;
            }
            for (b, &keep) in candidates[i + 1..].iter().zip(&selected[i + 1..]) {
                if !keep || a.shares_track_with(b) || !self.passes_separation(a, b) {
                    continue;
                }
                pairs.push((a, b));
            }
        }
        pairs
    }

    /// All pairs joining a selected primary candidate with a selected partner
    /// candidate from another event.
    pub fn mixed_pairs<'a, C: CandidateRecord>(
        &self,
        primary: &'a [C],
        primary_selected: &[bool],
        partner: &'a [C],
        partner_selected: &[bool],
    ) -> Vec<(&'a C, &'a C)> {
        let mut pairs = Vec::new();
        for (a, &keep_a) in primary.iter().zip(primary_selected) {
            if !keep_a {
                continue;
            }
            for (b, &keep_b) in partner.iter().zip(partner_selected) {
                if !keep_b || a.shares_track_with(b) || !self.passes_separation(a, b) {
                    continue;
                }
                pairs.push((a, b));
            }
        }
        pairs
    }
}
