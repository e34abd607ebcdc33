//! Candidate selection.
//!
//! When several endpoints match the same path, selection orders them by
//! explicit order, then pattern specificity, then declaration order, and
//! reports a tie at the first two levels as ambiguous rather than silently
//! picking a winner.

use std::sync::Arc;

use crate::{endpoint::Endpoint, value_map::RouteValueMap};

/// An endpoint paired with the values produced by matching it against one
/// path. Exists only while a single request is dispatched.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// The matched endpoint.
    pub endpoint: Arc<Endpoint>,
    /// The values the match produced.
    pub values: RouteValueMap,
    /// Declaration order in the registry.
    pub index: usize,
}

/// The result of ranking the candidates for one path.
#[derive(Debug)]
pub enum Selection {
    /// Exactly one best candidate.
    Single(MatchCandidate),
    /// Two or more candidates tied on order and specificity, in
    /// declaration order. Reportable; the caller decides whether it is
    /// fatal.
    Ambiguous(Vec<MatchCandidate>),
    /// No candidates were supplied.
    NoMatch,
}

/// Ranks `candidates` and picks the winner.
///
/// Ordering is explicit endpoint order ascending, then segment specificity
/// (literal above constrained parameter above unconstrained parameter above
/// catch-all, left to right; a rank sequence that is a strict prefix of
/// another ranks first), with declaration order keeping the sort
/// deterministic. Candidates still tied after order and specificity yield
/// [`Selection::Ambiguous`].
pub fn select(mut candidates: Vec<MatchCandidate>) -> Selection {
    if candidates.is_empty() {
        return Selection::NoMatch;
    }

    candidates.sort_by(|a, b| {
        a.endpoint
            .order()
            .cmp(&b.endpoint.order())
            .then_with(|| a.endpoint.pattern().ranks().cmp(b.endpoint.pattern().ranks()))
            .then_with(|| a.index.cmp(&b.index))
    });

    let tied = candidates
        .iter()
        .take_while(|c| {
            c.endpoint.order() == candidates[0].endpoint.order()
                && c.endpoint.pattern().ranks() == candidates[0].endpoint.pattern().ranks()
        })
        .count();

    if tied > 1 {
        candidates.truncate(tied);
        Selection::Ambiguous(candidates)
    } else {
        Selection::Single(candidates.swap_remove(0))
    }
}
