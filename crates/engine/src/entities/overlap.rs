//! Spatial overlap detection between live tokens.

use alchemy_domain::{Bounds, TokenId};

/// Why detection runs. Only `Terminal` detection may start a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// During pointer movement: drives the "about to merge" highlight.
    Continuous,
    /// On release: decides whether a merge is attempted.
    Terminal,
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlapPolicy::Continuous => write!(f, "continuous"),
            OverlapPolicy::Terminal => write!(f, "terminal"),
        }
    }
}

/// A token that may be hit, in board spawn order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapCandidate {
    pub id: TokenId,
    pub bounds: Bounds,
}

pub trait OverlapDetector: Send + Sync {
    /// First candidate (in the given order) whose bounds intersect `subject`.
    fn find_intersecting(&self, subject: &Bounds, candidates: &[OverlapCandidate])
        -> Option<TokenId>;
}

/// Axis-aligned bounding box intersection.
#[derive(Debug, Default, Clone, Copy)]
pub struct AabbOverlapDetector;

impl OverlapDetector for AabbOverlapDetector {
    fn find_intersecting(
        &self,
        subject: &Bounds,
        candidates: &[OverlapCandidate],
    ) -> Option<TokenId> {
        candidates
            .iter()
            .find(|candidate| subject.intersects(&candidate.bounds))
            .map(|candidate| candidate.id)
    }
}
