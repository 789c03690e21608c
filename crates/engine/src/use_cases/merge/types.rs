//! Merge use case types.

use std::fmt;
use std::time::Duration;

use alchemy_domain::{ElementImage, ElementName, MergeId, Tint, TokenId};
use tokio::task::JoinHandle;

use crate::infrastructure::ports::BoardError;

#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Global merge switch. Can be flipped at runtime.
    pub enabled: bool,
    pub loading_tint: Tint,
    pub failed_tint: Tint,
    /// Extra reference images sent with every synthesis request.
    pub style_references: Vec<ElementImage>,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            loading_tint: Tint::dimmed(),
            failed_tint: Tint::rgba(1.0, 0.35, 0.35, 0.8),
            style_references: Vec::new(),
            timeout: None,
        }
    }
}

/// Terminal result of one merge pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    CacheHit { name: ElementName },
    Generated { name: ElementName },
    NoReaction,
    Failed { reason: String },
    TimedOut,
    Cancelled,
}

impl MergeOutcome {
    /// Name of the resolved element, if the merge produced one.
    pub fn element(&self) -> Option<&ElementName> {
        match self {
            MergeOutcome::CacheHit { name } | MergeOutcome::Generated { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOutcome::CacheHit { name } => write!(f, "cache hit ({})", name),
            MergeOutcome::Generated { name } => write!(f, "generated ({})", name),
            MergeOutcome::NoReaction => write!(f, "no reaction"),
            MergeOutcome::Failed { reason } => write!(f, "failed ({})", reason),
            MergeOutcome::TimedOut => write!(f, "timed out"),
            MergeOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Published on the orchestrator's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeEvent {
    Started {
        merge_id: MergeId,
        inputs: [TokenId; 2],
        placeholder: TokenId,
    },
    Finished {
        merge_id: MergeId,
        placeholder: TokenId,
        outcome: MergeOutcome,
    },
}

/// Await one running merge pipeline.
#[derive(Debug)]
pub struct MergeHandle {
    pub merge_id: MergeId,
    pub placeholder: TokenId,
    join: JoinHandle<MergeOutcome>,
}

impl MergeHandle {
    pub(super) fn new(merge_id: MergeId, placeholder: TokenId, join: JoinHandle<MergeOutcome>) -> Self {
        Self {
            merge_id,
            placeholder,
            join,
        }
    }

    pub async fn outcome(self) -> MergeOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => MergeOutcome::Cancelled,
            Err(e) => MergeOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Merging is disabled")]
    Disabled,
    #[error("Invalid merge pair: {0}")]
    InvalidPair(String),
    #[error("Token not found: {0}")]
    TokenNotFound(TokenId),
    #[error("Merge requires a running tokio runtime")]
    RuntimeUnavailable,
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl MergeError {
    pub fn invalid_pair(message: impl Into<String>) -> Self {
        Self::InvalidPair(message.into())
    }
}
