//! Pointer-driven token interaction.
//!
//! Pointer handling is synchronous and never suspends. Continuous overlap
//! detection while dragging only drives the "about to merge" highlight;
//! the single terminal detection on release decides whether a merge starts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alchemy_domain::{DragStyle, TokenId, Vec2};

use crate::entities::{Board, OverlapDetector, OverlapPolicy};
use crate::infrastructure::ports::BoardError;
use crate::use_cases::merge::{MergeError, MergeHandle, MergeOrchestrator};

/// What happened when a drag ended.
#[derive(Debug)]
pub enum DropOutcome {
    /// Released over nothing
    Released,
    /// Released over `target`; the merge pipeline is running
    Merging { target: TokenId, merge: MergeHandle },
    /// Released over `target` but the merge was refused
    Rejected { target: TokenId, error: MergeError },
}

#[derive(Debug, Clone, Copy)]
pub struct InteractionConfig {
    pub drag: DragStyle,
    /// Scale multiplier of the token the dragged one is about to merge with
    pub highlight_scale: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag: DragStyle::default(),
            highlight_scale: 1.2,
        }
    }
}

pub struct TokenInteraction {
    board: Arc<Board>,
    detector: Arc<dyn OverlapDetector>,
    merge: Arc<MergeOrchestrator>,
    config: InteractionConfig,
    /// Dragged token -> currently highlighted target
    highlighted: Mutex<HashMap<TokenId, TokenId>>,
}

impl TokenInteraction {
    pub fn new(
        board: Arc<Board>,
        detector: Arc<dyn OverlapDetector>,
        merge: Arc<MergeOrchestrator>,
        config: InteractionConfig,
    ) -> Self {
        Self {
            board,
            detector,
            merge,
            config,
            highlighted: Mutex::new(HashMap::new()),
        }
    }

    pub fn pointer_enter(&self, token: TokenId) -> Result<bool, BoardError> {
        self.board.update(token, |t| Ok(t.pointer_enter()))
    }

    pub fn pointer_exit(&self, token: TokenId) -> Result<bool, BoardError> {
        self.board.update(token, |t| Ok(t.pointer_exit()))
    }

    /// Lift the token to the top of the render order and start dragging.
    pub fn begin_drag(&self, token: TokenId, pointer: Vec2) -> Result<(), BoardError> {
        let order = self.board.next_render_order();
        let style = self.config.drag;
        self.board
            .update(token, |t| t.begin_drag(pointer, order, style))
    }

    /// Move the dragged token and refresh the highlight. Returns the
    /// highlighted target, if any.
    pub fn drag(&self, token: TokenId, pointer: Vec2) -> Result<Option<TokenId>, BoardError> {
        self.board.update(token, |t| t.drag_to(pointer))?;
        let target = self.detect(token, OverlapPolicy::Continuous)?;

        let previous = {
            let mut highlighted = self.highlighted();
            match target {
                Some(target) => highlighted.insert(token, target),
                None => highlighted.remove(&token),
            }
        };
        if previous != target {
            if let Some(previous) = previous {
                self.set_highlight(previous, None);
            }
            if let Some(target) = target {
                self.set_highlight(target, Some(self.config.highlight_scale));
            }
        }
        Ok(target)
    }

    /// Release the dragged token: one terminal detection, then either a merge
    /// hand-off or a plain drop.
    pub fn end_drag(&self, token: TokenId) -> Result<DropOutcome, BoardError> {
        if let Some(previous) = self.highlighted().remove(&token) {
            self.set_highlight(previous, None);
        }

        let Some(target) = self.detect(token, OverlapPolicy::Terminal)? else {
            self.board.update(token, |t| t.release())?;
            return Ok(DropOutcome::Released);
        };

        self.board.update(token, |t| t.release_over_target())?;
        let outcome = match self.merge.attempt_merge(token, target) {
            Ok(merge) => DropOutcome::Merging { target, merge },
            Err(error) => {
                tracing::debug!(token = %token, target = %target, error = %error, "Merge refused");
                DropOutcome::Rejected { target, error }
            }
        };
        self.board.update(token, |t| t.handoff_acknowledged())?;
        Ok(outcome)
    }

    fn detect(&self, token: TokenId, policy: OverlapPolicy) -> Result<Option<TokenId>, BoardError> {
        let subject = self
            .board
            .get(token)
            .ok_or(BoardError::TokenNotFound(token))?;
        let candidates = self.board.overlap_candidates(token);
        let hit = self
            .detector
            .find_intersecting(&subject.bounds(), &candidates);
        tracing::trace!(token = %token, policy = %policy, hit = ?hit, "Overlap check");
        Ok(hit)
    }

    fn set_highlight(&self, token: TokenId, factor: Option<f32>) {
        if let Err(e) = self
            .board
            .update(token, |t| Ok(t.set_merge_highlight(factor)))
        {
            tracing::debug!(token = %token, error = %e, "Highlight target gone");
        }
    }

    fn highlighted(&self) -> MutexGuard<'_, HashMap<TokenId, TokenId>> {
        self.highlighted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
