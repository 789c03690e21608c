//! Merge orchestration use case.
//!
//! `attempt_merge` hides both inputs and spawns a `Loading` placeholder
//! synchronously, then drives the rest of the pipeline as a tracked tokio
//! task:
//!
//! ```text
//! memo hit ───────────────────────────────────────────────┐
//! memo miss -> propose name -> synthesize -> remove bg -> persist -> resolve
//!                   └─ no reaction: restore inputs, drop placeholder
//! ```
//!
//! Inputs are destroyed only once the placeholder holds the final element.
//! Pipelines are independent of each other; there is no global lock.

mod types;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alchemy_domain::{ElementImage, ElementName, MergeId, PairKey, TokenId, Vec2};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::entities::{Board, Combination, PairMemo};
use crate::infrastructure::ports::{CataloguePort, StoreError};

pub use types::{MergeConfig, MergeError, MergeEvent, MergeHandle, MergeOutcome};

/// Capacity of the merge event channel. Slow subscribers lag, they never block merges.
const EVENT_CAPACITY: usize = 64;

/// One consumed input of a running merge.
#[derive(Debug, Clone)]
struct MergeInput {
    token: TokenId,
    name: ElementName,
    image: ElementImage,
    position: Vec2,
}

#[derive(Debug, Clone)]
struct MergeContext {
    merge_id: MergeId,
    first: MergeInput,
    second: MergeInput,
    placeholder: TokenId,
}

impl MergeContext {
    fn key(&self) -> PairKey {
        PairKey::new(self.first.name.clone(), self.second.name.clone())
    }
}

pub struct MergeOrchestrator {
    board: Arc<Board>,
    memo: Arc<PairMemo>,
    combination: Arc<Combination>,
    catalogue: Arc<dyn CataloguePort>,
    config: MergeConfig,
    enabled: AtomicBool,
    events: broadcast::Sender<MergeEvent>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl MergeOrchestrator {
    pub fn new(
        board: Arc<Board>,
        memo: Arc<PairMemo>,
        combination: Arc<Combination>,
        catalogue: Arc<dyn CataloguePort>,
        config: MergeConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            board,
            memo,
            combination,
            catalogue,
            enabled: AtomicBool::new(config.enabled),
            config,
            events,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MergeEvent> {
        self.events.subscribe()
    }

    pub fn merge_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_merge_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        tracing::info!(enabled, "Merge switch changed");
    }

    /// Number of pipelines still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Check that `first` and `second` may be merged right now.
    pub fn should_merge(&self, first: TokenId, second: TokenId) -> Result<(), MergeError> {
        if !self.merge_enabled() {
            return Err(MergeError::Disabled);
        }
        if first == second {
            return Err(MergeError::invalid_pair("a token cannot merge with itself"));
        }
        for id in [first, second] {
            let token = self.board.get(id).ok_or(MergeError::TokenNotFound(id))?;
            if !token.is_interactive() {
                return Err(MergeError::invalid_pair(format!(
                    "token {} is not interactive (state {})",
                    id,
                    token.state()
                )));
            }
        }
        Ok(())
    }

    /// Start merging `first` (the dragged token) into `second`.
    ///
    /// Must be called from within a tokio runtime. A rejected attempt leaves
    /// both tokens untouched.
    pub fn attempt_merge(
        self: &Arc<Self>,
        first: TokenId,
        second: TokenId,
    ) -> Result<MergeHandle, MergeError> {
        self.should_merge(first, second)?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| MergeError::RuntimeUnavailable)?;

        let first = self.consume(first)?;
        let second = match self.consume(second) {
            Ok(input) => input,
            Err(e) => {
                self.restore(first.token);
                return Err(e);
            }
        };

        let midpoint = Vec2::midpoint(first.position, second.position);
        let placeholder = self
            .board
            .spawn_placeholder(midpoint, self.config.loading_tint);

        let ctx = MergeContext {
            merge_id: MergeId::new(),
            first,
            second,
            placeholder: placeholder.id(),
        };
        tracing::info!(
            merge_id = %ctx.merge_id,
            pair = %ctx.key(),
            placeholder = %ctx.placeholder,
            "Merge started"
        );
        self.publish(MergeEvent::Started {
            merge_id: ctx.merge_id,
            inputs: [ctx.first.token, ctx.second.token],
            placeholder: ctx.placeholder,
        });

        let this = Arc::clone(self);
        let merge_id = ctx.merge_id;
        let placeholder = ctx.placeholder;
        let join = self.tracker.spawn_on(
            async move {
                let outcome = tokio::select! {
                    _ = this.shutdown.cancelled() => MergeOutcome::Cancelled,
                    outcome = this.run_with_timeout(&ctx) => outcome,
                };
                tracing::info!(merge_id = %ctx.merge_id, outcome = %outcome, "Merge finished");
                this.publish(MergeEvent::Finished {
                    merge_id: ctx.merge_id,
                    placeholder: ctx.placeholder,
                    outcome: outcome.clone(),
                });
                outcome
            },
            &runtime,
        );

        Ok(MergeHandle::new(merge_id, placeholder, join))
    }

    /// Cancel every running pipeline and wait for them to stop.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    async fn run_with_timeout(&self, ctx: &MergeContext) -> MergeOutcome {
        let Some(limit) = self.config.timeout else {
            return self.run(ctx).await;
        };
        match tokio::time::timeout(limit, self.run(ctx)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    merge_id = %ctx.merge_id,
                    timeout_ms = limit.as_millis() as u64,
                    "Merge pipeline timed out"
                );
                self.fail_placeholder(ctx);
                MergeOutcome::TimedOut
            }
        }
    }

    async fn run(&self, ctx: &MergeContext) -> MergeOutcome {
        let first = &ctx.first.name;
        let second = &ctx.second.name;

        // A cached pair keeps its name even if the image has to be redrawn.
        let cached = self.memo.lookup(first, second).await;
        if let Some(name) = &cached {
            match self.memo.load_image(name).await {
                Ok(Some(image)) => {
                    tracing::info!(merge_id = %ctx.merge_id, result = %name, "Resolved from memo");
                    // A list write may have been lost after the memo entry landed.
                    let is_new = match self.memo.append_element(name).await {
                        Ok(is_new) => is_new,
                        Err(e) => {
                            tracing::warn!(
                                merge_id = %ctx.merge_id,
                                result = %name,
                                error = %e,
                                "Element list not updated for cached result"
                            );
                            false
                        }
                    };
                    self.complete(ctx, name, &image, is_new);
                    return MergeOutcome::CacheHit { name: name.clone() };
                }
                Ok(None) => tracing::warn!(
                    merge_id = %ctx.merge_id,
                    result = %name,
                    "Memo result has no stored image, redrawing"
                ),
                Err(e) => tracing::warn!(
                    merge_id = %ctx.merge_id,
                    result = %name,
                    error = %e,
                    "Memo result image unreadable, redrawing"
                ),
            }
        }

        let name = match cached {
            Some(name) => name,
            None => match self.combination.propose_name(first, second).await {
                Ok(Some(name)) => name,
                Ok(None) => {
                    self.abandon(ctx);
                    return MergeOutcome::NoReaction;
                }
                Err(e) => return self.fail(ctx, e.to_string()),
            },
        };

        let mut references = vec![ctx.first.image.clone(), ctx.second.image.clone()];
        references.extend(self.config.style_references.iter().cloned());

        let synthesized = match self.combination.synthesize_image(&name, &references).await {
            Ok(image) => image,
            Err(e) => return self.fail(ctx, e.to_string()),
        };
        let image = match self.combination.remove_background(&synthesized).await {
            Ok(image) => image,
            Err(e) => return self.fail(ctx, e.to_string()),
        };

        let is_new = match self.persist(ctx, &name, &image).await {
            Ok(is_new) => is_new,
            Err(e) => return self.fail(ctx, e.to_string()),
        };

        self.complete(ctx, &name, &image, is_new);
        MergeOutcome::Generated { name }
    }

    /// Image, memo entry, element list - each written through before the next.
    async fn persist(
        &self,
        ctx: &MergeContext,
        name: &ElementName,
        image: &ElementImage,
    ) -> Result<bool, StoreError> {
        self.memo.save_image(name, image).await?;
        self.memo.record(ctx.key(), name.clone()).await?;
        self.memo.append_element(name).await
    }

    /// Resolve the placeholder, then and only then drop the inputs.
    fn complete(&self, ctx: &MergeContext, name: &ElementName, image: &ElementImage, register: bool) {
        let resolved = self
            .board
            .update(ctx.placeholder, |t| t.resolve(name.clone(), image.clone()));
        if let Err(e) = resolved {
            tracing::warn!(merge_id = %ctx.merge_id, error = %e, "Placeholder could not be resolved");
        }
        if register {
            self.catalogue.register_element(name, image);
        }
        for input in [&ctx.first, &ctx.second] {
            if let Err(e) = self.board.destroy(input.token) {
                tracing::debug!(merge_id = %ctx.merge_id, error = %e, "Input already gone");
            }
        }
    }

    /// No reaction: put the inputs back and drop the placeholder.
    fn abandon(&self, ctx: &MergeContext) {
        self.restore(ctx.first.token);
        self.restore(ctx.second.token);
        if let Err(e) = self.board.destroy(ctx.placeholder) {
            tracing::debug!(merge_id = %ctx.merge_id, error = %e, "Placeholder already gone");
        }
    }

    fn fail(&self, ctx: &MergeContext, reason: String) -> MergeOutcome {
        tracing::warn!(merge_id = %ctx.merge_id, pair = %ctx.key(), reason = %reason, "Merge failed");
        self.fail_placeholder(ctx);
        MergeOutcome::Failed { reason }
    }

    fn fail_placeholder(&self, ctx: &MergeContext) {
        let tint = self.config.failed_tint;
        if let Err(e) = self.board.update(ctx.placeholder, |t| t.fail(tint)) {
            tracing::debug!(merge_id = %ctx.merge_id, error = %e, "Placeholder not marked failed");
        }
    }

    fn consume(&self, id: TokenId) -> Result<MergeInput, MergeError> {
        let token = self.board.update(id, |t| {
            t.consume()?;
            Ok(t.clone())
        })?;
        match (token.name(), token.image()) {
            (Some(name), Some(image)) => Ok(MergeInput {
                token: id,
                name: name.clone(),
                image: image.clone(),
                position: token.position(),
            }),
            _ => {
                self.restore(id);
                Err(MergeError::invalid_pair(format!(
                    "token {} has no resolved element",
                    id
                )))
            }
        }
    }

    fn restore(&self, id: TokenId) {
        let restored = self.board.update(id, |t| {
            t.restore();
            Ok(())
        });
        if let Err(e) = restored {
            tracing::debug!(token = %id, error = %e, "Input not restored");
        }
    }

    fn publish(&self, event: MergeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
