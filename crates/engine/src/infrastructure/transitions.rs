//! Timed visual transitions (scale tweens) driven as cancellable tokio tasks.
//!
//! At most one transition runs per token. Starting a new one supersedes the
//! running one: its cancellation token fires and its generation goes stale, so
//! even a step that already woke up will not write to the renderer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alchemy_domain::TokenId;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::ports::RenderPort;

/// Number of renderer writes per transition.
const TRANSITION_STEPS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Completed,
    Superseded,
}

/// Await the end of one transition. Dropping it does not cancel anything.
#[derive(Debug)]
pub struct TransitionHandle {
    join: Option<JoinHandle<TransitionOutcome>>,
}

impl TransitionHandle {
    fn completed() -> Self {
        Self { join: None }
    }

    pub async fn finished(self) -> TransitionOutcome {
        match self.join {
            None => TransitionOutcome::Completed,
            Some(join) => join.await.unwrap_or(TransitionOutcome::Superseded),
        }
    }
}

struct ActiveTransition {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct TransitionState {
    next_generation: u64,
    active: HashMap<TokenId, ActiveTransition>,
    scales: HashMap<TokenId, f32>,
}

pub struct TransitionScheduler {
    render: Arc<dyn RenderPort>,
    duration: Duration,
    state: Arc<Mutex<TransitionState>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl TransitionScheduler {
    pub fn new(render: Arc<dyn RenderPort>, duration: Duration) -> Self {
        Self {
            render,
            duration,
            state: Arc::new(Mutex::new(TransitionState::default())),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Tween the token's scale to `target`, superseding any running transition.
    ///
    /// Applied immediately when the duration is zero or no tokio runtime is
    /// available on the calling thread.
    pub fn scale_to(&self, token: TokenId, target: f32) -> TransitionHandle {
        let mut state = lock(&self.state);
        state.next_generation += 1;
        let generation = state.next_generation;
        if let Some(previous) = state.active.remove(&token) {
            previous.cancel.cancel();
            tracing::trace!(token = %token, "Superseded running transition");
        }
        let from = state.scales.get(&token).copied().unwrap_or(1.0);

        let runtime = tokio::runtime::Handle::try_current().ok();
        let Some(runtime) = runtime.filter(|_| !self.duration.is_zero()) else {
            self.render.set_scale(token, target);
            state.scales.insert(token, target);
            return TransitionHandle::completed();
        };

        let cancel = self.shutdown.child_token();
        state.active.insert(
            token,
            ActiveTransition {
                generation,
                cancel: cancel.clone(),
            },
        );
        drop(state);

        let task = ScaleTween {
            token,
            generation,
            from,
            to: target,
            step: self.duration / TRANSITION_STEPS,
            render: Arc::clone(&self.render),
            state: Arc::clone(&self.state),
        };
        let join = self.tracker.spawn_on(task.run(cancel), &runtime);
        TransitionHandle { join: Some(join) }
    }

    /// Drop every trace of a token: cancel its transition and forget its scale.
    pub fn forget(&self, token: TokenId) {
        let mut state = lock(&self.state);
        if let Some(active) = state.active.remove(&token) {
            active.cancel.cancel();
        }
        state.scales.remove(&token);
    }

    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

struct ScaleTween {
    token: TokenId,
    generation: u64,
    from: f32,
    to: f32,
    step: Duration,
    render: Arc<dyn RenderPort>,
    state: Arc<Mutex<TransitionState>>,
}

impl ScaleTween {
    async fn run(self, cancel: CancellationToken) -> TransitionOutcome {
        for step in 1..=TRANSITION_STEPS {
            tokio::select! {
                _ = cancel.cancelled() => return TransitionOutcome::Superseded,
                _ = tokio::time::sleep(self.step) => {}
            }

            let mut state = lock(&self.state);
            let current = state
                .active
                .get(&self.token)
                .is_some_and(|active| active.generation == self.generation);
            if !current {
                return TransitionOutcome::Superseded;
            }

            let t = step as f32 / TRANSITION_STEPS as f32;
            let value = self.from + (self.to - self.from) * t;
            self.render.set_scale(self.token, value);
            state.scales.insert(self.token, value);
            if step == TRANSITION_STEPS {
                state.active.remove(&self.token);
            }
        }
        TransitionOutcome::Completed
    }
}

fn lock(state: &Mutex<TransitionState>) -> MutexGuard<'_, TransitionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
