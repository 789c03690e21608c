//! Board entity - the registry of live tokens in one session.
//!
//! Every token change goes through `update`, which diffs the token before and
//! after and mirrors only what changed to the renderer. Scale changes are
//! played as transitions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alchemy_domain::{
    DomainError, ElementImage, ElementName, ElementToken, Tint, TokenId, Vec2,
};

use crate::infrastructure::ports::{BoardError, RenderPort, TokenTemplate, TokenVisual};
use crate::infrastructure::transitions::TransitionScheduler;

use super::overlap::OverlapCandidate;

#[derive(Default)]
struct BoardState {
    /// Spawn order
    tokens: Vec<ElementToken>,
    next_render_order: u64,
}

impl BoardState {
    fn next_render_order(&mut self) -> u64 {
        self.next_render_order += 1;
        self.next_render_order
    }

    fn find_mut(&mut self, id: TokenId) -> Option<&mut ElementToken> {
        self.tokens.iter_mut().find(|t| t.id() == id)
    }
}

pub struct Board {
    render: Arc<dyn RenderPort>,
    transitions: Arc<TransitionScheduler>,
    state: Mutex<BoardState>,
}

impl Board {
    pub fn new(render: Arc<dyn RenderPort>, transitions: Arc<TransitionScheduler>) -> Self {
        Self {
            render,
            transitions,
            state: Mutex::new(BoardState::default()),
        }
    }

    /// Instantiate an idle token for a known element on top of everything else.
    pub fn spawn_element(
        &self,
        name: ElementName,
        image: ElementImage,
        position: Vec2,
    ) -> ElementToken {
        let id = TokenId::new();
        let bounds = self.render.instantiate(id, TokenTemplate::Element, position);
        let token = {
            let mut state = self.lock();
            let order = state.next_render_order();
            let token = ElementToken::new(id, name, image, bounds, order);
            state.tokens.push(token.clone());
            token
        };
        self.render.set_render_order(id, token.render_order());
        self.render.set_visual(id, &visual_of(&token));
        tracing::debug!(token = %id, name = ?token.name().map(ElementName::as_str), "Spawned element token");
        token
    }

    /// Instantiate a `Loading` placeholder for an in-flight merge.
    pub fn spawn_placeholder(&self, position: Vec2, tint: Tint) -> ElementToken {
        let id = TokenId::new();
        let bounds = self
            .render
            .instantiate(id, TokenTemplate::Placeholder, position);
        let token = {
            let mut state = self.lock();
            let order = state.next_render_order();
            let token = ElementToken::placeholder(id, bounds, order, tint);
            state.tokens.push(token.clone());
            token
        };
        self.render.set_render_order(id, token.render_order());
        self.render.set_visual(id, &visual_of(&token));
        tracing::debug!(token = %id, "Spawned placeholder token");
        token
    }

    pub fn get(&self, id: TokenId) -> Option<ElementToken> {
        self.lock().tokens.iter().find(|t| t.id() == id).cloned()
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.lock().tokens.iter().any(|t| t.id() == id)
    }

    /// Snapshot of every live token, in spawn order.
    pub fn tokens(&self) -> Vec<ElementToken> {
        self.lock().tokens.clone()
    }

    /// Next value of the render-order counter. Values are never reused.
    pub fn next_render_order(&self) -> u64 {
        self.lock().next_render_order()
    }

    /// Mutate one token and mirror the resulting changes to the renderer.
    pub fn update<R>(
        &self,
        id: TokenId,
        f: impl FnOnce(&mut ElementToken) -> Result<R, DomainError>,
    ) -> Result<R, BoardError> {
        let (before, after, result) = {
            let mut state = self.lock();
            let token = state.find_mut(id).ok_or(BoardError::TokenNotFound(id))?;
            let before = token.clone();
            let result = f(token)?;
            (before, token.clone(), result)
        };
        self.sync(&before, &after);
        Ok(result)
    }

    /// Remove a token from the board and the renderer.
    pub fn destroy(&self, id: TokenId) -> Result<ElementToken, BoardError> {
        let token = {
            let mut state = self.lock();
            let index = state
                .tokens
                .iter()
                .position(|t| t.id() == id)
                .ok_or(BoardError::TokenNotFound(id))?;
            state.tokens.remove(index)
        };
        self.transitions.forget(id);
        self.render.destroy(id);
        tracing::debug!(token = %id, state = %token.state(), "Destroyed token");
        Ok(token)
    }

    /// Destroy every token. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let tokens = std::mem::take(&mut self.lock().tokens);
        for token in &tokens {
            self.transitions.forget(token.id());
            self.render.destroy(token.id());
        }
        tokens.len()
    }

    /// Interactive tokens other than `subject`, in spawn order.
    pub fn overlap_candidates(&self, subject: TokenId) -> Vec<OverlapCandidate> {
        self.lock()
            .tokens
            .iter()
            .filter(|t| t.id() != subject && t.is_interactive())
            .map(|t| OverlapCandidate {
                id: t.id(),
                bounds: t.bounds(),
            })
            .collect()
    }

    fn sync(&self, before: &ElementToken, after: &ElementToken) {
        let id = after.id();
        if before.position() != after.position() {
            self.render.set_position(id, after.position());
        }
        if before.render_order() != after.render_order() {
            self.render.set_render_order(id, after.render_order());
        }
        let visual = visual_of(after);
        if visual_of(before) != visual {
            self.render.set_visual(id, &visual);
        }
        if before.scale() != after.scale() {
            self.transitions.scale_to(id, after.scale());
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn visual_of(token: &ElementToken) -> TokenVisual {
    TokenVisual {
        name: token.name().cloned(),
        image: token.image().cloned(),
        state: token.state(),
        tint: token.tint(),
        visible: token.is_visible(),
    }
}
