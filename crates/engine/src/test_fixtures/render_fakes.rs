//! Recording renderer and catalogue.

use std::sync::{Mutex, MutexGuard, PoisonError};

use alchemy_domain::{Bounds, ElementImage, ElementName, TokenId, Vec2};

use crate::infrastructure::ports::{CataloguePort, RenderPort, TokenTemplate, TokenVisual};

/// Size of every sprite the recording renderer instantiates.
pub const SPRITE_SIZE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Instantiate(TokenId, TokenTemplate, Vec2),
    SetPosition(TokenId, Vec2),
    SetScale(TokenId, f32),
    SetRenderOrder(TokenId, u64),
    SetVisual(TokenId, TokenVisual),
    Destroy(TokenId),
}

#[derive(Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
}

impl RecordingRenderer {
    fn log(&self) -> MutexGuard<'_, Vec<RenderCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.log().clone()
    }

    pub fn clear_calls(&self) {
        self.log().clear();
    }

    pub fn destroyed(&self) -> Vec<TokenId> {
        self.log()
            .iter()
            .filter_map(|call| match call {
                RenderCall::Destroy(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl RenderPort for RecordingRenderer {
    fn instantiate(&self, token: TokenId, template: TokenTemplate, position: Vec2) -> Bounds {
        self.log()
            .push(RenderCall::Instantiate(token, template, position));
        Bounds::from_center_size(position, SPRITE_SIZE)
    }

    fn set_position(&self, token: TokenId, position: Vec2) {
        self.log().push(RenderCall::SetPosition(token, position));
    }

    fn set_scale(&self, token: TokenId, scale: f32) {
        self.log().push(RenderCall::SetScale(token, scale));
    }

    fn set_render_order(&self, token: TokenId, order: u64) {
        self.log().push(RenderCall::SetRenderOrder(token, order));
    }

    fn set_visual(&self, token: TokenId, visual: &TokenVisual) {
        self.log().push(RenderCall::SetVisual(token, visual.clone()));
    }

    fn destroy(&self, token: TokenId) {
        self.log().push(RenderCall::Destroy(token));
    }
}

#[derive(Default)]
pub struct RecordingCatalogue {
    registered: Mutex<Vec<(ElementName, ElementImage)>>,
}

impl RecordingCatalogue {
    pub fn registered_names(&self) -> Vec<ElementName> {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl CataloguePort for RecordingCatalogue {
    fn register_element(&self, name: &ElementName, image: &ElementImage) {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.clone(), image.clone()));
    }
}
