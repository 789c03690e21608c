//! Headless render and catalogue adapters.
//!
//! Used by the command-line binary, where there is no scene to draw into:
//! every render call becomes a trace event and sprites get a fixed size.

use std::sync::{Mutex, PoisonError};

use alchemy_domain::{Bounds, ElementImage, ElementName, TokenId, Vec2};

use crate::infrastructure::ports::{CataloguePort, RenderPort, TokenTemplate, TokenVisual};

/// Sprite size used for overlap tests when nothing is drawn.
pub const HEADLESS_SPRITE_SIZE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

#[derive(Debug, Default)]
pub struct TracingRenderer;

impl RenderPort for TracingRenderer {
    fn instantiate(&self, token: TokenId, template: TokenTemplate, position: Vec2) -> Bounds {
        tracing::debug!(%token, ?template, x = position.x, y = position.y, "instantiate");
        Bounds::from_center_size(position, HEADLESS_SPRITE_SIZE)
    }

    fn set_position(&self, token: TokenId, position: Vec2) {
        tracing::trace!(%token, x = position.x, y = position.y, "set_position");
    }

    fn set_scale(&self, token: TokenId, scale: f32) {
        tracing::trace!(%token, scale, "set_scale");
    }

    fn set_render_order(&self, token: TokenId, order: u64) {
        tracing::trace!(%token, order, "set_render_order");
    }

    fn set_visual(&self, token: TokenId, visual: &TokenVisual) {
        tracing::debug!(
            %token,
            name = visual.name.as_ref().map(ElementName::as_str).unwrap_or("?"),
            state = ?visual.state,
            visible = visual.visible,
            "set_visual"
        );
    }

    fn destroy(&self, token: TokenId) {
        tracing::debug!(%token, "destroy");
    }
}

/// Catalogue that remembers registrations in order.
#[derive(Debug, Default)]
pub struct TracingCatalogue {
    registered: Mutex<Vec<ElementName>>,
}

impl TracingCatalogue {
    pub fn registered(&self) -> Vec<ElementName> {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CataloguePort for TracingCatalogue {
    fn register_element(&self, name: &ElementName, image: &ElementImage) {
        tracing::info!(%name, bytes = image.len(), "Element added to catalogue");
        let mut registered = self.registered.lock().unwrap_or_else(PoisonError::into_inner);
        if !registered.contains(name) {
            registered.push(name.clone());
        }
    }
}
