//! Rendering/engine layer port.
//!
//! All calls are synchronous and instantaneous from the core's point of view.
//! Timed effects are built on top of `set_scale` by the transition scheduler.

use alchemy_domain::{Bounds, ElementImage, ElementName, TokenId, TokenState, Tint, Vec2};

/// Which prefab a token is instantiated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTemplate {
    /// A resolved element sprite
    Element,
    /// The pending-merge placeholder (masked, loading indicator)
    Placeholder,
}

/// Everything the renderer needs to draw one token, except scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenVisual {
    pub name: Option<ElementName>,
    pub image: Option<ElementImage>,
    pub state: TokenState,
    pub tint: Tint,
    pub visible: bool,
}

#[cfg_attr(test, mockall::automock)]
pub trait RenderPort: Send + Sync {
    /// Create the sprite for `token` and return its initial bounds.
    fn instantiate(&self, token: TokenId, template: TokenTemplate, position: Vec2) -> Bounds;
    fn set_position(&self, token: TokenId, position: Vec2);
    fn set_scale(&self, token: TokenId, scale: f32);
    fn set_render_order(&self, token: TokenId, order: u64);
    fn set_visual(&self, token: TokenId, visual: &TokenVisual);
    fn destroy(&self, token: TokenId);
}
