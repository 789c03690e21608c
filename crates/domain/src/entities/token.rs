//! ElementToken entity - one live, draggable instance of an element on the board.
//!
//! The token owns its interaction state machine:
//!
//! ```text
//! Idle <-> Hovering
//! Idle | Hovering -> Dragging -> Idle                 (released over nothing)
//!                  Dragging -> Overlapping -> Idle    (released over a target)
//! Loading -> Idle                                     (merge result resolved)
//! Loading -> Failed                                   (merge pipeline gave up)
//! ```
//!
//! Tokens consumed as merge inputs stay in their state but become hidden and
//! inert until the pipeline either destroys or restores them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::ids::TokenId;
use crate::value_objects::{Bounds, ElementImage, ElementName, Tint, Vec2};

/// Interaction state of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenState {
    Idle,
    Hovering,
    Dragging,
    Overlapping,
    Loading,
    Failed,
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TokenState::Idle => "Idle",
            TokenState::Hovering => "Hovering",
            TokenState::Dragging => "Dragging",
            TokenState::Overlapping => "Overlapping",
            TokenState::Loading => "Loading",
            TokenState::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Visual parameters applied when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStyle {
    /// Scale multiplier while dragging
    pub scale: f32,
    /// Tint while dragging
    pub tint: Tint,
}

impl Default for DragStyle {
    fn default() -> Self {
        Self {
            scale: 1.1,
            tint: Tint::WHITE,
        }
    }
}

/// Captured at drag start and held for the whole drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragContext {
    /// Token center minus pointer position at drag start
    offset: Vec2,
    scale: f32,
    restore_tint: Tint,
}

#[derive(Debug, Clone)]
pub struct ElementToken {
    id: TokenId,
    /// `None` only for a placeholder that has not resolved yet
    name: Option<ElementName>,
    image: Option<ElementImage>,
    bounds: Bounds,
    state: TokenState,
    render_order: u64,
    tint: Tint,
    drag: Option<DragContext>,
    highlight: Option<f32>,
    visible: bool,
    interactive: bool,
}

impl ElementToken {
    /// Create an idle token for a known element.
    pub fn new(
        id: TokenId,
        name: ElementName,
        image: ElementImage,
        bounds: Bounds,
        render_order: u64,
    ) -> Self {
        Self {
            id,
            name: Some(name),
            image: Some(image),
            bounds,
            state: TokenState::Idle,
            render_order,
            tint: Tint::WHITE,
            drag: None,
            highlight: None,
            visible: true,
            interactive: true,
        }
    }

    /// Create a placeholder for an in-flight merge result.
    pub fn placeholder(id: TokenId, bounds: Bounds, render_order: u64, tint: Tint) -> Self {
        Self {
            id,
            name: None,
            image: None,
            bounds,
            state: TokenState::Loading,
            render_order,
            tint,
            drag: None,
            highlight: None,
            visible: true,
            interactive: false,
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn name(&self) -> Option<&ElementName> {
        self.name.as_ref()
    }

    pub fn image(&self) -> Option<&ElementImage> {
        self.image.as_ref()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn position(&self) -> Vec2 {
        self.bounds.center
    }

    pub fn state(&self) -> TokenState {
        self.state
    }

    pub fn render_order(&self) -> u64 {
        self.render_order
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the token currently takes part in pointer interaction and overlap checks.
    pub fn is_interactive(&self) -> bool {
        self.visible
            && self.interactive
            && !matches!(self.state, TokenState::Loading | TokenState::Failed)
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight.is_some()
    }

    /// Current visual scale: drag scale times merge-target highlight.
    pub fn scale(&self) -> f32 {
        let drag = self.drag.map_or(1.0, |d| d.scale);
        let highlight = self.highlight.unwrap_or(1.0);
        drag * highlight
    }

    /// Pointer offset captured at drag start, if dragging.
    pub fn drag_offset(&self) -> Option<Vec2> {
        self.drag.map(|d| d.offset)
    }

    pub fn set_position(&mut self, center: Vec2) {
        self.bounds = self.bounds.moved_to(center);
    }

    /// Pointer entered the token. Only an idle token starts hovering.
    pub fn pointer_enter(&mut self) -> bool {
        if self.state == TokenState::Idle && self.is_interactive() {
            self.state = TokenState::Hovering;
            return true;
        }
        false
    }

    /// Pointer left the token.
    pub fn pointer_exit(&mut self) -> bool {
        if self.state == TokenState::Hovering {
            self.state = TokenState::Idle;
            return true;
        }
        false
    }

    /// Enter `Dragging`: lift to `render_order`, apply the drag style and
    /// capture the pointer offset once.
    pub fn begin_drag(
        &mut self,
        pointer: Vec2,
        render_order: u64,
        style: DragStyle,
    ) -> Result<(), DomainError> {
        if !self.is_interactive() {
            return Err(self.reject("Dragging"));
        }
        match self.state {
            TokenState::Idle | TokenState::Hovering => {}
            _ => return Err(self.reject("Dragging")),
        }
        self.drag = Some(DragContext {
            offset: self.bounds.center - pointer,
            scale: style.scale,
            restore_tint: self.tint,
        });
        self.render_order = render_order;
        self.tint = style.tint;
        self.state = TokenState::Dragging;
        Ok(())
    }

    /// Track the pointer through the captured offset.
    pub fn drag_to(&mut self, pointer: Vec2) -> Result<Vec2, DomainError> {
        let Some(drag) = self.drag else {
            return Err(self.reject("Dragging"));
        };
        if self.state != TokenState::Dragging {
            return Err(self.reject("Dragging"));
        }
        let center = pointer + drag.offset;
        self.set_position(center);
        Ok(center)
    }

    /// Released over a merge target.
    pub fn release_over_target(&mut self) -> Result<(), DomainError> {
        if self.state != TokenState::Dragging {
            return Err(self.reject("Overlapping"));
        }
        self.end_drag_visuals();
        self.state = TokenState::Overlapping;
        Ok(())
    }

    /// Released over nothing: drop the drag style and go back to `Idle`.
    pub fn release(&mut self) -> Result<(), DomainError> {
        if self.state != TokenState::Dragging {
            return Err(self.reject("Idle"));
        }
        self.end_drag_visuals();
        self.state = TokenState::Idle;
        Ok(())
    }

    /// The merge hand-off was acknowledged.
    pub fn handoff_acknowledged(&mut self) -> Result<(), DomainError> {
        if self.state != TokenState::Overlapping {
            return Err(self.reject("Idle"));
        }
        self.state = TokenState::Idle;
        Ok(())
    }

    /// Hide the token and make it inert while a merge consumes it.
    pub fn consume(&mut self) -> Result<(), DomainError> {
        if !self.is_interactive() {
            return Err(DomainError::invalid_state_transition(format!(
                "token {} cannot be consumed (state {}, visible {}, interactive {})",
                self.id, self.state, self.visible, self.interactive
            )));
        }
        if self.drag.is_some() {
            self.end_drag_visuals();
        }
        self.highlight = None;
        self.visible = false;
        self.interactive = false;
        Ok(())
    }

    /// Undo `consume` after a merge that produced nothing.
    pub fn restore(&mut self) {
        self.visible = true;
        self.interactive = true;
        if matches!(self.state, TokenState::Overlapping | TokenState::Hovering) {
            self.state = TokenState::Idle;
        }
    }

    /// Toggle the "about to merge" scale-up. Returns `true` only when the flag changed.
    pub fn set_merge_highlight(&mut self, factor: Option<f32>) -> bool {
        let changed = self.highlight.is_some() != factor.is_some();
        self.highlight = factor;
        changed
    }

    /// `Loading -> Idle` with the final identity.
    pub fn resolve(&mut self, name: ElementName, image: ElementImage) -> Result<(), DomainError> {
        if self.state != TokenState::Loading {
            return Err(self.reject("Idle"));
        }
        self.name = Some(name);
        self.image = Some(image);
        self.tint = Tint::WHITE;
        self.state = TokenState::Idle;
        self.interactive = true;
        Ok(())
    }

    /// `Loading -> Failed`.
    pub fn fail(&mut self, tint: Tint) -> Result<(), DomainError> {
        if self.state != TokenState::Loading {
            return Err(self.reject("Failed"));
        }
        self.tint = tint;
        self.state = TokenState::Failed;
        Ok(())
    }

    fn end_drag_visuals(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.tint = drag.restore_tint;
        }
    }

    fn reject(&self, target: &str) -> DomainError {
        DomainError::invalid_state_transition(format!(
            "token {}: {} -> {}",
            self.id, self.state, target
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_at(x: f32, y: f32) -> ElementToken {
        ElementToken::new(
            TokenId::new(),
            ElementName::new("fire").expect("valid name"),
            ElementImage::new(vec![1]),
            Bounds::from_center_size(Vec2::new(x, y), Vec2::new(1.0, 1.0)),
            1,
        )
    }

    fn style() -> DragStyle {
        DragStyle {
            scale: 1.5,
            tint: Tint::rgba(1.0, 0.9, 0.9, 1.0),
        }
    }

    #[test]
    fn hover_round_trip() {
        let mut token = token_at(0.0, 0.0);
        assert!(token.pointer_enter());
        assert_eq!(token.state(), TokenState::Hovering);
        assert!(!token.pointer_enter());
        assert!(token.pointer_exit());
        assert_eq!(token.state(), TokenState::Idle);
    }

    #[test]
    fn drag_keeps_pointer_offset_constant() {
        let mut token = token_at(10.0, 10.0);
        token
            .begin_drag(Vec2::new(9.5, 10.25), 7, style())
            .expect("drag starts");
        assert_eq!(token.drag_offset(), Some(Vec2::new(0.5, -0.25)));

        let center = token.drag_to(Vec2::new(20.0, 20.0)).expect("dragging");
        assert_eq!(center, Vec2::new(20.5, 19.75));
        let center = token.drag_to(Vec2::new(0.0, 0.0)).expect("dragging");
        assert_eq!(center, Vec2::new(0.5, -0.25));
    }

    #[test]
    fn drag_applies_and_restores_style() {
        let mut token = token_at(0.0, 0.0);
        token
            .begin_drag(Vec2::ZERO, 42, style())
            .expect("drag starts");
        assert_eq!(token.render_order(), 42);
        assert_eq!(token.scale(), 1.5);
        assert_eq!(token.tint(), style().tint);

        token.release().expect("release");
        assert_eq!(token.state(), TokenState::Idle);
        assert_eq!(token.scale(), 1.0);
        assert_eq!(token.tint(), Tint::WHITE);
        assert_eq!(token.render_order(), 42);
    }

    #[test]
    fn release_over_target_then_acknowledge() {
        let mut token = token_at(0.0, 0.0);
        token.begin_drag(Vec2::ZERO, 2, style()).expect("drag");
        token.release_over_target().expect("overlapping");
        assert_eq!(token.state(), TokenState::Overlapping);
        token.handoff_acknowledged().expect("ack");
        assert_eq!(token.state(), TokenState::Idle);
    }

    #[test]
    fn placeholder_cannot_be_dragged() {
        let mut token = ElementToken::placeholder(
            TokenId::new(),
            Bounds::from_center_size(Vec2::ZERO, Vec2::new(1.0, 1.0)),
            3,
            Tint::dimmed(),
        );
        assert_eq!(token.state(), TokenState::Loading);
        assert!(!token.is_interactive());
        let err = token.begin_drag(Vec2::ZERO, 4, style()).unwrap_err();
        assert!(err.is_invalid_transition());
        assert!(!token.pointer_enter());
    }

    #[test]
    fn placeholder_resolves_to_idle() {
        let mut token = ElementToken::placeholder(
            TokenId::new(),
            Bounds::from_center_size(Vec2::ZERO, Vec2::new(1.0, 1.0)),
            3,
            Tint::dimmed(),
        );
        token
            .resolve(
                ElementName::new("steam").expect("valid name"),
                ElementImage::new(vec![9, 9]),
            )
            .expect("resolves");
        assert_eq!(token.state(), TokenState::Idle);
        assert_eq!(token.name().map(|n| n.as_str()), Some("steam"));
        assert_eq!(token.tint(), Tint::WHITE);
        assert!(token.is_interactive());
    }

    #[test]
    fn placeholder_can_fail_but_idle_cannot() {
        let mut placeholder = ElementToken::placeholder(
            TokenId::new(),
            Bounds::from_center_size(Vec2::ZERO, Vec2::new(1.0, 1.0)),
            3,
            Tint::dimmed(),
        );
        placeholder.fail(Tint::rgba(1.0, 0.3, 0.3, 1.0)).expect("fails");
        assert_eq!(placeholder.state(), TokenState::Failed);
        assert!(!placeholder.is_interactive());

        let mut idle = token_at(0.0, 0.0);
        assert!(idle.fail(Tint::WHITE).is_err());
    }

    #[test]
    fn consume_and_restore() {
        let mut token = token_at(0.0, 0.0);
        token.consume().expect("consumed");
        assert!(!token.is_visible());
        assert!(!token.is_interactive());
        assert!(token.consume().is_err());

        token.restore();
        assert!(token.is_visible());
        assert!(token.is_interactive());
        assert_eq!(token.state(), TokenState::Idle);
    }

    #[test]
    fn highlight_reports_changes_once() {
        let mut token = token_at(0.0, 0.0);
        assert!(token.set_merge_highlight(Some(1.2)));
        assert!(!token.set_merge_highlight(Some(1.2)));
        assert_eq!(token.scale(), 1.2);
        assert!(token.set_merge_highlight(None));
        assert!(!token.set_merge_highlight(None));
        assert_eq!(token.scale(), 1.0);
    }
}
