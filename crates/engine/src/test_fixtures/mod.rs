//! Test fixtures: in-memory fakes for every port and a wired-up session
//! harness for scenario tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{Harness, StubGenerator};
//!
//! #[tokio::test]
//! async fn fire_and_water_make_steam() {
//!     let harness = Harness::new(StubGenerator::reacting("steam", vec![1], vec![2])).await;
//!     let fire = harness.seed("fire", Vec2::new(0.0, 0.0)).await;
//!     // ... drag fire onto water
//! }
//! ```

pub mod generator_mocks;
pub mod render_fakes;
pub mod store_fakes;

use std::sync::Arc;
use std::time::Duration;

use alchemy_domain::{ElementImage, ElementName, TokenId, Vec2};

use crate::entities::{AabbOverlapDetector, Board, Combination, PairMemo};
use crate::infrastructure::transitions::TransitionScheduler;
use crate::use_cases::interaction::{InteractionConfig, TokenInteraction};
use crate::use_cases::merge::{MergeConfig, MergeOrchestrator};

pub use generator_mocks::StubGenerator;
pub use render_fakes::{RecordingCatalogue, RecordingRenderer, RenderCall, SPRITE_SIZE};
pub use store_fakes::InMemoryElementStore;

/// Valid element name.
///
/// # Panics
///
/// Panics if `name` is not a valid element name.
pub fn element_name(name: &str) -> ElementName {
    ElementName::new(name).unwrap_or_else(|e| panic!("invalid element name '{}': {}", name, e))
}

/// Deterministic image bytes for a seed element.
pub fn seed_image(name: &str) -> ElementImage {
    ElementImage::new(format!("png:{}", name).into_bytes())
}

// =============================================================================
// Session Harness
// =============================================================================

/// Board, memo, orchestrator and interaction wired to fakes.
pub struct Harness {
    pub store: Arc<InMemoryElementStore>,
    pub renderer: Arc<RecordingRenderer>,
    pub catalogue: Arc<RecordingCatalogue>,
    pub generator: Arc<StubGenerator>,
    pub board: Arc<Board>,
    pub memo: Arc<PairMemo>,
    pub merge: Arc<MergeOrchestrator>,
    pub interaction: TokenInteraction,
}

impl Harness {
    pub async fn new(generator: StubGenerator) -> Self {
        Self::build(
            Arc::new(InMemoryElementStore::default()),
            generator,
            MergeConfig::default(),
        )
        .await
    }

    pub async fn with_config(generator: StubGenerator, config: MergeConfig) -> Self {
        Self::build(Arc::new(InMemoryElementStore::default()), generator, config).await
    }

    /// Reopen a session on an existing store.
    pub async fn with_store(store: Arc<InMemoryElementStore>, generator: StubGenerator) -> Self {
        Self::build(store, generator, MergeConfig::default()).await
    }

    async fn build(
        store: Arc<InMemoryElementStore>,
        generator: StubGenerator,
        config: MergeConfig,
    ) -> Self {
        let renderer = Arc::new(RecordingRenderer::default());
        let catalogue = Arc::new(RecordingCatalogue::default());
        let generator = Arc::new(generator);

        let transitions = Arc::new(TransitionScheduler::new(renderer.clone(), Duration::ZERO));
        let board = Arc::new(Board::new(renderer.clone(), transitions));
        let memo = Arc::new(
            PairMemo::load(store.clone())
                .await
                .unwrap_or_else(|e| panic!("memo failed to load: {}", e)),
        );
        let combination = Arc::new(Combination::new(
            generator.clone(),
            generator.clone(),
            generator.clone(),
        ));
        let merge = Arc::new(MergeOrchestrator::new(
            board.clone(),
            memo.clone(),
            combination,
            catalogue.clone(),
            config,
        ));
        let interaction = TokenInteraction::new(
            board.clone(),
            Arc::new(AabbOverlapDetector),
            merge.clone(),
            InteractionConfig::default(),
        );

        Self {
            store,
            renderer,
            catalogue,
            generator,
            board,
            memo,
            merge,
            interaction,
        }
    }

    /// Store a seed element (image + list entry) and put a token for it on the board.
    pub async fn seed(&self, name: &str, position: Vec2) -> TokenId {
        let element = element_name(name);
        let image = seed_image(name);
        self.memo
            .save_image(&element, &image)
            .await
            .unwrap_or_else(|e| panic!("seed image for '{}' not saved: {}", name, e));
        self.memo
            .append_element(&element)
            .await
            .unwrap_or_else(|e| panic!("seed '{}' not appended: {}", name, e));
        self.board.spawn_element(element, image, position).id()
    }

    /// Drag `token` onto the center of `target` and release it.
    pub fn drop_onto(
        &self,
        token: TokenId,
        target: TokenId,
    ) -> crate::use_cases::interaction::DropOutcome {
        let from = self
            .board
            .get(token)
            .map(|t| t.position())
            .unwrap_or_else(|| panic!("token {} not on the board", token));
        let to = self
            .board
            .get(target)
            .map(|t| t.position())
            .unwrap_or_else(|| panic!("target {} not on the board", target));
        self.interaction
            .begin_drag(token, from)
            .unwrap_or_else(|e| panic!("drag of {} refused: {}", token, e));
        self.interaction
            .drag(token, to)
            .unwrap_or_else(|e| panic!("drag of {} failed: {}", token, e));
        self.interaction
            .end_drag(token)
            .unwrap_or_else(|e| panic!("release of {} failed: {}", token, e))
    }
}
