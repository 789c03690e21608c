//! Session lifecycle use cases: load and seed, spawn from the palette,
//! remove a token, wipe the save.

use std::sync::Arc;

use alchemy_domain::{ElementImage, ElementName, TokenId, TokenState, Vec2};

use crate::entities::{Board, PairMemo};
use crate::infrastructure::ports::{BoardError, CataloguePort, StoreError};

/// Container for session use cases.
pub struct SessionUseCases {
    pub load: Arc<LoadSession>,
    pub spawn: Arc<SpawnElement>,
    pub remove: Arc<RemoveToken>,
    pub reset: Arc<ResetSession>,
}

impl SessionUseCases {
    pub fn new(
        load: Arc<LoadSession>,
        spawn: Arc<SpawnElement>,
        remove: Arc<RemoveToken>,
        reset: Arc<ResetSession>,
    ) -> Self {
        Self {
            load,
            spawn,
            remove,
            reset,
        }
    }
}

/// A starting element placed on the board when the session opens.
#[derive(Debug, Clone)]
pub struct SeedElement {
    pub name: ElementName,
    pub image: ElementImage,
    pub position: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedSession {
    /// Every known element, in discovery order
    pub elements: Vec<ElementName>,
    /// Tokens spawned for the seed elements
    pub seeded: Vec<TokenId>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown element: {0}")]
    UnknownElement(ElementName),
    #[error("No stored image for element: {0}")]
    MissingImage(ElementName),
    #[error("Token {0} is part of a running merge")]
    TokenBusy(TokenId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Register every persisted element with the catalogue and place the seeds.
pub struct LoadSession {
    memo: Arc<PairMemo>,
    board: Arc<Board>,
    catalogue: Arc<dyn CataloguePort>,
}

impl LoadSession {
    pub fn new(memo: Arc<PairMemo>, board: Arc<Board>, catalogue: Arc<dyn CataloguePort>) -> Self {
        Self {
            memo,
            board,
            catalogue,
        }
    }

    pub async fn execute(&self, seeds: &[SeedElement]) -> Result<LoadedSession, SessionError> {
        for seed in seeds {
            if !self.memo.contains_element(&seed.name).await {
                self.memo.save_image(&seed.name, &seed.image).await?;
                self.memo.append_element(&seed.name).await?;
            }
        }

        let elements = self.memo.element_names().await;
        for name in &elements {
            match self.memo.load_image(name).await? {
                Some(image) => self.catalogue.register_element(name, &image),
                None => tracing::warn!(name = %name, "Element has no stored image, not registered"),
            }
        }

        let seeded = seeds
            .iter()
            .map(|seed| {
                self.board
                    .spawn_element(seed.name.clone(), seed.image.clone(), seed.position)
                    .id()
            })
            .collect();

        tracing::info!(elements = elements.len(), seeds = seeds.len(), "Session loaded");
        Ok(LoadedSession { elements, seeded })
    }
}

/// Spawn a token for an already discovered element (palette button).
pub struct SpawnElement {
    memo: Arc<PairMemo>,
    board: Arc<Board>,
}

impl SpawnElement {
    pub fn new(memo: Arc<PairMemo>, board: Arc<Board>) -> Self {
        Self { memo, board }
    }

    pub async fn execute(&self, name: &ElementName, position: Vec2) -> Result<TokenId, SessionError> {
        if !self.memo.contains_element(name).await {
            return Err(SessionError::UnknownElement(name.clone()));
        }
        let image = self
            .memo
            .load_image(name)
            .await?
            .ok_or_else(|| SessionError::MissingImage(name.clone()))?;
        Ok(self.board.spawn_element(name.clone(), image, position).id())
    }
}

/// Remove a token on player request.
///
/// Tokens held by a running merge (hidden inputs, `Loading` placeholders)
/// belong to the pipeline and cannot be removed; `Failed` placeholders can.
pub struct RemoveToken {
    board: Arc<Board>,
}

impl RemoveToken {
    pub fn new(board: Arc<Board>) -> Self {
        Self { board }
    }

    pub fn execute(&self, token: TokenId) -> Result<(), SessionError> {
        let current = self
            .board
            .get(token)
            .ok_or(BoardError::TokenNotFound(token))?;
        if !current.is_interactive() && current.state() != TokenState::Failed {
            return Err(SessionError::TokenBusy(token));
        }
        self.board.destroy(token)?;
        Ok(())
    }
}

/// Delete every save file and clear the board.
pub struct ResetSession {
    memo: Arc<PairMemo>,
    board: Arc<Board>,
}

impl ResetSession {
    pub fn new(memo: Arc<PairMemo>, board: Arc<Board>) -> Self {
        Self { memo, board }
    }

    pub async fn execute(&self) -> Result<(), SessionError> {
        self.memo.reset().await?;
        let removed = self.board.clear();
        tracing::info!(tokens = removed, "Session reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockCataloguePort;
    use crate::infrastructure::transitions::TransitionScheduler;
    use crate::test_fixtures::{element_name, Harness, InMemoryElementStore, RecordingRenderer, StubGenerator};
    use mockall::predicate::*;
    use std::time::Duration;

    fn seed(name: &str, x: f32) -> SeedElement {
        SeedElement {
            name: element_name(name),
            image: ElementImage::new(name.as_bytes().to_vec()),
            position: Vec2::new(x, 0.0),
        }
    }

    async fn parts(store: Arc<InMemoryElementStore>) -> (Arc<PairMemo>, Arc<Board>) {
        let renderer = Arc::new(RecordingRenderer::default());
        let transitions = Arc::new(TransitionScheduler::new(renderer.clone(), Duration::ZERO));
        let board = Arc::new(Board::new(renderer, transitions));
        let memo = Arc::new(PairMemo::load(store).await.expect("memo loads"));
        (memo, board)
    }

    #[tokio::test]
    async fn load_registers_every_known_element_once() {
        let store = Arc::new(InMemoryElementStore::default());
        store.seed_names(vec![element_name("steam")]);
        store.seed_image(&element_name("steam"), ElementImage::new(vec![3]));
        let (memo, board) = parts(store.clone()).await;

        let mut catalogue = MockCataloguePort::new();
        for name in ["steam", "fire", "water"] {
            catalogue
                .expect_register_element()
                .with(eq(element_name(name)), always())
                .times(1)
                .return_const(());
        }

        let loaded = LoadSession::new(memo, board.clone(), Arc::new(catalogue))
            .execute(&[seed("fire", 0.0), seed("water", 5.0)])
            .await
            .expect("loads");

        assert_eq!(
            loaded.elements,
            vec![element_name("steam"), element_name("fire"), element_name("water")]
        );
        assert_eq!(loaded.seeded.len(), 2);
        assert_eq!(board.tokens().len(), 2);
        assert_eq!(store.element_names().len(), 3);
    }

    #[tokio::test]
    async fn spawn_requires_a_known_element() {
        let store = Arc::new(InMemoryElementStore::default());
        let (memo, board) = parts(store).await;
        let spawn = SpawnElement::new(memo.clone(), board.clone());

        let err = spawn
            .execute(&element_name("fire"), Vec2::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownElement(_)));

        memo.save_image(&element_name("fire"), &ElementImage::new(vec![1]))
            .await
            .expect("saved");
        memo.append_element(&element_name("fire"))
            .await
            .expect("appended");
        let token = spawn
            .execute(&element_name("fire"), Vec2::ZERO)
            .await
            .expect("spawned");
        assert!(board.contains(token));
    }

    #[tokio::test]
    async fn remove_refuses_tokens_held_by_a_merge() {
        let generator = StubGenerator::reacting("steam", vec![1], vec![2]).gated();
        let harness = Harness::new(generator).await;
        let fire = harness.seed("fire", Vec2::new(0.0, 0.0)).await;
        let water = harness.seed("water", Vec2::new(0.5, 0.0)).await;
        let remove = RemoveToken::new(harness.board.clone());

        let handle = harness.merge.attempt_merge(fire, water).expect("merge starts");

        assert!(matches!(
            remove.execute(fire),
            Err(SessionError::TokenBusy(_))
        ));
        assert!(matches!(
            remove.execute(handle.placeholder),
            Err(SessionError::TokenBusy(_))
        ));

        harness.generator.release();
        handle.outcome().await;
    }

    #[tokio::test]
    async fn reset_wipes_store_and_board() {
        let harness = Harness::new(StubGenerator::inert()).await;
        harness.seed("fire", Vec2::ZERO).await;
        let reset = ResetSession::new(harness.memo.clone(), harness.board.clone());

        reset.execute().await.expect("reset");

        assert!(harness.board.tokens().is_empty());
        assert!(harness.store.element_names().is_empty());
        assert!(harness.memo.element_names().await.is_empty());
    }
}
