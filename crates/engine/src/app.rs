//! Application state and composition.

use std::path::Path;
use std::sync::Arc;

use alchemy_domain::{ElementImage, ElementName, Vec2};

use crate::entities::{AabbOverlapDetector, Board, Combination, PairMemo};
use crate::infrastructure::{
    app_settings::AlchemySettings,
    fal::{FalAnyLlm, FalCredential, FalNanoBanana, FalRemBg},
    file_store::FileElementStore,
    ports::{
        BackgroundRemovalPort, CataloguePort, ElementStorePort, ImageSynthesisPort,
        NameProposalPort, RenderPort, StoreError,
    },
    transitions::TransitionScheduler,
};
use crate::use_cases::{
    interaction::TokenInteraction,
    merge::MergeOrchestrator,
    session::{
        LoadSession, LoadedSession, RemoveToken, ResetSession, SeedElement, SessionError,
        SpawnElement,
    },
    SessionUseCases,
};

/// Horizontal spacing between seed tokens.
const SEED_SPACING: f32 = 2.0;

/// Generative back-end used by a session.
pub struct Generators {
    pub names: Arc<dyn NameProposalPort>,
    pub images: Arc<dyn ImageSynthesisPort>,
    pub background: Arc<dyn BackgroundRemovalPort>,
}

impl Generators {
    /// The three fal.ai endpoints sharing one credential.
    pub fn fal(settings: &AlchemySettings, credential: &FalCredential) -> Self {
        Self {
            names: Arc::new(FalAnyLlm::from_settings(&settings.fal, credential.clone())),
            images: Arc::new(FalNanoBanana::from_settings(&settings.fal, credential.clone())),
            background: Arc::new(FalRemBg::from_settings(&settings.fal, credential.clone())),
        }
    }
}

/// One open alchemy session: board, memo, merge pipeline and interaction.
pub struct AlchemySession {
    pub settings: AlchemySettings,
    pub store: Arc<dyn ElementStorePort>,
    pub credential: FalCredential,
    pub board: Arc<Board>,
    pub memo: Arc<PairMemo>,
    pub merge: Arc<MergeOrchestrator>,
    pub interaction: TokenInteraction,
    pub session: SessionUseCases,
    transitions: Arc<TransitionScheduler>,
}

impl AlchemySession {
    /// Open the session stored under `settings.save_dir` with the fal.ai back-end.
    pub async fn open(
        settings: AlchemySettings,
        render: Arc<dyn RenderPort>,
        catalogue: Arc<dyn CataloguePort>,
    ) -> Result<Self, StoreError> {
        let store: Arc<dyn ElementStorePort> =
            Arc::new(FileElementStore::new(settings.save_dir.clone()));

        let key = match settings.fal.api_key.clone() {
            Some(key) => Some(key),
            None => store.load_credential().await?,
        };
        if key.is_none() {
            tracing::warn!("No fal.ai key configured, set FAL_KEY or run `set-key`");
        }
        let credential = FalCredential::new(key);
        let generators = Generators::fal(&settings, &credential);

        Self::assemble(settings, store, credential, generators, render, catalogue).await
    }

    /// Wire a session from explicit parts.
    pub async fn assemble(
        settings: AlchemySettings,
        store: Arc<dyn ElementStorePort>,
        credential: FalCredential,
        generators: Generators,
        render: Arc<dyn RenderPort>,
        catalogue: Arc<dyn CataloguePort>,
    ) -> Result<Self, StoreError> {
        let transitions = Arc::new(TransitionScheduler::new(
            render.clone(),
            settings.transition_duration,
        ));
        let board = Arc::new(Board::new(render, transitions.clone()));
        let memo = Arc::new(PairMemo::load(store.clone()).await?);

        let combination = Arc::new(Combination::new(
            generators.names,
            generators.images,
            generators.background,
        ));

        let mut merge_config = settings.merge_config();
        if settings.add_style_references {
            merge_config.style_references = read_images(&settings.style_reference_paths).await?;
            tracing::info!(
                count = merge_config.style_references.len(),
                "Style references loaded"
            );
        }

        let merge = Arc::new(MergeOrchestrator::new(
            board.clone(),
            memo.clone(),
            combination,
            catalogue.clone(),
            merge_config,
        ));
        let interaction = TokenInteraction::new(
            board.clone(),
            Arc::new(AabbOverlapDetector),
            merge.clone(),
            settings.interaction_config(),
        );

        let session = SessionUseCases::new(
            Arc::new(LoadSession::new(memo.clone(), board.clone(), catalogue)),
            Arc::new(SpawnElement::new(memo.clone(), board.clone())),
            Arc::new(RemoveToken::new(board.clone())),
            Arc::new(ResetSession::new(memo.clone(), board.clone())),
        );

        Ok(Self {
            settings,
            store,
            credential,
            board,
            memo,
            merge,
            interaction,
            session,
            transitions,
        })
    }

    /// Store the seed images found in `settings.seed_dir` and place them.
    pub async fn load(&self) -> Result<LoadedSession, SessionError> {
        let seeds = read_seed_dir(&self.settings.seed_dir).await?;
        self.session.load.execute(&seeds).await
    }

    /// Persist a new fal.ai key and use it for every following request.
    pub async fn set_service_key(&self, key: &str) -> Result<(), StoreError> {
        let key = key.trim();
        self.store.save_credential(key).await?;
        self.credential.set(key);
        tracing::info!("fal.ai key updated");
        Ok(())
    }

    /// Cancel running merges and pending transitions.
    pub async fn shutdown(&self) {
        self.merge.shutdown().await;
        self.transitions.shutdown().await;
    }
}

/// Every `<name>.png` in `dir`, sorted by name and laid out in a row.
///
/// A missing directory yields no seeds.
pub async fn read_seed_dir(dir: &Path) -> Result<Vec<SeedElement>, StoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "Seed directory not found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(StoreError::io("read_seed_dir", e)),
    };

    let mut found = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io("read_seed_dir", e))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match ElementName::new(stem) {
            Ok(name) => found.push((name, path)),
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "Skipping seed file"),
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));

    let mut seeds = Vec::with_capacity(found.len());
    for (index, (name, path)) in found.into_iter().enumerate() {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| StoreError::io("read_seed_dir", format!("{}: {}", path.display(), e)))?;
        seeds.push(SeedElement {
            name,
            image: ElementImage::new(bytes),
            position: Vec2::new(index as f32 * SEED_SPACING, 0.0),
        });
    }
    Ok(seeds)
}

async fn read_images(paths: &[std::path::PathBuf]) -> Result<Vec<ElementImage>, StoreError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            StoreError::io("load_style_reference", format!("{}: {}", path.display(), e))
        })?;
        images.push(ElementImage::new(bytes));
    }
    Ok(images)
}
