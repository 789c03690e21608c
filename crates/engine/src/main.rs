//! WhatIf Alchemy Engine - headless entry point.
//!
//! ```text
//! alchemy-engine list               show discovered elements
//! alchemy-engine merge <a> <b>      drag <a> onto <b> and wait for the result
//! alchemy-engine reset              delete the save
//! alchemy-engine set-key <key>      store the fal.ai key
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alchemy_domain::{ElementName, Vec2};
use alchemy_engine::infrastructure::app_settings::AlchemySettings;
use alchemy_engine::infrastructure::headless::{TracingCatalogue, TracingRenderer};
use alchemy_engine::use_cases::DropOutcome;
use alchemy_engine::AlchemySession;

/// Where the two tokens of a `merge` command are spawned, clear of the seeds.
const MERGE_ROW_Y: f32 = -10.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alchemy_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = AlchemySettings::from_env();
    tracing::debug!(?settings, "Settings loaded");

    let catalogue = Arc::new(TracingCatalogue::default());
    let session = AlchemySession::open(settings, Arc::new(TracingRenderer), catalogue.clone())
        .await
        .context("failed to open session")?;

    let result = run(&session, &catalogue, &args).await;
    session.shutdown().await;
    result
}

async fn run(
    session: &AlchemySession,
    catalogue: &TracingCatalogue,
    args: &[String],
) -> anyhow::Result<()> {
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["list"] | [] => {
            let loaded = session.load().await?;
            for name in &loaded.elements {
                println!("{}", name);
            }
            tracing::info!(
                elements = loaded.elements.len(),
                registered = catalogue.registered().len(),
                pairs = session.memo.pair_count().await,
                "Session summary"
            );
        }
        ["merge", first, second] => {
            session.load().await?;
            let first = ElementName::new(*first)?;
            let second = ElementName::new(*second)?;
            merge(session, &first, &second).await?;
        }
        ["reset"] => {
            session.session.reset.execute().await?;
            println!("save cleared");
        }
        ["set-key", key] => {
            session.set_service_key(key).await?;
            println!("key saved");
        }
        _ => bail!("usage: alchemy-engine [list | merge <a> <b> | reset | set-key <key>]"),
    }
    Ok(())
}

async fn merge(
    session: &AlchemySession,
    first: &ElementName,
    second: &ElementName,
) -> anyhow::Result<()> {
    let from = Vec2::new(0.0, MERGE_ROW_Y);
    let to = Vec2::new(3.0, MERGE_ROW_Y);
    let dragged = session.session.spawn.execute(first, from).await?;
    let target = session.session.spawn.execute(second, to).await?;

    let interaction = &session.interaction;
    interaction.begin_drag(dragged, from)?;
    interaction.drag(dragged, to)?;

    match interaction.end_drag(dragged)? {
        DropOutcome::Merging { merge, .. } => {
            let outcome = merge.outcome().await;
            println!("{} + {} -> {}", first, second, outcome);
        }
        DropOutcome::Rejected { error, .. } => bail!("merge refused: {}", error),
        DropOutcome::Released => bail!("token {} was not dropped onto {}", dragged, target),
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
