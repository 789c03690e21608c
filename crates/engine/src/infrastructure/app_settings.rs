//! Application settings
//!
//! Every value has a default and can be overridden from the environment
//! (`ALCHEMY_*` for the session, `FAL_*` for the generative back-end).
//! `main` loads `.env.local` / `.env` from the repo root before reading them.
//!
//! # Variables
//!
//! | Variable | Default |
//! |---|---|
//! | `ALCHEMY_SAVE_DIR` | `save` |
//! | `ALCHEMY_SEED_DIR` | `assets/seed` |
//! | `ALCHEMY_DRAG_SCALE` | `1.1` |
//! | `ALCHEMY_HIGHLIGHT_SCALE` | `1.2` |
//! | `ALCHEMY_DRAG_TINT` | `1,0.92,0.92,1` |
//! | `ALCHEMY_LOADING_TINT` | `0.5,0.5,0.5,0.6` |
//! | `ALCHEMY_FAILED_TINT` | `1,0.35,0.35,0.8` |
//! | `ALCHEMY_STYLE_REFERENCES` | empty (comma-separated image paths) |
//! | `ALCHEMY_ADD_STYLE_REFERENCES` | `false` |
//! | `ALCHEMY_MERGE_ENABLED` | `true` |
//! | `ALCHEMY_MERGE_TIMEOUT_SECS` | unset (wait forever) |
//! | `ALCHEMY_TRANSITION_MS` | `150` |
//! | `FAL_KEY` | unset (falls back to `key.config`) |
//! | `FAL_BASE_URL` | `https://fal.run/` |
//! | `FAL_LLM_ENDPOINT` | `fal-ai/any-llm` |
//! | `FAL_LLM_MODEL` | `google/gemini-2.0-flash-001` |
//! | `FAL_IMAGE_EDIT_ENDPOINT` | `fal-ai/nano-banana/edit` |
//! | `FAL_REMBG_ENDPOINT` | `fal-ai/imageutils/rembg` |
//! | `FAL_TIMEOUT_SECS` | `120` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alchemy_domain::{DragStyle, Tint};

use crate::infrastructure::fal::FalSettings;
use crate::use_cases::interaction::InteractionConfig;
use crate::use_cases::merge::MergeConfig;

#[derive(Debug, Clone)]
pub struct AlchemySettings {
    /// Session root holding every save file
    pub save_dir: PathBuf,
    /// Directory of `<name>.png` starting elements
    pub seed_dir: PathBuf,

    pub drag_scale: f32,
    pub highlight_scale: f32,
    pub drag_tint: Tint,
    pub loading_tint: Tint,
    pub failed_tint: Tint,

    pub style_reference_paths: Vec<PathBuf>,
    /// Send the style references with every synthesis request
    pub add_style_references: bool,

    pub merge_enabled: bool,
    pub merge_timeout: Option<Duration>,
    pub transition_duration: Duration,

    pub fal: FalSettings,
}

impl Default for AlchemySettings {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("save"),
            seed_dir: PathBuf::from("assets/seed"),
            drag_scale: 1.1,
            highlight_scale: 1.2,
            drag_tint: Tint::rgba(1.0, 0.92, 0.92, 1.0),
            loading_tint: Tint::dimmed(),
            failed_tint: Tint::rgba(1.0, 0.35, 0.35, 0.8),
            style_reference_paths: Vec::new(),
            add_style_references: false,
            merge_enabled: true,
            merge_timeout: None,
            transition_duration: Duration::from_millis(150),
            fal: FalSettings::default(),
        }
    }
}

impl AlchemySettings {
    /// Read settings from the environment, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            save_dir: env_string("ALCHEMY_SAVE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.save_dir),
            seed_dir: env_string("ALCHEMY_SEED_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.seed_dir),
            drag_scale: env_parse("ALCHEMY_DRAG_SCALE").unwrap_or(defaults.drag_scale),
            highlight_scale: env_parse("ALCHEMY_HIGHLIGHT_SCALE")
                .unwrap_or(defaults.highlight_scale),
            drag_tint: env_tint("ALCHEMY_DRAG_TINT").unwrap_or(defaults.drag_tint),
            loading_tint: env_tint("ALCHEMY_LOADING_TINT").unwrap_or(defaults.loading_tint),
            failed_tint: env_tint("ALCHEMY_FAILED_TINT").unwrap_or(defaults.failed_tint),
            style_reference_paths: env_string("ALCHEMY_STYLE_REFERENCES")
                .map(|raw| parse_paths(&raw))
                .unwrap_or(defaults.style_reference_paths),
            add_style_references: env_parse("ALCHEMY_ADD_STYLE_REFERENCES")
                .unwrap_or(defaults.add_style_references),
            merge_enabled: env_parse("ALCHEMY_MERGE_ENABLED").unwrap_or(defaults.merge_enabled),
            merge_timeout: env_parse::<u64>("ALCHEMY_MERGE_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .or(defaults.merge_timeout),
            transition_duration: env_parse::<u64>("ALCHEMY_TRANSITION_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.transition_duration),
            fal: FalSettings::from_env(),
        }
    }

    pub fn interaction_config(&self) -> InteractionConfig {
        InteractionConfig {
            drag: DragStyle {
                scale: self.drag_scale,
                tint: self.drag_tint,
            },
            highlight_scale: self.highlight_scale,
        }
    }

    /// Merge configuration without style references; those are loaded from disk at open.
    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            enabled: self.merge_enabled,
            loading_tint: self.loading_tint,
            failed_tint: self.failed_tint,
            style_references: Vec::new(),
            timeout: self.merge_timeout,
        }
    }
}

pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

fn env_tint(key: &str) -> Option<Tint> {
    let raw = env_string(key)?;
    let tint = parse_tint(&raw);
    if tint.is_none() {
        tracing::warn!(key, value = %raw, "Ignoring unparseable tint, expected r,g,b,a");
    }
    tint
}

/// `r,g,b,a` with components in 0..=1.
fn parse_tint(raw: &str) -> Option<Tint> {
    let parts: Vec<f32> = raw
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b, a] if parts.iter().all(|c| (0.0..=1.0).contains(c)) => {
            Some(Tint::rgba(*r, *g, *b, *a))
        }
        _ => None,
    }
}

fn parse_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tint_components() {
        assert_eq!(
            parse_tint("1, 0.5, 0.25, 1"),
            Some(Tint::rgba(1.0, 0.5, 0.25, 1.0))
        );
        assert_eq!(parse_tint("1,1,1"), None);
        assert_eq!(parse_tint("2,1,1,1"), None);
        assert_eq!(parse_tint("red"), None);
    }

    #[test]
    fn parses_comma_separated_paths() {
        assert_eq!(
            parse_paths("a.png, ,b/c.png"),
            vec![PathBuf::from("a.png"), PathBuf::from("b/c.png")]
        );
    }

    #[test]
    fn defaults_enable_merging_without_timeout() {
        let settings = AlchemySettings::default();
        let interaction = settings.interaction_config();
        assert_eq!(interaction.drag.scale, 1.1);
        assert!(settings.merge_config().enabled);
        assert_eq!(settings.merge_config().timeout, None);
    }
}
