//! fal.ai clients for the three generative capabilities.
//!
//! All endpoints share one HTTP client and one credential. Requests are
//! `POST {base_url}{endpoint}` with a JSON body and `Authorization: Key <key>`;
//! result images are returned as URLs and downloaded afterwards.

mod any_llm;
mod json_extract;
mod nano_banana;
mod rembg;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use alchemy_domain::ElementImage;

use crate::infrastructure::app_settings::{env_parse, env_string};
use crate::infrastructure::ports::GenerationError;

pub use any_llm::FalAnyLlm;
pub use json_extract::{extract_objects, extract_result_field};
pub use nano_banana::FalNanoBanana;
pub use rembg::FalRemBg;

/// Default fal.ai base URL.
pub const DEFAULT_FAL_BASE_URL: &str = "https://fal.run/";

/// Default model behind the any-llm endpoint.
pub const DEFAULT_FAL_LLM_MODEL: &str = "google/gemini-2.0-flash-001";

pub const ANY_LLM_ENDPOINT: &str = "fal-ai/any-llm";
pub const IMAGE_EDIT_ENDPOINT: &str = "fal-ai/nano-banana/edit";
pub const REMBG_ENDPOINT: &str = "fal-ai/imageutils/rembg";

#[derive(Clone)]
pub struct FalSettings {
    pub base_url: String,
    pub llm_endpoint: String,
    pub llm_model: String,
    pub image_edit_endpoint: String,
    pub rembg_endpoint: String,
    pub timeout: Duration,
    /// From `FAL_KEY`; `key.config` in the save directory is used when unset.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for FalSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FalSettings")
            .field("base_url", &self.base_url)
            .field("llm_endpoint", &self.llm_endpoint)
            .field("llm_model", &self.llm_model)
            .field("image_edit_endpoint", &self.image_edit_endpoint)
            .field("rembg_endpoint", &self.rembg_endpoint)
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for FalSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FAL_BASE_URL.to_string(),
            llm_endpoint: ANY_LLM_ENDPOINT.to_string(),
            llm_model: DEFAULT_FAL_LLM_MODEL.to_string(),
            image_edit_endpoint: IMAGE_EDIT_ENDPOINT.to_string(),
            rembg_endpoint: REMBG_ENDPOINT.to_string(),
            timeout: Duration::from_secs(120),
            api_key: None,
        }
    }
}

impl FalSettings {
    /// Uses `FAL_BASE_URL`, `FAL_LLM_ENDPOINT`, `FAL_LLM_MODEL`,
    /// `FAL_IMAGE_EDIT_ENDPOINT`, `FAL_REMBG_ENDPOINT`, `FAL_TIMEOUT_SECS`
    /// and `FAL_KEY`, falling back to defaults if not set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_string("FAL_BASE_URL").unwrap_or(defaults.base_url),
            llm_endpoint: env_string("FAL_LLM_ENDPOINT").unwrap_or(defaults.llm_endpoint),
            llm_model: env_string("FAL_LLM_MODEL").unwrap_or(defaults.llm_model),
            image_edit_endpoint: env_string("FAL_IMAGE_EDIT_ENDPOINT")
                .unwrap_or(defaults.image_edit_endpoint),
            rembg_endpoint: env_string("FAL_REMBG_ENDPOINT").unwrap_or(defaults.rembg_endpoint),
            timeout: env_parse::<u64>("FAL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            api_key: env_string("FAL_KEY"),
        }
    }
}

/// The fal.ai key, shared by every client and replaceable at runtime.
#[derive(Clone, Default)]
pub struct FalCredential {
    key: Arc<RwLock<Option<String>>>,
}

impl FalCredential {
    pub fn new(key: Option<String>) -> Self {
        let credential = Self::default();
        if let Some(key) = key {
            credential.set(&key);
        }
        credential
    }

    /// Blank keys clear the credential.
    pub fn set(&self, key: &str) {
        let key = key.trim();
        *self.key.write().unwrap_or_else(PoisonError::into_inner) =
            (!key.is_empty()).then(|| key.to_string());
    }

    pub fn get(&self) -> Option<String> {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

impl std::fmt::Debug for FalCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FalCredential")
            .field("set", &self.is_set())
            .finish()
    }
}

/// An image reference in a fal.ai response.
#[derive(Debug, Deserialize)]
pub(crate) struct FalImageRef {
    pub url: String,
}

/// Shared HTTP plumbing for the fal.ai endpoints.
#[derive(Clone)]
pub struct FalClient {
    client: Client,
    base_url: String,
    credential: FalCredential,
}

impl FalClient {
    pub fn new(base_url: &str, timeout: Duration, credential: FalCredential) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            client,
            base_url,
            credential,
        }
    }

    pub fn from_settings(settings: &FalSettings, credential: FalCredential) -> Self {
        Self::new(&settings.base_url, settings.timeout, credential)
    }

    /// POST `body` to `endpoint` and decode the JSON response.
    pub(crate) async fn call<B, R>(&self, endpoint: &str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let Some(key) = self.credential.get() else {
            tracing::warn!(endpoint, "fal.ai key is not configured");
            return Err(GenerationError::MissingCredential);
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint.trim_start_matches('/')))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", key))
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
            tracing::warn!(endpoint, status = status.as_u16(), body = %error_text, "fal.ai request failed");
            return Err(GenerationError::RequestFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))
    }

    /// Download a result image, bypassing any intermediate cache.
    pub(crate) async fn download(&self, url: &str) -> Result<ElementImage, GenerationError> {
        let nocache = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        let response = self
            .client
            .get(url)
            .query(&[("nocache", nocache.to_string())])
            .header(reqwest::header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(reqwest::header::PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::RequestFailed(format!(
                "HTTP {} downloading {}",
                status, url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
        if bytes.is_empty() {
            return Err(GenerationError::InvalidResponse(format!(
                "empty image at {}",
                url
            )));
        }
        Ok(ElementImage::new(bytes.to_vec()))
    }
}

/// `data:image/png;base64,...` for sending an image inline.
pub fn to_data_uri(image: &ElementImage) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(image.as_bytes())
    )
}
