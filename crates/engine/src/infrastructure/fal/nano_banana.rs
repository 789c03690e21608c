//! Image synthesis through fal.ai's nano-banana edit endpoint.
//!
//! The reference images are sent inline as data URIs; the edit model copies
//! their style onto a single new element.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use alchemy_domain::{ElementImage, ElementName};

use super::{to_data_uri, FalClient, FalCredential, FalImageRef, FalSettings};
use crate::infrastructure::ports::{GenerationError, ImageSynthesisPort};

#[derive(Debug, Serialize)]
struct ImageEditRequest {
    prompt: String,
    image_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ImageEditResponse {
    #[serde(default)]
    images: Vec<FalImageRef>,
}

pub struct FalNanoBanana {
    client: FalClient,
    endpoint: String,
}

impl FalNanoBanana {
    pub fn new(client: FalClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_settings(settings: &FalSettings, credential: FalCredential) -> Self {
        Self::new(
            FalClient::from_settings(settings, credential),
            &settings.image_edit_endpoint,
        )
    }
}

fn element_prompt(name: &ElementName) -> String {
    format!(
        "1. generate this style of cute element\n\
         2. only generate single element\n\
         3. white/single color background\n\
         4. generate element <{}>",
        name
    )
}

#[async_trait]
impl ImageSynthesisPort for FalNanoBanana {
    async fn synthesize_image(
        &self,
        name: &ElementName,
        references: &[ElementImage],
    ) -> Result<ElementImage, GenerationError> {
        let request = ImageEditRequest {
            prompt: element_prompt(name),
            image_urls: references.iter().map(to_data_uri).collect(),
        };

        let response: ImageEditResponse = self.client.call(&self.endpoint, &request).await?;
        let url = response
            .images
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or_else(|| GenerationError::InvalidResponse("no image in edit response".into()))?;

        tracing::debug!(%name, references = references.len(), %url, "Element image synthesized");
        self.client.download(&url).await
    }
}
