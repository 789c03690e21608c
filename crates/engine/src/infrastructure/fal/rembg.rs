//! Background removal through fal.ai's rembg utility.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use alchemy_domain::ElementImage;

use super::{to_data_uri, FalClient, FalCredential, FalImageRef, FalSettings};
use crate::infrastructure::ports::{BackgroundRemovalPort, GenerationError};

#[derive(Debug, Serialize)]
struct RemBgRequest {
    image_url: String,
}

#[derive(Debug, Deserialize)]
struct RemBgResponse {
    image: Option<FalImageRef>,
}

pub struct FalRemBg {
    client: FalClient,
    endpoint: String,
}

impl FalRemBg {
    pub fn new(client: FalClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_settings(settings: &FalSettings, credential: FalCredential) -> Self {
        Self::new(
            FalClient::from_settings(settings, credential),
            &settings.rembg_endpoint,
        )
    }
}

#[async_trait]
impl BackgroundRemovalPort for FalRemBg {
    async fn remove_background(
        &self,
        image: &ElementImage,
    ) -> Result<ElementImage, GenerationError> {
        let request = RemBgRequest {
            image_url: to_data_uri(image),
        };

        let response: RemBgResponse = self.client.call(&self.endpoint, &request).await?;
        let url = response
            .image
            .map(|image| image.url)
            .ok_or_else(|| GenerationError::InvalidResponse("no image in rembg response".into()))?;

        self.client.download(&url).await
    }
}
