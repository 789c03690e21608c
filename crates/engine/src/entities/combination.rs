//! Generative combination entity operations.

use std::sync::Arc;
use std::time::Instant;

use alchemy_domain::{ElementImage, ElementName};

use crate::infrastructure::ports::{
    BackgroundRemovalPort, GenerationError, ImageSynthesisPort, NameProposalPort,
};

/// Façade over the three generative capabilities a merge needs.
///
/// Each call is single-shot: no retries, exactly one success or error.
pub struct Combination {
    names: Arc<dyn NameProposalPort>,
    images: Arc<dyn ImageSynthesisPort>,
    background: Arc<dyn BackgroundRemovalPort>,
}

impl Combination {
    pub fn new(
        names: Arc<dyn NameProposalPort>,
        images: Arc<dyn ImageSynthesisPort>,
        background: Arc<dyn BackgroundRemovalPort>,
    ) -> Self {
        Self {
            names,
            images,
            background,
        }
    }

    /// `Ok(None)` when the two elements do not react.
    pub async fn propose_name(
        &self,
        first: &ElementName,
        second: &ElementName,
    ) -> Result<Option<ElementName>, GenerationError> {
        let started = Instant::now();
        let result = self.names.propose_name(first, second).await;
        match &result {
            Ok(Some(name)) => tracing::info!(
                first = %first,
                second = %second,
                result = %name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Name proposed"
            ),
            Ok(None) => tracing::info!(first = %first, second = %second, "No reaction"),
            Err(e) => tracing::warn!(first = %first, second = %second, error = %e, "Name proposal failed"),
        }
        result
    }

    pub async fn synthesize_image(
        &self,
        name: &ElementName,
        references: &[ElementImage],
    ) -> Result<ElementImage, GenerationError> {
        let started = Instant::now();
        let result = self.images.synthesize_image(name, references).await;
        match &result {
            Ok(image) => tracing::info!(
                name = %name,
                references = references.len(),
                bytes = image.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Image synthesized"
            ),
            Err(e) => tracing::warn!(name = %name, error = %e, "Image synthesis failed"),
        }
        result
    }

    pub async fn remove_background(
        &self,
        image: &ElementImage,
    ) -> Result<ElementImage, GenerationError> {
        let started = Instant::now();
        let result = self.background.remove_background(image).await;
        match &result {
            Ok(cleaned) => tracing::debug!(
                bytes = cleaned.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Background removed"
            ),
            Err(e) => tracing::warn!(error = %e, "Background removal failed"),
        }
        result
    }
}
