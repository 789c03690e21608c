//! Name proposal through fal.ai's any-llm endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use alchemy_domain::ElementName;

use super::{extract_result_field, FalClient, FalCredential, FalSettings};
use crate::infrastructure::ports::{GenerationError, NameProposalPort};

const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct AnyLlmRequest<'a> {
    model: &'a str,
    prompt: String,
    reasoning: bool,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct AnyLlmResponse {
    #[serde(default)]
    output: String,
}

pub struct FalAnyLlm {
    client: FalClient,
    endpoint: String,
    model: String,
}

impl FalAnyLlm {
    pub fn new(client: FalClient, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &FalSettings, credential: FalCredential) -> Self {
        Self::new(
            FalClient::from_settings(settings, credential),
            &settings.llm_endpoint,
            &settings.llm_model,
        )
    }
}

/// Ask for the product of two elements as `{ result: "<name>" }`.
fn combination_prompt(first: &ElementName, second: &ElementName) -> String {
    format!(
        "1. Combine this two element and give me new element. \n\
         2. It could be no new element if not reactable( return empty ) \n\
         3. It could be very creative element, such as dragon, anime character, ghost or robot\n\
         4. Reference Little Alchemy 2 game for as example \n\
         5. return as json format {{ result:\"new-element-name\" }} \n\
         6. example: I give you {{fire}} and {{water}}, you return {{ result:\"steam\"}} \n\n\
         Given Element: {}, {}",
        first, second
    )
}

#[async_trait]
impl NameProposalPort for FalAnyLlm {
    async fn propose_name(
        &self,
        first: &ElementName,
        second: &ElementName,
    ) -> Result<Option<ElementName>, GenerationError> {
        let request = AnyLlmRequest {
            model: &self.model,
            prompt: combination_prompt(first, second),
            reasoning: false,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response: AnyLlmResponse = self.client.call(&self.endpoint, &request).await?;
        tracing::debug!(%first, %second, output = %response.output, "Name proposal received");

        let Some(raw) = extract_result_field(&response.output)? else {
            return Ok(None);
        };
        ElementName::from_proposal(&raw).map_err(|e| GenerationError::InvalidResponse(e.to_string()))
    }
}
