//! Message translation over HTTP, with fallback to the original text.

use crate::config::SyncSettings;
use crate::core::traits::Translator;
use crate::error::TranslationError;
use async_trait::async_trait;
use log::warn;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TranslationRequest<'a> {
    text: &'a str,
    target_language: &'a str,
}

#[derive(Deserialize, Debug)]
struct TranslationResponse {
    text: String,
}

pub struct HttpTranslator {
    http: HttpClient,
    endpoint: String,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TranslationError> {
        let http = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// `None` when no translation endpoint is configured.
    pub fn from_settings(settings: &SyncSettings) -> Result<Option<Self>, TranslationError> {
        settings.translation_url.as_deref().map(Self::new).transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&TranslationRequest {
                text,
                target_language,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TranslationError::Status(resp.status().as_u16()));
        }

        Ok(resp.json::<TranslationResponse>().await?.text)
    }
}

/// Translates `text`, or hands it back unchanged if translation fails for any reason.
pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    target_language: &str,
) -> String {
    match translator.translate(text, target_language).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!("showing untranslated text, translation to {target_language} failed: {e}");
            text.to_owned()
        }
    }
}
