//! A generic OpenAI-compatible chat-completions adapter implementing
//! [`LLMProvider`] (§6 "LLM Provider", §9 "Polymorphism over providers"). The
//! internals of any specific model stay out of scope (§1); this is the one
//! concrete network collaborator the orchestrator dispatches to.

use async_trait::async_trait;
use prd_config::PrivacyLevel;
use prd_providers::{
    Capability, ContextRequestPort, GenerateCommand, GenerationOutput, LLMProvider, MockupAnalysis,
    MockupAnalysisContext, MockupExtraction, ProviderError, ProviderResult, RequirementsAnalysis,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const CAPABILITIES: &[Capability] =
    &[Capability::TextGeneration, Capability::RequirementsAnalysis, Capability::VisionAnalysis];

/// Per-adapter settings, sourced from `{NAME}_API_KEY`/`{NAME}_API_BASE`/`{NAME}_MODEL` (§6).
pub struct HttpProviderSettings {
    pub name: String,
    pub priority: u32,
    pub max_privacy_level: PrivacyLevel,
    pub api_base: String,
    pub model: String,
    pub api_key: String,
}

/// Drives any OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpLlmProvider {
    client: reqwest::Client,
    settings: HttpProviderSettings,
}

impl HttpLlmProvider {
    #[must_use]
    pub fn new(settings: HttpProviderSettings) -> Self {
        Self { client: reqwest::Client::new(), settings }
    }

    async fn chat(&self, system: &str, user: &str) -> ProviderResult<String> {
        let body = json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });
        let url = format!("{}/chat/completions", self.settings.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let reason = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unauthorized { provider: self.settings.name.clone(), reason });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reason = response.text().await.unwrap_or_default();
            return Err(ProviderError::RateLimited { provider: self.settings.name.clone(), reason });
        }
        if status.is_server_error() {
            let reason = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream { provider: self.settings.name.clone(), reason });
        }
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(ProviderError::Other(format!("unexpected status {status}: {reason}")));
        }

        let parsed: ChatCompletion = response.json().await.map_err(|e| ProviderError::MalformedResponse {
            provider: self.settings.name.clone(),
            reason: e.to_string(),
        })?;
        parsed.choices.into_iter().next().map(|c| c.message.content).ok_or_else(|| {
            ProviderError::MalformedResponse {
                provider: self.settings.name.clone(),
                reason: "no choices in response".to_string(),
            }
        })
    }

    fn map_reqwest_error(&self, e: &reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout { provider: self.settings.name.clone(), timeout_ms: 0 }
        } else {
            ProviderError::Upstream { provider: self.settings.name.clone(), reason: e.to_string() }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisJson {
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    clarifications_needed: Vec<String>,
    #[serde(default)]
    assumptions: Vec<String>,
    #[serde(default)]
    gaps: Vec<String>,
}

/// Strip a Markdown fence the model may have wrapped its JSON answer in.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map_or(trimmed, |rest| rest.strip_suffix("```").unwrap_or(rest).trim())
}

#[async_trait]
impl LLMProvider for HttpLlmProvider {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn priority(&self) -> u32 {
        self.settings.priority
    }

    fn capabilities(&self) -> &[Capability] {
        CAPABILITIES
    }

    fn max_privacy_level(&self) -> PrivacyLevel {
        self.settings.max_privacy_level
    }

    async fn is_available(&self) -> bool {
        !self.settings.api_key.is_empty()
    }

    async fn generate_prd(
        &self,
        command: &GenerateCommand,
        _context_request: Option<Arc<dyn ContextRequestPort>>,
    ) -> ProviderResult<GenerationOutput> {
        let mut user =
            format!("# {}\n\n{}\n\n## Context\n{}\n", command.title, command.description, command.context);
        if !command.clarifications.is_empty() {
            user.push_str("\n## Clarifications\n");
            for answer in &command.clarifications {
                user.push_str(&format!("- Q: {}\n  A: {}\n", answer.question, answer.answer));
            }
        }
        let content = self
            .chat(
                "Write a complete product requirements document in Markdown, using ATX headings \
                 (#, ##, ###) to separate sections such as Executive Summary, User Stories, \
                 Functional Requirements, Non-Functional Requirements, and Risks.",
                &user,
            )
            .await?;
        Ok(GenerationOutput { content, confidence: 0.8, metadata: HashMap::new() })
    }

    async fn analyze_requirements(&self, text: &str) -> ProviderResult<RequirementsAnalysis> {
        let content = self
            .chat(
                "Assess the confidence, open clarification questions, assumptions, and gaps in \
                 this product request. Respond with only JSON matching \
                 {\"confidence\":0-1,\"clarificationsNeeded\":[...],\"assumptions\":[...],\"gaps\":[...]}.",
                text,
            )
            .await?;
        let parsed: AnalysisJson = serde_json::from_str(extract_json(&content)).unwrap_or_default();
        Ok(RequirementsAnalysis {
            confidence: parsed.confidence,
            clarifications_needed: parsed.clarifications_needed,
            assumptions: parsed.assumptions,
            gaps: parsed.gaps,
        })
    }

    async fn extract_from_mockups(&self, sources: &[String]) -> ProviderResult<MockupExtraction> {
        let user = format!("Mockup image references: {}", sources.join(", "));
        let content = self
            .chat(
                "List the features, user flows, UI components, and business logic implied by \
                 these mockup images. Respond with only JSON matching \
                 {\"features\":[...],\"flows\":[...],\"components\":[...],\"businessLogic\":[...]}.",
                &user,
            )
            .await?;
        Ok(serde_json::from_str(extract_json(&content)).unwrap_or_default())
    }

    async fn analyze_mockup(
        &self,
        image_url: &str,
        context: &MockupAnalysisContext,
    ) -> ProviderResult<MockupAnalysis> {
        let user = format!(
            "Mockup image: {image_url}\nRequest: {} - {}\nAlready-processed analyses: {}",
            context.request_title,
            context.request_description,
            context.existing_analyses.len(),
        );
        let content = self
            .chat(
                "Analyze this single mockup image: UI elements, extracted text, layout, color \
                 scheme, user flows, and business logic. Respond with only JSON matching the \
                 MockupAnalysis schema, including an overall confidence in [0,1].",
                &user,
            )
            .await?;
        Ok(serde_json::from_str(extract_json(&content)).unwrap_or_default())
    }
}
