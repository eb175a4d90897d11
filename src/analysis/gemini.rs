//! Gemini REST adapter for both external services.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::prompts;
use super::service::{AnalysisService, ConversationService};
use crate::config::GeminiConfig;
use crate::error::AnalysisError;
use crate::profile::Profile;
use crate::report::{EntitlementRecord, Source};

const PROVIDER: &str = "gemini";

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }

    fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Web citations the model grounded its answer on.
    fn grounding_sources(&self) -> Vec<Source> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .map(|web| Source {
                        title: web
                            .title
                            .clone()
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| prompts::DEFAULT_SOURCE_TITLE.to_string()),
                        uri: web.uri.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Gemini client serving analysis and chat.
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, config: GeminiConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AnalysisError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn analysis_request(&self, profile: &Profile) -> GenerateContentRequest {
        let tools = if self.config.web_search {
            vec![serde_json::json!({ "googleSearch": {} })]
        } else {
            Vec::new()
        };
        GenerateContentRequest {
            contents: vec![Content::user(prompts::analysis_prompt(profile))],
            system_instruction: None,
            tools,
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(prompts::report_schema()),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: self.config.thinking_budget,
                }),
                ..Default::default()
            },
        }
    }

    fn chat_request(&self, turn: &str, report_context: Option<&str>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(turn)],
            system_instruction: Some(Content::system(prompts::chat_system_instruction(
                report_context,
            ))),
            tools: Vec::new(),
            generation_config: GenerationConfig {
                temperature: Some(self.config.chat_temperature),
                ..Default::default()
            },
        }
    }

    async fn generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AnalysisError> {
        let url = self.endpoint(model);
        debug!(url = %url, "Sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout {
                        provider: PROVIDER.to_string(),
                        timeout: self.config.request_timeout,
                    }
                } else {
                    AnalysisError::RequestFailed {
                        provider: PROVIDER.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::HttpStatus {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AnalysisError::MalformedPayload {
                provider: PROVIDER.to_string(),
                reason: format!("Unreadable response envelope: {e}"),
            })
    }
}

/// Decode the analysis answer: the record array plus grounding citations
/// appended to every record.
fn parse_report(response: &GenerateContentResponse) -> Result<Vec<EntitlementRecord>, AnalysisError> {
    let Some(text) = response.text() else {
        debug!("Analysis response carried no text");
        return Ok(Vec::new());
    };

    let json = prompts::extract_json_array(&text);
    let items: Vec<Value> =
        serde_json::from_str(&json).map_err(|e| AnalysisError::MalformedPayload {
            provider: PROVIDER.to_string(),
            reason: format!("Expected a JSON array of records: {e}"),
        })?;

    let grounding = response.grounding_sources();
    let total = items.len();
    let records: Vec<EntitlementRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<EntitlementRecord>(item) {
            Ok(mut record) => {
                record.append_sources(&grounding);
                Some(record)
            }
            Err(e) => {
                warn!(index = i, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect();

    debug!(
        decoded = records.len(),
        total,
        citations = grounding.len(),
        "Decoded analysis records"
    );
    Ok(records)
}

#[async_trait]
impl AnalysisService for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn analyze(&self, profile: &Profile) -> Result<Vec<EntitlementRecord>, AnalysisError> {
        let body = self.analysis_request(profile);
        let response = self.generate(&self.config.analysis_model, &body).await?;
        parse_report(&response)
    }
}

#[async_trait]
impl ConversationService for GeminiClient {
    async fn reply(&self, turn: &str, report_context: Option<&str>) -> String {
        let body = self.chat_request(turn, report_context);
        match self.generate(&self.config.chat_model, &body).await {
            Ok(response) => response
                .text()
                .unwrap_or_else(|| prompts::EMPTY_REPLY_FALLBACK.to_string()),
            Err(e) => {
                warn!(error = %e, "Chat turn failed");
                prompts::ERROR_REPLY_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Sector;
    use crate::report::Priority;

    fn client(config: GeminiConfig) -> GeminiClient {
        GeminiClient::new(SecretString::from("test-key".to_string()), config).unwrap()
    }

    fn response(value: Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn analysis_request_shape() {
        let gemini = client(GeminiConfig::default());
        let mut profile = Profile::wizard_defaults();
        profile.selected_sectors.insert(Sector::Family);

        let body = serde_json::to_value(gemini.analysis_request(&profile)).unwrap();
        assert_eq!(body["tools"][0], serde_json::json!({ "googleSearch": {} }));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            32_768
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn analysis_request_without_search() {
        let gemini = client(GeminiConfig {
            web_search: false,
            ..Default::default()
        });
        let body = serde_json::to_value(gemini.analysis_request(&Profile::default())).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn chat_request_shape() {
        let gemini = client(GeminiConfig::default());
        let body =
            serde_json::to_value(gemini.chat_request("מה מגיע לי?", Some("[]"))).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "מה מגיע לי?");
        let instruction = body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap();
        assert!(instruction.contains("[]"));
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn endpoint_uses_model() {
        let gemini = client(GeminiConfig {
            base_url: "http://localhost:9000/v1beta/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            gemini.endpoint("flash"),
            "http://localhost:9000/v1beta/models/flash:generateContent"
        );
    }

    #[test]
    fn parses_records_and_grounding() {
        let records_json = serde_json::json!([
            {
                "id": "r1",
                "title": "נקודות זיכוי",
                "description": "",
                "authority": "רשות המסים",
                "priority": "critical",
                "numericValue": 3000,
                "actionSteps": ["הגשת טופס 135"],
                "documentsToPrepare": [],
                "sources": [{ "title": "gov", "uri": "https://gov.il/a" }]
            },
            {
                "title": "הנחה בארנונה",
                "authority": "עירייה",
                "priority": "urgent"
            }
        ]);
        let resp = response(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": records_json.to_string() }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://btl.gov.il", "title": "ביטוח לאומי" } },
                        { "web": { "uri": "https://kolzchut.org.il" } },
                        { "retrievedContext": {} }
                    ]
                }
            }]
        }));

        let records = parse_report(&resp).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].priority, Priority::Critical);
        assert_eq!(records[0].numeric_value, Some(rust_decimal_macros::dec!(3000)));
        let sources = records[0].sources.as_ref().unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].uri, "https://gov.il/a");
        assert_eq!(sources[2].title, prompts::DEFAULT_SOURCE_TITLE);

        assert_eq!(records[1].priority, Priority::Recommended);
        assert!(records[1].action_steps.is_empty());
        assert_eq!(records[1].sources.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn fenced_payload_is_accepted() {
        let resp = response(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "```json\n[{\"id\":\"a\",\"title\":\"A\"}]\n```" }] }
            }]
        }));
        let records = parse_report(&resp).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].sources.is_none());
    }

    #[test]
    fn empty_text_is_an_empty_report() {
        let resp = response(serde_json::json!({ "candidates": [] }));
        assert!(parse_report(&resp).unwrap().is_empty());
    }

    #[test]
    fn non_array_payload_is_malformed() {
        let resp = response(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"oops\": true}" }] } }]
        }));
        assert!(matches!(
            parse_report(&resp),
            Err(AnalysisError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn multi_part_text_is_joined() {
        let resp = response(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "שלום " }, { "text": "לך" }] } }]
        }));
        assert_eq!(resp.text().unwrap(), "שלום לך");
    }
}
