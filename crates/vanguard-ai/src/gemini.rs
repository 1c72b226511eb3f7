//! REST client for the hosted Gemini model (`generateContent`).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use crate::client::{
    DocumentScan, DocumentScanWire, FaceComparison, FaceComparisonWire, RecognitionClient,
};
use crate::error::AiError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DETECT_PROMPT: &str = "Analyze this image. 1. Look for a National ID or Corporate Staff ID \
card. It does NOT need to be perfectly aligned as long as the text is readable. 2. If a card is \
present and text is legible, extract JSON: { \"valid\": true, \"docType\": \"GOVT_ID\" | \
\"STAFF_ID\", \"name\": \"FULL NAME\", \"id\": \"ID NUMBER\", \"department\": \"DEPT (optional)\" \
}. 3. If the card is completely missing or unreadable, return JSON: { \"valid\": false, \
\"reason\": \"Hold card steady\" }.";

const COMPARE_PROMPT: &str = "Compare the face in the first image (Card) with the face in the \
second image (Live Camera). Strict comparison. Return JSON: { \"score\": number (0-100), \
\"match\": boolean }.";

const ASSISTANT_INSTRUCTION: &str = "You are the Vanguard VMS AI Assistant for a high-security \
corporate campus.\n\
Campus Details:\n\
- Tower A: Finance & Executives\n\
- Tower B: Tech & Innovation\n\
- Tower C: HR & Operations\n\
- Parking: Levels P1 to P4. Level P1 has 20 EV charging stations.\n\
- Security Rules: Visitors must wear lanyards at all times. No tailgating.\n\
- Facilities: Gym on Tower B Level 2, Cafeteria in Tower C Lobby.\n\
- Emergency: Dial 999 or call security extension 4444.\n\n\
Keep responses helpful, professional, and safety-oriented.";

/// Client for the hosted multimodal model.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (local stub in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn inline_jpeg(jpeg: &[u8]) -> Value {
        json!({
            "inline_data": {
                "mime_type": "image/jpeg",
                "data": BASE64.encode(jpeg),
            }
        })
    }

    /// POST a `generateContent` request and unwrap the first candidate's
    /// text part. Provider errors are classified into [`AiError`] here.
    async fn generate(&self, parts: Vec<Value>, config: Value) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": config,
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        if !(200..300).contains(&status) {
            tracing::warn!(status, "model request failed");
            return Err(AiError::classify_provider_error(status, &text));
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AiError::MalformedResponse("no text candidate in response".into()))
    }
}

#[async_trait]
impl RecognitionClient for GeminiClient {
    async fn detect_document(&self, jpeg: &[u8]) -> Result<DocumentScan, AiError> {
        let parts = vec![Self::inline_jpeg(jpeg), json!({ "text": DETECT_PROMPT })];
        let text = self
            .generate(parts, json!({ "response_mime_type": "application/json" }))
            .await?;

        let wire: DocumentScanWire = serde_json::from_str(&text)
            .map_err(|e| AiError::MalformedResponse(format!("document scan: {e}")))?;
        Ok(wire.into())
    }

    async fn compare_faces(
        &self,
        id_jpeg: &[u8],
        live_jpeg: &[u8],
    ) -> Result<FaceComparison, AiError> {
        let parts = vec![
            Self::inline_jpeg(id_jpeg),
            Self::inline_jpeg(live_jpeg),
            json!({ "text": COMPARE_PROMPT }),
        ];
        let text = self
            .generate(parts, json!({ "response_mime_type": "application/json" }))
            .await?;

        let wire: FaceComparisonWire = serde_json::from_str(&text)
            .map_err(|e| AiError::MalformedResponse(format!("face comparison: {e}")))?;
        Ok(wire.into())
    }

    async fn chat(&self, query: &str) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": query }] }],
            "systemInstruction": { "parts": [{ "text": ASSISTANT_INSTRUCTION }] },
            "generationConfig": { "temperature": 0.7 },
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        if !(200..300).contains(&status) {
            tracing::warn!(status, "assistant request failed");
            return Err(AiError::classify_provider_error(status, &text));
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AiError::MalformedResponse("no text candidate in response".into()))
    }
}
