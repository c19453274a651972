use super::{DEFAULT_MODEL, NO_TEXT_FOUND, extract_text_field};
use crate::capture::{JPEG_QUALITY, MAX_UPLOAD_DIMENSION, encode_jpeg_base64};
use anyhow::{Context, Result, bail};
use image::DynamicImage;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TIMEOUT_SECS: u64 = 30;
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("API key is empty");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .context("could not build http client")?;

        let model = if model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            model.trim()
        };

        info!("Gemini API client initialized for model {model}");
        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            api_base: API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn extract_text(&self, image: &DynamicImage, prompt: &str) -> Result<String> {
        info!("Preparing image for Gemini API");
        let image_b64 = encode_jpeg_base64(image, MAX_UPLOAD_DIMENSION, JPEG_QUALITY)?;
        let raw = self.generate(&build_request(prompt, &image_b64)).await?;
        Ok(extract_text_field(&raw))
    }

    async fn generate(&self, body: &Value) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.api_base, self.model);

        debug!("Sending request to Gemini API");
        let start = Instant::now();
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("request to Gemini API failed")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("could not read Gemini API response")?;
        debug!("Gemini API answered {status} after {:.2?}", start.elapsed());

        if !status.is_success() {
            bail!("Gemini API error {status}: {}", error_message(&text));
        }

        let json: Value = serde_json::from_str(&text).context("Gemini API returned invalid JSON")?;
        Ok(parse_response(&json))
    }
}

pub fn build_request(prompt: &str, image_b64: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": prompt },
                {
                    "inline_data": {
                        "mime_type": "image/jpeg",
                        "data": image_b64
                    }
                }
            ]
        }],
        "generationConfig": {
            "temperature": 0.1,
            "topK": 40,
            "topP": 0.95,
            "maxOutputTokens": 8192,
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                }
            }
        }
    })
}

/// Text of the first candidate's first part.
pub fn parse_response(json: &Value) -> String {
    let text = json["candidates"]
        .as_array()
        .and_then(|a| a.first())
        .and_then(|c| c["content"]["parts"].as_array())
        .and_then(|p| p.first())
        .and_then(|p| p["text"].as_str())
        .unwrap_or_default();

    if text.trim().is_empty() {
        warn!("No text content found in Gemini API response");
        return NO_TEXT_FOUND.to_string();
    }

    info!("Successfully extracted text from image");
    text.to_string()
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
