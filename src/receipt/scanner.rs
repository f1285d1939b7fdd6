//! The client for the generative AI service that reads receipts.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The Gemini API host used when no other is configured.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const RECEIPT_PROMPT: &str = r#"
Analyze this receipt image and extract the following information in JSON format:
- Total amount (just the number)
- Date (in ISO format)
- Suggested category (one of: housing,transportation,groceries,utilities,entertainment,food,shopping,healthcare,education,personal,travel,insurance,gifts,bills,other-expense )

Only respond with valid JSON in this exact format:
{
  "amount": number,
  "date": "ISO date string",
  "category": "string"
}

If its not a receipt, return an empty object
"#;

/// Something that can read a receipt image and describe it as text.
///
/// The text is expected to be a JSON object, possibly wrapped in a
/// Markdown code fence.
#[async_trait]
pub trait ReceiptScanner: Send + Sync {
    /// Send `image` of type `mime_type` to the scanner and return its reply.
    async fn scan(&self, image: &[u8], mime_type: &str) -> Result<String, Error>;
}

/// A [ReceiptScanner] backed by Google's Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiScanner {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiScanner {
    /// Create a scanner that calls `model` with `api_key`.
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
        }
    }

    /// Send requests to `base_url` instead of the public Gemini API.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// The text parts of the first candidate, joined together.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        Some(text)
    }
}

#[async_trait]
impl ReceiptScanner for GeminiScanner {
    async fn scan(&self, image: &[u8], mime_type: &str) -> Result<String, Error> {
        let request = GenerateContentRequest {
            contents: [Content {
                parts: [
                    RequestPart::Text {
                        text: RECEIPT_PROMPT,
                    },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                ],
            }],
        };

        tracing::debug!(
            "Sending {} byte {mime_type} receipt to model {}",
            image.len(),
            self.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| Error::ReceiptScanError(error.without_url().to_string()))?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| Error::InvalidReceiptResponse(error.without_url().to_string()))?;

        body.text().ok_or_else(|| {
            Error::InvalidReceiptResponse("the response did not contain any text".to_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::receipt::scanner::{
        Content, GenerateContentRequest, GenerateContentResponse, GeminiScanner, InlineData,
        RequestPart,
    };

    #[test]
    fn endpoint_includes_model_and_key() {
        let scanner = GeminiScanner::new(
            reqwest::Client::new(),
            "secret".to_owned(),
            "gemini-2.5-flash".to_owned(),
        )
        .with_base_url("http://localhost:8080/".to_owned());

        assert_eq!(
            scanner.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent?key=secret"
        );
    }

    #[test]
    fn request_has_prompt_and_inline_image() {
        let request = GenerateContentRequest {
            contents: [Content {
                parts: [
                    RequestPart::Text { text: "prompt" },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: "AAEC".to_owned(),
                        },
                    },
                ],
            }],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        {"text": "prompt"},
                        {"inlineData": {"mimeType": "image/png", "data": "AAEC"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "```json\n{"}, {"text": "}\n```"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("```json\n{}\n```"));
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {}})).unwrap();

        assert_eq!(response.text(), None);
    }
}
