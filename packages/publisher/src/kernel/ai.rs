// Content generation using OpenAI
//
// This is the infrastructure implementation of BaseContentGenerator.
// What a generated post must contain is validated by the queue worker.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use schemars::schema_for;
use serde::{Deserialize, Serialize};

use super::{BaseContentGenerator, GeneratedPost, GenerationRequest};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You write blog posts for a technical blog. \
Given a title, write a complete post in Markdown, a one or two sentence description, \
and a short excerpt. Choose one to three categories and three to six tags. \
Reuse the existing category and tag names whenever one fits; only invent a new name \
when none of the existing ones apply.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI chat-completions client producing [`GeneratedPost`] via structured output
#[derive(Clone)]
pub struct OpenAIGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Point at a compatible API (proxy, local gateway)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn user_prompt(request: &GenerationRequest) -> String {
        format!(
            "Title: {}\n\nExisting categories: {}\nExisting tags: {}",
            request.title,
            join_or_none(&request.known_categories),
            join_or_none(&request.known_tags),
        )
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// OpenAI strict mode wants every property required and no extra properties.
fn strict_schema() -> serde_json::Value {
    let mut schema = serde_json::to_value(schema_for!(GeneratedPost)).unwrap_or_default();

    if let serde_json::Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
        map.insert("additionalProperties".to_string(), serde_json::Value::Bool(false));

        let required: Vec<serde_json::Value> = map
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| props.keys().cloned().map(serde_json::Value::String).collect())
            .unwrap_or_default();
        map.insert("required".to_string(), serde_json::Value::Array(required));
    }

    schema
}

#[async_trait]
impl BaseContentGenerator for OpenAIGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedPost> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(request),
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "generated_post",
                    strict: true,
                    schema: strict_schema(),
                },
            },
        };

        tracing::info!(model = %self.model, title = %request.title, "Calling OpenAI API");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send generation request to OpenAI")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, error = %error_text, "OpenAI API call failed");
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no content"))?;

        let generated: GeneratedPost = serde_json::from_str(&content)
            .context("OpenAI returned malformed JSON for the generated post")?;

        tracing::info!(
            content_length = generated.content.len(),
            categories = generated.categories.len(),
            tags = generated.tags.len(),
            "OpenAI API response received"
        );

        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_schema_requires_every_field() {
        let schema = strict_schema();

        assert_eq!(schema["additionalProperties"], serde_json::Value::Bool(false));
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        for field in ["description", "content", "excerpt", "categories", "tags"] {
            assert!(required.contains(&field), "{field} not required");
        }
    }

    #[test]
    fn test_user_prompt_lists_known_terms() {
        let prompt = OpenAIGenerator::user_prompt(&GenerationRequest {
            title: "Async Rust".into(),
            known_categories: vec!["Engineering".into(), "Rust".into()],
            known_tags: vec![],
        });

        assert!(prompt.contains("Title: Async Rust"));
        assert!(prompt.contains("Existing categories: Engineering, Rust"));
        assert!(prompt.contains("Existing tags: (none)"));
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_generate() {
        let api_key = std::env::var("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY must be set for integration tests");

        let generator = OpenAIGenerator::new(api_key, "gpt-4o-mini".to_string());
        let post = generator
            .generate(&GenerationRequest {
                title: "Why we moved our job queue into Postgres".into(),
                known_categories: vec!["Engineering".into()],
                known_tags: vec!["postgres".into()],
            })
            .await
            .expect("Generation should succeed");

        assert!(!post.content.is_empty());
        assert!(!post.excerpt.is_empty());
    }
}
