use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Oracle;
use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::planner::parse::parse_reply;
use crate::planner::types::{CookSnapshot, Recommendation};

const DEFAULT_PROMPT: &str = "You are the decision layer of an automated grill. \
You receive the cook state as JSON and choose the next physical action. \
Reply with ONLY a JSON object: {\"action\": <one of allowed_actions, or \"No action\">, \
\"statusPatch\": {\"expected_seasoning\": <optional integer>}}. \
Flip when the side on the grate is done, season the second side, \
take the food off when both sides are done. Never exceed max_seasoning.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions oracle.
#[derive(Clone)]
pub struct ChatOracle {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    system_prompt: String,
}

impl ChatOracle {
    pub fn new(config: &OracleConfig) -> Self {
        let system_prompt = match &config.prompt_file {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(prompt) if !prompt.trim().is_empty() => prompt,
                Ok(_) => DEFAULT_PROMPT.to_string(),
                Err(e) => {
                    warn!("Failed to load oracle prompt {}: {}. Using built-in prompt", path.display(), e);
                    DEFAULT_PROMPT.to_string()
                }
            },
            None => DEFAULT_PROMPT.to_string(),
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            url: config.url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            system_prompt,
        }
    }

    pub fn user_message(snapshot: &CookSnapshot) -> String {
        format!(
            "Decide the next grill action from this state:\n{}",
            serde_json::to_string_pretty(snapshot).unwrap_or_default()
        )
    }
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn consult(&self, snapshot: &CookSnapshot) -> Result<Recommendation, OracleError> {
        let user_message = Self::user_message(snapshot);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &self.system_prompt },
                ChatMessage { role: "user", content: &user_message },
            ],
            stream: false,
            max_tokens: 512,
            temperature: 0.1,
            top_p: 0.7,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        debug!("Oracle raw reply: {}", content.chars().take(200).collect::<String>());
        parse_reply(&content)
    }
}
