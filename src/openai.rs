//! Minimal OpenAI-compatible client for coaching suggestions.
//!
//! We only call chat.completions and request plain text.
//! Calls are instrumented and log model name, latency and response size (not contents).
//!
//! NOTE: We never log the API key.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::Mistake;
use crate::util::fill_template;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    Self::new(api_key, base_url, model)
  }

  pub fn new(api_key: String, base_url: String, model: String) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;
    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), model })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_plain(&self, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "math-master-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    if text.is_empty() {
      return Err("OpenAI returned an empty completion".into());
    }
    Ok(text)
  }

  /// Ask the model for 2-3 bullet-pointed tips based on a round's mistakes.
  #[instrument(level = "info", skip(self, prompts, mistakes), fields(mistake_count = mistakes.len()))]
  pub async fn suggest_improvements(
    &self,
    prompts: &Prompts,
    mistakes: &[Mistake],
    player_level: u32,
  ) -> Result<String, String> {
    let user = build_suggestion_prompt(prompts, mistakes, player_level);
    let start = std::time::Instant::now();
    let result = self.chat_plain(&prompts.suggestion_system, &user, 0.7).await;
    let elapsed = start.elapsed();
    match &result {
      Ok(text) => info!(?elapsed, response_len = text.len(), "Suggestions received"),
      Err(e) => error!(?elapsed, error = %e, "Model call failed during suggestion generation"),
    }
    result
  }
}

/// One line per mistake, in the form the prompt template expects.
pub fn summarize_mistakes(mistakes: &[Mistake]) -> String {
  mistakes
    .iter()
    .map(|m| {
      let answer = if m.not_attempted() { "Not Attempted" } else { m.user_answer.as_str() };
      format!("Problem: \"{}\", Your Answer: {}, Correct Answer: {}", m.question_text, answer, m.correct_answer)
    })
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn build_suggestion_prompt(prompts: &Prompts, mistakes: &[Mistake], player_level: u32) -> String {
  let level = player_level.to_string();
  let summary = summarize_mistakes(mistakes);
  fill_template(
    &prompts.suggestion_user_template,
    &[("player_level", level.as_str()), ("mistake_summary", summary.as_str())],
  )
}

fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct ErrBody { error: ErrInner }
  #[derive(Deserialize)]
  struct ErrInner { message: String }
  serde_json::from_str::<ErrBody>(body).ok().map(|b| b.error.message)
}

// --- Wire types ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}

#[derive(Serialize)]
struct ChatMessageReq {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
  #[serde(default)]
  content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
  prompt_tokens: Option<u32>,
  completion_tokens: Option<u32>,
  total_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Operation;

  fn mistakes() -> Vec<Mistake> {
    vec![
      Mistake { question_text: "23 + 19".into(), user_answer: "41".into(), correct_answer: 42, operation: Operation::Addition },
      Mistake { question_text: "72 ÷ 8".into(), user_answer: String::new(), correct_answer: 9, operation: Operation::Division },
    ]
  }

  #[test]
  fn summary_marks_unattempted() {
    let s = summarize_mistakes(&mistakes());
    assert_eq!(
      s,
      "Problem: \"23 + 19\", Your Answer: 41, Correct Answer: 42\nProblem: \"72 ÷ 8\", Your Answer: Not Attempted, Correct Answer: 9"
    );
  }

  #[test]
  fn prompt_fills_level_and_summary() {
    let p = build_suggestion_prompt(&Prompts::default(), &mistakes(), 6);
    assert!(p.contains("skill level is 6"));
    assert!(p.contains("Your Answer: Not Attempted"));
    assert!(!p.contains("{mistake_summary}"));
  }

  #[test]
  fn error_body_message_is_extracted() {
    let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Invalid API key"));
    assert_eq!(extract_openai_error("not json"), None);
  }
}
