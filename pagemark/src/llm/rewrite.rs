// Markdown rewrite pass
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::{LlmProvider, LlmRequest};

/// Build the fixed rewrite instruction prompt with today's date interpolated.
fn rewrite_prompt(content: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "As an AI model specializing in content rewriting using Markdown, your task is to \
         generate detailed and informative responses that enhance the given input. Make \
         effective use of Markdown formatting to structure your response clearly and \
         comprehensively. Aim to provide thorough and complete information, avoiding \
         unnecessary brevity.\n\n",
    );
    prompt.push_str(
        "Begin by creating a Markdown header that includes the following elements: title, \
         description, URL, and today's date. Then, proceed to rewrite all the provided \
         content in a well-organized Markdown format.\n\n",
    );
    prompt.push_str(&format!("Today's date is {}.\n\n", Utc::now().to_rfc3339()));
    prompt.push_str(&format!("<content>{content}</content>"));
    prompt
}

/// Pass scraped Markdown through the model and return whatever text it produces.
pub async fn rewrite_markdown<P: LlmProvider + ?Sized>(
    provider: &P,
    markdown: &str,
) -> Result<String> {
    let request = LlmRequest {
        prompt: rewrite_prompt(markdown),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    };

    let response = provider
        .generate(request)
        .await
        .context("markdown rewrite failed")?;

    if response.content.trim().is_empty() {
        anyhow::bail!("no content generated by the model");
    }

    info!(
        "rewrite: model {} produced {} chars ({} tokens)",
        response.model,
        response.content.len(),
        response.usage.total_tokens
    );
    Ok(response.content)
}
