//! Single-turn LLM chat passthrough against an OpenAI-style
//! chat-completions endpoint.

use crate::{event::*, log_internal, plugin::*};
use anyhow::{anyhow, Result};

// Discord caps messages at 2000 characters.
const REPLY_LIMIT: usize = 2000;

pub struct Chat;

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ChatMessage {
    role: ChatMessageRole,
    content: String,
}

#[allow(non_camel_case_types)] // Serialized literally; case matters
#[derive(serde::Serialize, serde::Deserialize)]
enum ChatMessageRole {
    system,
    user,
    assistant,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[serenity::async_trait]
impl Plugin for Chat {
    fn name(&self) -> &'static str {
        "chat"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!("{}{} <prompt> - ask the assistant", prefix, self.name()))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let prompt = args.join(" ");
        if prompt.is_empty() {
            msg.reply(ctx.cache_http, "Usage: `;chat <prompt>`").await?;
            return Ok(EventHandled::Yes);
        }

        if ctx.cfg.read().await.chat.api_key.is_empty() {
            msg.reply(ctx.cache_http, "No chat API key is configured.")
                .await?;
            return Ok(EventHandled::Yes);
        }

        // The request may take a while; show a typing indicator meanwhile.
        let typing = msg.channel_id.start_typing(ctx.http);
        let response = post_chat(ctx, prompt).await;
        typing.stop();

        // A manual command always answers, even with a failure.
        let reply = match response {
            Ok(text) if text.is_empty() => "(no response)".to_string(),
            Ok(text) => truncate_reply(text),
            Err(e) => format!("Chat request failed: {}", e),
        };

        msg.reply(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}

async fn post_chat(ctx: &Context<'_>, prompt: String) -> Result<String> {
    let cfg = ctx.cfg.read().await;
    let request = ChatRequest {
        model: cfg.chat.model.clone(),
        messages: vec![
            ChatMessage {
                role: ChatMessageRole::system,
                content: cfg.chat.system_prompt.clone(),
            },
            ChatMessage {
                role: ChatMessageRole::user,
                content: prompt,
            },
        ],
    };
    let url = cfg.chat.api_url.clone();
    let api_key = cfg.chat.api_key.clone();
    drop(cfg);

    log_internal!("Sending request to chat endpoint {}... ", url);
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?
        .json::<ChatResponse>()
        .await?;
    log_internal!("Sending request to chat endpoint {}... done", url);

    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(anyhow!("Chat endpoint returned no choices"))?;

    Ok(content.trim().to_string())
}

fn truncate_reply(text: String) -> String {
    if text.len() <= REPLY_LIMIT {
        return text;
    }

    // Cut on a char boundary at or below the limit.
    let mut cut = REPLY_LIMIT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_replies_pass_through() {
        assert_eq!(truncate_reply("hello".into()), "hello");
    }

    #[test]
    fn long_replies_are_cut_at_the_discord_limit() {
        let long = "x".repeat(REPLY_LIMIT + 100);
        assert_eq!(truncate_reply(long).len(), REPLY_LIMIT);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut long = "x".repeat(REPLY_LIMIT - 1);
        long.push('é'); // two bytes, straddles the limit
        long.push_str("tail");

        let cut = truncate_reply(long);
        assert!(cut.len() <= REPLY_LIMIT);
        assert!(cut.ends_with('x'));
    }
}
