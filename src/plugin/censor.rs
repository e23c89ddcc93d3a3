//! Deletes messages containing configured words and posts a short-lived
//! warning.  Deletion failures (missing permission, message already gone)
//! are swallowed; moderation should never crash the bot.

use crate::{event::*, plugin::*};
use anyhow::Result;
use std::time::Duration;

const WARNING_LIFETIME: Duration = Duration::from_secs(5);

pub struct Censor;

#[serenity::async_trait]
impl Plugin for Censor {
    fn name(&self) -> &'static str {
        "censor"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        if msg.author.bot {
            return Ok(EventHandled::No);
        }

        let words = ctx.cfg.read().await.censor.words.clone();
        if !contains_banned_word(&msg.content, &words) {
            return Ok(EventHandled::No);
        }

        if msg.delete(ctx.cache_http).await.is_err() {
            return Ok(EventHandled::Yes);
        }

        let warning = msg
            .channel_id
            .say(
                ctx.cache_http,
                format!("<@{}>, watch your language.", msg.author.id),
            )
            .await?;

        let http = ctx.http.clone();
        tokio::spawn(async move {
            tokio::time::sleep(WARNING_LIFETIME).await;
            let _ = warning.delete(&http).await;
        });

        Ok(EventHandled::Yes)
    }
}

/// Whole-word, case-insensitive match.
fn contains_banned_word(content: &str, words: &[String]) -> bool {
    content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| words.iter().any(|banned| w.eq_ignore_ascii_case(banned)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<String> {
        vec!["badword".to_string()]
    }

    #[test]
    fn matches_whole_words_only() {
        assert!(contains_banned_word("what a badword here", &words()));
        assert!(contains_banned_word("BadWord!", &words()));
        assert!(!contains_banned_word("badwording is fine", &words()));
        assert!(!contains_banned_word("clean message", &words()));
    }

    #[test]
    fn matches_across_punctuation_boundaries() {
        assert!(contains_banned_word("so,badword.", &words()));
        assert!(!contains_banned_word("", &words()));
    }
}
