//! Canned news embed, kept as a placeholder until a real news feed is
//! wired up.

use crate::{event::*, plugin::*};
use anyhow::Result;
use serenity::all::{CreateEmbed, CreateEmbedAuthor, CreateMessage};

pub struct News;

#[serenity::async_trait]
impl Plugin for News {
    fn name(&self) -> &'static str {
        "news"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!("{}{} - show the latest tech headline", prefix, self.name()))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let embed = CreateEmbed::new()
            .title("Samsung Silently Changes Android On Hundreds Of Millions Of Phones - Forbes")
            .url("https://www.forbes.com/sites/zakdoffman/2026/01/08/samsung-silently-changes-android-on-hundreds-of-millions-of-phones/")
            .description("Samsung issues update now warning for most Galaxy smartphone owners.")
            .color(0x2ecc71)
            .author(CreateEmbedAuthor::new("Zak Doffman"))
            .field("Published", "2026-01-08T21:16:00Z", false);

        msg.channel_id
            .send_message(ctx.cache_http, CreateMessage::new().embed(embed))
            .await?;
        Ok(EventHandled::Yes)
    }
}
