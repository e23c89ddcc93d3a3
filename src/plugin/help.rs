//! `;help`: gathers every plugin's usage lines into one code block, so a
//! plugin only has to describe itself to show up here.

use crate::{event::*, plugin::*};
use anyhow::Result;

pub struct Help;

#[serenity::async_trait]
impl Plugin for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!("{}help - list every command", prefix))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let mut lines = vec!["Hackathon Bot commands:".to_string()];
        for plugin in crate::plugin::plugins() {
            if let Some(usage) = plugin.usage(ctx).await {
                lines.push(usage);
            }
        }

        msg.reply(ctx.cache_http, format!("```\n{}\n```", lines.join("\n")))
            .await?;
        Ok(EventHandled::Yes)
    }
}
