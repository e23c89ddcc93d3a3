//! Manual entry points into the notification cycle: `;hackathons` runs a
//! fetch right now, `;ledger` reports the persisted announcement ledger.
//! Both always answer; a manual command never finishes silently.

use crate::ledger::LEDGER_CAPACITY;
use crate::{cycle, event::*, plugin::*};
use anyhow::Result;
use serenity::all::{CreateEmbed, CreateEmbedFooter, CreateMessage};

pub struct HackathonCheck;

#[serenity::async_trait]
impl Plugin for HackathonCheck {
    fn name(&self) -> &'static str {
        "hackathons"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}hackathons - check Devpost for new hackathons now\n\
             {}ledger - show the announcement ledger status",
            prefix, prefix
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        if let Some((msg, _)) = event.is_bot_cmd(ctx, "hackathons").await {
            return fetch_now(ctx, msg).await;
        }

        if let Some((msg, _)) = event.is_bot_cmd(ctx, "ledger").await {
            return ledger_status(ctx, msg).await;
        }

        Ok(EventHandled::No)
    }
}

async fn fetch_now(ctx: &Context<'_>, msg: &serenity::all::Message) -> Result<EventHandled> {
    let channel_id = ctx.cfg.read().await.hackathon.announce_channel_id;

    // Same non-reentrancy rule as the scheduler: one cycle in flight, ever.
    let Ok(mut guard) = ctx.cycle.try_lock() else {
        msg.reply(ctx.cache_http, "A hackathon check is already running.")
            .await?;
        return Ok(EventHandled::Yes);
    };

    let outcome =
        cycle::run_or_fault(&mut guard, ctx.http, channel_id, cycle::MANUAL_FETCH_PAGES).await;
    drop(guard);

    let reply = match outcome {
        cycle::CycleOutcome::NoChannel => {
            "No usable announce channel is configured; check `announce_channel_id`.".to_string()
        }
        cycle::CycleOutcome::Ran {
            fetched,
            announced: 0,
        } => format!("Nothing new ({} listings checked).", fetched),
        cycle::CycleOutcome::Ran { announced, .. } => {
            format!("Announced {} new hackathon(s).", announced)
        }
    };

    msg.reply(ctx.cache_http, reply).await?;
    Ok(EventHandled::Yes)
}

async fn ledger_status(ctx: &Context<'_>, msg: &serenity::all::Message) -> Result<EventHandled> {
    let guard = ctx.cycle.lock().await;
    let ledger = guard.ledger();

    let recent = if ledger.is_empty() {
        "None".to_string()
    } else {
        ledger.recent(3).join("\n")
    };

    let embed = CreateEmbed::new()
        .title("Announcement Ledger")
        .color(0x3498db)
        .field(
            "Stored Count",
            format!("{} / {}", ledger.len(), LEDGER_CAPACITY),
            false,
        )
        .field("Recent URLs", format!("```{}```", recent), false)
        .footer(CreateEmbedFooter::new("Oldest entries are evicted first"));
    drop(guard);

    msg.channel_id
        .send_message(ctx.cache_http, CreateMessage::new().embed(embed))
        .await?;
    Ok(EventHandled::Yes)
}
