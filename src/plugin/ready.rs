use crate::{event::*, plugin::*};
use anyhow::Result;
use serenity::all::{ActivityData, OnlineStatus};

/// Sets presence once the connection to Discord is ready.
pub struct ReadyPresence;

#[serenity::async_trait]
impl Plugin for ReadyPresence {
    fn name(&self) -> &'static str {
        "ready"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Ready(_) = event else {
            return Ok(EventHandled::No);
        };

        ctx.cache_http.set_presence(
            Some(ActivityData::playing("Hackathon Bot")),
            OnlineStatus::Online,
        );

        Ok(EventHandled::Yes)
    }
}
