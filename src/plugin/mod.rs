use crate::context::Context;
use crate::event::EventHandled;
use anyhow::Result;

mod censor;
mod chat;
mod debug;
mod hackathon;
mod help;
mod ignore_bots;
mod news;
mod ping;
mod ready;
mod roles;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Used for debug
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    ///   handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &crate::event::Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    use crate::plugin::*;

    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ready::ReadyPresence),
        Box::new(ignore_bots::IgnoreBots),
        // Moderation, before any command handling
        Box::new(censor::Censor),
        // Commands
        Box::new(help::Help),
        Box::new(ping::Ping),
        Box::new(hackathon::HackathonCheck),
        Box::new(roles::Roles),
        Box::new(chat::Chat),
        Box::new(news::News),
    ]
}
