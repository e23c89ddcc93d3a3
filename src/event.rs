//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! this module translates the callbacks to a distinct Event enum.

use crate::context::Context;
use crate::log_error;
use serenity::all::{Message, Ready};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(e) => log_error!("Error in plugin {}: {:#}", plugin.name(), e),
            }
        }
    }

    /// Check if a message should be interpreted as the bot command `cmd`.
    ///
    /// Commands are the configured prefix followed by the command word,
    /// e.g. `;role add-all Verified`.  Returns the message and the argument
    /// words following the command.
    pub async fn is_bot_cmd<'e>(
        &'e self,
        ctx: &Context<'_>,
        cmd: &str,
    ) -> Option<(&'e Message, Vec<&'e str>)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();

        let mut words = msg.content.split_ascii_whitespace();
        let invoked = words.next()?.strip_prefix(prefix.as_str())?;
        if invoked != cmd {
            return None;
        }

        Some((msg, words.collect()))
    }
}

pub enum EventHandled {
    Yes,
    No,
}
