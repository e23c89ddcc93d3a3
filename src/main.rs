mod announce;
mod config;
mod context;
mod cycle;
mod devpost;
mod event;
mod handler;
mod ledger;
mod logging;
mod plugin;
mod roles;
mod scheduler;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let ledger = crate::ledger::Ledger::load(crate::ledger::Ledger::default_path()?).await;
    let cycle = crate::cycle::NotificationCycle::new(ledger);
    let handler = handler::Handler::new(cfg, cycle);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
