use crate::{
    config::Config, context::Context, cycle, cycle::NotificationCycle, event::Event, log_internal,
    scheduler,
};
use serenity::all::{Message, Ready};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Discord event handler
pub struct Handler {
    cfg: Arc<RwLock<Config>>,
    cycle: Arc<Mutex<NotificationCycle>>,
    scheduler_started: AtomicBool,
}

impl<'a> Handler {
    pub fn new(cfg: Config, cycle: NotificationCycle) -> Self {
        Self {
            cfg: Arc::new(RwLock::new(cfg)),
            cycle: Arc::new(Mutex::new(cycle)),
            scheduler_started: AtomicBool::new(false),
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            cycle: &self.cycle,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }

    /// Register the hourly notification cycle.  `ready` fires again on
    /// gateway reconnects, so only the first call starts the scheduler.
    fn start_scheduler(&self, discord_ctx: &serenity::all::Context) {
        if self.scheduler_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let cfg = self.cfg.clone();
        let cycle = self.cycle.clone();
        let http = discord_ctx.http.clone();

        scheduler::spawn(cycle::FETCH_INTERVAL, move || {
            let cfg = cfg.clone();
            let cycle = cycle.clone();
            let http = http.clone();

            async move {
                let channel_id = cfg.read().await.hackathon.announce_channel_id;

                // A manual run may be in flight; skip rather than stack.
                let Ok(mut guard) = cycle.try_lock() else {
                    log_internal!("Previous notification cycle still running, skipping tick");
                    return;
                };

                cycle::run_or_fault(
                    &mut guard,
                    &http,
                    channel_id,
                    cycle::SCHEDULED_FETCH_PAGES,
                )
                .await;
            }
        });
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        self.start_scheduler(&discord_ctx);
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }
}
