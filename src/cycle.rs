//! The notification cycle: one fetch -> filter-new -> announce -> persist
//! round against Devpost and the announcement ledger.
//!
//! A cycle is triggered either by the hourly scheduler or by the manual
//! `;hackathons` command; both serialize on the same `Mutex` held by the
//! handler, so only one round is ever in flight.

use crate::devpost;
use crate::ledger::Ledger;
use crate::{announce, log_error, log_event, log_internal};
use anyhow::Result;
use serenity::all::{ChannelId, CreateMessage, Http};
use std::sync::Arc;
use std::time::Duration;

/// Scheduled fetch cadence.
pub const FETCH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Pages fetched per scheduled round.
pub const SCHEDULED_FETCH_PAGES: u32 = 1;

/// Pages fetched when a moderator asks for a fetch by hand.
pub const MANUAL_FETCH_PAGES: u32 = 3;

// Pause between channel sends, against Discord rate limits.
const SEND_PAUSE: Duration = Duration::from_secs(1);

/// Exit code for an error escaping a whole cycle.  The process terminates
/// instead of keeping a possibly inconsistent scheduler alive; the external
/// supervisor is expected to restart it fresh.
pub const FAULT_EXIT_CODE: i32 = 70;

pub struct NotificationCycle {
    ledger: Ledger,
    client: reqwest::Client,
}

pub enum CycleOutcome {
    /// The announce channel is unconfigured or unresolvable.  A config
    /// problem, not a fault; the cycle did not fetch.
    NoChannel,
    Ran { fetched: usize, announced: usize },
}

impl NotificationCycle {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            client: reqwest::Client::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Run one round.  All expected failures are contained: fetch problems
    /// yield partial or empty listings, a failed send leaves the URL
    /// unappended so it retries next round, and a failed persist keeps the
    /// in-memory ledger for the next round's write.
    pub async fn run(
        &mut self,
        http: &Arc<Http>,
        channel_id: u64,
        pages: u32,
    ) -> Result<CycleOutcome> {
        if channel_id == 0 {
            log_error!("No announce channel configured, skipping hackathon check");
            return Ok(CycleOutcome::NoChannel);
        }

        let channel = ChannelId::new(channel_id);
        if let Err(e) = channel.to_channel(http).await {
            log_error!("Could not resolve announce channel {}: {}", channel_id, e);
            return Ok(CycleOutcome::NoChannel);
        }

        log_internal!("Checking Devpost for new hackathons...");
        let listings = devpost::fetch_recent(&self.client, pages).await;
        let fetched = listings.len();

        let mut announced = 0;
        for listing in self.ledger.filter_new(&listings) {
            let message = CreateMessage::new().embed(announce::build_embed(listing));

            match channel.send_message(http, message).await {
                Ok(_) => {
                    log_event!("Announced: {}", listing.title);
                    self.ledger.append(listing.url.clone());
                    announced += 1;
                    tokio::time::sleep(SEND_PAUSE).await;
                }
                Err(e) => {
                    // Not appended, so it is retried next cycle.  Delivery
                    // is at-least-once, not at-most-once.
                    log_error!("Could not announce `{}`: {}", listing.url, e);
                }
            }
        }

        if announced > 0 {
            self.ledger.evict_overflow();
            if let Err(e) = self.ledger.persist().await {
                log_error!("Could not persist ledger, retrying next cycle: {:#}", e);
            }
            log_internal!("Announced {} new hackathons", announced);
        } else {
            log_internal!("No new hackathons");
        }

        Ok(CycleOutcome::Ran { fetched, announced })
    }
}

/// Cycle boundary: anything `run` could not contain is unrecoverable.  Log
/// it in full and terminate so the supervisor restarts us clean.
pub async fn run_or_fault(
    cycle: &mut NotificationCycle,
    http: &Arc<Http>,
    channel_id: u64,
    pages: u32,
) -> CycleOutcome {
    match cycle.run(http, channel_id, pages).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log_error!("Notification cycle faulted: {:#}", e);
            log_error!("Shutting down for a supervisor restart");
            std::process::exit(FAULT_EXIT_CODE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devpost::Listing;
    use std::path::PathBuf;

    fn listing(url: &str) -> Listing {
        Listing {
            url: url.to_string(),
            title: "No Title".into(),
            thumbnail_url: None,
            status: "N/A".into(),
            location: "Online".into(),
            host: "N/A".into(),
            submission_period: "N/A".into(),
            prize_amount: "0".into(),
            prize_cash: 0,
            prize_other: 0,
            themes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn unpersisted_sends_reannounce_after_restart() {
        let path = std::env::temp_dir()
            .join(format!("hackbot-test-{}-cycle", std::process::id()))
            .join("announced.json");
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;

        let upstream = vec![
            listing("https://c.devpost.com"),
            listing("https://b.devpost.com"),
            listing("https://a.devpost.com"),
        ];

        // First run: three sends succeed and the URLs are appended in
        // memory, but the persist step fails (simulated by never writing).
        let mut cycle = NotificationCycle::new(Ledger::load(path.clone()).await);
        for l in cycle.ledger.filter_new(&upstream) {
            cycle.ledger.append(l.url.clone());
        }
        assert_eq!(cycle.ledger.len(), 3);

        // Restart: the durable ledger never saw those URLs, so the same
        // upstream data is announced again.  At-least-once, not exactly-once.
        let restarted = Ledger::load(path).await;
        let retry: Vec<&str> = restarted
            .filter_new(&upstream)
            .into_iter()
            .map(|l| l.url.as_str())
            .collect();

        assert_eq!(
            retry,
            vec![
                "https://a.devpost.com",
                "https://b.devpost.com",
                "https://c.devpost.com",
            ]
        );
    }

    #[test]
    fn ledger_path_is_stable() {
        // `default_path` must resolve somewhere under the home directory so
        // restarts of the same deployment find the same file.
        let path = Ledger::default_path().unwrap();
        assert!(path.ends_with(PathBuf::from(".config/hackbot/announced.json")));
    }
}
