//! The announcement ledger: an ordered, bounded list of hackathon URLs that
//! have already been posted.  It is the sole source of truth for "already
//! announced" and survives restarts as a pretty-printed JSON array.
//!
//! Both `load` and `persist` fail soft.  Losing ledger history re-announces
//! a few recent hackathons; crashing the bot over it would be worse.

use crate::devpost::Listing;
use crate::{log_error, log_internal};
use anyhow::{anyhow, Result};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Maximum number of retained URLs.  Oldest entries are evicted first.
pub const LEDGER_CAPACITY: usize = 30;

const LEDGER_PATH_REL_HOME: &str = ".config/hackbot/announced.json";

pub struct Ledger {
    entries: Vec<String>,
    path: PathBuf,
}

impl Ledger {
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(LEDGER_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    /// Load the ledger from `path`.  A missing file yields an empty ledger;
    /// an unreadable or corrupt file is logged and also yields an empty
    /// ledger rather than propagating the error.
    pub async fn load(path: PathBuf) -> Self {
        let entries = match tokio::fs::read(&path).await {
            Ok(data) => match serde_json::from_slice::<Vec<String>>(&data) {
                Ok(entries) => {
                    log_internal!("Loaded {} announced URLs from ledger", entries.len());
                    entries
                }
                Err(e) => {
                    log_error!(
                        "Ledger at `{}` is corrupt, starting empty: {}",
                        path.to_string_lossy(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log_error!(
                    "Could not read ledger at `{}`, starting empty: {}",
                    path.to_string_lossy(),
                    e
                );
                Vec::new()
            }
        };

        Self { entries, path }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|e| e == url)
    }

    pub fn append(&mut self, url: String) {
        self.entries.push(url);
    }

    /// Drop oldest entries until the ledger fits its capacity again.  Must
    /// run before `persist`.
    pub fn evict_overflow(&mut self) {
        if self.entries.len() > LEDGER_CAPACITY {
            let excess = self.entries.len() - LEDGER_CAPACITY;
            self.entries.drain(..excess);
            log_internal!("Ledger over capacity, evicted {} oldest entries", excess);
        }
    }

    /// Write the whole ledger out.  Serialization or I/O errors are
    /// propagated so the caller can log them; in-memory state is untouched
    /// either way, so a failed persist retries naturally next cycle.
    pub async fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| anyhow!("Could not serialize ledger: {}", e))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        // Write to a temporary file and rename it into place so a crash
        // mid-write never leaves a truncated ledger behind.
        let tmp_path = self.path.with_extension("json.new");

        tokio::fs::write(&tmp_path, serialized).await.map_err(|e| {
            anyhow!(
                "Could not write ledger to temporary file `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;

        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            anyhow!(
                "Could not rename `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                self.path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }

    /// Listings not yet announced, reordered oldest-first.  Devpost returns
    /// most-recent-first, so reversing here means multiple new hackathons
    /// are announced in chronological order.
    ///
    /// A URL repeated within `listings` (a listing can shift pages while a
    /// multi-page fetch is in flight) is kept once.
    pub fn filter_new<'a>(&self, listings: &'a [Listing]) -> Vec<&'a Listing> {
        let mut fresh: Vec<&Listing> = Vec::new();

        for listing in listings.iter().rev() {
            if self.contains(&listing.url) {
                continue;
            }
            if fresh.iter().any(|l| l.url == listing.url) {
                continue;
            }
            fresh.push(listing);
        }

        fresh
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most recently announced URLs, newest last.
    pub fn recent(&self, n: usize) -> &[String] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_ledger_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("hackbot-test-{}-{}", std::process::id(), name))
            .join("announced.json")
    }

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
    async fn missing_file_loads_empty() {
        let ledger = Ledger::load(temp_ledger_path("missing")).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let path = temp_ledger_path("corrupt");
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, "{ not json ]").await.unwrap();

        let ledger = Ledger::load(path).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn persists_and_reloads() {
        let path = temp_ledger_path("roundtrip");
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;

        let mut ledger = Ledger::load(path.clone()).await;
        ledger.append("https://a.devpost.com".into());
        ledger.append("https://b.devpost.com".into());
        ledger.persist().await.unwrap();

        let reloaded = Ledger::load(path).await;
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("https://a.devpost.com"));
        assert!(reloaded.contains("https://b.devpost.com"));
    }

    #[tokio::test]
    async fn eviction_keeps_most_recent_30() {
        let path = temp_ledger_path("eviction");
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;

        let mut ledger = Ledger::load(path.clone()).await;
        for i in 0..45 {
            ledger.append(format!("https://h{}.devpost.com", i));
        }
        ledger.evict_overflow();
        ledger.persist().await.unwrap();

        let reloaded = Ledger::load(path).await;
        assert_eq!(reloaded.len(), LEDGER_CAPACITY);
        // Oldest 15 evicted, most recent 30 kept in insertion order.
        assert!(!reloaded.contains("https://h14.devpost.com"));
        assert!(reloaded.contains("https://h15.devpost.com"));
        assert!(reloaded.contains("https://h44.devpost.com"));
        assert_eq!(reloaded.recent(1), &["https://h44.devpost.com"]);
    }

    #[test]
    fn membership_does_not_refresh_position() {
        let mut ledger = Ledger {
            entries: Vec::new(),
            path: PathBuf::new(),
        };
        for i in 0..LEDGER_CAPACITY {
            ledger.append(format!("https://h{}.devpost.com", i));
        }

        // Re-checking the oldest entry is pure FIFO, not LRU: it is still
        // the first to go when the ledger overflows.
        assert!(ledger.contains("https://h0.devpost.com"));
        ledger.append("https://fresh.devpost.com".into());
        ledger.evict_overflow();
        assert!(!ledger.contains("https://h0.devpost.com"));
        assert!(ledger.contains("https://h1.devpost.com"));
    }

    #[test]
    fn filter_new_reverses_and_skips_seen() {
        let mut ledger = Ledger {
            entries: Vec::new(),
            path: PathBuf::new(),
        };
        ledger.append("https://seen4.devpost.com".into());

        // Upstream order is most-recent-first.
        let fetched = vec![
            listing("https://new3.devpost.com"),
            listing("https://new2.devpost.com"),
            listing("https://old1.devpost.com"),
            listing("https://seen4.devpost.com"),
        ];

        let fresh: Vec<&str> = ledger
            .filter_new(&fetched)
            .into_iter()
            .map(|l| l.url.as_str())
            .collect();

        assert_eq!(
            fresh,
            vec![
                "https://old1.devpost.com",
                "https://new2.devpost.com",
                "https://new3.devpost.com",
            ]
        );
    }

    #[test]
    fn page_shifted_duplicates_collapse_to_one() {
        let ledger = Ledger {
            entries: Vec::new(),
            path: PathBuf::new(),
        };

        // The same hackathon seen on two pages of one fetch.
        let fetched = vec![
            listing("https://new.devpost.com"),
            listing("https://shifted.devpost.com"),
            listing("https://shifted.devpost.com"),
        ];

        let fresh: Vec<&str> = ledger
            .filter_new(&fetched)
            .into_iter()
            .map(|l| l.url.as_str())
            .collect();

        assert_eq!(
            fresh,
            vec!["https://shifted.devpost.com", "https://new.devpost.com"]
        );
    }

    #[test]
    fn unchanged_upstream_filters_to_nothing() {
        let mut ledger = Ledger {
            entries: Vec::new(),
            path: PathBuf::new(),
        };
        let fetched = vec![listing("https://a.devpost.com"), listing("https://b.devpost.com")];

        for l in ledger.filter_new(&fetched.clone()) {
            ledger.append(l.url.clone());
        }
        let before: Vec<String> = ledger.entries.clone();

        // Second cycle over the same upstream data announces nothing and
        // leaves the ledger untouched.
        assert!(ledger.filter_new(&fetched).is_empty());
        assert_eq!(ledger.entries, before);
    }
}
