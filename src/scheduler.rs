//! Fixed-period background scheduler.
//!
//! Ticks never overlap: the callback future is awaited before the next tick
//! is taken, and a missed tick is delayed rather than stacked.  The first
//! tick fires immediately, so a freshly (re)started bot checks for new
//! hackathons right away.

use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> tokio::task::JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            tick().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_at_the_requested_period() {
        let count = Arc::new(AtomicUsize::new(0));

        let tick_count = count.clone();
        let handle = spawn(Duration::from_secs(10), move || {
            let count = tick_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Immediate tick plus three periods.
        tokio::time::sleep(Duration::from_secs(35)).await;
        handle.abort();

        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        let tick_in_flight = in_flight.clone();
        let tick_max = max_in_flight.clone();
        let handle = spawn(Duration::from_secs(10), move || {
            let in_flight = tick_in_flight.clone();
            let max_in_flight = tick_max.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                // Each tick takes longer than the period.
                tokio::time::sleep(Duration::from_secs(25)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(120)).await;
        handle.abort();

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }
}
