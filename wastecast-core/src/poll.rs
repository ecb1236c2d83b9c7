//! Periodic lookup scheduling across all configured addresses.

use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::lookup::LookupClient;
use crate::model::{AddressBook, Record};

/// Drives the lookup client for every configured address on a fixed period.
///
/// Addresses are processed sequentially within a cycle; one address's
/// failure never blocks the others.
pub struct Poller {
    book: AddressBook,
    client: LookupClient,
    interval: Duration,
    outgoing: mpsc::Sender<Record>,
}

impl Poller {
    /// Create a poller feeding records into the given channel.
    #[must_use]
    pub fn new(
        book: AddressBook,
        client: LookupClient,
        interval: Duration,
        outgoing: mpsc::Sender<Record>,
    ) -> Self {
        Self {
            book,
            client,
            interval,
            outgoing,
        }
    }

    /// Poll once immediately, then every interval, until the sink goes away.
    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The first tick completes immediately.
            ticker.tick().await;
            if !self.poll_once().await {
                return;
            }
            info!(sleep = ?self.interval, "finished polling; sleeping");
        }
    }

    /// Run one cycle; returns `false` once the record channel is closed.
    async fn poll_once(&self) -> bool {
        info!("polling");
        for (address, _) in self.book.iter() {
            // Captured per address so a slow lookup does not skew the rest
            // of the batch.
            let now = Local::now();
            match self.client.next_collection(address, now).await {
                Ok(Some(record)) => {
                    if self.outgoing.send(record).await.is_err() {
                        warn!("record channel closed; stopping poller");
                        return false;
                    }
                }
                Ok(None) => info!(address, "no upcoming collection found"),
                Err(err) => warn!(address, %err, "lookup failed; skipping this cycle"),
            }
        }
        true
    }
}
