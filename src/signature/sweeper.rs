// Background expiry sweep for the signature cache
// Author: kelexine (https://github.com/kelexine)

use super::SignatureCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Periodically purge expired signatures so unread entries do not linger.
///
/// Lookups already expire entries lazily; this only bounds the memory held
/// by entries nobody asks for again. Abort the handle to stop it.
pub fn spawn_sweeper(cache: Arc<SignatureCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.purge_expired();
            debug!(
                "Signature sweep removed {} entries, {} remain",
                removed,
                cache.len()
            );
        }
    })
}
