// ── sysfs poller ──
//
// Periodically re-discovers interfaces and broadcasts every payload that
// differs from the previous pass. Removed devices are not reported: the
// next full refresh drops them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use netcfg_core::Backend;
use netcfg_core::payload::InterfacePayload;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::SysconfigBackend;

type Snapshot = HashMap<String, InterfacePayload>;

/// Spawn the poll task, or `None` when polling is disabled.
pub fn spawn_poller(
    backend: Arc<SysconfigBackend>,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    let period = backend.options().poll_interval?;
    Some(tokio::spawn(poll_task(backend, period, cancel)))
}

async fn poll_task(backend: Arc<SysconfigBackend>, period: Duration, cancel: CancellationToken) {
    let mut last = match backend.interfaces().await {
        Ok(interfaces) => snapshot(interfaces),
        Err(e) => {
            warn!(error = %e, "initial interface discovery failed");
            Snapshot::new()
        }
    };

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match backend.interfaces().await {
                    Ok(interfaces) => {
                        let current = snapshot(interfaces);
                        for payload in changed(&last, &current) {
                            debug!(interface = %payload.name, "interface changed");
                            backend.notify(payload.clone());
                        }
                        last = current;
                    }
                    Err(e) => warn!(error = %e, "interface poll failed"),
                }
            }
        }
    }

    debug!("interface poller stopped");
}

fn snapshot(interfaces: Vec<InterfacePayload>) -> Snapshot {
    interfaces
        .into_iter()
        .map(|payload| (payload.name.clone(), payload))
        .collect()
}

/// New or modified interfaces, sorted by name.
fn changed<'a>(last: &Snapshot, current: &'a Snapshot) -> Vec<&'a InterfacePayload> {
    let mut changed: Vec<_> = current
        .values()
        .filter(|payload| last.get(&payload.name) != Some(*payload))
        .collect();
    changed.sort_by(|a, b| a.name.cmp(&b.name));
    changed
}
