use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::model::{Notification, RoleScope};
use crate::query::NotificationQueries;

/// A running background refresh for one view. Dropping it stops the interval;
/// a request already in flight is abandoned with it.
#[derive(Debug)]
pub struct PollHandle {
    rx: watch::Receiver<Option<Vec<Notification>>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Latest successfully fetched list, `None` until the first fetch lands.
    pub fn latest(&self) -> Option<Vec<Notification>> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<Notification>>> {
        self.rx.clone()
    }

    pub fn stop(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start polling `scope` every `every`. The first tick fires immediately and
/// may be served from cache; later ticks always refetch. Failed refetches are
/// logged and the previously published list stays in place. Between ticks,
/// changes to the shared cache (a notification marked read elsewhere) are
/// republished right away.
pub fn spawn_poller(queries: NotificationQueries, scope: RoleScope, every: Duration) -> PollHandle {
    let (tx, rx) = watch::channel(None);
    let mut changes = queries.cache().subscribe();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut first = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let res = if first {
                        queries.fetch(&scope).await
                    } else {
                        queries.refresh(&scope).await
                    };
                    first = false;
                    match res {
                        Ok(list) => {
                            debug!(role = %scope.role(), count = list.len(), "poll refreshed");
                            tx.send_replace(Some(list));
                        }
                        Err(err) => {
                            warn!(
                                ?err,
                                role = %scope.role(),
                                "notification poll failed; keeping previous list"
                            );
                        }
                    }
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(list) = queries.cached(&scope).await {
                        publish_if_changed(&tx, list);
                    }
                }
            }
        }
    });
    PollHandle { rx, task }
}

fn publish_if_changed(tx: &watch::Sender<Option<Vec<Notification>>>, list: Vec<Notification>) {
    tx.send_if_modified(|current| {
        if current.as_ref() == Some(&list) {
            return false;
        }
        debug!(count = list.len(), "cached notifications changed");
        *current = Some(list);
        true
    });
}
