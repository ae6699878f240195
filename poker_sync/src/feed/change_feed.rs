//! Event-driven refresh of the tracked table.
//!
//! A [`ChangeFeed`] lives for as long as one table is tracked. It performs a
//! baseline refresh, then listens to the contract's events, drops those for
//! other tables and turns bursts of the rest into debounced refreshes.

use super::debounce::{Debouncer, Trigger};
use crate::{
    ledger::{LedgerEvent, TableId},
    session::SessionContext,
    table::RemoteTableReader,
};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

struct FeedShared {
    table_id: TableId,
    reader: RemoteTableReader,
    debouncer: Mutex<Debouncer>,
    torn_down: AtomicBool,
}

impl FeedShared {
    fn debouncer(&self) -> MutexGuard<'_, Debouncer> {
        self.debouncer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Handle one event for the tracked table
    fn on_event(self: &Arc<Self>, event: &LedgerEvent) {
        if self.is_torn_down() {
            return;
        }

        let now = Instant::now();
        let mut debouncer = self.debouncer();
        match debouncer.plan(now) {
            Trigger::RefreshNow => {
                log::debug!("Table {}: {} triggers refresh", self.table_id, event.name());
                // Also disarms any timer still pending
                debouncer.record_refresh(now);
                self.spawn_refresh();
            }
            Trigger::Deferred(deadline) => {
                log::trace!(
                    "Table {}: {} deferred to debounce deadline",
                    self.table_id,
                    event.name()
                );
                let shared = Arc::clone(self);
                let generation = debouncer.next_generation();
                debouncer.arm(tokio::spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    let fired = !shared.is_torn_down()
                        && shared.debouncer().fire(generation, Instant::now());
                    if fired {
                        log::debug!("Table {}: debounced refresh", shared.table_id);
                        shared.spawn_refresh();
                    }
                }));
            }
        }
    }

    /// Run a refresh that outlives the timer or listener that started it
    fn spawn_refresh(&self) {
        let reader = self.reader.clone();
        let table_id = self.table_id;
        tokio::spawn(async move {
            reader.refresh_all(table_id).await;
        });
    }
}

/// Subscription to one table's events
pub struct ChangeFeed {
    shared: Arc<FeedShared>,
    listener: Option<JoinHandle<()>>,
}

impl ChangeFeed {
    /// Refresh `table_id` once, then start listening for its events.
    ///
    /// Failing to attach listeners is logged and leaves a feed that only
    /// performed the baseline refresh.
    pub async fn start(ctx: &SessionContext, table_id: TableId) -> Self {
        let shared = Arc::new(FeedShared {
            table_id,
            reader: ctx.reader(),
            debouncer: Mutex::new(Debouncer::new(ctx.config().refresh_debounce)),
            torn_down: AtomicBool::new(false),
        });

        shared.reader.refresh_all(table_id).await;
        shared.debouncer().record_refresh(Instant::now());

        let listener = match (ctx.events(), ctx.contract_address()) {
            (Some(events), Some(contract)) => match events.subscribe(contract).await {
                Ok(receiver) => {
                    log::info!("Table {}: listening for contract events", table_id);
                    Some(tokio::spawn(listen(Arc::clone(&shared), receiver)))
                }
                Err(e) => {
                    log::error!("Table {}: failed to attach event listeners: {}", table_id, e);
                    None
                }
            },
            _ => {
                log::debug!("Table {}: no event source configured", table_id);
                None
            }
        };

        Self { shared, listener }
    }

    pub fn table_id(&self) -> TableId {
        self.shared.table_id
    }

    /// Whether events are being received
    pub fn is_listening(&self) -> bool {
        !self.shared.is_torn_down()
            && self
                .listener
                .as_ref()
                .is_some_and(|listener| !listener.is_finished())
    }

    /// Whether a debounced refresh is scheduled
    pub fn has_pending_refresh(&self) -> bool {
        self.shared.debouncer().has_pending()
    }

    /// Cancel the pending timer and detach the listeners.
    ///
    /// Refreshes already running are left to finish.
    pub fn teardown(&mut self) {
        if self.shared.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.shared.debouncer().cancel();
        log::debug!("Table {}: change feed torn down", self.shared.table_id);
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn listen(shared: Arc<FeedShared>, mut receiver: mpsc::Receiver<LedgerEvent>) {
    while let Some(event) = receiver.recv().await {
        if event.table_id != shared.table_id {
            log::trace!(
                "Table {}: ignoring {} for table {}",
                shared.table_id,
                event.name(),
                event.table_id
            );
            continue;
        }
        shared.on_event(&event);
    }
    log::debug!("Table {}: event stream closed", shared.table_id);
}
