//! Connection manager: one explicit record per buzzer identity.
//!
//! All connection state lives in the records map. Status snapshots are
//! projections of that map, press and status observers are fanned out
//! through [`Observers`], and on link loss the record is cleared before any
//! observer runs, so a callback that queries the manager sees the same
//! state the snapshot it was handed describes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use buzzer_proto::{ButtonState, BuzzerId, Rgb};
use futures_util::future::join_all;
use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::HostConfig;
use crate::error::{ConnectError, DisconnectAllError, LinkError};
use crate::events::Observers;
use crate::status::{BuzzerStatus, StatusSnapshot};
use crate::transport::{BuzzerLink, LinkEvent, Transport};

/// A debounced button transition reported by a connected buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    pub buzzer: BuzzerId,
    pub state: ButtonState,
}

struct ConnectionRecord {
    link: Arc<dyn BuzzerLink>,
    battery: Option<u8>,
    events: JoinHandle<()>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    config: HostConfig,
    records: Mutex<HashMap<BuzzerId, ConnectionRecord>>,
    presses: Observers<PressEvent>,
    status: Observers<StatusSnapshot>,
}

impl Inner {
    /// Project the records map into a snapshot. Callers must not hold the
    /// records lock.
    fn snapshot(&self) -> StatusSnapshot {
        let records = self.records.lock().expect("records lock poisoned");
        let mut snapshot = StatusSnapshot::default();
        for (id, record) in records.iter() {
            snapshot.set(
                *id,
                BuzzerStatus {
                    connected: true,
                    battery: record.battery,
                },
            );
        }
        snapshot
    }

    fn emit_status(&self) {
        let snapshot = self.snapshot();
        self.status.emit(&snapshot);
    }

    fn link_for(&self, id: BuzzerId) -> Option<Arc<dyn BuzzerLink>> {
        self.records
            .lock()
            .expect("records lock poisoned")
            .get(&id)
            .map(|record| record.link.clone())
    }
}

/// Manages the lifecycle of both buzzer connections.
///
/// Cheap to clone; clones share the same records and observer lists.
#[derive(Clone)]
pub struct BuzzerManager {
    inner: Arc<Inner>,
}

impl BuzzerManager {
    pub fn new(transport: Arc<dyn Transport>, config: HostConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                records: Mutex::new(HashMap::new()),
                presses: Observers::new(),
                status: Observers::new(),
            }),
        }
    }

    /// Discover and connect the buzzer with the given identity.
    ///
    /// Connecting an already-connected identity is a no-op. The reported
    /// identity must match the requested one; a mismatch tears the link
    /// down and fails hard, because silently relabeling would swap the
    /// players' buzzers.
    pub async fn connect(&self, identity: BuzzerId) -> Result<(), ConnectError> {
        if self.inner.link_for(identity).is_some() {
            info!("{:?} is already connected", identity);
            return Ok(());
        }

        let link: Arc<dyn BuzzerLink> = self.inner.transport.discover(identity).await?.into();

        let reported = match link.read_identity().await {
            Ok(reported) => reported,
            Err(err) => {
                let _ = link.disconnect().await;
                return Err(err.into());
            }
        };
        if reported != identity {
            let _ = link.disconnect().await;
            return Err(ConnectError::IdentityMismatch {
                requested: identity,
                reported,
            });
        }

        // Seed the battery cache so the first snapshot already carries a
        // level. A read failure degrades to "unknown", not a failed connect.
        let battery = match link.read_battery().await {
            Ok(level) => level,
            Err(err) => {
                warn!("initial battery read for {:?} failed: {err}", identity);
                None
            }
        };

        let rx = match link.subscribe().await {
            Ok(rx) => rx,
            Err(err) => {
                let _ = link.disconnect().await;
                return Err(err.into());
            }
        };

        let events = tokio::spawn(Self::run_event_loop(self.inner.clone(), identity, rx));

        let previous = self
            .inner
            .records
            .lock()
            .expect("records lock poisoned")
            .insert(
                identity,
                ConnectionRecord {
                    link,
                    battery,
                    events,
                },
            );
        if let Some(previous) = previous {
            // A concurrent connect slipped in; keep the newer link.
            previous.events.abort();
        }

        info!("{:?} connected, battery {:?}", identity, battery);
        self.inner.emit_status();
        Ok(())
    }

    async fn run_event_loop(
        inner: Arc<Inner>,
        identity: BuzzerId,
        mut rx: mpsc::Receiver<LinkEvent>,
    ) {
        while let Some(event) = rx.recv().await {
            match event {
                LinkEvent::Button(state) => {
                    inner.presses.emit(&PressEvent {
                        buzzer: identity,
                        state,
                    });
                }
                LinkEvent::Battery(level) => {
                    {
                        let mut records = inner.records.lock().expect("records lock poisoned");
                        if let Some(record) = records.get_mut(&identity) {
                            record.battery = Some(level);
                        }
                    }
                    inner.emit_status();
                }
                LinkEvent::Dropped => {
                    warn!("link to {:?} lost", identity);
                    // Clear the record before notifying: observers that
                    // query the manager must see the disconnected state.
                    inner
                        .records
                        .lock()
                        .expect("records lock poisoned")
                        .remove(&identity);
                    inner.emit_status();
                    return;
                }
            }
        }
    }

    /// Disconnect one buzzer. Idempotent; the record and cached battery
    /// level are cleared even if the link teardown fails.
    pub async fn disconnect(&self, identity: BuzzerId) -> Result<(), LinkError> {
        let record = self
            .inner
            .records
            .lock()
            .expect("records lock poisoned")
            .remove(&identity);
        let Some(record) = record else {
            return Ok(());
        };

        record.events.abort();
        let result = record.link.disconnect().await;
        self.inner.emit_status();
        result
    }

    /// Disconnect every connected buzzer. Individual failures are logged;
    /// the call only fails when no disconnect succeeded.
    pub async fn disconnect_all(&self) -> Result<(), DisconnectAllError> {
        let connected: Vec<BuzzerId> = {
            let records = self.inner.records.lock().expect("records lock poisoned");
            records.keys().copied().collect()
        };
        if connected.is_empty() {
            return Ok(());
        }

        let results = join_all(connected.iter().map(|id| self.disconnect(*id))).await;
        let failures: Vec<(BuzzerId, LinkError)> = connected
            .iter()
            .zip(results)
            .filter_map(|(id, result)| result.err().map(|err| (*id, err)))
            .collect();

        for (id, err) in &failures {
            warn!("disconnect of {:?} failed: {err}", id);
        }
        if failures.len() == connected.len() {
            Err(DisconnectAllError(failures))
        } else {
            Ok(())
        }
    }

    /// Set a buzzer's dome illumination. With a duration the color reverts
    /// to off afterwards, giving a feedback flash.
    ///
    /// Targeting a disconnected buzzer is a logged no-op: feedback for a
    /// press that raced a link loss has nowhere to go and that is fine.
    pub async fn set_illumination(
        &self,
        identity: BuzzerId,
        color: Rgb,
        duration_ms: Option<u64>,
    ) -> Result<(), LinkError> {
        let Some(link) = self.inner.link_for(identity) else {
            warn!("illumination for {:?} dropped, not connected", identity);
            return Ok(());
        };

        link.write_illumination(color).await?;

        if let Some(ms) = duration_ms {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(ms)).await;
                // Re-fetch: the link may have gone away during the flash.
                if let Some(link) = inner.link_for(identity) {
                    if let Err(err) = link.write_illumination(Rgb::OFF).await {
                        warn!("could not end flash on {:?}: {err}", identity);
                    }
                }
            });
        }
        Ok(())
    }

    /// Cycle each connected buzzer through the primary colors and back to
    /// off. Used by the operator to verify the hardware before a game.
    pub async fn test_pattern(&self) -> Result<(), LinkError> {
        let step = Duration::from_millis(self.inner.config.test_pattern_step_ms);
        for identity in BuzzerId::ALL {
            for color in [Rgb::GREEN, Rgb::RED, Rgb::WHITE] {
                self.set_illumination(identity, color, None).await?;
                sleep(step).await;
            }
            self.set_illumination(identity, Rgb::OFF, None).await?;
        }
        Ok(())
    }

    /// Current connection state of both buzzers, from cache. Performs no
    /// I/O and never blocks on the radio.
    #[must_use]
    pub fn get_status(&self) -> StatusSnapshot {
        self.inner.snapshot()
    }

    /// Register an observer for debounced button transitions.
    pub fn on_button_press(&self, callback: impl Fn(&PressEvent) + Send + Sync + 'static) {
        self.inner.presses.subscribe(callback);
    }

    /// Register an observer for connection and battery changes.
    pub fn on_status_change(&self, callback: impl Fn(&StatusSnapshot) + Send + Sync + 'static) {
        self.inner.status.subscribe(callback);
    }
}
