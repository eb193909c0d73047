//! Indicator task
//!
//! This module handles:
//! - Router duplicate statistics shared with the mesh stack
//! - The channel the packet dispatch path uses to reach the indicator
//! - The thread that owns the indicator and runs its tick schedule
//!
//! The mesh stack integrates through [`IndicatorHandle`]: the receive path
//! calls [`IndicatorHandle::packet_received`], the router bumps the
//! counters in [`IndicatorHandle::router_stats`], and the ambient lighting
//! owner calls [`IndicatorHandle::ambient_changed`].

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::blink::AmbientLighting;
use crate::duplicates::RouterCounters;
use crate::module::{IndicatorModule, MeshPacketInfo, NextTick};
use crate::surface::LedSurface;

/// Messages sent to the indicator task
#[derive(Debug, Clone)]
pub enum IndicatorMessage {
    /// A packet was heard on the radio
    Packet(MeshPacketInfo),
    /// Ambient lighting configuration changed
    AmbientChanged(AmbientLighting),
}

/// Channel sender for messages to the indicator task
pub type IndicatorSender = Sender<IndicatorMessage>;

/// Duplicate counters maintained by the router.
#[derive(Debug, Default)]
pub struct RouterStats {
    rx_dupe: AtomicU32,
    tx_relay_canceled: AtomicU32,
}

impl RouterStats {
    pub fn record_rx_duplicate(&self) {
        self.rx_dupe.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relay_canceled(&self) {
        self.tx_relay_canceled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample(&self) -> RouterCounters {
        RouterCounters {
            rx_duplicate_count: self.rx_dupe.load(Ordering::Relaxed),
            tx_relay_canceled_count: self.tx_relay_canceled.load(Ordering::Relaxed),
        }
    }
}

/// Everything the indicator task needs besides its channel
pub struct IndicatorTaskContext<S> {
    pub module: IndicatorModule<S>,
    /// This node's number; its own packets never alert
    pub node_num: u32,
    /// Ambient lighting at boot, painted before the first tick
    pub ambient: AmbientLighting,
}

/// Connection to a running indicator task.
pub struct IndicatorHandle {
    tx: IndicatorSender,
    router: Arc<RouterStats>,
    thread: JoinHandle<()>,
}

impl IndicatorHandle {
    /// Report a packet heard on the radio. Never blocks.
    pub fn packet_received(&self, packet: MeshPacketInfo) {
        if self.tx.send(IndicatorMessage::Packet(packet)).is_err() {
            warn!("Indicator task gone, dropping packet 0x{:08x}", packet.id);
        }
    }

    pub fn ambient_changed(&self, ambient: AmbientLighting) {
        if self.tx.send(IndicatorMessage::AmbientChanged(ambient)).is_err() {
            warn!("Indicator task gone, dropping ambient change");
        }
    }

    /// Counters for the router to update
    pub fn router_stats(&self) -> Arc<RouterStats> {
        Arc::clone(&self.router)
    }

    /// A sender for code that outlives this handle's borrow, such as a
    /// packet callback registered with the mesh stack.
    pub fn sender(&self) -> IndicatorSender {
        self.tx.clone()
    }

    /// Close the channel and wait for the task to drain it and exit.
    ///
    /// Senders handed out by [`sender`](Self::sender) keep the task alive
    /// until they are dropped too.
    pub fn shutdown(self) {
        let Self { tx, thread, .. } = self;
        drop(tx);
        if thread.join().is_err() {
            warn!("Indicator task panicked");
        }
    }
}

/// Spawn the indicator task and return its handle.
pub fn spawn_indicator_task<S>(ctx: IndicatorTaskContext<S>) -> io::Result<IndicatorHandle>
where
    S: LedSurface + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let router = Arc::new(RouterStats::default());
    let task_router = Arc::clone(&router);
    let thread = std::thread::Builder::new()
        .name("indicator".into())
        .spawn(move || indicator_task(ctx, &task_router, &rx))?;
    Ok(IndicatorHandle { tx, router, thread })
}

/// Run the indicator task.
///
/// Packets are handled as soon as they arrive. Between packets the task
/// sleeps until the deadline the module asked for on its last tick; once
/// the module stops scheduling itself the task only drains the channel.
fn indicator_task<S: LedSurface>(
    ctx: IndicatorTaskContext<S>,
    router: &RouterStats,
    rx: &Receiver<IndicatorMessage>,
) {
    let IndicatorTaskContext {
        mut module,
        node_num,
        mut ambient,
    } = ctx;

    info!("Indicator task started (node 0x{node_num:08x})");
    let started = Instant::now();
    let now_ms = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    module.on_ambient_changed(&ambient);

    // First tick runs immediately
    let mut next_tick_at = Some(Instant::now());

    loop {
        let message = match next_tick_at {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            },
        };

        match message {
            Some(IndicatorMessage::Packet(packet)) => {
                let disposition = module.on_packet_received(&packet, node_num, now_ms());
                debug!("Packet 0x{:08x}: {disposition:?}", packet.id);
            }
            Some(IndicatorMessage::AmbientChanged(new_ambient)) => {
                debug!("Ambient lighting changed: {new_ambient:?}");
                ambient = new_ambient;
                module.on_ambient_changed(&ambient);
            }
            None => {
                next_tick_at = match module.on_tick(now_ms(), Some(router.sample()), &ambient) {
                    NextTick::AfterMs(ms) => Some(Instant::now() + Duration::from_millis(ms)),
                    NextTick::Never => {
                        info!("Indicator stopped scheduling ticks");
                        None
                    }
                };
            }
        }
    }

    info!("Indicator channel closed, exiting task");
}
