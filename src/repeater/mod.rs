mod dispatch;
mod queue;
mod timeslot;

pub use timeslot::{TimeslotSnapshot, VOICE_CALL_TIMEOUT};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::{DmrError, Result};
use crate::framing::lc::FullLc;
use crate::packet::{Packet, Ts};
use crate::proto::{Router, RxCallback, Transport};

use queue::IngressQueue;
use timeslot::Timeslots;

/// One attached transport with its stable slot identity. Fan-out excludes
/// the slot a packet arrived on.
#[derive(Clone)]
pub(crate) struct Slot {
    pub id: usize,
    pub transport: Arc<dyn Transport>,
}

/// State shared with the dispatch thread and the per-transport ingress
/// callbacks.
pub(crate) struct RepeaterInner {
    pub color_code: u8,
    pub router: Option<Router>,
    pub slots: Mutex<Vec<Slot>>,
    pub queue: IngressQueue,
    pub timeslots: Timeslots,
    pub is_active: AtomicBool,
}

struct Lifecycle {
    thread: Option<JoinHandle<()>>,
    running: bool,
}

/// A protocol-aware packet router bridging two or more DMR transports.
///
/// Transports are attached with [`Repeater::add`] before [`Repeater::start`]
/// spawns the dispatch thread. Every packet a transport receives is queued
/// and relayed to all other transports, subject to the router policy, with
/// framing regenerated for each sink.
pub struct Repeater {
    inner: Arc<RepeaterInner>,
    lifecycle: Mutex<Lifecycle>,
}

impl Repeater {
    pub const MAX_SLOTS: usize = 8;
    pub const QUEUE_CAPACITY: usize = 32;

    /// Create a repeater with a routing policy and a color code in 1..=15.
    /// `None` for the router permits everything.
    pub fn new(router: Option<Router>, color_code: u8) -> Result<Self> {
        if !(1..=15).contains(&color_code) {
            log::error!("repeater: invalid color code {color_code}");
            return Err(DmrError::Invalid("color code out of range"));
        }
        if router.is_none() {
            log::warn!("repeater: no router installed, permitting everything");
        }
        Ok(Self {
            inner: Arc::new(RepeaterInner {
                color_code,
                router,
                slots: Mutex::new(Vec::new()),
                queue: IngressQueue::new(Self::QUEUE_CAPACITY),
                timeslots: Timeslots::new(),
                is_active: AtomicBool::new(false),
            }),
            lifecycle: Mutex::new(Lifecycle {
                thread: None,
                running: false,
            }),
        })
    }

    pub fn color_code(&self) -> u8 {
        self.inner.color_code
    }

    /// Attach a transport and install the ingress callback on it. Fails
    /// when the slot table is full, the transport refuses the callback,
    /// or the repeater is already running.
    pub fn add(&self, transport: Arc<dyn Transport>) -> Result<()> {
        if self.active() {
            log::error!("repeater: cannot add transports while running");
            return Err(DmrError::Invalid("cannot add transports while running"));
        }
        let mut slots = self.inner.slots.lock().expect("slot table poisoned");
        if slots.len() >= Self::MAX_SLOTS {
            log::error!("repeater: max slots of {} reached", Self::MAX_SLOTS);
            return Err(DmrError::Invalid("transport slots exhausted"));
        }

        let id = slots.len();
        let weak = Arc::downgrade(&self.inner);
        let callback: RxCallback = Box::new(move |packet| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(e) = inner.queue.enqueue(id, *packet) {
                log::warn!("repeater: dropping packet from slot {id}: {e}");
            }
        });

        if !transport.register_rx(callback) {
            log::error!(
                "repeater: transport {} refused rx callback",
                transport.name()
            );
            return Err(DmrError::Invalid("transport refused rx callback"));
        }

        log::info!("repeater: added transport {}", transport.name());
        slots.push(Slot { id, transport });
        Ok(())
    }

    /// Spawn the dispatch thread. Requires at least two attached
    /// transports; a repeater with one sink is not a bridge.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().expect("lifecycle poisoned");
        if lifecycle.running {
            log::error!("repeater: can't start, already active");
            return Err(DmrError::Invalid("already started"));
        }
        let attached = self.inner.slots.lock().expect("slot table poisoned").len();
        if attached < 2 {
            log::error!("repeater: can't start with less than 2 transports, got {attached}");
            return Err(DmrError::Invalid("need at least two transports"));
        }

        self.inner.is_active.store(true, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        match thread::Builder::new()
            .name("repeater".to_string())
            .spawn(move || dispatch::run(inner))
        {
            Ok(handle) => {
                lifecycle.thread = Some(handle);
                lifecycle.running = true;
                Ok(())
            }
            Err(e) => {
                self.inner.is_active.store(false, Ordering::Relaxed);
                log::error!("repeater: can't create thread: {e}");
                Err(DmrError::Thread(e.to_string()))
            }
        }
    }

    /// Cooperative shutdown: clear the active flag and join the dispatch
    /// thread. Queued packets are not drained.
    pub fn stop(&self) -> Result<()> {
        let handle = {
            let mut lifecycle = self.lifecycle.lock().expect("lifecycle poisoned");
            if !lifecycle.running {
                log::error!("repeater: can't stop, not running");
                return Err(DmrError::Invalid("not running"));
            }
            self.inner.is_active.store(false, Ordering::Relaxed);
            lifecycle.running = false;
            lifecycle.thread.take()
        };
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| DmrError::Thread("dispatch thread panicked".to_string()))?;
        }
        Ok(())
    }

    /// Block until the dispatch thread exits (some other thread calls
    /// [`Repeater::stop`]). Returns immediately when not running.
    pub fn wait(&self) -> Result<()> {
        let handle = {
            let mut lifecycle = self.lifecycle.lock().expect("lifecycle poisoned");
            lifecycle.thread.take()
        };
        let Some(handle) = handle else {
            return Ok(());
        };
        let joined = handle
            .join()
            .map_err(|_| DmrError::Thread("dispatch thread panicked".to_string()));
        let mut lifecycle = self.lifecycle.lock().expect("lifecycle poisoned");
        lifecycle.running = false;
        self.inner.is_active.store(false, Ordering::Relaxed);
        joined
    }

    /// True while the dispatch thread exists and the active flag is set.
    pub fn active(&self) -> bool {
        let lifecycle = self.lifecycle.lock().expect("lifecycle poisoned");
        lifecycle.running && self.inner.is_active.load(Ordering::Relaxed)
    }

    // ── Timeslot surface ─────────────────────────────────────────────────────

    pub fn voice_call_active(&self, ts: Ts) -> bool {
        self.inner.timeslots.voice_call_active(ts)
    }

    pub fn set_voice_call_active(&self, ts: Ts, active: bool) {
        self.inner.timeslots.set_voice_call_active(ts, active)
    }

    pub fn voice_call_start(&self, ts: Ts, packet: &Packet, full_lc: Option<&FullLc>) -> Result<()> {
        self.inner.timeslots.voice_call_start(ts, packet, full_lc)
    }

    pub fn voice_call_end(&self, ts: Ts) -> Result<()> {
        self.inner.timeslots.voice_call_end(ts)
    }

    pub fn timeslot_snapshot(&self, ts: Ts) -> TimeslotSnapshot {
        self.inner.timeslots.snapshot(ts)
    }

    /// Number of packets currently waiting in the ingress queue.
    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }
}

impl Drop for Repeater {
    fn drop(&mut self) {
        // Let a still-running dispatch thread wind down on its own
        self.inner.is_active.store(false, Ordering::Relaxed);
    }
}
