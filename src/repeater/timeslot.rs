use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fec::Vbptc1611;
use crate::framing::emb;
use crate::framing::lc::FullLc;
use crate::packet::{Flco, Packet, Ts};

/// A voice call with no burst for longer than this is force-terminated by
/// the expiry sweep. Strictly greater than: a frame exactly this old does
/// not expire.
pub const VOICE_CALL_TIMEOUT: Duration = Duration::from_millis(180);

pub(crate) fn voice_call_expired(elapsed: Duration) -> bool {
    elapsed > VOICE_CALL_TIMEOUT
}

/// Per-timeslot call tracking. Only the dispatch thread mutates these
/// records; transports observe them through the repeater's query surface.
#[derive(Debug)]
pub(crate) struct TimeslotState {
    pub voice_call_active: bool,
    pub data_call_active: bool,
    pub stream_id: u32,
    pub sequence: u8,
    /// Position in the A..F superframe cycle, 0..=5.
    pub voice_frame: u8,
    pub last_voice_frame_received: Option<Instant>,
    pub last_data_frame_received: Option<Instant>,
    /// Encoded embedded LC for the current call; present only while a
    /// voice call is active and an LC was available at start.
    pub emb_lc: Option<Vbptc1611>,
    // Last-seen addressing, used by the expiry synthesizer
    pub src_id: u32,
    pub dst_id: u32,
    pub flco: Flco,
}

impl Default for TimeslotState {
    fn default() -> Self {
        Self {
            voice_call_active: false,
            data_call_active: false,
            stream_id: 0,
            sequence: 0,
            voice_frame: 0,
            last_voice_frame_received: None,
            last_data_frame_received: None,
            emb_lc: None,
            src_id: 0,
            dst_id: 0,
            flco: Flco::Group,
        }
    }
}

/// Serializable view of one timeslot record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeslotSnapshot {
    pub ts: Ts,
    pub voice_call_active: bool,
    pub data_call_active: bool,
    pub stream_id: u32,
    pub sequence: u8,
    pub voice_frame: u8,
    pub emb_lc_present: bool,
    pub src_id: u32,
    pub dst_id: u32,
    /// Milliseconds since the last voice / data burst, if any was seen.
    pub voice_idle_ms: Option<u128>,
    pub data_idle_ms: Option<u128>,
}

/// The two timeslot records, each behind its own short-lived lock.
pub(crate) struct Timeslots {
    slots: [Mutex<TimeslotState>; 2],
}

impl Timeslots {
    pub fn new() -> Self {
        Self {
            slots: [
                Mutex::new(TimeslotState::default()),
                Mutex::new(TimeslotState::default()),
            ],
        }
    }

    fn get(&self, ts: Ts) -> MutexGuard<'_, TimeslotState> {
        self.slots[ts.index()].lock().expect("timeslot lock poisoned")
    }

    pub fn voice_call_active(&self, ts: Ts) -> bool {
        self.get(ts).voice_call_active
    }

    pub fn set_voice_call_active(&self, ts: Ts, active: bool) {
        self.get(ts).voice_call_active = active;
    }

    /// Begin a voice call; an already-active call is ended first. With a
    /// link control the embedded-LC record is encoded and stored for the
    /// fragment codec; without one, voice bursts carry NULL fragments.
    pub fn voice_call_start(
        &self,
        ts: Ts,
        packet: &Packet,
        full_lc: Option<&FullLc>,
    ) -> Result<()> {
        if self.voice_call_active(ts) {
            log::debug!("repeater[{}]: restarting active voice call", ts.as_str());
            self.voice_call_end(ts)?;
        }

        let record = full_lc.map(emb::encode_signalling);

        log::info!("repeater[{}]: voice call start", ts.as_str());
        let mut slot = self.get(ts);
        slot.voice_call_active = true;
        slot.voice_frame = 0;
        slot.sequence = 0;
        slot.stream_id = slot.stream_id.wrapping_add(1);
        slot.emb_lc = record;
        slot.src_id = packet.src_id;
        slot.dst_id = packet.dst_id;
        slot.flco = packet.flco;
        Ok(())
    }

    /// End the timeslot's voice call. A no-op when none is active.
    pub fn voice_call_end(&self, ts: Ts) -> Result<()> {
        let mut slot = self.get(ts);
        if !slot.voice_call_active {
            log::debug!("repeater[{}]: not stopping inactive voice call", ts.as_str());
            return Ok(());
        }
        log::info!("repeater[{}]: voice call end", ts.as_str());
        slot.emb_lc = None;
        slot.voice_call_active = false;
        Ok(())
    }

    pub fn stamp_voice_frame(&self, ts: Ts, packet: &Packet) {
        let mut slot = self.get(ts);
        slot.last_voice_frame_received = Some(Instant::now());
        slot.src_id = packet.src_id;
        slot.dst_id = packet.dst_id;
        slot.flco = packet.flco;
    }

    pub fn stamp_data_frame(&self, ts: Ts) {
        self.get(ts).last_data_frame_received = Some(Instant::now());
    }

    /// Current superframe position; advances the counter and the burst
    /// sequence through the owned record.
    pub fn next_voice_frame(&self, ts: Ts) -> u8 {
        let mut slot = self.get(ts);
        let frame = slot.voice_frame;
        slot.voice_frame = (slot.voice_frame + 1) % 6;
        slot.sequence = slot.sequence.wrapping_add(1);
        frame
    }

    pub fn emb_lc(&self, ts: Ts) -> Option<Vbptc1611> {
        self.get(ts).emb_lc
    }

    pub fn last_voice_elapsed(&self, ts: Ts) -> Option<Duration> {
        self.get(ts).last_voice_frame_received.map(|t| t.elapsed())
    }

    /// Last-seen addressing on this timeslot.
    pub fn addressing(&self, ts: Ts) -> (u32, u32, Flco) {
        let slot = self.get(ts);
        (slot.src_id, slot.dst_id, slot.flco)
    }

    pub fn snapshot(&self, ts: Ts) -> TimeslotSnapshot {
        let slot = self.get(ts);
        TimeslotSnapshot {
            ts,
            voice_call_active: slot.voice_call_active,
            data_call_active: slot.data_call_active,
            stream_id: slot.stream_id,
            sequence: slot.sequence,
            voice_frame: slot.voice_frame,
            emb_lc_present: slot.emb_lc.is_some(),
            src_id: slot.src_id,
            dst_id: slot.dst_id,
            voice_idle_ms: slot.last_voice_frame_received.map(|t| t.elapsed().as_millis()),
            data_idle_ms: slot.last_data_frame_received.map(|t| t.elapsed().as_millis()),
        }
    }
}
