use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{DmrError, Result};
use crate::framing::emb::{self, Emb, Lcss};
use crate::framing::lc::{self, FullLc};
use crate::framing::slot_type;
use crate::framing::sync::{self, SyncPattern};
use crate::packet::{DataType, Flco, Packet, Ts};
use crate::proto::RouteAction;

use super::queue::QueueItem;
use super::timeslot::voice_call_expired;
use super::{RepeaterInner, Slot};

/// Idle sleep when the ingress queue is empty.
pub(crate) const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// Number of VOICE_LC headers fabricated on late entry.
const LATE_ENTRY_HEADERS: usize = 4;

/// The relay thread body: sweep expired calls, drain the queue, fan each
/// packet out to every transport except its source.
pub(crate) fn run(inner: Arc<RepeaterInner>) {
    log::debug!("repeater: dispatch thread running");
    while inner.is_active.load(Ordering::Relaxed) {
        expire(&inner);
        match inner.queue.shift() {
            Some(item) => fan_out(&inner, item),
            None => thread::sleep(IDLE_SLEEP),
        }
    }
    log::debug!("repeater: dispatch thread exiting");
}

/// Force-terminate voice calls whose far end went silent without a
/// terminator. The synthetic terminator carries the timeslot's last-seen
/// addressing and goes out to every attached transport.
fn expire(inner: &RepeaterInner) {
    for ts in Ts::ALL {
        if !inner.timeslots.voice_call_active(ts) {
            continue;
        }
        let Some(elapsed) = inner.timeslots.last_voice_elapsed(ts) else {
            continue;
        };
        if !voice_call_expired(elapsed) {
            continue;
        }
        log::info!(
            "repeater[{}]: voice call expired after {}ms",
            ts.as_str(),
            elapsed.as_millis()
        );

        let (src_id, dst_id, flco) = inner.timeslots.addressing(ts);
        let mut template = Packet {
            ts,
            data_type: DataType::TerminatorWithLc,
            color_code: inner.color_code,
            flco,
            src_id,
            dst_id,
            ..Default::default()
        };
        if let Err(e) = lc::encode(&FullLc::from_packet(&template), &mut template) {
            log::error!("repeater[{}]: terminator LC failed: {e}", ts.as_str());
        }

        let slots: Vec<Slot> = inner.slots.lock().expect("slot table poisoned").clone();
        for slot in &slots {
            let mut packet = template;
            if let Err(e) = fix_headers(inner, &mut packet) {
                log::error!(
                    "repeater[{}]: fix headers failed for {}: {e}",
                    ts.as_str(),
                    slot.transport.name()
                );
                continue;
            }
            if let Err(e) = slot.transport.transmit(&packet) {
                log::error!(
                    "repeater: transmit to {} failed: {e}",
                    slot.transport.name()
                );
            }
        }
        let _ = inner.timeslots.voice_call_end(ts);
    }
}

fn fan_out(inner: &RepeaterInner, item: QueueItem) {
    let slots: Vec<Slot> = inner.slots.lock().expect("slot table poisoned").clone();
    let source = slots.iter().find(|s| s.id == item.source).cloned();
    if let Some(src) = &source {
        log::debug!("repeater: handle packet from {}", src.transport.name());
    }

    for slot in &slots {
        if slot.id == item.source {
            log::trace!("repeater: skipped same-transport {}", slot.transport.name());
            continue;
        }

        // Each sink works on an independent copy: the router may rewrite it.
        let mut packet = item.packet;

        if let (Some(router), Some(src)) = (&inner.router, &source) {
            if router(src.transport.as_ref(), slot.transport.as_ref(), &mut packet)
                == RouteAction::Reject
            {
                log::debug!(
                    "repeater: packet refused by router for {}",
                    slot.transport.name()
                );
                continue;
            }
        }

        log::debug!(
            "repeater: routing {} packet to {}",
            packet.data_type.as_str(),
            slot.transport.name()
        );

        let ts = packet.ts;
        match packet.data_type {
            DataType::Voice | DataType::VoiceSync => {
                inner.timeslots.stamp_voice_frame(ts, &packet);

                if !inner.timeslots.voice_call_active(ts) {
                    // Late entry: we missed the header, fabricate some.
                    if let Err(e) = inner.timeslots.voice_call_start(ts, &packet, None) {
                        log::error!(
                            "repeater[{}]: failed to start voice call: {e}",
                            ts.as_str()
                        );
                        continue;
                    }
                    log::debug!("repeater[{}]: prepending voice LC headers", ts.as_str());
                    for _ in 0..LATE_ENTRY_HEADERS {
                        let mut header = packet;
                        header.data_type = DataType::VoiceLc;
                        if let Err(e) = fix_headers(inner, &mut header) {
                            log::error!(
                                "repeater[{}]: header synthesis failed: {e}",
                                ts.as_str()
                            );
                            break;
                        }
                        if let Err(e) = slot.transport.transmit(&header) {
                            log::error!(
                                "repeater: transmit to {} failed: {e}",
                                slot.transport.name()
                            );
                        }
                    }
                }

                packet.meta.voice_frame = inner.timeslots.next_voice_frame(ts);
            }

            DataType::VoiceLc => {
                inner.timeslots.stamp_voice_frame(ts, &packet);
                if let Err(e) = inner.timeslots.voice_call_start(ts, &packet, None) {
                    log::error!("repeater[{}]: failed to start voice call: {e}", ts.as_str());
                    continue;
                }
            }

            DataType::TerminatorWithLc => {
                inner.timeslots.stamp_voice_frame(ts, &packet);
                if let Err(e) = inner.timeslots.voice_call_end(ts) {
                    log::error!("repeater[{}]: failed to end voice call: {e}", ts.as_str());
                    continue;
                }
            }

            _ => {
                inner.timeslots.stamp_data_frame(ts);
            }
        }

        if let Err(e) = fix_headers(inner, &mut packet) {
            log::error!(
                "repeater[{}]: fix headers failed for {}: {e}",
                ts.as_str(),
                slot.transport.name()
            );
            continue;
        }
        if let Err(e) = slot.transport.transmit(&packet) {
            log::error!("repeater: transmit to {} failed: {e}", slot.transport.name());
        }
    }
}

/// Normalize an outbound packet's framing for its sink: repeater color
/// code everywhere, regenerated full LC and slot type on headers, sync
/// pattern or embedded-LC fragment on voice bursts by superframe
/// position.
pub(crate) fn fix_headers(inner: &RepeaterInner, packet: &mut Packet) -> Result<()> {
    let ts = packet.ts;
    log::trace!(
        "repeater[{}]: fixing headers in {} packet",
        ts.as_str(),
        packet.data_type.as_str()
    );

    if packet.color_code != inner.color_code {
        log::debug!(
            "repeater[{}]: setting color code {}->{}",
            ts.as_str(),
            packet.color_code,
            inner.color_code
        );
        packet.color_code = inner.color_code;
    }

    match packet.data_type {
        DataType::VoiceLc => {
            let full_lc = FullLc::from_packet(packet);
            lc::encode(&full_lc, packet)?;
            sync::encode(SyncPattern::MsSourcedData, packet);
            slot_type::encode(packet)?;
        }

        DataType::TerminatorWithLc => {
            sync::encode(SyncPattern::MsSourcedData, packet);
            // Forwarding a terminator ends the timeslot's call for all sinks
            inner.timeslots.voice_call_end(ts)?;
        }

        DataType::Voice | DataType::VoiceSync => {
            let record = inner.timeslots.emb_lc(ts);
            let mut emb = Emb {
                color_code: inner.color_code,
                pi: packet.flco == Flco::Private,
                lcss: Lcss::SingleFragment,
            };

            match packet.meta.voice_frame {
                // Frame A carries the voice sync pattern
                0 => sync::encode(SyncPattern::MsSourcedVoice, packet),
                // Frames B..E carry embedded LC fragments 0..3
                1..=4 => {
                    let fragment = usize::from(packet.meta.voice_frame - 1);
                    if record.is_some() {
                        emb.lcss = match fragment {
                            0 => Lcss::FirstFragment,
                            3 => Lcss::LastFragment,
                            _ => Lcss::Continuation,
                        };
                    }
                    emb::fragment_encode(&emb, record.as_ref(), fragment, packet)?;
                }
                // Frame F carries a null EMB
                5 => emb::fragment_encode(&emb, None, 0, packet)?,
                _ => return Err(DmrError::Codec("voice frame out of range")),
            }
        }

        _ => {
            log::trace!(
                "repeater[{}]: not altering {} packet",
                ts.as_str(),
                packet.data_type.as_str()
            );
        }
    }

    Ok(())
}
