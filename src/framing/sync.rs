use serde::{Deserialize, Serialize};

use crate::bits::{get_bits, set_bits};
use crate::packet::{Packet, SYNC_BITS, SYNC_OFFSET};

/// The standard 48-bit DMR sync patterns (ETSI TS 102 361-1 9.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPattern {
    BsSourcedData,
    BsSourcedVoice,
    MsSourcedData,
    MsSourcedVoice,
    MsSourcedRc,
    DirectVoiceTs1,
    DirectDataTs1,
    DirectVoiceTs2,
    DirectDataTs2,
}

impl SyncPattern {
    pub const ALL: [SyncPattern; 9] = [
        SyncPattern::BsSourcedData,
        SyncPattern::BsSourcedVoice,
        SyncPattern::MsSourcedData,
        SyncPattern::MsSourcedVoice,
        SyncPattern::MsSourcedRc,
        SyncPattern::DirectVoiceTs1,
        SyncPattern::DirectDataTs1,
        SyncPattern::DirectVoiceTs2,
        SyncPattern::DirectDataTs2,
    ];

    pub fn value(self) -> u64 {
        match self {
            Self::BsSourcedData => 0xDFF5_7D75_DF5D,
            Self::BsSourcedVoice => 0x755F_D7DF_75F7,
            Self::MsSourcedData => 0xD5D7_F77F_D757,
            Self::MsSourcedVoice => 0x7F7D_5DD5_7DFD,
            Self::MsSourcedRc => 0x77D5_5F7D_FD77,
            Self::DirectVoiceTs1 => 0x5D57_7F77_57FF,
            Self::DirectDataTs1 => 0xF7FD_D5DD_FD55,
            Self::DirectVoiceTs2 => 0x7DFF_D5F5_5D5F,
            Self::DirectDataTs2 => 0xD755_7F5F_F7F5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BsSourcedData => "bs sourced data",
            Self::BsSourcedVoice => "bs sourced voice",
            Self::MsSourcedData => "ms sourced data",
            Self::MsSourcedVoice => "ms sourced voice",
            Self::MsSourcedRc => "ms sourced rc",
            Self::DirectVoiceTs1 => "direct voice ts1",
            Self::DirectDataTs1 => "direct data ts1",
            Self::DirectVoiceTs2 => "direct voice ts2",
            Self::DirectDataTs2 => "direct data ts2",
        }
    }
}

/// Overwrite the burst's 48-bit sync field.
pub fn encode(pattern: SyncPattern, packet: &mut Packet) {
    set_bits(&mut packet.payload, SYNC_OFFSET, SYNC_BITS, pattern.value());
}

/// Identify the sync pattern currently in the burst, if any.
pub fn extract(packet: &Packet) -> Option<SyncPattern> {
    let field = get_bits(&packet.payload, SYNC_OFFSET, SYNC_BITS);
    SyncPattern::ALL.into_iter().find(|p| p.value() == field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_places_exact_bytes() {
        let mut packet = Packet::default();
        encode(SyncPattern::MsSourcedData, &mut packet);
        // Field starts on the low nibble of byte 13
        assert_eq!(packet.payload[13], 0x0D);
        assert_eq!(&packet.payload[14..19], &[0x5D, 0x7F, 0x77, 0xFD, 0x75]);
        assert_eq!(packet.payload[19], 0x70);
    }

    #[test]
    fn encode_extract_round_trip() {
        for pattern in SyncPattern::ALL {
            let mut packet = Packet::default();
            encode(pattern, &mut packet);
            assert_eq!(extract(&packet), Some(pattern), "{}", pattern.as_str());
        }
    }

    #[test]
    fn garbage_field_extracts_nothing() {
        let packet = Packet::default();
        assert_eq!(extract(&packet), None);
    }

    #[test]
    fn encode_leaves_payload_halves_alone() {
        let mut packet = Packet {
            payload: [0xFF; 33],
            ..Default::default()
        };
        encode(SyncPattern::BsSourcedVoice, &mut packet);
        assert_eq!(packet.payload[0], 0xFF);
        assert_eq!(packet.payload[13] & 0xF0, 0xF0);
        assert_eq!(packet.payload[19] & 0x0F, 0x0F);
        assert_eq!(packet.payload[32], 0xFF);
    }
}
