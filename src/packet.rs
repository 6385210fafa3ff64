use serde::{Deserialize, Serialize};

// ── Burst geometry ───────────────────────────────────────────────────────────

/// One DMR burst is 264 bits: 108 payload bits, 48 sync-or-embedded bits,
/// 108 payload bits (ETSI TS 102 361-1).
pub const BURST_BITS: usize = 264;
pub const BURST_LEN: usize = 33;

/// Bit offset of the 48-bit sync / embedded-signalling field.
pub const SYNC_OFFSET: usize = 108;
pub const SYNC_BITS: usize = 48;

/// The 20-bit slot type flanks the sync field, 10 bits on either side.
pub const SLOT_TYPE_FIRST_OFFSET: usize = 98;
pub const SLOT_TYPE_SECOND_OFFSET: usize = 156;
pub const SLOT_TYPE_HALF_BITS: usize = 10;

/// Embedded signalling inside a voice burst: 16-bit EMB split around a
/// 32-bit LC fragment.
pub const EMB_FIRST_OFFSET: usize = 108;
pub const EMB_FRAGMENT_OFFSET: usize = 116;
pub const EMB_FRAGMENT_BITS: usize = 32;
pub const EMB_SECOND_OFFSET: usize = 148;

// ── Enums ────────────────────────────────────────────────────────────────────

/// DMR timeslot, the two TDMA channels on one carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ts {
    Ts1,
    Ts2,
}

impl Ts {
    pub const ALL: [Ts; 2] = [Ts::Ts1, Ts::Ts2];

    pub fn index(self) -> usize {
        match self {
            Ts::Ts1 => 0,
            Ts::Ts2 => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ts::Ts1 => "TS1",
            Ts::Ts2 => "TS2",
        }
    }
}

/// Burst data type. The first ten values are the on-air slot-type codes;
/// `Voice` and `VoiceSync` are pseudo-types for voice bursts, which carry
/// no slot type on air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    PiHeader,
    VoiceLc,
    TerminatorWithLc,
    Csbk,
    MbcHeader,
    MbcContinuation,
    DataHeader,
    Rate12Data,
    Rate34Data,
    Idle,
    Voice,
    VoiceSync,
}

impl DataType {
    /// The 4-bit slot-type code, or `None` for voice pseudo-types.
    pub fn slot_type_code(self) -> Option<u8> {
        match self {
            Self::PiHeader => Some(0),
            Self::VoiceLc => Some(1),
            Self::TerminatorWithLc => Some(2),
            Self::Csbk => Some(3),
            Self::MbcHeader => Some(4),
            Self::MbcContinuation => Some(5),
            Self::DataHeader => Some(6),
            Self::Rate12Data => Some(7),
            Self::Rate34Data => Some(8),
            Self::Idle => Some(9),
            Self::Voice | Self::VoiceSync => None,
        }
    }

    pub fn from_slot_type_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::PiHeader),
            1 => Some(Self::VoiceLc),
            2 => Some(Self::TerminatorWithLc),
            3 => Some(Self::Csbk),
            4 => Some(Self::MbcHeader),
            5 => Some(Self::MbcContinuation),
            6 => Some(Self::DataHeader),
            7 => Some(Self::Rate12Data),
            8 => Some(Self::Rate34Data),
            9 => Some(Self::Idle),
            _ => None,
        }
    }

    pub fn is_voice_burst(self) -> bool {
        matches!(self, Self::Voice | Self::VoiceSync)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PiHeader => "pi header",
            Self::VoiceLc => "voice lc",
            Self::TerminatorWithLc => "terminator with lc",
            Self::Csbk => "csbk",
            Self::MbcHeader => "mbc header",
            Self::MbcContinuation => "mbc continuation",
            Self::DataHeader => "data header",
            Self::Rate12Data => "rate 1/2 data",
            Self::Rate34Data => "rate 3/4 data",
            Self::Idle => "idle",
            Self::Voice => "voice",
            Self::VoiceSync => "voice sync",
        }
    }
}

/// Full link control opcode: group or unit-to-unit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flco {
    Group,
    Private,
}

impl Flco {
    /// 6-bit FLCO value carried in the first LC octet.
    pub fn code(self) -> u8 {
        match self {
            Flco::Group => 0x00,
            Flco::Private => 0x03,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Flco::Group),
            0x03 => Some(Flco::Private),
            _ => None,
        }
    }
}

// ── Packet ───────────────────────────────────────────────────────────────────

/// Per-packet metadata that never hits the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketMeta {
    /// Position in the A..F voice superframe cycle, 0..=5.
    pub voice_frame: u8,
    pub stream_id: u32,
    pub sequence: u8,
}

/// One DMR burst plus its decoded addressing.
///
/// `payload` holds the raw 264-bit burst; the framing codecs rewrite
/// regions of it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub ts: Ts,
    pub data_type: DataType,
    pub color_code: u8,
    pub flco: Flco,
    pub src_id: u32,
    pub dst_id: u32,
    pub payload: [u8; BURST_LEN],
    pub meta: PacketMeta,
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            ts: Ts::Ts1,
            data_type: DataType::Idle,
            color_code: 1,
            flco: Flco::Group,
            src_id: 0,
            dst_id: 0,
            payload: [0; BURST_LEN],
            meta: PacketMeta::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_type_codes_round_trip() {
        for code in 0..=9 {
            let dt = DataType::from_slot_type_code(code).unwrap();
            assert_eq!(dt.slot_type_code(), Some(code));
        }
        assert_eq!(DataType::Voice.slot_type_code(), None);
        assert_eq!(DataType::from_slot_type_code(12), None);
    }

    #[test]
    fn flco_codes() {
        assert_eq!(Flco::Group.code(), 0x00);
        assert_eq!(Flco::Private.code(), 0x03);
        assert_eq!(Flco::from_code(0x01), None);
    }

    #[test]
    fn geometry_is_consistent() {
        assert_eq!(BURST_BITS, BURST_LEN * 8);
        assert_eq!(SYNC_OFFSET + SYNC_BITS, SLOT_TYPE_SECOND_OFFSET);
        assert_eq!(EMB_FRAGMENT_OFFSET + EMB_FRAGMENT_BITS, EMB_SECOND_OFFSET);
    }

    #[test]
    fn ts_serde_names() {
        assert_eq!(serde_json::to_string(&Ts::Ts1).unwrap(), "\"ts1\"");
        assert_eq!(Ts::Ts2.index(), 1);
    }
}
