use serde::{Deserialize, Serialize};

use crate::error::{DmrError, Result};
use crate::fec::rs_12_9;
use crate::packet::{DataType, Flco, Packet};

/// Full link control: 72 bits carried in VOICE_LC and TERMINATOR_WITH_LC
/// bursts, protected with RS(12,9) whose parity is masked per data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullLc {
    pub flco_pdu: Flco,
    /// Feature set id; 0 for the standardized feature set.
    pub fid: u8,
    /// Privacy flag.
    pub pf: bool,
    pub src_id: u32,
    pub dst_id: u32,
}

/// Air-interface CRC masks applied to the RS parity bytes.
const MASK_VOICE_LC: u8 = 0x96;
const MASK_TERMINATOR_WITH_LC: u8 = 0x99;

fn parity_mask(data_type: DataType) -> Result<u8> {
    match data_type {
        DataType::VoiceLc => Ok(MASK_VOICE_LC),
        DataType::TerminatorWithLc => Ok(MASK_TERMINATOR_WITH_LC),
        _ => Err(DmrError::Codec("data type carries no full LC")),
    }
}

impl FullLc {
    /// Addressing for a regenerated header, taken from a forwarded packet.
    pub fn from_packet(packet: &Packet) -> Self {
        Self {
            flco_pdu: packet.flco,
            fid: 0,
            pf: false,
            src_id: packet.src_id,
            dst_id: packet.dst_id,
        }
    }

    pub fn to_bytes(&self) -> [u8; 9] {
        [
            (u8::from(self.pf) << 7) | self.flco_pdu.code(),
            self.fid,
            0, // service options
            (self.dst_id >> 16) as u8,
            (self.dst_id >> 8) as u8,
            self.dst_id as u8,
            (self.src_id >> 16) as u8,
            (self.src_id >> 8) as u8,
            self.src_id as u8,
        ]
    }

    pub fn from_bytes(bytes: &[u8; 9]) -> Result<Self> {
        let flco_pdu = Flco::from_code(bytes[0] & 0x3F)
            .ok_or(DmrError::Codec("unsupported FLCO in link control"))?;
        Ok(Self {
            flco_pdu,
            fid: bytes[1],
            pf: bytes[0] & 0x80 != 0,
            dst_id: u32::from(bytes[3]) << 16 | u32::from(bytes[4]) << 8 | u32::from(bytes[5]),
            src_id: u32::from(bytes[6]) << 16 | u32::from(bytes[7]) << 8 | u32::from(bytes[8]),
        })
    }
}

/// Serialize the LC with its masked RS parity into the first 12 payload
/// bytes of the burst.
pub fn encode(lc: &FullLc, packet: &mut Packet) -> Result<()> {
    let mask = parity_mask(packet.data_type)?;
    let data = lc.to_bytes();
    let parity = rs_12_9::parity(&data);
    packet.payload[..9].copy_from_slice(&data);
    for (i, &p) in parity.iter().enumerate() {
        packet.payload[9 + i] = p ^ mask;
    }
    Ok(())
}

/// Read the LC back out of a burst, verifying the RS parity under the
/// data type's mask.
pub fn decode(packet: &Packet) -> Result<FullLc> {
    let mask = parity_mask(packet.data_type)?;
    let mut codeword = [0u8; 12];
    codeword.copy_from_slice(&packet.payload[..12]);
    for byte in &mut codeword[9..] {
        *byte ^= mask;
    }
    if !rs_12_9::verify(&codeword) {
        return Err(DmrError::Codec("full LC parity check failed"));
    }
    let mut data = [0u8; 9];
    data.copy_from_slice(&codeword[..9]);
    FullLc::from_bytes(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_lc() -> FullLc {
        FullLc {
            flco_pdu: Flco::Group,
            fid: 0,
            pf: false,
            src_id: 2042,
            dst_id: 9,
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let lc = group_lc();
        let mut packet = Packet {
            data_type: DataType::VoiceLc,
            ..Default::default()
        };
        encode(&lc, &mut packet).unwrap();
        assert_eq!(decode(&packet).unwrap(), lc);
    }

    #[test]
    fn private_call_round_trip() {
        let lc = FullLc {
            flco_pdu: Flco::Private,
            fid: 0,
            pf: true,
            src_id: 0x12_34_56,
            dst_id: 0xAB_CD_EF,
        };
        let mut packet = Packet {
            data_type: DataType::TerminatorWithLc,
            ..Default::default()
        };
        encode(&lc, &mut packet).unwrap();
        assert_eq!(decode(&packet).unwrap(), lc);
    }

    #[test]
    fn mask_differs_per_data_type() {
        let lc = group_lc();
        let mut header = Packet {
            data_type: DataType::VoiceLc,
            ..Default::default()
        };
        let mut terminator = Packet {
            data_type: DataType::TerminatorWithLc,
            ..Default::default()
        };
        encode(&lc, &mut header).unwrap();
        encode(&lc, &mut terminator).unwrap();
        assert_eq!(header.payload[..9], terminator.payload[..9]);
        assert_ne!(header.payload[9..12], terminator.payload[9..12]);
    }

    #[test]
    fn tampered_burst_fails_decode() {
        let mut packet = Packet {
            data_type: DataType::VoiceLc,
            ..Default::default()
        };
        encode(&group_lc(), &mut packet).unwrap();
        packet.payload[4] ^= 0x01;
        assert!(decode(&packet).is_err());
    }

    #[test]
    fn voice_burst_carries_no_lc() {
        let mut packet = Packet {
            data_type: DataType::Voice,
            ..Default::default()
        };
        assert!(encode(&group_lc(), &mut packet).is_err());
        assert!(decode(&packet).is_err());
    }
}
