use serde::{Deserialize, Serialize};

use crate::bits::{bits_to_bytes, bytes_to_bits, set_bits};
use crate::error::{DmrError, Result};
use crate::fec::qr;
use crate::fec::vbptc::{Vbptc1611, DATA_COLS, DATA_ROWS, FRAGMENTS, PAYLOAD_BITS};
use crate::packet::{
    Packet, EMB_FIRST_OFFSET, EMB_FRAGMENT_BITS, EMB_FRAGMENT_OFFSET, EMB_SECOND_OFFSET,
};

use super::lc::FullLc;

/// Link control start/stop flag inside the EMB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lcss {
    SingleFragment,
    FirstFragment,
    LastFragment,
    Continuation,
}

impl Lcss {
    pub fn code(self) -> u8 {
        match self {
            Lcss::SingleFragment => 0,
            Lcss::FirstFragment => 1,
            Lcss::LastFragment => 2,
            Lcss::Continuation => 3,
        }
    }
}

/// Embedded signalling header, carried 8+8 bits around the LC fragment in
/// voice bursts B..E.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emb {
    pub color_code: u8,
    pub pi: bool,
    pub lcss: Lcss,
}

impl Emb {
    /// 16-bit encoded EMB: 7 data bits plus (16,7,6) parity.
    pub fn encode(&self) -> Result<u16> {
        if self.color_code > 15 {
            return Err(DmrError::Codec("color code out of range"));
        }
        let data = (self.color_code << 3) | (u8::from(self.pi) << 2) | self.lcss.code();
        Ok(qr::encode_16_7(data))
    }
}

/// The 77 embedded signalling bits for a call: the 72-bit LC followed by
/// its 5-bit checksum (octet sum mod 31).
pub fn signalling_bits(lc: &FullLc) -> [bool; PAYLOAD_BITS] {
    let bytes = lc.to_bytes();
    let checksum = bytes.iter().map(|&b| u32::from(b)).sum::<u32>() % 31;

    let mut bits = [false; PAYLOAD_BITS];
    bytes_to_bits(&bytes, &mut bits[..72]);
    for i in 0..5 {
        bits[72 + i] = (checksum >> (4 - i)) & 1 != 0;
    }
    bits
}

/// Spread the 77 bits over the BPTC rows: bit (r, c) of the 7x11 grid
/// moves to (c, r) reading order, so consecutive input bits land in
/// different rows.
pub fn interleave(bits: &[bool; PAYLOAD_BITS]) -> [bool; PAYLOAD_BITS] {
    let mut out = [false; PAYLOAD_BITS];
    for (i, &bit) in bits.iter().enumerate() {
        let (r, c) = (i / DATA_COLS, i % DATA_COLS);
        out[c * DATA_ROWS + r] = bit;
    }
    out
}

pub fn deinterleave(bits: &[bool; PAYLOAD_BITS]) -> [bool; PAYLOAD_BITS] {
    let mut out = [false; PAYLOAD_BITS];
    for (i, &bit) in bits.iter().enumerate() {
        let (c, r) = (i / DATA_ROWS, i % DATA_ROWS);
        out[r * DATA_COLS + c] = bit;
    }
    out
}

/// Build the encoded embedded-LC record for a call.
pub fn encode_signalling(lc: &FullLc) -> Vbptc1611 {
    Vbptc1611::encode(&interleave(&signalling_bits(lc)))
}

/// Recover a link control from a received record; fails on FEC or
/// checksum damage beyond repair.
pub fn decode_signalling(record: &Vbptc1611) -> Result<FullLc> {
    let bits = deinterleave(&record.decode()?);

    let mut bytes = [0u8; 9];
    bits_to_bytes(&bits[..72], &mut bytes);
    let mut checksum = 0u32;
    for i in 0..5 {
        checksum = (checksum << 1) | u32::from(bits[72 + i]);
    }
    if checksum != bytes.iter().map(|&b| u32::from(b)).sum::<u32>() % 31 {
        return Err(DmrError::Codec("embedded LC checksum mismatch"));
    }
    FullLc::from_bytes(&bytes)
}

/// Write fragment `index` of the record plus the encoded EMB into the
/// burst's 48-bit embedded-signalling field. Without a record (no LC was
/// available for this call, or voice frame F), a NULL fragment of zeros
/// is written under the same EMB.
pub fn fragment_encode(
    emb: &Emb,
    record: Option<&Vbptc1611>,
    index: usize,
    packet: &mut Packet,
) -> Result<()> {
    if index >= FRAGMENTS {
        return Err(DmrError::Codec("embedded LC fragment index out of range"));
    }
    let emb16 = emb.encode()?;
    let fragment = match record {
        Some(record) => record.fragment(index)?,
        None => 0,
    };
    set_bits(&mut packet.payload, EMB_FIRST_OFFSET, 8, u64::from(emb16 >> 8));
    set_bits(
        &mut packet.payload,
        EMB_FRAGMENT_OFFSET,
        EMB_FRAGMENT_BITS,
        u64::from(fragment),
    );
    set_bits(&mut packet.payload, EMB_SECOND_OFFSET, 8, u64::from(emb16 & 0xFF));
    Ok(())
}
