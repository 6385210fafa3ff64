use crate::bits::{get_bits, set_bits};
use crate::error::{DmrError, Result};
use crate::fec::golay;
use crate::packet::{
    DataType, Packet, SLOT_TYPE_FIRST_OFFSET, SLOT_TYPE_HALF_BITS, SLOT_TYPE_SECOND_OFFSET,
};

/// Stamp the 20-bit slot type: color code (4) + data type (4) +
/// Golay(20,8) parity (12), split 10/10 around the sync field.
pub fn encode(packet: &mut Packet) -> Result<()> {
    let code = packet
        .data_type
        .slot_type_code()
        .ok_or(DmrError::Codec("voice bursts carry no slot type"))?;
    if packet.color_code > 15 {
        return Err(DmrError::Codec("color code out of range"));
    }
    let codeword = golay::encode_20_8((packet.color_code << 4) | code);
    set_bits(
        &mut packet.payload,
        SLOT_TYPE_FIRST_OFFSET,
        SLOT_TYPE_HALF_BITS,
        (codeword >> 10) as u64,
    );
    set_bits(
        &mut packet.payload,
        SLOT_TYPE_SECOND_OFFSET,
        SLOT_TYPE_HALF_BITS,
        (codeword & 0x3FF) as u64,
    );
    Ok(())
}

/// Read back (color code, data type), verifying the Golay parity.
pub fn decode(packet: &Packet) -> Result<(u8, DataType)> {
    let first = get_bits(&packet.payload, SLOT_TYPE_FIRST_OFFSET, SLOT_TYPE_HALF_BITS) as u32;
    let second = get_bits(&packet.payload, SLOT_TYPE_SECOND_OFFSET, SLOT_TYPE_HALF_BITS) as u32;
    let codeword = (first << 10) | second;
    if !golay::verify_20_8(codeword) {
        return Err(DmrError::Codec("slot type parity check failed"));
    }
    let data = (codeword >> 12) as u8;
    let data_type = DataType::from_slot_type_code(data & 0x0F)
        .ok_or(DmrError::Codec("reserved slot type code"))?;
    Ok((data >> 4, data_type))
}
