pub mod golay;
pub mod hamming;
pub mod qr;
pub mod rs_12_9;
pub mod vbptc;

pub use vbptc::Vbptc1611;
