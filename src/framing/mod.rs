pub mod emb;
pub mod lc;
pub mod slot_type;
pub mod sync;

pub use emb::{Emb, Lcss};
pub use lc::FullLc;
pub use sync::SyncPattern;
