//! Shop and item structures recovered from game memory.

mod decoder;
mod record;
mod validation;

pub use decoder::{
    ListHeader, decode_item, decode_shop, read_list, read_managed_string,
};
pub use record::*;
pub use validation::{candidate_offsets, confirm_shop, quick_validate, scan_offsets};
