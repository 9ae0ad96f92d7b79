mod accessor;
mod bytes;
mod handle;
pub mod layout;
mod reader;
pub mod region;

// Mock memory reader for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use accessor::{FlagRead, MemoryAccessor};
pub use bytes::{ByteBuffer, decode_utf16le};
pub use handle::*;
pub use layout::{Layout, is_plausible_pointer};
pub use reader::{MemoryReader, ReadMemory};
pub use region::{MemoryRegion, QueryRegions, RegionFilter, RegionInfo, RegionWalker};

#[doc(hidden)]
pub use mock::{MockItem, MockMemoryBuilder, MockMemoryReader, MockShop, PlantedShop};
