pub mod reading;
pub mod store;
pub mod journal;

pub use reading::{parse_timestamp, Reading};
pub use store::ReadingStore;
pub use journal::Journal;
