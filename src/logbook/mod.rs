pub mod stats;
pub mod store;

pub use stats::{ClassCount, LogStats, StatsAccumulator};
pub use store::{LogEntry, LogStore, DEFAULT_RECENT_LIMIT, RECENT_CAPACITY};
