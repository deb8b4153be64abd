pub mod config;
pub mod report;
pub mod store;

pub use config::DedupConfig;
pub use report::RemovalReport;
pub use store::{DirectoryStore, FrameStore};
