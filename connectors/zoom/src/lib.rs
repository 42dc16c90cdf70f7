pub mod client;
pub mod config;
pub mod models;
pub mod sync;

pub use client::{ReportApi, ZoomClient};
pub use config::ZoomConfig;
pub use sync::{ExportOptions, MeetingType};
