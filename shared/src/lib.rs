pub mod cancel;
pub mod error;
pub mod models;
pub mod pacing;
pub mod sink;
pub mod telemetry;

pub use cancel::CancelFlag;
pub use error::Error;
