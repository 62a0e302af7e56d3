pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod listener;
pub mod media;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod transport;

pub use cache::FrameCache;
pub use client::{Client, Signals};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use listener::{FatalCondition, NoopListener, SessionListener};
pub use protocol::{DescribeInfo, Method};
pub use session::SessionState;
pub use stats::ReceptionStats;
