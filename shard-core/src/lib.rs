//! shard-core: transport-agnostic errors and configuration shared by the
//! shard crates.

pub mod config;
pub mod errors;

pub use config::{ShardConfig, ShardConfigSnapshot};
pub use errors::{ErrorKind, ShardError, ShardResult};
