//! Turning session snapshots into report artifacts and handing them to a delivery channel.

pub mod artifacts;
pub mod delivery;
pub mod distribution;
pub mod pipeline;
pub mod snapshot;
pub mod text;
