//! Tracks how long each application stays in the foreground during a working session, checks
//! that time against user defined tasks and produces periodic reports of where the time went.
//!

pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod report;
pub mod tracker;
pub mod utils;
pub mod window_api;
