//! Port traits: the boundaries the domain core consumes or exposes.

pub mod config_port;
pub mod data_port;
pub mod oracle_port;
pub mod report_port;
pub mod wallet_port;
