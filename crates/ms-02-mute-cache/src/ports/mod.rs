//! Ports Layer
//!
//! - Driving Ports (inbound) - `MuteCache`, used by chat and enforcement
//! - Driven Ports (outbound) - store query, online roster, message rendering

pub mod inbound;
pub mod outbound;

pub use inbound::MuteCache;
pub use outbound::{MuteMessageFormatter, MuteQuery, OnlineRoster};
