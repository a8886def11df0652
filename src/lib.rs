//! gatekeeper-bot - a chat bot that gates one privileged command behind
//! a password login flow.

pub mod application;
pub mod domain;
pub mod infrastructure;
