//! Message handling - turning raw chat text into structured events

pub mod parser;

pub use parser::MessageParser;
