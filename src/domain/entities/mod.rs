//! Domain entities - Core business objects with no external dependencies

pub mod message;
pub mod record;

pub use message::{Content, Incoming, Reply};
pub use record::{RecordPatch, UserRecord};
