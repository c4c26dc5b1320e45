mod connection;
pub mod discovery;
mod message;

pub use connection::{parse_incoming, HomeAssistant, Initiator};
pub use message::{Incoming, Outgoing};
