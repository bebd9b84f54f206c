//! Domain layer: core entities and business rules.

pub mod compose_state;
pub mod conversation;
pub mod events;
pub mod message;
pub mod open_conversation_state;
pub mod peer_list_state;
pub mod projection;
pub mod session;
pub mod shell_state;
pub mod user;
