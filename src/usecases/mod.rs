//! Use case layer: application workflows and orchestration.

pub mod bootstrap;
pub mod context;
pub mod contracts;
pub mod directory;
pub mod logout;
pub mod send_message;
pub mod shell;
pub mod sign_in;
pub mod sync_conversations;
