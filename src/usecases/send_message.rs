//! Use case for sending a direct message to a peer.
//!
//! Sending only appends to the store; it never touches local state. The
//! sent message becomes visible through the next feed snapshot, own echo
//! included, with no special-casing of the sender.

use crate::domain::message::UserId;

/// Command to append a message addressed to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageCommand {
    pub receiver_id: UserId,
    pub text: String,
}

/// Errors the store can report for an append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendSourceError {
    /// The session is missing or no longer valid.
    Unauthorized,
    /// The store rejected the write.
    Rejected,
    /// The store is temporarily unreachable.
    Unavailable,
}

/// Domain-level errors for the send operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// Message text is empty after trimming whitespace.
    EmptyMessage,
    Unauthorized,
    Rejected,
    TemporarilyUnavailable,
}

/// Append seam toward the hosted message store. The store assigns the id,
/// the server timestamp, and the initial `sent` status.
pub trait MessageWriter {
    fn append(&self, receiver_id: &UserId, text: &str) -> Result<(), SendSourceError>;
}

impl<T: MessageWriter + ?Sized> MessageWriter for &T {
    fn append(&self, receiver_id: &UserId, text: &str) -> Result<(), SendSourceError> {
        (*self).append(receiver_id, text)
    }
}

/// Validates and appends a message.
///
/// There is no idempotency key on the append: a caller that retries the
/// same (peer, text) pair after a failure can produce a duplicate message.
/// The retry decision is the caller's.
pub fn send_message(
    writer: &dyn MessageWriter,
    command: SendMessageCommand,
) -> Result<(), SendMessageError> {
    let text = command.text.trim();
    if text.is_empty() {
        return Err(SendMessageError::EmptyMessage);
    }

    writer
        .append(&command.receiver_id, text)
        .map_err(map_source_error)
}

fn map_source_error(error: SendSourceError) -> SendMessageError {
    match error {
        SendSourceError::Unauthorized => SendMessageError::Unauthorized,
        SendSourceError::Rejected => SendMessageError::Rejected,
        SendSourceError::Unavailable => SendMessageError::TemporarilyUnavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct StubWriter {
        result: Result<(), SendSourceError>,
        captured_receiver: RefCell<Option<UserId>>,
        captured_text: RefCell<Option<String>>,
    }

    impl StubWriter {
        fn with_result(result: Result<(), SendSourceError>) -> Self {
            Self {
                result,
                captured_receiver: RefCell::new(None),
                captured_text: RefCell::new(None),
            }
        }
    }

    impl MessageWriter for StubWriter {
        fn append(&self, receiver_id: &UserId, text: &str) -> Result<(), SendSourceError> {
            *self.captured_receiver.borrow_mut() = Some(receiver_id.clone());
            *self.captured_text.borrow_mut() = Some(text.to_owned());
            self.result.clone()
        }
    }

    fn command(text: &str) -> SendMessageCommand {
        SendMessageCommand {
            receiver_id: UserId::new("bob"),
            text: text.to_owned(),
        }
    }

    #[test]
    fn rejects_empty_message_text() {
        let writer = StubWriter::with_result(Ok(()));

        let result = send_message(&writer, command(""));

        assert_eq!(result, Err(SendMessageError::EmptyMessage));
        assert!(writer.captured_receiver.borrow().is_none());
    }

    #[test]
    fn rejects_whitespace_only_message() {
        let writer = StubWriter::with_result(Ok(()));

        let result = send_message(&writer, command("   \n\t  "));

        assert_eq!(result, Err(SendMessageError::EmptyMessage));
    }

    #[test]
    fn trims_whitespace_before_appending() {
        let writer = StubWriter::with_result(Ok(()));

        let _ = send_message(&writer, command("  hello world  "));

        assert_eq!(
            *writer.captured_text.borrow(),
            Some("hello world".to_owned())
        );
    }

    #[test]
    fn passes_receiver_to_writer() {
        let writer = StubWriter::with_result(Ok(()));

        let _ = send_message(&writer, command("hi"));

        assert_eq!(
            *writer.captured_receiver.borrow(),
            Some(UserId::new("bob"))
        );
    }

    #[test]
    fn returns_ok_on_successful_append() {
        let writer = StubWriter::with_result(Ok(()));

        assert_eq!(send_message(&writer, command("hello")), Ok(()));
    }

    #[test]
    fn maps_unauthorized_error() {
        let writer = StubWriter::with_result(Err(SendSourceError::Unauthorized));

        assert_eq!(
            send_message(&writer, command("hello")),
            Err(SendMessageError::Unauthorized)
        );
    }

    #[test]
    fn maps_rejected_error() {
        let writer = StubWriter::with_result(Err(SendSourceError::Rejected));

        assert_eq!(
            send_message(&writer, command("hello")),
            Err(SendMessageError::Rejected)
        );
    }

    #[test]
    fn maps_unavailable_error_to_temporarily_unavailable() {
        let writer = StubWriter::with_result(Err(SendSourceError::Unavailable));

        assert_eq!(
            send_message(&writer, command("hello")),
            Err(SendMessageError::TemporarilyUnavailable)
        );
    }
}
