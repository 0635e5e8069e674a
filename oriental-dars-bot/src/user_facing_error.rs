use crate::message::FormattedText;

/// An error that can be shown to the user as a chat message.
pub trait UserFacingError {
    fn user_message(&self) -> FormattedText;
}
