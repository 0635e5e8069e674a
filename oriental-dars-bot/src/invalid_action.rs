use crate::message::FormattedText;
use crate::strings::STRINGS;
use crate::user_facing_error::UserFacingError;
use std::error::Error;
use std::fmt::Display;

/// A user action that is not valid in the current dialog state.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum InvalidAction {
    UnexpectedMessage,
    UnexpectedMessageKind,
    InvalidState,
    PermissionDenied,
}

impl Display for InvalidAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedMessage => write!(f, "A message was received when it was not expected"),
            Self::UnexpectedMessageKind => {
                write!(f, "An unexpected type of message was received")
            }
            Self::InvalidState => write!(f, "Invalid state for selected action"),
            Self::PermissionDenied => write!(f, "The action requires admin rights"),
        }
    }
}

impl Error for InvalidAction {}

impl UserFacingError for InvalidAction {
    fn user_message(&self) -> FormattedText {
        let s = &STRINGS.errors.action;
        match self {
            Self::UnexpectedMessage => s.unexpected_message(),
            Self::UnexpectedMessageKind => s.unexpected_message_kind(),
            Self::InvalidState => s.invalid_state(),
            Self::PermissionDenied => s.permission_denied(),
        }
    }
}
