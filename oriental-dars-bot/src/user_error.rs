use crate::dispatch::InvalidChatError;
use crate::input_error::InputError;
use crate::invalid_action::InvalidAction;
use crate::message::FormattedText;
use crate::store::StoreError;
use crate::user_facing_error::UserFacingError;
use std::error::Error;
use std::fmt::Display;

/// Everything a user can cause and should be told about.
#[derive(Debug, PartialEq)]
pub enum UserError {
    Store(StoreError),
    InvalidChat(InvalidChatError),
    InvalidAction(InvalidAction),
    Input(InputError),
}

impl Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => Display::fmt(&e, f),
            Self::InvalidChat(e) => Display::fmt(&e, f),
            Self::InvalidAction(e) => Display::fmt(&e, f),
            Self::Input(e) => Display::fmt(&e, f),
        }
    }
}

impl Error for UserError {}

impl From<StoreError> for UserError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<InvalidChatError> for UserError {
    fn from(e: InvalidChatError) -> Self {
        Self::InvalidChat(e)
    }
}

impl From<InvalidAction> for UserError {
    fn from(e: InvalidAction) -> Self {
        Self::InvalidAction(e)
    }
}

impl From<InputError> for UserError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

impl UserFacingError for UserError {
    fn user_message(&self) -> FormattedText {
        match self {
            Self::Store(e) => e.user_message(),
            Self::InvalidChat(e) => e.user_message(),
            Self::InvalidAction(e) => e.user_message(),
            Self::Input(e) => e.user_message(),
        }
    }
}
