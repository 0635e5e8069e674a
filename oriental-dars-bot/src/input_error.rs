use crate::message::FormattedText;
use crate::strings::STRINGS;
use crate::user_facing_error::UserFacingError;
use std::error::Error;
use std::fmt::Display;

/// Flow input that failed validation. The flow stays in its current state so
/// the user can retry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputError {
    NoText,
    NotAFile,
    TopicTooShort,
    CodeTooShort,
    TitleTooShort,
    FacultyNameTooShort,
    NotANumber,
    BadChannelSpec,
}

impl Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoText => write!(f, "The message has no text"),
            Self::NotAFile => write!(f, "The message carries no file attachment"),
            Self::TopicTooShort => write!(f, "The topic name is too short"),
            Self::CodeTooShort => write!(f, "The lesson code is too short"),
            Self::TitleTooShort => write!(f, "The lesson title is too short"),
            Self::FacultyNameTooShort => write!(f, "The faculty name is too short"),
            Self::NotANumber => write!(f, "The input is not a number"),
            Self::BadChannelSpec => write!(f, "The channel description is malformed"),
        }
    }
}

impl Error for InputError {}

impl UserFacingError for InputError {
    fn user_message(&self) -> FormattedText {
        let s = &STRINGS.errors.input;
        match self {
            Self::NoText => s.no_text(),
            Self::NotAFile => s.not_a_file(),
            Self::TopicTooShort => s.topic_too_short(),
            Self::CodeTooShort => s.code_too_short(),
            Self::TitleTooShort => s.title_too_short(),
            Self::FacultyNameTooShort => s.faculty_name_too_short(),
            Self::NotANumber => s.not_a_number(),
            Self::BadChannelSpec => s.bad_channel_spec(),
        }
    }
}
