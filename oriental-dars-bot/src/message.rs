use teloxide::types::{MessageEntity, ReplyMarkup};

/// Message text together with its Telegram formatting entities.
///
/// Entity offsets are in UTF-16 code units, as the Bot API counts them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormattedText {
    pub raw_text: String,
    pub entities: Option<Vec<MessageEntity>>,
}

impl FormattedText {
    /// Append `other`, shifting its entity offsets past the existing text.
    pub fn concat(mut self, other: Self) -> Self {
        let offset_shift = self.raw_text.encode_utf16().count();
        self.raw_text.push_str(&other.raw_text);
        if let Some(mut appended) = other.entities {
            for entity in appended.iter_mut() {
                entity.offset += offset_shift;
            }
            match self.entities {
                Some(ref mut entities) => entities.extend(appended),
                None => self.entities = Some(appended),
            }
        }
        self
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormattedMessage {
    pub text: FormattedText,
    pub reply_markup: Option<ReplyMarkup>,
}

impl FormattedMessage {
    pub fn new(text: FormattedText) -> Self {
        Self {
            text,
            reply_markup: None,
        }
    }

    pub fn with_markup(text: FormattedText, reply_markup: impl Into<ReplyMarkup>) -> Self {
        Self {
            text,
            reply_markup: Some(reply_markup.into()),
        }
    }
}

impl From<FormattedText> for FormattedMessage {
    fn from(text: FormattedText) -> Self {
        Self::new(text)
    }
}
