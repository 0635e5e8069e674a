use crate::message::{FormattedMessage, FormattedText};
use crate::state::DialogState;
use crate::strings::STRINGS;
use crate::types::{BotType, HandlerResult};
use crate::user_facing_error::UserFacingError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use teloxide::prelude::*;
use teloxide::requests::HasPayload;

/// The dialog with a certain user.
pub struct UserDialog {
    chat_id: ChatId,
    data: RwLock<UserDialogData>,
}

/// The mutable data of a [`UserDialog`].
#[derive(Clone, Default)]
pub struct UserDialogData {
    pub state: DialogState,
}

impl UserDialog {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            data: RwLock::new(UserDialogData::default()),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn data(&self) -> &RwLock<UserDialogData> {
        &self.data
    }

    /// Raw send used by the outbound queue and the places that need the sent
    /// [`Message`] back (the subscription prompt keeps its id for later
    /// edits).
    pub async fn send_message_with_id(
        chat_id: ChatId,
        bot: &BotType,
        message: FormattedMessage,
    ) -> HandlerResult<Message> {
        let mut request = bot.send_message(chat_id, message.text.raw_text);
        let payload = request.payload_mut();
        payload.entities = message.text.entities;
        payload.reply_markup = message.reply_markup;
        Ok(request.await?)
    }
}

/// The error when the bot has been invoked in a kind of chat it does not
/// support (a group chat, a channel).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InvalidChatError {
    pub chat_id: ChatId,
}

impl std::fmt::Display for InvalidChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chat with id {} is not a private chat; the bot only works one-to-one",
            self.chat_id,
        )
    }
}

impl std::error::Error for InvalidChatError {}

impl UserFacingError for InvalidChatError {
    fn user_message(&self) -> FormattedText {
        STRINGS.errors.common.invalid_chat()
    }
}

/// Stores the dialogs of all users, keyed by user id. Dialog data never
/// leaks between users: every entry has its own lock, independent of the
/// map lock.
pub struct DialogStorage {
    dialogs: Mutex<HashMap<UserId, Arc<UserDialog>>>,
}

impl DialogStorage {
    pub fn new() -> Self {
        Self {
            dialogs: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the dialog for the given chat/user pair. Both ids are
    /// required so a dialog stays pinned to the private chat it started in.
    pub fn get_dialog(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Arc<UserDialog>, InvalidChatError> {
        if !chat_id.is_user() {
            return Err(InvalidChatError { chat_id });
        }

        let mut dialogs = self.dialogs.lock().unwrap();
        let dialog = dialogs
            .entry(user_id)
            .or_insert_with(|| Arc::new(UserDialog::new(chat_id)));
        Ok(Arc::clone(dialog))
    }
}
