use crate::callback_query::{parse_callback_query, Query};
use crate::catalog::{self, BrowseSession, TopicChoice};
use crate::dispatch::UserDialog;
use crate::gate;
use crate::global_state::GlobalState;
use crate::input_error::InputError;
use crate::invalid_action::InvalidAction;
use crate::media;
use crate::message::{FormattedMessage, FormattedText};
use crate::message_queue::MessageQueueSender;
use crate::state::{states, DialogState};
use crate::store::{Channel, Faculty, NewLesson, StoreError, UserProfile};
use crate::strings::STRINGS;
use crate::types::{BotType, HandlerError, HandlerResult, InternalError};
use crate::user_facing_error::UserFacingError;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::requests::HasPayload;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};
use teloxide::errors::{ApiError, RequestError};

/// Reply-keyboard button labels. The gate references the admin set too.
pub(crate) mod buttons {
    pub const MAIN_MENU: &str = "🏠 Asosiy menyu";
    pub const CANCEL: &str = "❌ Bekor qilish";
    pub const CONFIRM: &str = "✅Tasdiqlash";
    pub const CONFIRM_CANCEL: &str = "❌Bekor qilish";
    pub const BACK_TO_FACULTIES: &str = "🔙 Fakultetlar";
    pub const BACK_TO_TOPICS: &str = "🔙 Mavzularga qaytish";
    pub const HELP: &str = "📞 Yordam";
    pub const PREV_PAGE: &str = "⬅️ Oldingi";
    pub const NEXT_PAGE: &str = "➡️ Keyingi";
    pub const ADD_LESSON: &str = "➕ Dars Qo'shish";
    pub const DELETE_LESSON: &str = "🗑 Dars O'chirish";
    pub const ADD_FACULTY: &str = "➕ Fakultet Qo'shish";
    pub const DELETE_FACULTY: &str = "🗑 Fakultet O'chirish";
    pub const STATS: &str = "📊 Statistika";
    pub const BROADCAST: &str = "📣 Reklama";
    pub const CHANNELS: &str = "📢 Kanallar";
    pub const ADD_ADMIN: &str = "👤 Admin Qo'shish";
    pub const REMOVE_ADMIN: &str = "🗑 Admin O'chirish";
    pub const LIST_ADMINS: &str = "📋 Adminlar Ro'yxati";
    pub const LIST_LESSONS: &str = "🔍 Darslarni Ko'rish";
    pub const ADMIN_BACK: &str = "🔙 Admin menyu";

    /// Admin-panel inputs the subscription gate lets through for admins.
    pub const ADMIN_PANEL: &[&str] = &[
        ADD_LESSON,
        DELETE_LESSON,
        ADD_FACULTY,
        DELETE_FACULTY,
        STATS,
        BROADCAST,
        CHANNELS,
        ADD_ADMIN,
        REMOVE_ADMIN,
        LIST_ADMINS,
        LIST_LESSONS,
        ADMIN_BACK,
        CONFIRM,
        CONFIRM_CANCEL,
    ];
}

const TOPIC_BUTTON_PREFIX: &str = "📖 ";
const LESSON_BUTTON_PREFIX: &str = "🎯 ";

/// The designated exit inputs work from any state and discard flow data.
pub(crate) fn is_cancel_input(text: &str) -> bool {
    text == buttons::MAIN_MENU
        || text == buttons::CANCEL
        || text.eq_ignore_ascii_case("/cancel")
}

fn extract_text(message: &Message) -> Result<&str, InputError> {
    message.text().ok_or(InputError::NoText)
}

fn extract_formatted_text(message: &Message) -> Result<FormattedText, InputError> {
    let raw_text = message
        .text()
        .or_else(|| message.caption())
        .ok_or(InputError::NoText)?
        .to_owned();
    let entities = message
        .entities()
        .or_else(|| message.caption_entities())
        .map(|entities| entities.to_owned());
    Ok(FormattedText { raw_text, entities })
}

/// Strip a `"📖 Name (3)"`-style button down to its label.
fn parse_labelled_button<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    Some(match rest.rsplit_once(" (") {
        Some((label, _)) => label,
        None => rest,
    })
}

fn reply_keyboard(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup {
        keyboard: rows
            .into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect())
            .collect(),
        resize_keyboard: Some(true),
        one_time_keyboard: None,
        input_field_placeholder: None,
        selective: None,
    }
}

fn admin_keyboard() -> KeyboardMarkup {
    let rows = [
        [buttons::ADD_LESSON, buttons::DELETE_LESSON],
        [buttons::ADD_FACULTY, buttons::DELETE_FACULTY],
        [buttons::STATS, buttons::BROADCAST],
        [buttons::ADD_ADMIN, buttons::REMOVE_ADMIN],
        [buttons::LIST_ADMINS, buttons::CHANNELS],
        [buttons::LIST_LESSONS, buttons::MAIN_MENU],
    ];
    reply_keyboard(
        rows.iter()
            .map(|row| row.iter().map(|&label| label.to_owned()).collect())
            .collect(),
    )
}

fn confirm_keyboard() -> KeyboardMarkup {
    reply_keyboard(vec![vec![
        buttons::CONFIRM.to_owned(),
        buttons::CONFIRM_CANCEL.to_owned(),
    ]])
}

/// The user-facing faculty menu, two buttons per row.
pub(crate) fn faculty_keyboard(faculties: &[Faculty]) -> InlineKeyboardMarkup {
    let inline_keyboard = faculties
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|faculty| {
                    InlineKeyboardButton::callback(
                        format!("📚 {}", faculty.name),
                        Query::SelectFaculty { id: faculty.id },
                    )
                })
                .collect()
        })
        .collect();
    InlineKeyboardMarkup { inline_keyboard }
}

/// An admin pick list over faculties, one per row.
fn faculty_pick_keyboard(
    faculties: &[Faculty],
    to_query: impl Fn(i64) -> Query,
) -> InlineKeyboardMarkup {
    let inline_keyboard = faculties
        .iter()
        .map(|faculty| {
            vec![InlineKeyboardButton::callback(
                format!("📚 {}", faculty.name),
                to_query(faculty.id),
            )]
        })
        .collect();
    InlineKeyboardMarkup { inline_keyboard }
}

/// The join prompt: one link button per missing channel plus the recheck
/// button. Channels with a broken invite link get an inert button instead.
pub(crate) fn subscription_keyboard(missing: &[Channel]) -> InlineKeyboardMarkup {
    let mut inline_keyboard = Vec::with_capacity(missing.len() + 1);
    for (index, channel) in missing.iter().enumerate() {
        let button = if channel.invite_link.starts_with("https://t.me/") {
            match url::Url::parse(&channel.invite_link) {
                Ok(link) => InlineKeyboardButton::url(
                    format!(
                        "{}. 📢 {}",
                        index + 1,
                        catalog::truncate_chars(&channel.title, 25),
                    ),
                    link,
                ),
                Err(_) => invalid_link_button(index),
            }
        } else {
            invalid_link_button(index)
        };
        inline_keyboard.push(vec![button]);
    }
    inline_keyboard.push(vec![InlineKeyboardButton::callback(
        "✅ Obuna bo'ldim, tekshirish",
        Query::CheckSubscription,
    )]);
    InlineKeyboardMarkup { inline_keyboard }
}

fn invalid_link_button(index: usize) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(
        format!("{}. ❌ Noto'g'ri havola", index + 1),
        Query::NoAction,
    )
}

fn topics_keyboard(groups: &[(TopicChoice, usize)]) -> KeyboardMarkup {
    let mut rows: Vec<Vec<String>> = groups
        .iter()
        .map(|(choice, count)| {
            vec![format!(
                "{}{} ({})",
                TOPIC_BUTTON_PREFIX,
                choice.label(),
                count,
            )]
        })
        .collect();
    rows.push(vec![
        buttons::BACK_TO_FACULTIES.to_owned(),
        buttons::HELP.to_owned(),
    ]);
    reply_keyboard(rows)
}

fn lessons_keyboard(session: &BrowseSession) -> KeyboardMarkup {
    let first_ordinal = session.first_ordinal();
    let mut rows: Vec<Vec<String>> = session
        .page_items()
        .iter()
        .enumerate()
        .map(|(offset, lesson)| {
            vec![format!(
                "{}{}. {} ({})",
                LESSON_BUTTON_PREFIX,
                first_ordinal + offset,
                catalog::truncate_chars(&lesson.title, catalog::TITLE_BUTTON_LIMIT),
                lesson.downloads,
            )]
        })
        .collect();

    let mut nav_row = Vec::with_capacity(2);
    if session.has_prev() {
        nav_row.push(buttons::PREV_PAGE.to_owned());
    }
    if session.has_next() {
        nav_row.push(buttons::NEXT_PAGE.to_owned());
    }
    if !nav_row.is_empty() {
        rows.push(nav_row);
    }

    rows.push(vec![
        buttons::BACK_TO_TOPICS.to_owned(),
        buttons::MAIN_MENU.to_owned(),
    ]);
    reply_keyboard(rows)
}

/// Edit a message in place, carrying formatting entities and an optional
/// inline keyboard.
pub(crate) async fn edit_formatted(
    bot: &BotType,
    chat_id: ChatId,
    message_id: i32,
    text: FormattedText,
    reply_markup: Option<InlineKeyboardMarkup>,
) -> HandlerResult<()> {
    let mut request = bot.edit_message_text(chat_id, message_id, text.raw_text);
    let payload = request.payload_mut();
    payload.entities = text.entities;
    payload.reply_markup = reply_markup;
    request.await?;
    Ok(())
}

async fn check_admin(global_state: &GlobalState, user_id: UserId) -> bool {
    if global_state.admins.contains(&user_id) {
        return true;
    }
    match global_state.store.is_admin(user_id.0 as i64).await {
        Ok(flag) => flag,
        Err(e) => {
            warn!("Admin lookup failed for {}: {}", user_id, e);
            false
        }
    }
}

struct Context<'bot, 'dialog, 'gs, 'mq> {
    pub bot: &'bot BotType,
    pub dialog: &'dialog UserDialog,
    pub global_state: &'gs Arc<GlobalState>,
    pub message_queue_tx: &'mq mut MessageQueueSender,
    pub user_id: UserId,
    pub is_admin: bool,
}

/// Handle an incoming message.
pub async fn handle_message(
    bot: BotType,
    message: Message,
    global_state: Arc<GlobalState>,
    mut message_queue_tx: MessageQueueSender,
) -> HandlerResult<()> {
    let user_id = match message.from() {
        Some(user) => user.id,
        None => {
            // Ignore messages without an identifiable sender.
            return Ok(());
        }
    };
    let chat_id = message.chat.id;

    if !chat_id.is_user() {
        // Fixed notice, then drop; group traffic is never dispatched.
        let _ = message_queue_tx
            .send_message(STRINGS.gate.group_chat_notice().into(), chat_id)
            .await;
        return Ok(());
    }

    let dialog = global_state.dialog_storage.get_dialog(chat_id, user_id)?;
    let is_admin = check_admin(&global_state, user_id).await;
    let mut context = Context {
        bot: &bot,
        dialog: &dialog,
        global_state: &global_state,
        message_queue_tx: &mut message_queue_tx,
        user_id,
        is_admin,
    };

    if !context.gate_allows_message(&message).await {
        return Ok(());
    }

    let state = dialog.data().read().unwrap().state.clone();
    let result = context.dispatch_message(&message, state).await;
    context.conclude(result).await?;

    if let Err(e) = global_state.store.touch_last_active(user_id.0 as i64).await {
        warn!("Cannot refresh last-active for {}: {}", user_id, e);
    }
    Ok(())
}

/// Handle an incoming callback query.
pub async fn handle_callback_query(
    bot: BotType,
    query: CallbackQuery,
    global_state: Arc<GlobalState>,
    mut message_queue_tx: MessageQueueSender,
) -> HandlerResult<()> {
    let query_data = match query.data {
        Some(ref data) => data.clone(),
        None => return Ok(()),
    };
    let origin = match query.message {
        Some(ref message) => message.clone(),
        None => return Ok(()),
    };
    let chat_id = origin.chat.id;
    if !chat_id.is_user() {
        return Ok(());
    }
    let user_id = query.from.id;

    let dialog = global_state.dialog_storage.get_dialog(chat_id, user_id)?;
    let is_admin = check_admin(&global_state, user_id).await;
    let mut context = Context {
        bot: &bot,
        dialog: &dialog,
        global_state: &global_state,
        message_queue_tx: &mut message_queue_tx,
        user_id,
        is_admin,
    };

    bot.answer_callback_query(query.id.clone()).await?;

    if !context.gate_allows_callback(&query_data, &origin).await {
        return Ok(());
    }

    let parsed_query = match parse_callback_query(&query_data) {
        Ok(parsed_query) => parsed_query,
        Err(e) => {
            warn!("Invalid callback query: {}", e);
            context
                .send_message(STRINGS.errors.technical.invalid_callback().into())
                .await?;
            return Ok(());
        }
    };

    let result = context
        .handle_callback(&parsed_query, &query.from, origin.id)
        .await;
    context.conclude(result).await?;

    if let Err(e) = global_state.store.touch_last_active(user_id.0 as i64).await {
        warn!("Cannot refresh last-active for {}: {}", user_id, e);
    }
    Ok(())
}

impl Context<'_, '_, '_, '_> {
    async fn send_message(&mut self, message: FormattedMessage) -> HandlerResult<()> {
        self.message_queue_tx
            .send_message(message, self.dialog.chat_id())
            .await
    }

    fn set_state(&self, new_state: DialogState) {
        self.dialog.data().write().unwrap().state = new_state;
    }

    fn state(&self) -> DialogState {
        self.dialog.data().read().unwrap().state.clone()
    }

    fn require_admin(&self) -> Result<(), InvalidAction> {
        if self.is_admin {
            Ok(())
        } else {
            Err(InvalidAction::PermissionDenied)
        }
    }

    /// Report the outcome: user errors become inline messages plus a
    /// re-prompt of the current state, internal errors are logged and
    /// answered with a generic apology. Nothing propagates further.
    async fn conclude(&mut self, result: HandlerResult<()>) -> HandlerResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(HandlerError::User(e)) => {
                debug!("User error: {:?}", &e);
                self.send_message(FormattedMessage::new(e.user_message()))
                    .await?;
                self.send_state_prompt().await?;
                Ok(())
            }
            Err(HandlerError::Internal(e)) => {
                error!("Internal error while handling an update: {}", e);
                let _ = self
                    .send_message(FormattedMessage::new(STRINGS.errors.common.internal()))
                    .await;
                Ok(())
            }
        }
    }

    // The subscription gate.

    async fn gate_allows_message(&mut self, message: &Message) -> bool {
        match self.gate_message_verdict(message).await {
            Ok(allowed) => allowed,
            Err(e) => {
                // The gate fails open: a broken gate must not lock the bot up.
                error!("Subscription gate error, letting the update through: {}", e);
                true
            }
        }
    }

    async fn gate_message_verdict(&mut self, message: &Message) -> HandlerResult<bool> {
        if self.is_admin {
            return Ok(true);
        }
        if self.dialog.data().read().unwrap().state.in_flow() {
            return Ok(true);
        }
        if let Some(text) = message.text() {
            if gate::is_exempt_text(text, self.is_admin) {
                return Ok(true);
            }
        }

        let channels = self.global_state.store.all_channels().await?;
        if channels.is_empty() {
            return Ok(true);
        }
        if self
            .global_state
            .gate
            .is_fully_subscribed(self.bot, &channels, self.user_id)
            .await
        {
            return Ok(true);
        }
        let missing = self
            .global_state
            .gate
            .missing_channels(self.bot, &channels, self.user_id)
            .await;
        if missing.is_empty() {
            // A stale negative verdict; everything is joined by now.
            return Ok(true);
        }
        self.send_message(FormattedMessage::with_markup(
            STRINGS.gate.join_required(&missing.len()),
            subscription_keyboard(&missing),
        ))
        .await?;
        Ok(false)
    }

    async fn gate_allows_callback(&mut self, data: &str, origin: &Message) -> bool {
        match self.gate_callback_verdict(data, origin).await {
            Ok(allowed) => allowed,
            Err(e) => {
                error!("Subscription gate error, letting the update through: {}", e);
                true
            }
        }
    }

    async fn gate_callback_verdict(&mut self, data: &str, origin: &Message) -> HandlerResult<bool> {
        if self.is_admin {
            return Ok(true);
        }
        if self.dialog.data().read().unwrap().state.in_flow() {
            return Ok(true);
        }
        if gate::is_exempt_callback(data, self.is_admin) {
            return Ok(true);
        }

        let channels = self.global_state.store.all_channels().await?;
        if channels.is_empty() {
            return Ok(true);
        }
        if self
            .global_state
            .gate
            .is_fully_subscribed(self.bot, &channels, self.user_id)
            .await
        {
            return Ok(true);
        }
        let missing = self
            .global_state
            .gate
            .missing_channels(self.bot, &channels, self.user_id)
            .await;
        if missing.is_empty() {
            return Ok(true);
        }
        self.edit_or_send(
            origin.id,
            STRINGS.gate.join_required(&missing.len()),
            Some(subscription_keyboard(&missing)),
        )
        .await?;
        Ok(false)
    }

    /// Edit in place where possible, fall back to a fresh message. An
    /// unchanged-message error means there is nothing to do.
    async fn edit_or_send(
        &mut self,
        message_id: i32,
        text: FormattedText,
        markup: Option<InlineKeyboardMarkup>,
    ) -> HandlerResult<()> {
        match edit_formatted(
            self.bot,
            self.dialog.chat_id(),
            message_id,
            text.clone(),
            markup.clone(),
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(HandlerError::Internal(InternalError::Telegram(RequestError::Api(
                ApiError::MessageNotModified,
            )))) => Ok(()),
            Err(e) => {
                debug!("Edit failed, sending a new message instead: {}", e);
                let message = match markup {
                    Some(markup) => FormattedMessage::with_markup(text, markup),
                    None => FormattedMessage::new(text),
                };
                self.send_message(message).await
            }
        }
    }

    // Message dispatch.

    async fn dispatch_message(
        &mut self,
        message: &Message,
        state: DialogState,
    ) -> HandlerResult<()> {
        if let Some(text) = message.text() {
            let trimmed = text.trim();
            if is_cancel_input(trimmed) {
                return self.handle_cancel().await;
            }
            if trimmed == "/start" || trimmed.starts_with("/start ") {
                return self.handle_start(message).await;
            }
            if trimmed == "/help" || trimmed == buttons::HELP {
                return self.handle_help().await;
            }
            if trimmed == "/admin" {
                return self.handle_admin_command().await;
            }
        }

        match state {
            DialogState::Initial => self.handle_start(message).await,
            DialogState::MainMenu => self.handle_main_menu_message(message).await,
            DialogState::TopicSelection(s) => self.handle_topic_selection_message(message, s).await,
            DialogState::LessonBrowsing(s) => self.handle_lesson_browsing_message(message, s).await,
            DialogState::AddLessonFaculty => Err(InvalidAction::UnexpectedMessage.into()),
            DialogState::AddLessonTopic(s) => self.handle_add_lesson_topic_message(message, s).await,
            DialogState::AddLessonCode(s) => self.handle_add_lesson_code_message(message, s).await,
            DialogState::AddLessonTitle(s) => {
                self.handle_add_lesson_title_message(message, s).await
            }
            DialogState::AddLessonFile(s) => self.handle_add_lesson_file_message(message, s).await,
            DialogState::DeleteLessonCode => self.handle_delete_lesson_code_message(message).await,
            DialogState::DeleteLessonConfirm(s) => {
                self.handle_delete_lesson_confirm_message(message, s).await
            }
            DialogState::AddFacultyName => self.handle_add_faculty_message(message).await,
            DialogState::AddChannel => self.handle_add_channel_message(message).await,
            DialogState::DeleteChannel => self.handle_delete_channel_message(message).await,
            DialogState::AddAdmin => self.handle_add_admin_message(message).await,
            DialogState::RemoveAdmin => self.handle_remove_admin_message(message).await,
            DialogState::Broadcast => self.handle_broadcast_message(message).await,
        }
    }

    async fn handle_start(&mut self, message: &Message) -> HandlerResult<()> {
        let from = match message.from() {
            Some(from) => from.clone(),
            None => return Ok(()),
        };
        let full_name = from.full_name();

        if self.is_admin {
            let stats = self.global_state.store.user_stats().await?;
            self.set_state(DialogState::MainMenu);
            self.send_message(FormattedMessage::with_markup(
                STRINGS.start.admin_greeting(
                    &full_name,
                    &stats.total,
                    &stats.new_today,
                    &stats.active_today,
                ),
                admin_keyboard(),
            ))
            .await?;
            return Ok(());
        }

        let profile = UserProfile {
            telegram_id: self.user_id.0 as i64,
            username: from.username.clone(),
            first_name: Some(from.first_name.clone()),
            last_name: from.last_name.clone(),
        };
        let newly_registered = match self.global_state.store.register_user(profile).await {
            Ok(created) => created,
            Err(e) => {
                error!("Cannot register user {}: {}", self.user_id, e);
                self.send_message(STRINGS.start.registration_failed().into())
                    .await?;
                return Ok(());
            }
        };
        if newly_registered {
            info!("New user: {}", self.user_id);
            self.report_new_user(&full_name, from.username.as_deref())
                .await;
        }

        let channels = self.global_state.store.all_channels().await?;
        let faculties = self.global_state.store.all_faculties().await?;

        if channels.is_empty() {
            self.set_state(DialogState::MainMenu);
            self.send_message(FormattedMessage::with_markup(
                STRINGS.start.welcome_no_channels(&full_name),
                faculty_keyboard(&faculties),
            ))
            .await?;
            return Ok(());
        }

        if self
            .global_state
            .gate
            .is_fully_subscribed(self.bot, &channels, self.user_id)
            .await
        {
            self.set_state(DialogState::MainMenu);
            self.send_message(FormattedMessage::with_markup(
                STRINGS.start.welcome_subscribed(&full_name),
                faculty_keyboard(&faculties),
            ))
            .await?;
        } else {
            let missing = self
                .global_state
                .gate
                .missing_channels(self.bot, &channels, self.user_id)
                .await;
            let prompt = FormattedMessage::with_markup(
                STRINGS.start.subscribe_prompt(&full_name),
                subscription_keyboard(&missing),
            );
            // Sent directly so the message id is known to the recheck task.
            let sent =
                UserDialog::send_message_with_id(self.dialog.chat_id(), self.bot, prompt).await?;
            gate::spawn_auto_recheck(
                self.bot.clone(),
                Arc::clone(self.global_state),
                self.dialog.chat_id(),
                sent.id,
                self.user_id,
            );
        }
        Ok(())
    }

    async fn report_new_user(&mut self, full_name: &str, username: Option<&str>) {
        let total = match self.global_state.store.user_stats().await {
            Ok(stats) => stats.total,
            Err(_) => 0,
        };
        let report = STRINGS.start.new_user_report(
            &full_name,
            &self.user_id.0,
            &username.unwrap_or("Yoq"),
            &total,
        );
        let sticker = self.global_state.new_user_sticker.clone();
        let admin_chats: Vec<ChatId> = self
            .global_state
            .admins
            .iter()
            .map(|id| ChatId(id.0 as i64))
            .collect();
        for admin_chat in admin_chats {
            if let Some(ref sticker_id) = sticker {
                let _ = self
                    .message_queue_tx
                    .send_sticker(admin_chat, sticker_id.clone())
                    .await;
            }
            if let Err(e) = self
                .message_queue_tx
                .send_message(report.clone().into(), admin_chat)
                .await
            {
                debug!("Cannot notify admin {}: {}", admin_chat, e);
            }
        }
    }

    async fn handle_cancel(&mut self) -> HandlerResult<()> {
        let previous = {
            let mut data = self.dialog.data().write().unwrap();
            std::mem::replace(&mut data.state, DialogState::MainMenu)
        };
        if previous.in_flow() {
            info!("Flow cancelled for {}", self.user_id);
        }
        if self.is_admin {
            self.send_message(FormattedMessage::with_markup(
                STRINGS.admin.cancelled_admin(),
                admin_keyboard(),
            ))
            .await?;
        } else {
            self.send_message(STRINGS.admin.cancelled().into()).await?;
            self.send_state_prompt().await?;
        }
        Ok(())
    }

    async fn handle_help(&mut self) -> HandlerResult<()> {
        self.send_message(STRINGS.browse.help().into()).await
    }

    async fn handle_admin_command(&mut self) -> HandlerResult<()> {
        self.require_admin()?;
        self.set_state(DialogState::MainMenu);
        self.send_state_prompt().await
    }

    async fn handle_main_menu_message(&mut self, message: &Message) -> HandlerResult<()> {
        let text = extract_text(message)?.trim();

        if self.is_admin {
            match text {
                buttons::ADD_LESSON => return self.start_add_lesson().await,
                buttons::DELETE_LESSON => {
                    self.set_state(DialogState::DeleteLessonCode);
                    return self.send_state_prompt().await;
                }
                buttons::ADD_FACULTY => {
                    self.set_state(DialogState::AddFacultyName);
                    return self.send_state_prompt().await;
                }
                buttons::DELETE_FACULTY => return self.start_delete_faculty().await,
                buttons::STATS => return self.send_stats().await,
                buttons::CHANNELS => return self.send_channels_menu().await,
                buttons::ADD_ADMIN => {
                    self.set_state(DialogState::AddAdmin);
                    return self.send_state_prompt().await;
                }
                buttons::REMOVE_ADMIN => {
                    self.set_state(DialogState::RemoveAdmin);
                    return self.send_state_prompt().await;
                }
                buttons::LIST_ADMINS => return self.send_admin_list().await,
                buttons::LIST_LESSONS => return self.send_recent_lessons().await,
                buttons::BROADCAST => {
                    self.set_state(DialogState::Broadcast);
                    return self.send_state_prompt().await;
                }
                buttons::ADMIN_BACK => return self.send_state_prompt().await,
                _ => (),
            }
        }

        match text {
            buttons::BACK_TO_FACULTIES => self.send_state_prompt().await,
            _ => Err(InvalidAction::UnexpectedMessage.into()),
        }
    }

    async fn handle_topic_selection_message(
        &mut self,
        message: &Message,
        state: states::TopicSelection,
    ) -> HandlerResult<()> {
        let text = extract_text(message)?.trim();

        if text == buttons::BACK_TO_FACULTIES {
            self.set_state(DialogState::MainMenu);
            return self.send_state_prompt().await;
        }

        if let Some(label) = parse_labelled_button(text, TOPIC_BUTTON_PREFIX) {
            let choice = TopicChoice::from_label(label);
            let topic_filter = match choice {
                TopicChoice::Named(ref name) => Some(name.clone()),
                TopicChoice::Uncategorized => None,
            };
            let lessons = self
                .global_state
                .store
                .topic_lessons(state.faculty.id, topic_filter)
                .await?;
            if lessons.is_empty() {
                self.send_message(STRINGS.browse.lesson_not_found().into())
                    .await?;
                return self.send_state_prompt().await;
            }
            let session = BrowseSession::new(state.faculty.clone(), choice, lessons);
            self.set_state(DialogState::LessonBrowsing(states::LessonBrowsing { session }));
            return self.send_state_prompt().await;
        }

        Err(InvalidAction::UnexpectedMessage.into())
    }

    async fn handle_lesson_browsing_message(
        &mut self,
        message: &Message,
        state: states::LessonBrowsing,
    ) -> HandlerResult<()> {
        let text = extract_text(message)?.trim();

        match text {
            buttons::BACK_TO_TOPICS => {
                // Leaving the lesson level discards the pagination session.
                let faculty = state.session.faculty.clone();
                self.set_state(DialogState::TopicSelection(states::TopicSelection {
                    faculty,
                }));
                return self.send_state_prompt().await;
            }
            buttons::PREV_PAGE | buttons::NEXT_PAGE => {
                let mut session = state.session;
                let moved = if text == buttons::PREV_PAGE {
                    session.prev_page()
                } else {
                    session.next_page()
                };
                if !moved {
                    return Err(InvalidAction::InvalidState.into());
                }
                self.set_state(DialogState::LessonBrowsing(states::LessonBrowsing { session }));
                return self.send_state_prompt().await;
            }
            _ => (),
        }

        if let Ok(ordinal) = text.parse::<usize>() {
            return match state.session.by_ordinal(ordinal) {
                Some(lesson) => {
                    let code = lesson.code.clone();
                    self.deliver_lesson(&code).await
                }
                None => {
                    self.send_message(STRINGS.browse.lesson_not_found().into())
                        .await?;
                    self.send_state_prompt().await
                }
            };
        }

        if let Some(label) = parse_labelled_button(text, LESSON_BUTTON_PREFIX) {
            let found = catalog::ordinal_from_label(label)
                .and_then(|ordinal| state.session.by_ordinal(ordinal));
            return match found {
                Some(lesson) => {
                    let code = lesson.code.clone();
                    self.deliver_lesson(&code).await
                }
                None => {
                    self.send_message(STRINGS.browse.lesson_not_found().into())
                        .await?;
                    self.send_state_prompt().await
                }
            };
        }

        Err(InvalidAction::UnexpectedMessage.into())
    }

    /// The one logical "deliver" operation: send the stored file, then move
    /// the counters. Counters stay untouched when the send fails.
    async fn deliver_lesson(&mut self, code: &str) -> HandlerResult<()> {
        let lesson = self
            .global_state
            .store
            .lesson_by_code(code.to_owned())
            .await?
            .ok_or_else(|| StoreError::NoSuchLesson(code.to_owned()))?;

        if lesson.file_id.is_empty() {
            warn!("Lesson {} has an empty file reference", code);
            self.send_message(STRINGS.browse.send_failed().into()).await?;
            return Ok(());
        }

        let caption = STRINGS.browse.download_caption(
            &lesson.title,
            &lesson.code,
            &(lesson.downloads + 1),
            &catalog::truncate_chars(&lesson.created_at, 10),
        );
        match self
            .message_queue_tx
            .send_document(self.dialog.chat_id(), lesson.file_id.clone(), caption)
            .await
        {
            Ok(()) => {
                self.global_state
                    .store
                    .bump_lesson_downloads(code.to_owned())
                    .await?;
                self.global_state
                    .store
                    .increment_user_downloads(self.user_id.0 as i64)
                    .await?;
                info!("Download: {} by {}", code, self.user_id);
                Ok(())
            }
            Err(e) => {
                warn!("Cannot send lesson {}: {}", code, e);
                self.send_message(STRINGS.browse.send_failed().into()).await?;
                Ok(())
            }
        }
    }

    // Admin one-shot actions.

    async fn start_add_lesson(&mut self) -> HandlerResult<()> {
        let faculties = self.global_state.store.all_faculties().await?;
        if faculties.is_empty() {
            return self
                .send_message(FormattedMessage::with_markup(
                    STRINGS.add_course.no_faculties(),
                    admin_keyboard(),
                ))
                .await;
        }
        self.set_state(DialogState::AddLessonFaculty);
        self.send_state_prompt().await
    }

    async fn start_delete_faculty(&mut self) -> HandlerResult<()> {
        let faculties = self.global_state.store.all_faculties().await?;
        if faculties.is_empty() {
            return self
                .send_message(FormattedMessage::with_markup(
                    STRINGS.fakultet.empty(),
                    admin_keyboard(),
                ))
                .await;
        }
        let markup = faculty_pick_keyboard(&faculties, |id| Query::DeleteFacultyPick { id });
        self.send_message(FormattedMessage::with_markup(
            STRINGS.fakultet.pick_delete(),
            markup,
        ))
        .await
    }

    async fn send_stats(&mut self) -> HandlerResult<()> {
        let stats = self.global_state.store.user_stats().await?;
        self.send_message(
            STRINGS
                .admin
                .stats(&stats.total, &stats.new_today, &stats.active_today)
                .into(),
        )
        .await
    }

    async fn send_admin_list(&mut self) -> HandlerResult<()> {
        let admins = self.global_state.store.list_admins().await?;
        if admins.is_empty() {
            return self.send_message(STRINGS.admins.list_empty().into()).await;
        }
        let mut text = STRINGS.admins.list_head();
        for admin in &admins {
            let display = admin
                .first_name
                .as_deref()
                .or(admin.username.as_deref())
                .unwrap_or("-");
            text = text.concat(STRINGS.admins.list_item(&display, &admin.telegram_id));
        }
        self.send_message(text.into()).await
    }

    async fn send_channels_menu(&mut self) -> HandlerResult<()> {
        let channels = self.global_state.store.all_channels().await?;
        let text = if channels.is_empty() {
            STRINGS.channels.empty()
        } else {
            let mut text = STRINGS.channels.head();
            for channel in &channels {
                text = text.concat(STRINGS.channels.item(&channel.title, &channel.channel_id));
            }
            text
        };
        let markup = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![
                InlineKeyboardButton::callback("➕ Kanal qo'shish", Query::ChannelAdd),
                InlineKeyboardButton::callback("🗑 Kanal o'chirish", Query::ChannelDelete),
            ]],
        };
        self.send_message(FormattedMessage::with_markup(text, markup))
            .await
    }

    async fn send_recent_lessons(&mut self) -> HandlerResult<()> {
        let lessons = self.global_state.store.recent_lessons(20).await?;
        if lessons.is_empty() {
            return self
                .send_message(STRINGS.lessons_list.empty().into())
                .await;
        }
        let mut text = STRINGS.lessons_list.head();
        for (index, lesson) in lessons.iter().enumerate() {
            // A real Telegram file id is well over 50 characters.
            let status = if lesson.file_id_len > 50 { "✅" } else { "❌" };
            text = text.concat(STRINGS.lessons_list.item(
                &(index + 1),
                &status,
                &lesson.code,
                &catalog::truncate_chars(&lesson.title, 30),
            ));
        }
        text = text.concat(STRINGS.lessons_list.footer());
        self.send_message(text.into()).await
    }

    // Guided flow steps.

    async fn handle_add_lesson_topic_message(
        &mut self,
        message: &Message,
        state: states::AddLessonTopic,
    ) -> HandlerResult<()> {
        let topic = extract_text(message)?.trim().to_owned();
        if topic.chars().count() < 2 {
            return Err(InputError::TopicTooShort.into());
        }
        self.set_state(DialogState::AddLessonCode(states::AddLessonCode {
            faculty: state.faculty,
            topic: topic.clone(),
        }));
        self.send_message(STRINGS.add_course.topic_ok(&topic).into())
            .await
    }

    async fn handle_add_lesson_code_message(
        &mut self,
        message: &Message,
        state: states::AddLessonCode,
    ) -> HandlerResult<()> {
        let code = extract_text(message)?.trim().to_uppercase();
        if code.chars().count() < 3 {
            return Err(InputError::CodeTooShort.into());
        }
        // Uniqueness is checked before the file is ever requested.
        if self
            .global_state
            .store
            .lesson_by_code(code.clone())
            .await?
            .is_some()
        {
            return Err(StoreError::DuplicateLessonCode(code).into());
        }
        self.set_state(DialogState::AddLessonTitle(states::AddLessonTitle {
            faculty: state.faculty,
            topic: state.topic,
            code: code.clone(),
        }));
        self.send_message(STRINGS.add_course.code_ok(&code).into())
            .await
    }

    async fn handle_add_lesson_title_message(
        &mut self,
        message: &Message,
        state: states::AddLessonTitle,
    ) -> HandlerResult<()> {
        let title = extract_text(message)?.trim().to_owned();
        if title.chars().count() < 2 {
            return Err(InputError::TitleTooShort.into());
        }
        self.send_message(
            STRINGS
                .add_course
                .title_ok(&state.topic, &state.code, &title)
                .into(),
        )
        .await?;
        self.set_state(DialogState::AddLessonFile(states::AddLessonFile {
            faculty: state.faculty,
            topic: state.topic,
            code: state.code,
            title,
        }));
        Ok(())
    }

    async fn handle_add_lesson_file_message(
        &mut self,
        message: &Message,
        state: states::AddLessonFile,
    ) -> HandlerResult<()> {
        let file = media::extract_file(message).ok_or(InputError::NotAFile)?;
        self.require_admin()?;

        let file_name_display = file.file_name.clone().unwrap_or_else(|| String::from("file"));
        let size_mb = file.file_size as f64 / (1024.0 * 1024.0);
        let new = NewLesson {
            faculty_id: state.faculty.id,
            topic: Some(state.topic.clone()),
            code: state.code.clone(),
            title: state.title.clone(),
            file_id: file.file_id,
            file_name: file.file_name,
            file_size: file.file_size,
        };
        self.global_state.store.add_lesson(new).await?;

        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.add_course.created(
                &state.faculty.name,
                &state.topic,
                &state.title,
                &state.code,
                &file_name_display,
                &size_mb,
            ),
            admin_keyboard(),
        ))
        .await
    }

    async fn handle_delete_lesson_code_message(&mut self, message: &Message) -> HandlerResult<()> {
        let code = extract_text(message)?.trim().to_uppercase();
        let lesson = self
            .global_state
            .store
            .lesson_by_code(code.clone())
            .await?
            .ok_or(StoreError::NoSuchLesson(code))?;
        self.set_state(DialogState::DeleteLessonConfirm(states::DeleteLessonConfirm {
            code: lesson.code,
            title: lesson.title,
            downloads: lesson.downloads,
        }));
        self.send_state_prompt().await
    }

    async fn handle_delete_lesson_confirm_message(
        &mut self,
        message: &Message,
        state: states::DeleteLessonConfirm,
    ) -> HandlerResult<()> {
        let text = extract_text(message)?.trim();
        if text != buttons::CONFIRM {
            return Err(InvalidAction::UnexpectedMessage.into());
        }
        self.require_admin()?;
        self.global_state
            .store
            .delete_lesson(state.code.clone())
            .await?;
        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.delete_course.deleted(&state.code),
            admin_keyboard(),
        ))
        .await
    }

    async fn handle_add_faculty_message(&mut self, message: &Message) -> HandlerResult<()> {
        let name = extract_text(message)?.trim().to_owned();
        if name.chars().count() < 2 {
            return Err(InputError::FacultyNameTooShort.into());
        }
        self.require_admin()?;
        let faculty = self.global_state.store.add_faculty(name).await?;
        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.fakultet.added(&faculty.name),
            admin_keyboard(),
        ))
        .await
    }

    async fn handle_add_channel_message(&mut self, message: &Message) -> HandlerResult<()> {
        let text = extract_text(message)?;
        let channel = parse_channel_spec(text).ok_or(InputError::BadChannelSpec)?;
        self.require_admin()?;
        let title = channel.title.clone();
        self.global_state.store.upsert_channel(channel).await?;
        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.channels.added(&title),
            admin_keyboard(),
        ))
        .await
    }

    async fn handle_delete_channel_message(&mut self, message: &Message) -> HandlerResult<()> {
        let channel_id: i64 = extract_text(message)?
            .trim()
            .parse()
            .map_err(|_| InputError::NotANumber)?;
        self.require_admin()?;
        self.global_state.store.delete_channel(channel_id).await?;
        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.channels.deleted(&channel_id),
            admin_keyboard(),
        ))
        .await
    }

    async fn handle_add_admin_message(&mut self, message: &Message) -> HandlerResult<()> {
        let telegram_id: i64 = extract_text(message)?
            .trim()
            .parse()
            .map_err(|_| InputError::NotANumber)?;
        self.require_admin()?;
        self.global_state.store.grant_admin(telegram_id).await?;
        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.admins.added(&telegram_id),
            admin_keyboard(),
        ))
        .await
    }

    async fn handle_remove_admin_message(&mut self, message: &Message) -> HandlerResult<()> {
        let telegram_id: i64 = extract_text(message)?
            .trim()
            .parse()
            .map_err(|_| InputError::NotANumber)?;
        self.require_admin()?;
        self.global_state.store.revoke_admin(telegram_id).await?;
        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.admins.removed(&telegram_id),
            admin_keyboard(),
        ))
        .await
    }

    async fn handle_broadcast_message(&mut self, message: &Message) -> HandlerResult<()> {
        let text = extract_formatted_text(message)?;
        self.require_admin()?;
        let user_ids = self.global_state.store.active_user_ids().await?;

        let own_chat = self.dialog.chat_id();
        let mut sent = 0_u32;
        let mut failed = 0_u32;
        for telegram_id in user_ids {
            let chat = ChatId(telegram_id);
            if chat == own_chat {
                continue;
            }
            match self
                .message_queue_tx
                .send_message(FormattedMessage::new(text.clone()), chat)
                .await
            {
                Ok(()) => sent += 1,
                Err(e) => {
                    debug!("Broadcast to {} failed: {}", telegram_id, e);
                    failed += 1;
                }
            }
        }
        info!("Broadcast finished: {} sent, {} failed", sent, failed);

        self.set_state(DialogState::MainMenu);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.broadcast.done(&sent, &failed),
            admin_keyboard(),
        ))
        .await
    }

    // Callback dispatch.

    async fn handle_callback(
        &mut self,
        query: &Query,
        from: &teloxide::types::User,
        message_id: i32,
    ) -> HandlerResult<()> {
        match query {
            Query::SelectFaculty { id } => self.select_faculty(*id, message_id).await,
            Query::FacultyBack => {
                self.set_state(DialogState::MainMenu);
                let faculties = self.global_state.store.all_faculties().await?;
                self.edit_or_send(
                    message_id,
                    STRINGS.browse.faculty_prompt(),
                    Some(faculty_keyboard(&faculties)),
                )
                .await
            }
            Query::CheckSubscription => self.recheck_subscription(from, message_id).await,
            Query::NoAction => Ok(()),
            Query::AddCourseFaculty { id } => self.pick_add_lesson_faculty(*id, message_id).await,
            Query::DeleteFacultyPick { id } => {
                self.send_faculty_deletion_confirmation(*id, message_id).await
            }
            Query::DeleteFacultyConfirm { id } => self.delete_faculty(*id, message_id).await,
            Query::ChannelAdd => {
                self.require_admin()?;
                self.set_state(DialogState::AddChannel);
                self.send_state_prompt().await
            }
            Query::ChannelDelete => {
                self.require_admin()?;
                self.set_state(DialogState::DeleteChannel);
                self.send_state_prompt().await
            }
        }
    }

    async fn select_faculty(&mut self, id: i64, message_id: i32) -> HandlerResult<()> {
        let faculty = match self.global_state.store.faculty_by_id(id).await? {
            Some(faculty) => faculty,
            None => {
                return self
                    .send_message(STRINGS.browse.faculty_missing().into())
                    .await;
            }
        };
        self.global_state
            .store
            .set_faculty(self.user_id.0 as i64, faculty.name.clone())
            .await?;
        self.edit_or_send(message_id, STRINGS.browse.faculty_selected(), None)
            .await?;
        self.set_state(DialogState::TopicSelection(states::TopicSelection { faculty }));
        self.send_state_prompt().await
    }

    async fn recheck_subscription(
        &mut self,
        from: &teloxide::types::User,
        message_id: i32,
    ) -> HandlerResult<()> {
        self.global_state.gate.invalidate(self.user_id);
        let full_name = from.full_name();

        if self.is_admin {
            self.edit_or_send(message_id, STRINGS.gate.admin_bypass(), None)
                .await?;
            self.set_state(DialogState::MainMenu);
            return self.send_state_prompt().await;
        }

        // Users can sign up from this button too; keep the profile fresh.
        let profile = UserProfile {
            telegram_id: self.user_id.0 as i64,
            username: from.username.clone(),
            first_name: Some(from.first_name.clone()),
            last_name: from.last_name.clone(),
        };
        if let Err(e) = self.global_state.store.register_user(profile).await {
            warn!("Cannot refresh user {}: {}", self.user_id, e);
        }

        let channels = self.global_state.store.all_channels().await?;
        if self
            .global_state
            .gate
            .refresh(self.bot, &channels, self.user_id)
            .await
        {
            let faculties = self.global_state.store.all_faculties().await?;
            self.set_state(DialogState::MainMenu);
            self.edit_or_send(
                message_id,
                STRINGS.gate.recheck_ok(&full_name),
                Some(faculty_keyboard(&faculties)),
            )
            .await
        } else {
            let missing = self
                .global_state
                .gate
                .missing_channels(self.bot, &channels, self.user_id)
                .await;
            self.edit_or_send(
                message_id,
                STRINGS.gate.recheck_missing(&missing.len()),
                Some(subscription_keyboard(&missing)),
            )
            .await
        }
    }

    async fn pick_add_lesson_faculty(&mut self, id: i64, message_id: i32) -> HandlerResult<()> {
        self.require_admin()?;
        match self.state() {
            DialogState::AddLessonFaculty => (),
            _ => return Err(InvalidAction::InvalidState.into()),
        }
        let faculty = self
            .global_state
            .store
            .faculty_by_id(id)
            .await?
            .ok_or(StoreError::NoSuchFaculty(id))?;
        let name = faculty.name.clone();
        self.set_state(DialogState::AddLessonTopic(states::AddLessonTopic { faculty }));
        self.edit_or_send(message_id, STRINGS.add_course.faculty_ok(&name), None)
            .await
    }

    async fn send_faculty_deletion_confirmation(
        &mut self,
        id: i64,
        message_id: i32,
    ) -> HandlerResult<()> {
        self.require_admin()?;
        let faculty = self
            .global_state
            .store
            .faculty_by_id(id)
            .await?
            .ok_or(StoreError::NoSuchFaculty(id))?;
        let markup = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![
                InlineKeyboardButton::callback(
                    "✅ Ha, o'chirish",
                    Query::DeleteFacultyConfirm { id },
                ),
                InlineKeyboardButton::callback("❌ Yo'q", Query::NoAction),
            ]],
        };
        self.edit_or_send(
            message_id,
            STRINGS.fakultet.delete_confirm(&faculty.name),
            Some(markup),
        )
        .await
    }

    async fn delete_faculty(&mut self, id: i64, message_id: i32) -> HandlerResult<()> {
        self.require_admin()?;
        self.global_state.store.delete_faculty(id).await?;
        self.edit_or_send(message_id, STRINGS.fakultet.deleted(), None)
            .await
    }

    // Prompts.

    /// Re-render the prompt for the current state. All idempotent; replaying
    /// the same state yields the same output.
    async fn send_state_prompt(&mut self) -> HandlerResult<()> {
        let state = self.state();
        match state {
            DialogState::Initial => Ok(()),
            DialogState::MainMenu => self.send_main_menu().await,
            DialogState::TopicSelection(s) => self.send_topic_menu(&s.faculty).await,
            DialogState::LessonBrowsing(s) => self.send_lesson_page(&s.session).await,
            DialogState::AddLessonFaculty => self.send_add_lesson_faculty_prompt().await,
            DialogState::AddLessonTopic(_) => {
                self.send_message(STRINGS.add_course.topic_prompt().into())
                    .await
            }
            DialogState::AddLessonCode(_) => {
                self.send_message(STRINGS.add_course.code_prompt().into())
                    .await
            }
            DialogState::AddLessonTitle(_) => {
                self.send_message(STRINGS.add_course.title_prompt().into())
                    .await
            }
            DialogState::AddLessonFile(_) => {
                self.send_message(STRINGS.add_course.file_prompt().into())
                    .await
            }
            DialogState::DeleteLessonCode => {
                self.send_message(STRINGS.delete_course.code_prompt().into())
                    .await
            }
            DialogState::DeleteLessonConfirm(s) => {
                self.send_message(FormattedMessage::with_markup(
                    STRINGS
                        .delete_course
                        .confirm(&s.title, &s.code, &s.downloads),
                    confirm_keyboard(),
                ))
                .await
            }
            DialogState::AddFacultyName => {
                self.send_message(STRINGS.fakultet.name_prompt().into()).await
            }
            DialogState::AddChannel => {
                self.send_message(STRINGS.channels.add_prompt().into()).await
            }
            DialogState::DeleteChannel => {
                self.send_message(STRINGS.channels.delete_prompt().into())
                    .await
            }
            DialogState::AddAdmin => {
                self.send_message(STRINGS.admins.add_prompt().into()).await
            }
            DialogState::RemoveAdmin => {
                self.send_message(STRINGS.admins.remove_prompt().into())
                    .await
            }
            DialogState::Broadcast => {
                self.send_message(STRINGS.broadcast.prompt().into()).await
            }
        }
    }

    async fn send_main_menu(&mut self) -> HandlerResult<()> {
        if self.is_admin {
            self.send_message(FormattedMessage::with_markup(
                STRINGS.admin.panel(),
                admin_keyboard(),
            ))
            .await
        } else {
            let faculties = self.global_state.store.all_faculties().await?;
            self.send_message(FormattedMessage::with_markup(
                STRINGS.browse.faculty_prompt(),
                faculty_keyboard(&faculties),
            ))
            .await
        }
    }

    async fn send_topic_menu(&mut self, faculty: &Faculty) -> HandlerResult<()> {
        let listing = self.global_state.store.faculty_lessons(faculty.id).await?;
        if listing.is_empty() {
            let markup = reply_keyboard(vec![vec![buttons::BACK_TO_FACULTIES.to_owned()]]);
            return self
                .send_message(FormattedMessage::with_markup(
                    STRINGS.browse.no_lessons(&faculty.name),
                    markup,
                ))
                .await;
        }
        let groups = catalog::group_by_topic(&listing);
        self.send_message(FormattedMessage::with_markup(
            STRINGS.browse.topics_prompt(&faculty.name, &listing.len()),
            topics_keyboard(&groups),
        ))
        .await
    }

    async fn send_lesson_page(&mut self, session: &BrowseSession) -> HandlerResult<()> {
        self.send_message(FormattedMessage::with_markup(
            STRINGS.browse.lessons_prompt(
                &session.faculty.name,
                &session.topic.label(),
                &session.len(),
                &(session.page_index() + 1),
                &session.page_count(),
            ),
            lessons_keyboard(session),
        ))
        .await
    }

    async fn send_add_lesson_faculty_prompt(&mut self) -> HandlerResult<()> {
        let faculties = self.global_state.store.all_faculties().await?;
        let markup = faculty_pick_keyboard(&faculties, |id| Query::AddCourseFaculty { id });
        self.send_message(FormattedMessage::with_markup(
            STRINGS.add_course.pick_faculty(),
            markup,
        ))
        .await
    }
}

fn parse_channel_spec(text: &str) -> Option<Channel> {
    let mut parts = text.splitn(3, '|').map(str::trim);
    let channel_id = parts.next()?.parse().ok()?;
    let title = parts.next()?.to_owned();
    if title.is_empty() {
        return None;
    }
    let invite_link = parts.next().unwrap_or("").to_owned();
    Some(Channel {
        channel_id,
        title,
        invite_link,
    })
}
