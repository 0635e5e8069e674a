//! The subscription gate: users must join every configured channel before
//! the catalog opens up. Admins, allow-listed inputs and users mid-flow are
//! never blocked, and the gate fails open on its own errors.

use crate::callback_query::cmd;
use crate::global_state::GlobalState;
use crate::state::DialogState;
use crate::store::Channel;
use crate::strings::STRINGS;
use crate::types::BotType;
use crate::ui;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use teloxide::prelude::*;
use teloxide::types::ChatMemberKind;

/// How long a membership verdict is trusted before the platform is asked
/// again.
pub const CACHE_TTL: Duration = Duration::from_secs(30);

/// Poll period and attempt budget of the post-registration auto-recheck.
pub const RECHECK_INTERVAL: Duration = Duration::from_secs(3);
pub const RECHECK_ATTEMPTS: u32 = 60;

struct CacheEntry {
    subscribed: bool,
    checked_at: Instant,
}

/// Per-user subscription verdicts with a fixed TTL. Keyed by user id; there
/// is no cross-user coordination to worry about.
pub struct SubscriptionGate {
    cache: Mutex<HashMap<UserId, CacheEntry>>,
}

impl SubscriptionGate {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_verdict(&self, user_id: UserId) -> Option<bool> {
        self.verdict_at(user_id, Instant::now())
    }

    pub(crate) fn verdict_at(&self, user_id: UserId, now: Instant) -> Option<bool> {
        let cache = self.cache.lock().unwrap();
        let entry = cache.get(&user_id)?;
        if now.duration_since(entry.checked_at) < CACHE_TTL {
            Some(entry.subscribed)
        } else {
            None
        }
    }

    pub(crate) fn remember(&self, user_id: UserId, subscribed: bool) {
        self.cache.lock().unwrap().insert(
            user_id,
            CacheEntry {
                subscribed,
                checked_at: Instant::now(),
            },
        );
    }

    /// Drop the cached verdict, e.g. when the user presses the manual
    /// recheck button.
    pub fn invalidate(&self, user_id: UserId) {
        self.cache.lock().unwrap().remove(&user_id);
    }

    /// Cache-aware aggregate check. No configured channels means everyone
    /// passes.
    pub async fn is_fully_subscribed(
        &self,
        bot: &BotType,
        channels: &[Channel],
        user_id: UserId,
    ) -> bool {
        if channels.is_empty() {
            return true;
        }
        if let Some(verdict) = self.cached_verdict(user_id) {
            return verdict;
        }
        self.refresh(bot, channels, user_id).await
    }

    /// Query the platform for every channel and replace the cached verdict.
    pub async fn refresh(&self, bot: &BotType, channels: &[Channel], user_id: UserId) -> bool {
        if channels.is_empty() {
            return true;
        }
        let mut subscribed = true;
        for channel in channels {
            if !is_member(bot, channel.channel_id, user_id).await {
                subscribed = false;
                break;
            }
        }
        self.remember(user_id, subscribed);
        subscribed
    }

    /// The channels the user still has to join, in configuration order.
    pub async fn missing_channels(
        &self,
        bot: &BotType,
        channels: &[Channel],
        user_id: UserId,
    ) -> Vec<Channel> {
        let mut missing = Vec::new();
        for channel in channels {
            if !is_member(bot, channel.channel_id, user_id).await {
                missing.push(channel.clone());
            }
        }
        missing
    }
}

/// A failed lookup counts as not subscribed; the user can always recheck.
async fn is_member(bot: &BotType, channel_id: i64, user_id: UserId) -> bool {
    match bot.get_chat_member(ChatId(channel_id), user_id).await {
        Ok(member) => matches!(
            member.kind,
            ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_) | ChatMemberKind::Member,
        ),
        Err(e) => {
            warn!("Membership check failed for channel {}: {}", channel_id, e);
            false
        }
    }
}

/// Commands that work without a subscription.
pub const ALLOWED_COMMANDS: &[&str] = &["/start", "/help", "/admin", "/cancel"];

/// Text inputs the gate lets through: the entry commands for everyone, the
/// admin-panel buttons for admins.
pub fn is_exempt_text(text: &str, is_admin: bool) -> bool {
    let trimmed = text.trim();
    if let Some(first_word) = trimmed.split_whitespace().next() {
        if ALLOWED_COMMANDS.contains(&first_word.to_lowercase().as_str()) {
            return true;
        }
    }
    is_admin && ui::buttons::ADMIN_PANEL.contains(&trimmed)
}

/// Callback inputs the gate lets through: the recheck/navigation set for
/// everyone, the admin management actions for admins.
pub fn is_exempt_callback(data: &str, is_admin: bool) -> bool {
    const ALLOWED: &[&str] = &[cmd::CHECK_SUBSCRIPTION, cmd::FACULTY_BACK, cmd::NO_ACTION];
    if ALLOWED.contains(&data) {
        return true;
    }
    if !is_admin {
        return false;
    }
    const ADMIN_COMMANDS: &[&str] = &[
        cmd::ADD_COURSE_FACULTY,
        cmd::DELETE_FACULTY_PICK,
        cmd::DELETE_FACULTY_CONFIRM,
        cmd::CHANNEL_ADD,
        cmd::CHANNEL_DELETE,
    ];
    let command = data.split('@').next().unwrap_or(data);
    ADMIN_COMMANDS.contains(&command)
}

/// Poll the subscription status after `/start` until the user joins or the
/// attempt budget runs out, editing the join prompt in place.
///
/// The task is never cancelled; a newer inbound event simply supersedes it
/// and the loop expires on its own.
pub fn spawn_auto_recheck(
    bot: BotType,
    global_state: Arc<GlobalState>,
    chat_id: ChatId,
    message_id: i32,
    user_id: UserId,
) {
    tokio::spawn(async move {
        for _ in 0..RECHECK_ATTEMPTS {
            tokio::time::sleep(RECHECK_INTERVAL).await;
            let channels = match global_state.store.all_channels().await {
                Ok(channels) => channels,
                Err(e) => {
                    warn!("Auto recheck for {} aborted: {}", user_id, e);
                    return;
                }
            };
            if global_state.gate.refresh(&bot, &channels, user_id).await {
                if let Ok(dialog) = global_state.dialog_storage.get_dialog(chat_id, user_id) {
                    dialog.data().write().unwrap().state = DialogState::MainMenu;
                }
                let faculties = global_state.store.all_faculties().await.unwrap_or_default();
                let markup = ui::faculty_keyboard(&faculties);
                if let Err(e) = ui::edit_formatted(
                    &bot,
                    chat_id,
                    message_id,
                    STRINGS.gate.auto_ok(),
                    Some(markup),
                )
                .await
                {
                    debug!("Auto recheck edit failed: {}", e);
                }
                return;
            }
        }

        if let Err(e) =
            ui::edit_formatted(&bot, chat_id, message_id, STRINGS.gate.auto_timeout(), None).await
        {
            debug!("Auto recheck timeout edit failed: {}", e);
        }
    });
}
