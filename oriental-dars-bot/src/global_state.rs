use crate::db::CommandSender;
use crate::dispatch::DialogStorage;
use crate::gate::SubscriptionGate;
use std::collections::HashSet;
use teloxide::types::UserId;

pub struct GlobalState {
    pub dialog_storage: DialogStorage,
    pub store: CommandSender,
    pub gate: SubscriptionGate,
    /// The static admin allow-list; the persisted `is_admin` flag extends it.
    pub admins: HashSet<UserId>,
    pub new_user_sticker: Option<String>,
}
