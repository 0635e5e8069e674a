use crate::db::AccessTask;
use crate::dispatch::DialogStorage;
use crate::gate::SubscriptionGate;
use crate::global_state::GlobalState;
use crate::message_queue::MessageQueue;
use crate::store::Store;
use crate::types::BotType;
use crate::ui;
use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::UserId;

const DB_PATH: &str = "oriental-dars-bot.sqlite";

/// Faculties guaranteed to exist after startup; admins can add more.
const DEFAULT_FACULTIES: &[&str] = &[
    "Dasturiy injiniring",
    "Kompyuter injiniring",
    "Iqtisodiyot",
    "Menejment (talim)",
    "Menejment",
    "Tarix",
    "Psixologiya",
    "Moliyaviy nazorat",
    "Raqamli iqtisodiyot",
    "Lingvistika (Ingliz)",
    "Lingvistika (Arab)",
    "Sport faoliyati",
    "Talim nazariyasi",
    "Pedagogika",
];

/// The application with its state.
pub struct App {
    bot: BotType,
    admins: HashSet<UserId>,
    new_user_sticker: Option<String>,
}

impl App {
    pub fn new(api_token: String, admins: HashSet<UserId>, new_user_sticker: Option<String>) -> Self {
        Self {
            bot: Bot::new(api_token).auto_send(),
            admins,
            new_user_sticker,
        }
    }

    /// Run the application.
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        let message_handler = Update::filter_message().endpoint(ui::handle_message);
        let callback_query_handler =
            Update::filter_callback_query().endpoint(ui::handle_callback_query);
        let root_handler = teloxide::dptree::entry()
            .branch(message_handler)
            .branch(callback_query_handler);

        let store = Store::open(DB_PATH)?;
        let seeded = store.seed_faculties(DEFAULT_FACULTIES)?;
        if seeded > 0 {
            info!("Seeded {} default faculties", seeded);
        }

        let (access_task, store_tx) = AccessTask::new(store);
        let access_task_handle = access_task.spawn();

        let global_state = Arc::new(GlobalState {
            dialog_storage: DialogStorage::new(),
            store: store_tx,
            gate: SubscriptionGate::new(),
            admins: self.admins,
            new_user_sticker: self.new_user_sticker,
        });

        let (message_queue, message_queue_tx) = MessageQueue::new();
        tokio::spawn(message_queue.run(self.bot.clone()));

        info!("Dispatching updates");
        let mut dispatcher = Dispatcher::builder(self.bot, root_handler)
            .dependencies(teloxide::dptree::deps![global_state, message_queue_tx])
            .build();
        dispatcher.dispatch().await;

        access_task_handle.abort();
        let _ = access_task_handle.await;

        Ok(())
    }
}
