//! Async facade over the SQLite store.
//!
//! rusqlite is synchronous, so the connection lives on a dedicated blocking
//! task. Handlers ship closures over an mpsc channel and await the result on
//! a oneshot; the task applies them to the store one at a time, which is also
//! what serializes all store access.

use crate::store::{
    AdminEntry, Channel, Faculty, FacultyLesson, Lesson, LessonSummary, NewLesson, RecentLesson,
    Store, StoreError, UserProfile, UserStats,
};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};

pub struct Context {
    pub store: Store,
}

pub type ErasedCommandReturnType = Box<dyn Any + Send + 'static>;
pub type ErasedCommandFn = Box<dyn FnOnce(&mut Context) -> ErasedCommandReturnType + Send>;

pub struct ErasedCommand {
    operation: ErasedCommandFn,
}

impl ErasedCommand {
    pub fn run(self, context: &mut Context) -> ErasedCommandReturnType {
        (self.operation)(context)
    }
}

pub struct Command<R, F>
where
    F: FnOnce(&mut Context) -> R,
{
    operation: F,
}

impl<R, F> Command<R, F>
where
    F: FnOnce(&mut Context) -> R,
{
    pub fn new(operation: F) -> Self {
        Self { operation }
    }
}

impl<R, F> From<Command<R, F>> for ErasedCommand
where
    R: Any + Send + 'static,
    F: FnOnce(&mut Context) -> R + Send + 'static,
{
    fn from(cmd: Command<R, F>) -> Self {
        ErasedCommand {
            operation: Box::new(|context| Box::new((cmd.operation)(context))),
        }
    }
}

struct CommandPackage {
    command: ErasedCommand,
    response_sender: oneshot::Sender<ErasedCommandReturnType>,
}

#[derive(Clone)]
pub struct CommandSender {
    sender: mpsc::Sender<CommandPackage>,
}

impl CommandSender {
    pub async fn send<R, F>(&self, command: Command<R, F>) -> R
    where
        F: FnOnce(&mut Context) -> R + Send,
        R: 'static + Send,
        Command<R, F>: Into<ErasedCommand>,
    {
        let erased_result = self.send_erased(command.into()).await;
        let boxed_result = erased_result
            .downcast()
            .expect("Type mismatch when returning from the store access task");
        *boxed_result
    }

    async fn send_erased(&self, command: ErasedCommand) -> ErasedCommandReturnType {
        let (response_sender, response_receiver) = oneshot::channel();
        let pkg = CommandPackage {
            command,
            response_sender,
        };
        if self.sender.send(pkg).await.is_err() {
            // `CommandPackage` has no meaningful `Debug`, so `Result::expect`
            // is not available here.
            panic!("Cannot send a command to the store access task");
        }
        response_receiver
            .await
            .expect("Cannot receive the command result from the store access task")
    }

    // Users.

    pub async fn register_user(&self, profile: UserProfile) -> Result<bool, StoreError> {
        self.send(Command::new(move |ctx| ctx.store.register_user(&profile)))
            .await
    }

    pub async fn touch_last_active(&self, telegram_id: i64) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| {
            ctx.store.touch_last_active(telegram_id)
        }))
        .await
    }

    pub async fn set_faculty(&self, telegram_id: i64, faculty: String) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| {
            ctx.store.set_faculty(telegram_id, &faculty)
        }))
        .await
    }

    pub async fn user_faculty(&self, telegram_id: i64) -> Result<Option<String>, StoreError> {
        self.send(Command::new(move |ctx| ctx.store.user_faculty(telegram_id)))
            .await
    }

    pub async fn is_admin(&self, telegram_id: i64) -> Result<bool, StoreError> {
        self.send(Command::new(move |ctx| ctx.store.is_admin(telegram_id)))
            .await
    }

    pub async fn grant_admin(&self, telegram_id: i64) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| ctx.store.grant_admin(telegram_id)))
            .await
    }

    pub async fn revoke_admin(&self, telegram_id: i64) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| ctx.store.revoke_admin(telegram_id)))
            .await
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminEntry>, StoreError> {
        self.send(Command::new(|ctx| ctx.store.list_admins())).await
    }

    pub async fn increment_user_downloads(&self, telegram_id: i64) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| {
            ctx.store.increment_user_downloads(telegram_id)
        }))
        .await
    }

    pub async fn user_stats(&self) -> Result<UserStats, StoreError> {
        self.send(Command::new(|ctx| ctx.store.user_stats())).await
    }

    pub async fn active_user_ids(&self) -> Result<Vec<i64>, StoreError> {
        self.send(Command::new(|ctx| ctx.store.active_user_ids()))
            .await
    }

    // Catalog.

    pub async fn add_faculty(&self, name: String) -> Result<Faculty, StoreError> {
        self.send(Command::new(move |ctx| ctx.store.add_faculty(&name)))
            .await
    }

    pub async fn all_faculties(&self) -> Result<Vec<Faculty>, StoreError> {
        self.send(Command::new(|ctx| ctx.store.all_faculties()))
            .await
    }

    pub async fn faculty_by_id(&self, id: i64) -> Result<Option<Faculty>, StoreError> {
        self.send(Command::new(move |ctx| ctx.store.faculty_by_id(id)))
            .await
    }

    pub async fn delete_faculty(&self, id: i64) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| ctx.store.delete_faculty(id)))
            .await
    }

    pub async fn faculty_lessons(&self, faculty_id: i64) -> Result<Vec<FacultyLesson>, StoreError> {
        self.send(Command::new(move |ctx| {
            ctx.store.faculty_lessons(faculty_id)
        }))
        .await
    }

    pub async fn topic_lessons(
        &self,
        faculty_id: i64,
        topic: Option<String>,
    ) -> Result<Vec<LessonSummary>, StoreError> {
        self.send(Command::new(move |ctx| {
            ctx.store.topic_lessons(faculty_id, topic.as_deref())
        }))
        .await
    }

    pub async fn add_lesson(&self, new: NewLesson) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| ctx.store.add_lesson(&new)))
            .await
    }

    pub async fn lesson_by_code(&self, code: String) -> Result<Option<Lesson>, StoreError> {
        self.send(Command::new(move |ctx| ctx.store.lesson_by_code(&code)))
            .await
    }

    pub async fn delete_lesson(&self, code: String) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| ctx.store.delete_lesson(&code)))
            .await
    }

    pub async fn bump_lesson_downloads(&self, code: String) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| {
            ctx.store.bump_lesson_downloads(&code)
        }))
        .await
    }

    pub async fn recent_lessons(&self, limit: i64) -> Result<Vec<RecentLesson>, StoreError> {
        self.send(Command::new(move |ctx| ctx.store.recent_lessons(limit)))
            .await
    }

    // Channels.

    pub async fn upsert_channel(&self, channel: Channel) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| ctx.store.upsert_channel(&channel)))
            .await
    }

    pub async fn all_channels(&self) -> Result<Vec<Channel>, StoreError> {
        self.send(Command::new(|ctx| ctx.store.all_channels())).await
    }

    pub async fn delete_channel(&self, channel_id: i64) -> Result<(), StoreError> {
        self.send(Command::new(move |ctx| {
            ctx.store.delete_channel(channel_id)
        }))
        .await
    }
}

pub struct AccessTask {
    receiver: mpsc::Receiver<CommandPackage>,
    context: Context,
}

impl AccessTask {
    pub fn new(store: Store) -> (Self, CommandSender) {
        let context = Context { store };
        let (sender, receiver) = mpsc::channel(1);
        let command_sender = CommandSender { sender };
        (Self { receiver, context }, command_sender)
    }

    fn run_blocking(mut self) {
        loop {
            let command_package = match self.receiver.blocking_recv() {
                Some(value) => value,
                None => break,
            };
            let result = command_package.command.run(&mut self.context);
            if command_package.response_sender.send(result).is_err() {
                warn!("A store command result was dropped unreceived");
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        task::spawn_blocking(|| self.run_blocking())
    }
}
