use crate::dispatch::UserDialog;
use crate::message::{FormattedMessage, FormattedText};
use crate::types::{BotType, HandlerError, HandlerResult, InternalError};
use teloxide::errors::RequestError;
use teloxide::prelude::*;
use teloxide::requests::HasPayload;
use teloxide::types::{ChatId, InputFile};
use tokio::sync::{mpsc, oneshot};

/// What the queue can deliver.
#[derive(Debug, Clone)]
pub enum OutboundPayload {
    Text(FormattedMessage),
    Document {
        file_id: String,
        caption: FormattedText,
    },
    Sticker {
        file_id: String,
    },
}

pub struct OutboundPackage {
    pub payload: OutboundPayload,
    pub chat_id: ChatId,
    pub result_tx: oneshot::Sender<HandlerResult<()>>,
}

impl std::fmt::Debug for OutboundPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundPackage")
            .field("payload", &self.payload)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

/// Serializes outbound sends and absorbs Telegram rate limiting in one
/// place instead of in every handler.
pub struct MessageQueue {
    rx: mpsc::Receiver<OutboundPackage>,
}

#[derive(Clone)]
pub struct MessageQueueSender {
    tx: mpsc::Sender<OutboundPackage>,
}

impl MessageQueueSender {
    pub async fn send_message(
        &mut self,
        message: FormattedMessage,
        chat_id: ChatId,
    ) -> HandlerResult<()> {
        self.send(OutboundPayload::Text(message), chat_id).await
    }

    pub async fn send_document(
        &mut self,
        chat_id: ChatId,
        file_id: String,
        caption: FormattedText,
    ) -> HandlerResult<()> {
        self.send(OutboundPayload::Document { file_id, caption }, chat_id)
            .await
    }

    pub async fn send_sticker(&mut self, chat_id: ChatId, file_id: String) -> HandlerResult<()> {
        self.send(OutboundPayload::Sticker { file_id }, chat_id)
            .await
    }

    async fn send(&mut self, payload: OutboundPayload, chat_id: ChatId) -> HandlerResult<()> {
        let (result_tx, result_rx) = oneshot::channel();
        let pkg = OutboundPackage {
            payload,
            chat_id,
            result_tx,
        };
        self.tx
            .send(pkg)
            .await
            .expect("The message queue task is gone");
        result_rx
            .await
            .expect("The message queue dropped a result sender")
    }
}

impl MessageQueue {
    pub fn new() -> (Self, MessageQueueSender) {
        let (tx, rx) = mpsc::channel(1);
        (Self { rx }, MessageQueueSender { tx })
    }

    pub async fn run(mut self, bot: BotType) {
        while let Some(pkg) = self.rx.recv().await {
            let result = loop {
                match Self::dispatch(&bot, pkg.chat_id, pkg.payload.clone()).await {
                    Err(HandlerError::Internal(InternalError::Telegram(
                        RequestError::RetryAfter(duration),
                    ))) => {
                        debug!("Rate limited, retrying in {:?}", duration);
                        tokio::time::sleep(duration).await;
                    }
                    other => break other,
                }
            };
            if pkg.result_tx.send(result).is_err() {
                warn!("An outbound send result was dropped unreceived");
            }
        }
        debug!("Message queue closed");
    }

    async fn dispatch(
        bot: &BotType,
        chat_id: ChatId,
        payload: OutboundPayload,
    ) -> HandlerResult<()> {
        match payload {
            OutboundPayload::Text(message) => {
                UserDialog::send_message_with_id(chat_id, bot, message).await?;
            }
            OutboundPayload::Document { file_id, caption } => {
                let mut request = bot.send_document(chat_id, InputFile::file_id(file_id));
                let payload = request.payload_mut();
                payload.caption = Some(caption.raw_text);
                payload.caption_entities = caption.entities;
                request.await?;
            }
            OutboundPayload::Sticker { file_id } => {
                bot.send_sticker(chat_id, InputFile::file_id(file_id)).await?;
            }
        }
        Ok(())
    }
}
