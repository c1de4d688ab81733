use botcomod_house::Houses;
use botcomod_shared::token::TokenCodec;
use botcomod_user::{Command, Query, User};
use sqlx::SqliteConnection;

use super::{
    reply::{Keyboard, Outbound},
    update::{Sender, Update},
};
use crate::config::BotConfig;

/// Long-lived collaborators shared by every update.
pub struct Services {
    pub bot: BotConfig,
    pub houses: Houses,
    pub tokens: TokenCodec,
}

/// Everything a handler may touch while one update is processed.
///
/// `conn` is the update's transaction; replies are collected in the outbox and
/// only leave once the transaction committed.
pub struct Context<'a> {
    pub update: &'a Update,
    pub sender: &'a Sender,
    pub chat_id: i64,
    pub services: &'a Services,
    conn: &'a mut SqliteConnection,
    outbox: Vec<Outbound>,
}

impl<'a> Context<'a> {
    /// `None` for updates without a sender, such as channel posts.
    pub fn new(
        update: &'a Update,
        conn: &'a mut SqliteConnection,
        services: &'a Services,
    ) -> Option<Self> {
        Some(Self {
            sender: update.sender()?,
            chat_id: update.chat_id()?,
            update,
            services,
            conn,
            outbox: vec![],
        })
    }

    pub fn sender_id(&self) -> i64 {
        self.sender.id
    }

    pub fn update_id(&self) -> i64 {
        self.update.update_id
    }

    pub fn sender_mention(&self) -> String {
        match &self.sender.username {
            Some(username) => format!("@{username}"),
            None => format!("id{}", self.sender.id),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.services.bot.is_admin(self.sender.id)
    }

    pub fn ensure_admin(&self) -> botcomod_shared::Result<()> {
        if !self.is_admin() {
            tracing::warn!(user_id = self.sender.id, "admin action refused");
            return Err(botcomod_shared::Error::Forbidden);
        }

        Ok(())
    }

    pub fn users(&mut self) -> Command<'_> {
        Command::new(self.conn)
    }

    pub fn query(&mut self) -> Query<'_> {
        Query::new(self.conn)
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        self.conn
    }

    /// The sender's aggregate, replayed inside the update's transaction.
    pub async fn me(&mut self) -> botcomod_shared::Result<User> {
        let id = self.sender.id;
        self.users().load(id).await
    }

    pub fn send(&mut self, chat_id: i64, text: impl Into<String>, keyboard: Option<Keyboard>) {
        self.outbox.push(Outbound::SendMessage {
            chat_id,
            text: text.into(),
            reply_markup: keyboard,
        });
    }

    pub fn reply(&mut self, text: impl Into<String>, keyboard: Option<Keyboard>) {
        self.send(self.chat_id, text, keyboard);
    }

    /// Rewrites the message holding the pressed button, or replies when the
    /// update is not a button press.
    pub fn edit_or_reply(&mut self, text: impl Into<String>, keyboard: Option<Keyboard>) {
        let update = self.update;
        let message = update
            .callback_query
            .as_ref()
            .and_then(|query| query.message.as_ref());

        match message {
            Some(message) => self.outbox.push(Outbound::EditMessageText {
                chat_id: message.chat.id,
                message_id: message.message_id,
                text: text.into(),
                reply_markup: keyboard,
            }),
            None => self.reply(text, keyboard),
        }
    }

    /// Forwards the update's own message to `chat_id`.
    pub fn forward_to(&mut self, chat_id: i64) {
        let update = self.update;
        if let Some(message) = &update.message {
            self.outbox.push(Outbound::ForwardMessage {
                chat_id,
                from_chat_id: message.chat.id,
                message_id: message.message_id,
            });
        }
    }

    pub fn answer_callback(&mut self, text: Option<String>) {
        let update = self.update;
        if let Some(query) = &update.callback_query {
            self.outbox.push(Outbound::AnswerCallbackQuery {
                callback_query_id: query.id.clone(),
                text,
            });
        }
    }

    /// Text of the message holding the pressed button.
    pub fn button_message_text(&self) -> &str {
        self.update
            .message()
            .and_then(|message| message.text.as_deref())
            .unwrap_or_default()
    }

    pub fn into_outbox(self) -> Vec<Outbound> {
        self.outbox
    }
}
