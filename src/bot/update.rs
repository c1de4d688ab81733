//! The subset of the Telegram `Update` object the bot reads.

use botcomod_shared::callback::Callback;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Sender>,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// What an update asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound<'a> {
    Command { name: &'a str, payload: &'a str },
    Callback(Callback),
    Photo,
    Text(&'a str),
    Other,
}

impl Update {
    pub fn sender(&self) -> Option<&Sender> {
        match (&self.callback_query, &self.message) {
            (Some(query), _) => Some(&query.from),
            (None, Some(message)) => message.from.as_ref(),
            (None, None) => None,
        }
    }

    /// The message this update is about; for callbacks, the message carrying the button.
    pub fn message(&self) -> Option<&Message> {
        match &self.callback_query {
            Some(query) => query.message.as_ref(),
            None => self.message.as_ref(),
        }
    }

    pub fn chat_id(&self) -> Option<i64> {
        match (self.message(), self.sender()) {
            (Some(message), _) => Some(message.chat.id),
            (None, Some(sender)) => Some(sender.id),
            (None, None) => None,
        }
    }

    pub fn inbound(&self) -> Inbound<'_> {
        if let Some(query) = &self.callback_query {
            let Some(data) = &query.data else {
                return Inbound::Other;
            };

            return match Callback::decode(data) {
                Ok(callback) => Inbound::Callback(callback),
                Err(err) => {
                    tracing::debug!(error = %err, "undecodable callback data");
                    Inbound::Other
                }
            };
        }

        let Some(message) = &self.message else {
            return Inbound::Other;
        };

        if message.photo.as_ref().is_some_and(|photo| !photo.is_empty()) {
            return Inbound::Photo;
        }

        match message.text.as_deref() {
            Some(text) => parse_command(text).unwrap_or(Inbound::Text(text)),
            None => Inbound::Other,
        }
    }
}

fn parse_command(text: &str) -> Option<Inbound<'_>> {
    let text = text.trim().strip_prefix('/')?;
    let (name, payload) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    // `/start@botcomod_bot` in group chats
    let name = name.split_once('@').map_or(name, |(name, _)| name);
    if name.is_empty() {
        return None;
    }

    Some(Inbound::Command {
        name,
        payload: payload.trim(),
    })
}
