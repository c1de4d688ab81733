//! Outbound actions, returned to the transport relay as Bot API method calls.

use botcomod_shared::callback::Callback;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Outbound {
    SendMessage {
        chat_id: i64,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_markup: Option<Keyboard>,
    },
    EditMessageText {
        chat_id: i64,
        message_id: i64,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_markup: Option<Keyboard>,
    },
    ForwardMessage {
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
    },
    AnswerCallbackQuery {
        callback_query_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
}

impl Outbound {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::SendMessage { text, .. } | Self::EditMessageText { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Self::SendMessage { reply_markup, .. } | Self::EditMessageText { reply_markup, .. } => {
                reply_markup.as_ref()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub inline_keyboard: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.inline_keyboard.push(buttons);
        }
        self
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.inline_keyboard.iter().flatten()
    }

    pub fn find(&self, text: &str) -> Option<&Button> {
        self.buttons().find(|button| button.text == text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Button {
    pub fn callback(text: impl Into<String>, callback: &Callback) -> botcomod_shared::Result<Self> {
        Ok(Self {
            text: text.into(),
            callback_data: Some(callback.encode()?),
            url: None,
        })
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_serializes_as_bot_api_calls() {
        let keyboard = Keyboard::new().row(vec![
            Button::callback("Back", &Callback::new("menu")).unwrap(),
        ]);
        let outbound = Outbound::SendMessage {
            chat_id: 1,
            text: "hi".to_owned(),
            reply_markup: Some(keyboard),
        };

        let json = serde_json::to_value(&outbound).unwrap();

        assert_eq!(json["method"], "sendMessage");
        assert_eq!(json["chat_id"], 1);
        assert_eq!(
            json["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "\u{c}menu"
        );
    }

    #[test]
    fn empty_rows_are_skipped() {
        let keyboard = Keyboard::new().row(vec![]);

        assert!(keyboard.inline_keyboard.is_empty());
    }
}
