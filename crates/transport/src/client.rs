//! Telegram Bot API client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use intake_bot_core::{Attachment, CapabilityError, Keyboard, Reply, Transport, UserId};

use crate::types::{ApiResponse, BotCommand, File, TelegramUpdate};
use crate::TransportError;

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
}

/// `reply_markup` for a keyboard, if it needs one
fn reply_markup(keyboard: &Keyboard) -> Option<Value> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Choices { choices } => Some(json!({
            "inline_keyboard": choices
                .iter()
                .map(|c| vec![json!({ "text": c.label, "callback_data": c.payload })])
                .collect::<Vec<_>>()
        })),
        Keyboard::RequestContact { label } => Some(json!({
            "keyboard": [[{ "text": label, "request_contact": true }]],
            "resize_keyboard": true,
            "one_time_keyboard": true
        })),
        Keyboard::Remove => Some(json!({ "remove_keyboard": true })),
    }
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base, token)
    }

    pub fn with_client(http: Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token, file_path)
    }

    async fn unwrap_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;
        if !envelope.ok {
            return Err(TransportError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope
            .result
            .ok_or_else(|| TransportError::Parse("missing result".to_string()))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, TransportError> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    pub async fn send_message(&self, chat_id: &str, reply: &Reply) -> Result<(), TransportError> {
        let mut body = json!({ "chat_id": chat_id, "text": reply.text });
        if let Some(markup) = reply_markup(&reply.keyboard) {
            body["reply_markup"] = markup;
        }
        let _: Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TransportError> {
        self.call("getFile", json!({ "file_id": file_id })).await
    }

    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| TransportError::Parse(format!("no file_path for {}", file_id)))?;

        let response = self
            .http
            .get(self.file_url(&path))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn send_document(
        &self,
        chat_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let response = self
            .http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        let _: Value = Self::unwrap_response(response).await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, TransportError> {
        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs + 10))
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"]
            }))
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TransportError> {
        let _: Value = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_query_id }),
            )
            .await?;
        Ok(())
    }

    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), TransportError> {
        let _: Value = self
            .call("setMyCommands", json!({ "commands": commands }))
            .await?;
        Ok(())
    }

    /// Drop any webhook so `getUpdates` can be used
    pub async fn delete_webhook(&self) -> Result<(), TransportError> {
        let _: Value = self.call("deleteWebhook", json!({})).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send(&self, to: &UserId, reply: Reply) -> Result<(), CapabilityError> {
        self.send_message(to.as_str(), &reply).await.map_err(|e| {
            tracing::error!(chat_id = %to, error = %e, "Failed to send message");
            e.into()
        })
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>, CapabilityError> {
        self.download(&attachment.file_id).await.map_err(|e| {
            tracing::error!(file_id = %attachment.file_id, error = %e, "Failed to download attachment");
            e.into()
        })
    }

    async fn send_file(
        &self,
        to: &UserId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), CapabilityError> {
        self.send_document(to.as_str(), file_name, bytes)
            .await
            .map_err(Into::into)
    }
}
