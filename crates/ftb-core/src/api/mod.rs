//! Direct request/response entry points, one per bot API method.
//!
//! Every method serializes its parameters into a JSON body, hands it to the
//! [`BotTransport`] and reads the answer through the envelope reader, so a
//! rejected call always surfaces as [`Error::Api`].

pub mod markup;

use std::{sync::Arc, time::Duration};

use serde::Serialize;

use crate::{
    domain::{ChatId, FileId, MessageId},
    envelope::{ensure_ok, read_result, read_result_list},
    errors::Error,
    ports::{form_fields, ApiRequest, BotTransport, RawResponse},
    types::{File, SentMessage, StickerSet, Update, UpdateKind, User, WebhookInfo},
    Result,
};

pub use markup::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, ParseMode,
    ReplyKeyboardMarkup, ReplyKeyboardRemove, ReplyMarkup,
};

/// Parameters of `getUpdates`. Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GetUpdates {
    pub offset: i64,
    pub limit: u8,
    pub timeout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<UpdateKind>>,
}

impl Default for GetUpdates {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
            timeout: 0,
            allowed_updates: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<MessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
            reply_to_message_id: None,
            disable_notification: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn without_link_preview(mut self) -> Self {
        self.disable_web_page_preview = Some(true);
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = Some(true);
        self
    }

    pub fn reply_to(mut self, id: MessageId) -> Self {
        self.reply_to_message_id = Some(id);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EditMessageText {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageText {
    pub fn new(chat_id: impl Into<ChatId>, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }
}

/// Media message: `sendPhoto`, `sendDocument` and `sendSticker` differ only
/// in the name of the field carrying the file.
///
/// Files sent by id or URL go out as JSON, uploads as multipart.
#[derive(Clone, Debug, PartialEq)]
pub struct SendMedia {
    pub chat_id: ChatId,
    pub file: InputFile,
    pub caption: Option<String>,
    pub parse_mode: Option<ParseMode>,
    pub disable_notification: Option<bool>,
    pub reply_to_message_id: Option<MessageId>,
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMedia {
    pub fn new(chat_id: impl Into<ChatId>, file: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            file,
            caption: None,
            parse_mode: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>, mode: ParseMode) -> Self {
        self.caption = Some(caption.into());
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_to(mut self, id: MessageId) -> Self {
        self.reply_to_message_id = Some(id);
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = Some(true);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }

    fn request(&self, method: &'static str, field: &'static str) -> Result<ApiRequest> {
        let mut body = MediaBody {
            chat_id: &self.chat_id,
            field,
            file: Some(&self.file),
            caption: self.caption.as_deref(),
            parse_mode: self.parse_mode,
            disable_notification: self.disable_notification,
            reply_to_message_id: self.reply_to_message_id,
            reply_markup: self.reply_markup.as_ref(),
        };
        if !self.file.is_upload() {
            return ApiRequest::json(method, &body);
        }
        body.file = None;
        let mut parts = form_fields(&body)?;
        parts.push(self.file.to_form_part(field));
        Ok(ApiRequest::form(method, parts))
    }
}

struct MediaBody<'a> {
    chat_id: &'a ChatId,
    field: &'static str,
    file: Option<&'a InputFile>,
    caption: Option<&'a str>,
    parse_mode: Option<ParseMode>,
    disable_notification: Option<bool>,
    reply_to_message_id: Option<MessageId>,
    reply_markup: Option<&'a ReplyMarkup>,
}

impl Serialize for MediaBody<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("chat_id", self.chat_id)?;
        if let Some(file) = self.file {
            map.serialize_entry(self.field, file)?;
        }
        if let Some(caption) = self.caption {
            map.serialize_entry("caption", caption)?;
        }
        if let Some(mode) = self.parse_mode {
            map.serialize_entry("parse_mode", &mode)?;
        }
        if let Some(silent) = self.disable_notification {
            map.serialize_entry("disable_notification", &silent)?;
        }
        if let Some(id) = self.reply_to_message_id {
            map.serialize_entry("reply_to_message_id", &id)?;
        }
        if let Some(markup) = self.reply_markup {
            map.serialize_entry("reply_markup", markup)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl AnswerCallbackQuery {
    pub fn new(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Parameters of `setWebhook`.
///
/// A `certificate` turns the call into a multipart upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SetWebhook {
    pub url: String,
    #[serde(skip)]
    pub certificate: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<UpdateKind>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_pending_updates: Option<bool>,
}

#[derive(Serialize)]
struct MessageRef<'a> {
    chat_id: &'a ChatId,
    message_id: MessageId,
}

/// Bot API client over any [`BotTransport`]. Cheap to clone.
#[derive(Clone)]
pub struct BotClient {
    transport: Arc<dyn BotTransport>,
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient").finish_non_exhaustive()
    }
}

impl BotClient {
    pub fn new(transport: Arc<dyn BotTransport>) -> Self {
        Self { transport }
    }

    async fn call(&self, req: ApiRequest) -> Result<RawResponse> {
        let method = req.method;
        let resp = self.transport.call(req).await?;
        tracing::debug!(method, status = resp.status, bytes = resp.body.len(), "api call");
        Ok(resp)
    }

    async fn post<T: Serialize>(&self, method: &'static str, params: &T) -> Result<RawResponse> {
        self.call(ApiRequest::json(method, params)?).await
    }

    pub async fn get_me(&self) -> Result<User> {
        let resp = self.call(ApiRequest::new("getMe")).await?;
        read_result(&resp.body)
    }

    /// One fetch of pending updates. The transport is told to allow for the
    /// long-poll wait on top of its own timeout.
    pub async fn get_updates(&self, params: &GetUpdates) -> Result<Vec<Update>> {
        let req = ApiRequest::json("getUpdates", params)?
            .with_long_poll(Duration::from_secs(u64::from(params.timeout)));
        let resp = self.call(req).await?;
        read_result_list(&resp.body)
    }

    pub async fn send_message(&self, params: &SendMessage) -> Result<SentMessage> {
        let resp = self.post("sendMessage", params).await?;
        read_result(&resp.body)
    }

    pub async fn edit_message_text(&self, params: &EditMessageText) -> Result<()> {
        let resp = self.post("editMessageText", params).await?;
        ensure_ok(&resp.body)
    }

    pub async fn edit_message_caption(
        &self,
        chat_id: impl Into<ChatId>,
        message_id: MessageId,
        caption: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Params<'a> {
            chat_id: ChatId,
            message_id: MessageId,
            caption: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<ParseMode>,
        }

        let params = Params {
            chat_id: chat_id.into(),
            message_id,
            caption,
            parse_mode,
        };
        let resp = self.post("editMessageCaption", &params).await?;
        ensure_ok(&resp.body)
    }

    pub async fn edit_inline_keyboard(
        &self,
        chat_id: impl Into<ChatId>,
        message_id: MessageId,
        markup: &InlineKeyboardMarkup,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Params<'a> {
            chat_id: ChatId,
            message_id: MessageId,
            reply_markup: &'a InlineKeyboardMarkup,
        }

        let params = Params {
            chat_id: chat_id.into(),
            message_id,
            reply_markup: markup,
        };
        let resp = self.post("editMessageReplyMarkup", &params).await?;
        ensure_ok(&resp.body)
    }

    /// Drop the inline keyboard of a message.
    ///
    /// A 400 answer (message gone, or no keyboard to remove) counts as done.
    pub async fn remove_inline_keyboard(
        &self,
        chat_id: impl Into<ChatId>,
        message_id: MessageId,
    ) -> Result<()> {
        let chat_id = chat_id.into();
        let params = MessageRef {
            chat_id: &chat_id,
            message_id,
        };
        let resp = self.post("editMessageReplyMarkup", &params).await?;
        match ensure_ok(&resp.body) {
            Err(err) if err.is_api_code(400) => {
                tracing::debug!(%chat_id, %message_id, error = %err, "keyboard already gone");
                Ok(())
            }
            other => other,
        }
    }

    pub async fn delete_message(
        &self,
        chat_id: impl Into<ChatId>,
        message_id: MessageId,
    ) -> Result<()> {
        let chat_id = chat_id.into();
        let params = MessageRef {
            chat_id: &chat_id,
            message_id,
        };
        let resp = self.post("deleteMessage", &params).await?;
        ensure_ok(&resp.body)
    }

    pub async fn answer_callback_query(&self, params: &AnswerCallbackQuery) -> Result<()> {
        let resp = self.post("answerCallbackQuery", params).await?;
        ensure_ok(&resp.body)
    }

    pub async fn send_sticker(&self, params: &SendMedia) -> Result<SentMessage> {
        let resp = self.call(params.request("sendSticker", "sticker")?).await?;
        read_result(&resp.body)
    }

    pub async fn send_photo(&self, params: &SendMedia) -> Result<SentMessage> {
        let resp = self.call(params.request("sendPhoto", "photo")?).await?;
        read_result(&resp.body)
    }

    pub async fn send_document(&self, params: &SendMedia) -> Result<SentMessage> {
        let resp = self.call(params.request("sendDocument", "document")?).await?;
        read_result(&resp.body)
    }

    pub async fn get_sticker_set(&self, name: &str) -> Result<StickerSet> {
        #[derive(Serialize)]
        struct Params<'a> {
            name: &'a str,
        }

        let resp = self.post("getStickerSet", &Params { name }).await?;
        read_result(&resp.body)
    }

    pub async fn get_file(&self, file_id: &FileId) -> Result<File> {
        #[derive(Serialize)]
        struct Params<'a> {
            file_id: &'a FileId,
        }

        let resp = self.post("getFile", &Params { file_id }).await?;
        read_result(&resp.body)
    }

    /// Fetch the bytes behind a `File::file_path`.
    ///
    /// Error answers carry the usual envelope and are reported as such.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        if file_path.trim().is_empty() {
            return Err(Error::InvalidArgument("file_path is empty".to_string()));
        }
        let resp = self.transport.download(file_path).await?;
        if resp.is_success() {
            return Ok(resp.body);
        }
        ensure_ok(&resp.body)?;
        Err(Error::Transport(format!(
            "download of {file_path} failed with status {}",
            resp.status
        )))
    }

    pub async fn set_webhook(&self, params: &SetWebhook) -> Result<()> {
        let req = match &params.certificate {
            None => ApiRequest::json("setWebhook", params)?,
            Some(cert) => {
                let mut parts = form_fields(params)?;
                parts.push(cert.to_form_part("certificate"));
                ApiRequest::form("setWebhook", parts)
            }
        };
        let resp = self.call(req).await?;
        ensure_ok(&resp.body)
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        #[derive(Serialize)]
        struct Params {
            drop_pending_updates: bool,
        }

        let resp = self
            .post("deleteWebhook", &Params { drop_pending_updates })
            .await?;
        ensure_ok(&resp.body)
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        let resp = self.call(ApiRequest::new("getWebhookInfo")).await?;
        read_result(&resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UserId,
        ports::{FormPart, FormValue},
        testing::ScriptedTransport,
        types::UpdatePayload,
    };
    use serde_json::json;

    fn client() -> (Arc<ScriptedTransport>, BotClient) {
        let transport = ScriptedTransport::new();
        (transport.clone(), BotClient::new(transport))
    }

    #[tokio::test]
    async fn get_me_is_a_bodiless_call() {
        let (t, bot) = client();
        t.reply_ok(r#"{"id":7,"is_bot":true,"first_name":"Echo","username":"echo_bot"}"#);

        let me = bot.get_me().await.unwrap();
        assert_eq!(me.id, UserId(7));
        assert_eq!(me.to_string(), "@echo_bot (ID 7)");
        assert_eq!(t.methods(), vec!["getMe"]);
        assert_eq!(t.requests()[0].body, None);
    }

    #[tokio::test]
    async fn get_updates_sends_the_wire_body_and_long_poll_hint() {
        let (t, bot) = client();
        t.reply_ok(r#"[{"update_id":100,"message":{"message_id":1,"text":"hi"}}]"#);

        let params = GetUpdates {
            offset: 100,
            timeout: 30,
            ..GetUpdates::default()
        };
        let batch = bot.get_updates(&params).await.unwrap();

        assert_eq!(t.bodies(), vec![r#"{"offset":100,"limit":100,"timeout":30}"#]);
        assert_eq!(t.requests()[0].long_poll, Duration::from_secs(30));
        assert_eq!(batch.len(), 1);
        assert!(matches!(batch[0].payload, UpdatePayload::Message(_)));
    }

    #[tokio::test]
    async fn send_message_omits_unset_options() {
        let (t, bot) = client();
        t.reply_ok(r#"{"message_id":55,"chat":{"id":1,"type":"private"},"date":1,"text":"x"}"#);

        let sent = bot
            .send_message(&SendMessage::new(1, "x").parse_mode(ParseMode::Html))
            .await
            .unwrap();

        assert_eq!(sent.message_id, MessageId(55));
        assert_eq!(t.last_body(), json!({"chat_id": 1, "text": "x", "parse_mode": "HTML"}));
    }

    #[tokio::test]
    async fn api_errors_surface_verbatim() {
        let (t, bot) = client();
        t.reply(403, r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#);

        let err = bot.send_message(&SendMessage::new(1, "x")).await.unwrap_err();
        assert!(err.is_api_code(403));
        assert!(err.to_string().contains("bot was blocked"));
    }

    #[tokio::test]
    async fn removing_a_missing_keyboard_is_not_an_error() {
        let (t, bot) = client();
        t.reply(400, r#"{"ok":false,"error_code":400,"description":"Bad Request: message is not modified"}"#);
        t.reply(403, r#"{"ok":false,"error_code":403,"description":"Forbidden"}"#);

        bot.remove_inline_keyboard(1, MessageId(2)).await.unwrap();
        assert_eq!(t.last_body(), json!({"chat_id": 1, "message_id": 2}));

        let err = bot.remove_inline_keyboard(1, MessageId(2)).await.unwrap_err();
        assert!(err.is_api_code(403));
    }

    #[tokio::test]
    async fn delete_message_keeps_400_as_an_error() {
        let (t, bot) = client();
        t.reply(400, r#"{"ok":false,"error_code":400,"description":"Bad Request: message to delete not found"}"#);

        let err = bot.delete_message("@chan", MessageId(9)).await.unwrap_err();
        assert!(err.is_api_code(400));
        assert_eq!(t.last_body(), json!({"chat_id": "@chan", "message_id": 9}));
    }

    #[tokio::test]
    async fn media_field_name_follows_the_method() {
        let (t, bot) = client();
        t.reply_ok(r#"{"message_id":1}"#);
        t.reply_ok(r#"{"message_id":2}"#);
        t.reply_ok(r#"{"message_id":3}"#);

        let photo = SendMedia::new(5, InputFile::url("https://x/p.png")).caption("<b>c</b>", ParseMode::Html);
        bot.send_photo(&photo).await.unwrap();
        assert_eq!(
            t.last_body(),
            json!({"chat_id": 5, "photo": "https://x/p.png", "caption": "<b>c</b>", "parse_mode": "HTML"})
        );

        bot.send_document(&SendMedia::new(5, InputFile::id("BQAD"))).await.unwrap();
        assert_eq!(t.last_body(), json!({"chat_id": 5, "document": "BQAD"}));

        let sent = bot
            .send_sticker(&SendMedia::new(5, InputFile::id("CAAD")).reply_to(MessageId(4)))
            .await
            .unwrap();
        assert_eq!(sent.message_id, MessageId(3));
        assert_eq!(
            t.last_body(),
            json!({"chat_id": 5, "sticker": "CAAD", "reply_to_message_id": 4})
        );
        assert_eq!(t.methods(), vec!["sendPhoto", "sendDocument", "sendSticker"]);
    }

    #[tokio::test]
    async fn send_message_options() {
        let (t, bot) = client();
        t.reply_ok(r#"{"message_id":56}"#);

        bot.send_message(&SendMessage::new(1, "see https://x").without_link_preview().silent())
            .await
            .unwrap();
        assert_eq!(
            t.last_body(),
            json!({"chat_id": 1, "text": "see https://x", "disable_web_page_preview": true, "disable_notification": true})
        );
    }

    #[tokio::test]
    async fn uploads_go_out_as_multipart() {
        let (t, bot) = client();
        t.reply_ok(r#"{"message_id":8}"#);
        t.reply_ok(r#"{"message_id":9}"#);

        let photo = SendMedia::new(5, InputFile::upload("cat.png", vec![0x89, b'P']))
            .caption("a cat", ParseMode::Html)
            .reply_markup(InlineKeyboardMarkup::column([InlineKeyboardButton::callback("pet", "p")]));
        let sent = bot.send_photo(&photo).await.unwrap();
        assert_eq!(sent.message_id, MessageId(8));

        let form = t.last_form();
        assert_eq!(t.bodies(), vec![String::new()]);
        let text = |name: &str| {
            form.iter()
                .find(|p| p.name == name)
                .and_then(|p| p.as_text())
                .map(str::to_string)
        };
        assert_eq!(text("chat_id").as_deref(), Some("5"));
        assert_eq!(text("caption").as_deref(), Some("a cat"));
        assert_eq!(text("parse_mode").as_deref(), Some("HTML"));
        let markup: serde_json::Value =
            serde_json::from_str(&text("reply_markup").unwrap()).unwrap();
        assert_eq!(
            markup,
            json!({"inline_keyboard": [[{"text": "pet", "callback_data": "p"}]]})
        );
        let file = form.iter().find(|p| p.name == "photo").unwrap();
        assert_eq!(
            file.value,
            FormValue::File {
                file_name: "cat.png".to_string(),
                bytes: vec![0x89, b'P']
            }
        );
        assert_eq!(form.iter().filter(|p| p.name == "photo").count(), 1);

        bot.send_document(&SendMedia::new("@chan", InputFile::upload("a.txt", b"x".to_vec())).silent())
            .await
            .unwrap();
        let form = t.last_form();
        assert!(form.contains(&FormPart::text("chat_id", "@chan")));
        assert!(form.contains(&FormPart::text("disable_notification", "true")));
        assert!(form.contains(&FormPart::file("document", "a.txt", b"x".to_vec())));
        assert_eq!(t.methods(), vec!["sendPhoto", "sendDocument"]);
    }

    #[tokio::test]
    async fn webhook_certificate_is_uploaded() {
        let (t, bot) = client();
        t.reply_ok("true");

        bot.set_webhook(&SetWebhook {
            url: "https://bot.example/hook".to_string(),
            certificate: Some(InputFile::upload("cert.pem", b"-----BEGIN".to_vec())),
            ip_address: Some("203.0.113.7".to_string()),
            max_connections: Some(40),
            allowed_updates: Some(vec![UpdateKind::Message, UpdateKind::CallbackQuery]),
            ..SetWebhook::default()
        })
        .await
        .unwrap();

        let form = t.last_form();
        assert!(form.contains(&FormPart::text("url", "https://bot.example/hook")));
        assert!(form.contains(&FormPart::text("ip_address", "203.0.113.7")));
        assert!(form.contains(&FormPart::text("max_connections", "40")));
        assert!(form.contains(&FormPart::text(
            "allowed_updates",
            r#"["message","callback_query"]"#
        )));
        assert!(form.contains(&FormPart::file("certificate", "cert.pem", b"-----BEGIN".to_vec())));
        assert_eq!(form.len(), 5);
    }

    #[tokio::test]
    async fn edits_and_callback_answers() {
        let (t, bot) = client();
        t.reply_ok("true");
        t.reply_ok(r#"{"message_id":3,"date":0}"#);
        t.reply_ok("true");
        t.reply_ok("true");

        bot.edit_message_text(&EditMessageText::new(1, MessageId(3), "new"))
            .await
            .unwrap();
        assert_eq!(t.last_body(), json!({"chat_id": 1, "message_id": 3, "text": "new"}));

        bot.edit_message_caption(1, MessageId(3), "cap", None).await.unwrap();
        assert_eq!(t.last_body(), json!({"chat_id": 1, "message_id": 3, "caption": "cap"}));

        let kb = InlineKeyboardMarkup::column([InlineKeyboardButton::callback("ok", "1")]);
        bot.edit_inline_keyboard(1, MessageId(3), &kb).await.unwrap();
        assert_eq!(
            t.last_body(),
            json!({"chat_id": 1, "message_id": 3, "reply_markup": {"inline_keyboard": [[{"text": "ok", "callback_data": "1"}]]}})
        );

        bot.answer_callback_query(&AnswerCallbackQuery::new("q1").text("done"))
            .await
            .unwrap();
        assert_eq!(t.last_body(), json!({"callback_query_id": "q1", "text": "done"}));
    }

    #[tokio::test]
    async fn files_and_sticker_sets() {
        let (t, bot) = client();
        t.reply_ok(r#"{"file_id":"F","file_unique_id":"U","file_size":3,"file_path":"docs/a.txt"}"#);
        t.reply(200, "abc");
        t.reply_ok(r#"{"name":"pack","title":"Pack","sticker_type":"regular","stickers":[{"file_id":"s","file_unique_id":"su","type":"regular"}]}"#);

        let file = bot.get_file(&FileId::from("F")).await.unwrap();
        assert_eq!(t.last_body(), json!({"file_id": "F"}));
        let path = file.file_path.unwrap();

        let bytes = bot.download_file(&path).await.unwrap();
        assert_eq!(bytes, b"abc");
        assert_eq!(t.downloads(), vec!["docs/a.txt"]);

        let set = bot.get_sticker_set("pack").await.unwrap();
        assert_eq!(set.stickers.len(), 1);
        assert_eq!(t.last_body(), json!({"name": "pack"}));
    }

    #[tokio::test]
    async fn failed_download_reads_the_envelope() {
        let (t, bot) = client();
        t.reply(404, r#"{"ok":false,"error_code":404,"description":"Not Found"}"#);
        t.reply(502, "<html>bad gateway</html>");

        let err = bot.download_file("x").await.unwrap_err();
        assert!(err.is_api_code(404));

        let err = bot.download_file("x").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        assert!(matches!(
            bot.download_file(" ").await.unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn webhook_management() {
        let (t, bot) = client();
        t.reply_ok("true");
        t.reply_ok(r#"{"url":"https://bot.example/hook","has_custom_certificate":false,"pending_update_count":2}"#);
        t.reply_ok("true");

        bot.set_webhook(&SetWebhook {
            url: "https://bot.example/hook".to_string(),
            ip_address: Some("203.0.113.7".to_string()),
            secret_token: Some("s3cr3t".to_string()),
            allowed_updates: Some(vec![UpdateKind::Message]),
            ..SetWebhook::default()
        })
        .await
        .unwrap();
        assert_eq!(
            t.last_body(),
            json!({"url": "https://bot.example/hook", "ip_address": "203.0.113.7", "secret_token": "s3cr3t", "allowed_updates": ["message"]})
        );

        let info = bot.get_webhook_info().await.unwrap();
        assert_eq!(info.pending_update_count, 2);

        bot.delete_webhook(true).await.unwrap();
        assert_eq!(t.last_body(), json!({"drop_pending_updates": true}));
        assert_eq!(t.methods(), vec!["setWebhook", "getWebhookInfo", "deleteWebhook"]);
    }

    #[tokio::test]
    async fn transport_failures_propagate() {
        let (t, bot) = client();
        t.fail(Error::Transport("connection reset".to_string()));
        assert!(matches!(bot.get_me().await.unwrap_err(), Error::Transport(_)));
    }
}
