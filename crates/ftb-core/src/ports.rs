use std::time::Duration;

use async_trait::async_trait;

use crate::{errors::Error, Result};

/// One call to a bot API method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    /// Method name as it appears in the URL (`getUpdates`, `sendMessage`, ..).
    pub method: &'static str,
    /// `None` for parameterless calls.
    pub body: Option<RequestBody>,
    /// How long the service may hold the connection open on purpose.
    ///
    /// Transports add this on top of their own request timeout.
    pub long_poll: Duration,
}

impl ApiRequest {
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            body: None,
            long_poll: Duration::ZERO,
        }
    }

    pub fn json<T: serde::Serialize>(method: &'static str, body: &T) -> Result<Self> {
        Ok(Self {
            method,
            body: Some(RequestBody::Json(serde_json::to_vec(body)?)),
            long_poll: Duration::ZERO,
        })
    }

    /// Multipart request; used when a call carries file contents.
    pub fn form(method: &'static str, parts: Vec<FormPart>) -> Self {
        Self {
            method,
            body: Some(RequestBody::Form(parts)),
            long_poll: Duration::ZERO,
        }
    }

    pub fn with_long_poll(mut self, long_poll: Duration) -> Self {
        self.long_poll = long_poll;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// Serialized JSON object.
    Json(Vec<u8>),
    /// `multipart/form-data` fields, in order.
    Form(Vec<FormPart>),
}

/// One field of a multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

impl std::fmt::Debug for FormValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FormValue::File { file_name, bytes } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                bytes,
            },
        }
    }

    /// Text value of this part, `None` for file contents.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            FormValue::Text(s) => Some(s),
            FormValue::File { .. } => None,
        }
    }
}

/// Flatten a serializable parameter struct into text fields.
///
/// Strings go in verbatim, other values as their JSON text (`true`, `42`,
/// `["message"]`); absent (`null`) members are left out.
pub fn form_fields<T: serde::Serialize>(params: &T) -> Result<Vec<FormPart>> {
    let serde_json::Value::Object(members) = serde_json::to_value(params)? else {
        return Err(Error::InvalidArgument(
            "form parameters must serialize to an object".to_string(),
        ));
    };
    Ok(members
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, v)| match v {
            serde_json::Value::String(s) => FormPart::text(name, s),
            other => FormPart::text(name, other.to_string()),
        })
        .collect())
}

/// Status line and body of an HTTP answer, before the envelope is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Hexagonal port for reaching the bot API.
///
/// The HTTP adapter lives in `ftb-http`; tests script their own. A transport
/// reports non-2xx answers as a normal [`RawResponse`] so the envelope can be
/// read; only connection level failures are errors.
#[async_trait]
pub trait BotTransport: Send + Sync {
    async fn call(&self, req: ApiRequest) -> Result<RawResponse>;

    /// Fetch a file by the `file_path` the service handed out in a `File`.
    async fn download(&self, file_path: &str) -> Result<RawResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_fields_keep_strings_raw_and_encode_the_rest() {
        let parts = form_fields(&json!({
            "chat_id": 5,
            "caption": "a \"quoted\" caption",
            "allowed_updates": ["message"],
            "drop_pending_updates": true,
            "reply_to_message_id": null,
        }))
        .unwrap();

        let text: Vec<(&str, &str)> = parts
            .iter()
            .map(|p| (p.name.as_str(), p.as_text().unwrap()))
            .collect();
        assert!(text.contains(&("chat_id", "5")));
        assert!(text.contains(&("caption", "a \"quoted\" caption")));
        assert!(text.contains(&("allowed_updates", r#"["message"]"#)));
        assert!(text.contains(&("drop_pending_updates", "true")));
        assert_eq!(text.len(), 4);
    }

    #[test]
    fn form_fields_need_an_object() {
        assert!(matches!(
            form_fields(&[1, 2]).unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[test]
    fn file_parts_do_not_dump_their_bytes() {
        let part = FormPart::file("photo", "cat.png", vec![0u8; 4096]);
        assert_eq!(part.as_text(), None);
        let shown = format!("{part:?}");
        assert!(shown.contains("cat.png"));
        assert!(shown.contains("4096"));
    }
}
