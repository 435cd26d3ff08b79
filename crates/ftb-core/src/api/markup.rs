use std::{fmt, path::Path};

use serde::Serialize;

use crate::{
    domain::FileId,
    ports::FormPart,
    Result,
};

/// Text formatting applied by the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[default]
    #[serde(rename = "HTML")]
    Html,
    MarkdownV2,
    Markdown,
}

/// Media reference: a `file_id` already stored by the service, a URL it
/// should fetch on its own, or file contents sent along with the request.
///
/// Only `Id` and `Url` have a JSON form; calls carrying an `Upload` go out as
/// multipart.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InputFile {
    Id(FileId),
    Url(String),
    #[serde(skip_serializing)]
    Upload { file_name: String, bytes: Vec<u8> },
}

impl InputFile {
    pub fn id(id: impl Into<FileId>) -> Self {
        InputFile::Id(id.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        InputFile::Url(url.into())
    }

    pub fn upload(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        InputFile::Upload {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a local file for upload, named after its last path component.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("file")
            .to_string();
        Ok(Self::upload(file_name, bytes))
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, InputFile::Upload { .. })
    }

    /// Multipart field named `field` carrying this file.
    pub fn to_form_part(&self, field: &str) -> FormPart {
        match self {
            InputFile::Id(id) => FormPart::text(field, id.0.as_str()),
            InputFile::Url(url) => FormPart::text(field, url.as_str()),
            InputFile::Upload { file_name, bytes } => {
                FormPart::file(field, file_name.as_str(), bytes.clone())
            }
        }
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFile::Id(id) => f.debug_tuple("Id").field(id).finish(),
            InputFile::Url(url) => f.debug_tuple("Url").field(url).finish(),
            InputFile::Upload { file_name, bytes } => f
                .debug_struct("Upload")
                .field("file_name", file_name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn new(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }

    /// One button per row.
    pub fn column(buttons: impl IntoIterator<Item = InlineKeyboardButton>) -> Self {
        Self::new(buttons.into_iter().map(|b| vec![b]).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Custom keyboard shown in place of the user's own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_time_keyboard: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardRemove {
    remove_keyboard: bool,
}

impl Default for ReplyKeyboardRemove {
    fn default() -> Self {
        Self {
            remove_keyboard: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

impl From<InlineKeyboardMarkup> for ReplyMarkup {
    fn from(m: InlineKeyboardMarkup) -> Self {
        ReplyMarkup::Inline(m)
    }
}

impl From<ReplyKeyboardMarkup> for ReplyMarkup {
    fn from(m: ReplyKeyboardMarkup) -> Self {
        ReplyMarkup::Keyboard(m)
    }
}

impl From<ReplyKeyboardRemove> for ReplyMarkup {
    fn from(m: ReplyKeyboardRemove) -> Self {
        ReplyMarkup::Remove(m)
    }
}
