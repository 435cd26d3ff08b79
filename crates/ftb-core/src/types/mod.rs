//! Entity registry: every record shape the API emits that this crate models.

mod callback;
mod chat;
mod file;
mod message;
mod sticker;
mod update;
mod user;
mod webhook_info;

pub use callback::CallbackQuery;
pub use chat::{Chat, ChatKind};
pub use file::{Document, File, PhotoSize};
pub use message::{Message, SentMessage};
pub use sticker::{Sticker, StickerSet, StickerType};
pub use update::{Update, UpdateKind, UpdatePayload};
pub use user::User;
pub use webhook_info::WebhookInfo;
