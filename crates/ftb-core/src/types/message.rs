use chrono::{DateTime, Utc};
use serde::de::MapAccess;

use crate::{
    decode::{
        first, first_lenient, list_of, required, Int, LenientStr, MissingField, Record,
        RecordSeed, Timestamp,
    },
    domain::MessageId,
    types::{Chat, Document, PhotoSize, Sticker, User},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    /// Absent for messages sent to channels.
    pub from: Option<User>,
    pub chat: Option<Chat>,
    pub date: DateTime<Utc>,
    pub edit_date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub document: Option<Document>,
    pub sticker: Option<Sticker>,
    /// Available sizes of an attached photo, smallest first.
    pub photo: Vec<PhotoSize>,
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    /// Chat to answer in: the chat itself, or the sender for chat-less payloads.
    pub fn reply_target(&self) -> Option<i64> {
        self.chat
            .as_ref()
            .map(|c| c.id)
            .or_else(|| self.from.as_ref().map(|u| u.id.0))
    }
}

#[derive(Default)]
pub struct MessageBuilder {
    id: Option<i64>,
    from: Option<User>,
    chat: Option<Chat>,
    date: Option<DateTime<Utc>>,
    edit_date: Option<DateTime<Utc>>,
    text: Option<String>,
    caption: Option<String>,
    document: Option<Document>,
    sticker: Option<Sticker>,
    photo: Option<Vec<PhotoSize>>,
    reply_to_message: Option<Message>,
}

impl Record for Message {
    const NAME: &'static str = "Message";
    type Builder = MessageBuilder;

    fn accept<'de, A>(
        b: &mut MessageBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "message_id" => first(&mut b.id, map, Int::new())?,
            "from" => first(&mut b.from, map, RecordSeed::new())?,
            "chat" => first(&mut b.chat, map, RecordSeed::new())?,
            "date" => first_lenient(&mut b.date, map, Timestamp)?,
            "edit_date" => first_lenient(&mut b.edit_date, map, Timestamp)?,
            "text" => first_lenient(&mut b.text, map, LenientStr)?,
            "caption" => first_lenient(&mut b.caption, map, LenientStr)?,
            "document" => first(&mut b.document, map, RecordSeed::new())?,
            "sticker" => first(&mut b.sticker, map, RecordSeed::new())?,
            "photo" => first(&mut b.photo, map, list_of::<PhotoSize>())?,
            "reply_to_message" => first(&mut b.reply_to_message, map, RecordSeed::new())?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: MessageBuilder) -> std::result::Result<Self, MissingField> {
        Ok(Message {
            id: MessageId(required(b.id, "message_id")?),
            from: b.from,
            chat: b.chat,
            date: b.date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            edit_date: b.edit_date,
            text: b.text,
            caption: b.caption,
            document: b.document,
            sticker: b.sticker,
            photo: b.photo.unwrap_or_default(),
            reply_to_message: b.reply_to_message.map(Box::new),
        })
    }
}

/// Result of send methods: only the id of the message that was sent.
///
/// Decoding a full `Message` payload into this record skips everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SentMessage {
    pub message_id: MessageId,
}

#[derive(Default)]
pub struct SentMessageBuilder {
    message_id: Option<i64>,
}

impl Record for SentMessage {
    const NAME: &'static str = "MessageId";
    type Builder = SentMessageBuilder;

    fn accept<'de, A>(
        b: &mut SentMessageBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        if key != "message_id" {
            return Ok(false);
        }
        first(&mut b.message_id, map, Int::new())?;
        Ok(true)
    }

    fn finish(b: SentMessageBuilder) -> std::result::Result<Self, MissingField> {
        Ok(SentMessage {
            message_id: MessageId(required(b.message_id, "message_id")?),
        })
    }
}
