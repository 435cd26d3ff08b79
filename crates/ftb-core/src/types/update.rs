use std::{fmt, str::FromStr};

use serde::{de::MapAccess, Serialize, Serializer};

use crate::{
    decode::{first, required, Int, MissingField, Record, RecordSeed},
    types::{CallbackQuery, Message},
};

/// Wire names of every update kind, as used by `allowed_updates`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
    PollAnswer,
    MyChatMember,
    ChatMember,
    ChatJoinRequest,
    Unknown,
}

impl UpdateKind {
    pub const ALL: [UpdateKind; 14] = [
        UpdateKind::Message,
        UpdateKind::EditedMessage,
        UpdateKind::ChannelPost,
        UpdateKind::EditedChannelPost,
        UpdateKind::InlineQuery,
        UpdateKind::ChosenInlineResult,
        UpdateKind::CallbackQuery,
        UpdateKind::ShippingQuery,
        UpdateKind::PreCheckoutQuery,
        UpdateKind::Poll,
        UpdateKind::PollAnswer,
        UpdateKind::MyChatMember,
        UpdateKind::ChatMember,
        UpdateKind::ChatJoinRequest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateKind::Message => "message",
            UpdateKind::EditedMessage => "edited_message",
            UpdateKind::ChannelPost => "channel_post",
            UpdateKind::EditedChannelPost => "edited_channel_post",
            UpdateKind::InlineQuery => "inline_query",
            UpdateKind::ChosenInlineResult => "chosen_inline_result",
            UpdateKind::CallbackQuery => "callback_query",
            UpdateKind::ShippingQuery => "shipping_query",
            UpdateKind::PreCheckoutQuery => "pre_checkout_query",
            UpdateKind::Poll => "poll",
            UpdateKind::PollAnswer => "poll_answer",
            UpdateKind::MyChatMember => "my_chat_member",
            UpdateKind::ChatMember => "chat_member",
            UpdateKind::ChatJoinRequest => "chat_join_request",
            UpdateKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdateKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown update kind: {s}"))
    }
}

impl Serialize for UpdateKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Payload of an update, decided by the first recognized kind key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdatePayload {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    CallbackQuery(CallbackQuery),
    /// A kind this crate does not model; its object was skipped.
    Unknown,
}

/// One incoming event with its service-assigned sequence id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub id: i64,
    pub payload: UpdatePayload,
}

impl Update {
    pub fn kind(&self) -> UpdateKind {
        match &self.payload {
            UpdatePayload::Message(_) => UpdateKind::Message,
            UpdatePayload::EditedMessage(_) => UpdateKind::EditedMessage,
            UpdatePayload::ChannelPost(_) => UpdateKind::ChannelPost,
            UpdatePayload::EditedChannelPost(_) => UpdateKind::EditedChannelPost,
            UpdatePayload::CallbackQuery(_) => UpdateKind::CallbackQuery,
            UpdatePayload::Unknown => UpdateKind::Unknown,
        }
    }

    /// The message carried by any of the message-like kinds.
    pub fn message(&self) -> Option<&Message> {
        match &self.payload {
            UpdatePayload::Message(m)
            | UpdatePayload::EditedMessage(m)
            | UpdatePayload::ChannelPost(m)
            | UpdatePayload::EditedChannelPost(m) => Some(m),
            _ => None,
        }
    }

    pub fn callback_query(&self) -> Option<&CallbackQuery> {
        match &self.payload {
            UpdatePayload::CallbackQuery(q) => Some(q),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct UpdateBuilder {
    id: Option<i64>,
    payload: Option<UpdatePayload>,
}

impl UpdateBuilder {
    fn message<'de, A>(
        &mut self,
        map: &mut A,
        wrap: fn(Message) -> UpdatePayload,
    ) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let message = map.next_value_seed(RecordSeed::<Message>::new())?;
        self.payload = Some(wrap(message));
        Ok(())
    }
}

impl Record for Update {
    const NAME: &'static str = "Update";
    type Builder = UpdateBuilder;

    fn accept<'de, A>(
        b: &mut UpdateBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        if key == "update_id" {
            first(&mut b.id, map, Int::new())?;
            return Ok(true);
        }
        // Only one payload per update; later kind keys are skipped.
        if b.payload.is_some() {
            return Ok(false);
        }
        match key {
            "message" => b.message(map, UpdatePayload::Message)?,
            "edited_message" => b.message(map, UpdatePayload::EditedMessage)?,
            "channel_post" => b.message(map, UpdatePayload::ChannelPost)?,
            "edited_channel_post" => b.message(map, UpdatePayload::EditedChannelPost)?,
            "callback_query" => {
                let query = map.next_value_seed(RecordSeed::<CallbackQuery>::new())?;
                b.payload = Some(UpdatePayload::CallbackQuery(query));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: UpdateBuilder) -> std::result::Result<Self, MissingField> {
        Ok(Update {
            id: required(b.id, "update_id")?,
            payload: b.payload.unwrap_or(UpdatePayload::Unknown),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode::decode_record, domain::UserId};

    #[test]
    fn message_update() {
        let u: Update = decode_record(
            br#"{"update_id":101,"message":{"message_id":1,"from":{"id":42,"first_name":"A"},"date":0,"text":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(u.id, 101);
        assert_eq!(u.kind(), UpdateKind::Message);
        let m = u.message().unwrap();
        assert_eq!(m.text.as_deref(), Some("hi"));
        assert_eq!(m.from.as_ref().unwrap().id, UserId(42));
    }

    #[test]
    fn unmodeled_kind_is_unknown_and_fully_skipped() {
        let u: Update = decode_record(
            br#"{"update_id":7,"poll":{"id":"p","options":[{"text":"a","voter_count":1}],"question":{"q":[1,2,{"x":{}}]}}}"#,
        )
        .unwrap();
        assert_eq!(u.id, 7);
        assert_eq!(u.kind(), UpdateKind::Unknown);
        assert_eq!(u.payload, UpdatePayload::Unknown);
    }

    #[test]
    fn callback_query_update() {
        let u: Update = decode_record(
            br#"{"callback_query":{"id":"c","from":{"id":3,"first_name":"B"},"data":"go"},"update_id":8}"#,
        )
        .unwrap();
        assert_eq!(u.kind(), UpdateKind::CallbackQuery);
        assert_eq!(u.callback_query().unwrap().data.as_deref(), Some("go"));
        assert!(u.message().is_none());
    }

    #[test]
    fn second_kind_key_is_ignored() {
        let u: Update = decode_record(
            br#"{"update_id":9,"edited_message":{"message_id":2},"message":{"message_id":3}}"#,
        )
        .unwrap();
        assert_eq!(u.kind(), UpdateKind::EditedMessage);
        assert_eq!(u.message().unwrap().id.0, 2);
    }

    #[test]
    fn update_id_is_mandatory() {
        assert!(decode_record::<Update>(br#"{"message":{"message_id":2}}"#).is_err());
        assert!(decode_record::<Update>(br#"{"update_id":"x"}"#).is_err());
    }

    #[test]
    fn kinds_round_trip_through_wire_names() {
        for kind in UpdateKind::ALL {
            assert_eq!(kind.as_str().parse::<UpdateKind>().unwrap(), kind);
        }
        assert!("unknown".parse::<UpdateKind>().is_err());
        assert_eq!(
            serde_json::to_string(&[UpdateKind::Message, UpdateKind::CallbackQuery]).unwrap(),
            r#"["message","callback_query"]"#
        );
    }
}
