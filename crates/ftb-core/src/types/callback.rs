use serde::de::MapAccess;

use crate::{
    decode::{first, first_lenient, required, LenientStr, MissingField, Record, RecordSeed, Str},
    types::{Message, User},
};

/// A press on an inline keyboard button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// Message with the button, if it is not too old.
    pub message: Option<Message>,
    pub inline_message_id: Option<String>,
    pub chat_instance: String,
    pub data: Option<String>,
}

#[derive(Default)]
pub struct CallbackQueryBuilder {
    id: Option<String>,
    from: Option<User>,
    message: Option<Message>,
    inline_message_id: Option<String>,
    chat_instance: Option<String>,
    data: Option<String>,
}

impl Record for CallbackQuery {
    const NAME: &'static str = "CallbackQuery";
    type Builder = CallbackQueryBuilder;

    fn accept<'de, A>(
        b: &mut CallbackQueryBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "id" => first(&mut b.id, map, Str)?,
            "from" => first(&mut b.from, map, RecordSeed::new())?,
            "message" => first(&mut b.message, map, RecordSeed::new())?,
            "inline_message_id" => first_lenient(&mut b.inline_message_id, map, LenientStr)?,
            "chat_instance" => first_lenient(&mut b.chat_instance, map, LenientStr)?,
            "data" => first_lenient(&mut b.data, map, LenientStr)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: CallbackQueryBuilder) -> std::result::Result<Self, MissingField> {
        Ok(CallbackQuery {
            id: required(b.id, "id")?,
            from: required(b.from, "from")?,
            message: b.message,
            inline_message_id: b.inline_message_id,
            chat_instance: b.chat_instance.unwrap_or_default(),
            data: b.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode::decode_record, domain::UserId};

    #[test]
    fn first_occurrence_of_each_field_wins() {
        let q: CallbackQuery = decode_record(
            br#"{"id":"q1","from":{"id":7,"first_name":"F"},"data":"yes","id":"q2","from":{"id":8},"data":"no","chat_instance":"ci"}"#,
        )
        .unwrap();
        assert_eq!(q.id, "q1");
        assert_eq!(q.from.id, UserId(7));
        assert_eq!(q.data.as_deref(), Some("yes"));
        assert_eq!(q.chat_instance, "ci");
    }

    #[test]
    fn sender_is_mandatory() {
        assert!(decode_record::<CallbackQuery>(br#"{"id":"q1","data":"x"}"#).is_err());
    }
}
