use serde::de::MapAccess;

use crate::decode::{first, first_lenient, required, Int, LenientStr, MissingField, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    Unknown,
}

impl ChatKind {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "private" => ChatKind::Private,
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Unknown,
        }
    }
}

/// The chat a message belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatKind,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Default)]
pub struct ChatBuilder {
    id: Option<i64>,
    kind: Option<String>,
    title: Option<String>,
    username: Option<String>,
    first_name: Option<String>,
}

impl Record for Chat {
    const NAME: &'static str = "Chat";
    type Builder = ChatBuilder;

    fn accept<'de, A>(
        b: &mut ChatBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "id" => first(&mut b.id, map, Int::new())?,
            "type" => first_lenient(&mut b.kind, map, LenientStr)?,
            "title" => first_lenient(&mut b.title, map, LenientStr)?,
            "username" => first_lenient(&mut b.username, map, LenientStr)?,
            "first_name" => first_lenient(&mut b.first_name, map, LenientStr)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: ChatBuilder) -> std::result::Result<Self, MissingField> {
        Ok(Chat {
            id: required(b.id, "id")?,
            kind: b
                .kind
                .as_deref()
                .map(ChatKind::from_wire)
                .unwrap_or(ChatKind::Unknown),
            title: b.title,
            username: b.username,
            first_name: b.first_name,
        })
    }
}
