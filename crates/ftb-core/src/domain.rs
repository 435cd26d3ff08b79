use std::fmt;

use serde::{Serialize, Serializer};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Telegram message id (numeric, unique within a chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

/// Identifier used to download or reuse a file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(pub String);

/// Identifier stable over time and across bots; cannot be used to download.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileUniqueId(pub String);

/// Target chat: numeric id or `@username` of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FileUniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => id.fmt(f),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<UserId> for ChatId {
    fn from(id: UserId) -> Self {
        ChatId::Id(id.0)
    }
}

impl From<&str> for ChatId {
    fn from(name: &str) -> Self {
        ChatId::Username(name.to_string())
    }
}

impl From<String> for ChatId {
    fn from(name: String) -> Self {
        ChatId::Username(name)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        FileId(id.to_string())
    }
}

impl From<String> for FileId {
    fn from(id: String) -> Self {
        FileId(id)
    }
}

impl Serialize for ChatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChatId::Id(id) => serializer.serialize_i64(*id),
            ChatId::Username(name) => serializer.serialize_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_serializes_as_number_or_string() {
        assert_eq!(serde_json::to_string(&ChatId::from(-100)).unwrap(), "-100");
        assert_eq!(
            serde_json::to_string(&ChatId::from("@chan")).unwrap(),
            "\"@chan\""
        );
    }

    #[test]
    fn identifiers_compare_by_value() {
        assert_eq!(FileId::from("a"), FileId("a".to_string()));
        assert_ne!(ChatId::from(1), ChatId::from("1"));
        assert_eq!(ChatId::from(1).to_string(), ChatId::from("1").to_string());
    }
}
