use std::fmt;

use serde::de::MapAccess;

use crate::{
    decode::{first, first_lenient, required, Flag, Int, LenientStr, MissingField, Record},
    domain::UserId,
};

/// A Telegram user or bot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Default)]
pub struct UserBuilder {
    id: Option<i64>,
    is_bot: Option<bool>,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
}

impl Record for User {
    const NAME: &'static str = "User";
    type Builder = UserBuilder;

    fn accept<'de, A>(
        b: &mut UserBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "id" => first(&mut b.id, map, Int::new())?,
            "is_bot" => first_lenient(&mut b.is_bot, map, Flag)?,
            "first_name" => first_lenient(&mut b.first_name, map, LenientStr)?,
            "last_name" => first_lenient(&mut b.last_name, map, LenientStr)?,
            "username" => first_lenient(&mut b.username, map, LenientStr)?,
            "language_code" => first_lenient(&mut b.language_code, map, LenientStr)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: UserBuilder) -> std::result::Result<Self, MissingField> {
        Ok(User {
            id: UserId(required(b.id, "id")?),
            is_bot: b.is_bot.unwrap_or(false),
            first_name: b.first_name.unwrap_or_default(),
            last_name: b.last_name,
            username: b.username,
            language_code: b.language_code,
        })
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.username, &self.last_name) {
            (Some(username), _) => write!(f, "@{username} (ID {})", self.id),
            (None, Some(last)) => write!(f, "{} {last} (ID {})", self.first_name, self.id),
            (None, None) => write!(f, "{} (ID {})", self.first_name, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_record;

    #[test]
    fn decodes_minimal_user() {
        let u: User = decode_record(br#"{"id":42,"first_name":"A"}"#).unwrap();
        assert_eq!(u.id, UserId(42));
        assert_eq!(u.first_name, "A");
        assert!(!u.is_bot);
        assert_eq!(u.last_name, None);
    }

    #[test]
    fn duplicate_id_keeps_the_first() {
        let u: User = decode_record(br#"{"id":1,"first_name":"A","id":2}"#).unwrap();
        assert_eq!(u.id, UserId(1));
    }

    #[test]
    fn id_may_arrive_as_string() {
        let u: User = decode_record(br#"{"id":"77","first_name":"A"}"#).unwrap();
        assert_eq!(u.id, UserId(77));
    }

    #[test]
    fn non_numeric_id_fails() {
        assert!(decode_record::<User>(br#"{"id":"abc","first_name":"A"}"#).is_err());
        assert!(decode_record::<User>(br#"{"first_name":"A"}"#).is_err());
    }

    #[test]
    fn display_prefers_username_then_full_name() {
        let mut u: User =
            decode_record(br#"{"id":1,"first_name":"Ann","last_name":"Lee"}"#).unwrap();
        assert_eq!(u.to_string(), "Ann Lee (ID 1)");
        u.username = Some("ann".to_string());
        assert_eq!(u.to_string(), "@ann (ID 1)");
        u.username = None;
        u.last_name = None;
        assert_eq!(u.to_string(), "Ann (ID 1)");
    }
}
