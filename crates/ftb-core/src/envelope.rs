//! The uniform `{"ok": .., "result": ..}` / `{"ok": false, "error_code": ..}`
//! wrapper around every API response body.

use std::{fmt, marker::PhantomData};

use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};

use crate::{
    decode::{
        decode_with, first_lenient, list_of, Flag, LenientInt, LenientStr, Record, RecordSeed,
    },
    errors::Error,
    Result,
};

/// What the envelope turned out to hold.
enum Outcome<T> {
    Ok(Option<T>),
    Failed {
        code: Option<i32>,
        description: Option<String>,
    },
}

struct EnvelopeVisitor<S> {
    /// `None` when the caller only wants the `ok` flag.
    seed: Option<S>,
}

impl<'de, S> DeserializeSeed<'de> for EnvelopeVisitor<S>
where
    S: DeserializeSeed<'de>,
{
    type Value = Outcome<S::Value>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de, S> Visitor<'de> for EnvelopeVisitor<S>
where
    S: DeserializeSeed<'de>,
{
    type Value = Outcome<S::Value>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an API response object")
    }

    fn visit_map<A>(mut self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut ok: Option<bool> = None;
        let mut code: Option<i32> = None;
        let mut description: Option<String> = None;
        let mut result: Option<S::Value> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "ok" => first_lenient(&mut ok, &mut map, Flag)?,
                "error_code" => first_lenient(&mut code, &mut map, LenientInt::new())?,
                "description" => first_lenient(&mut description, &mut map, LenientStr)?,
                // The payload is only materialized once; a service that
                // reports failure never sends one.
                "result" => match self.seed.take() {
                    Some(seed) if ok != Some(false) => {
                        result = Some(map.next_value_seed(seed)?);
                    }
                    _ => {
                        map.next_value::<IgnoredAny>()?;
                    }
                },
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        if ok == Some(true) {
            Ok(Outcome::Ok(result))
        } else {
            Ok(Outcome::Failed { code, description })
        }
    }
}

fn into_api_error(code: Option<i32>, description: Option<String>) -> Error {
    Error::Api {
        code: code.unwrap_or(0),
        description: description.unwrap_or_default(),
    }
}

/// Decode the `result` payload with `seed`, or fail with the service's error.
pub fn read_result_with<'de, S>(body: &'de [u8], seed: S) -> Result<S::Value>
where
    S: DeserializeSeed<'de>,
{
    match decode_with(body, EnvelopeVisitor { seed: Some(seed) })? {
        Outcome::Ok(Some(value)) => Ok(value),
        Outcome::Ok(None) => Err(Error::Decode(serde::de::Error::missing_field("result"))),
        Outcome::Failed { code, description } => Err(into_api_error(code, description)),
    }
}

/// Decode a single record from the `result` payload.
pub fn read_result<R: Record>(body: &[u8]) -> Result<R> {
    read_result_with(body, RecordSeed::<R>::new())
}

/// Decode an array of records from the `result` payload.
pub fn read_result_list<R: Record>(body: &[u8]) -> Result<Vec<R>> {
    read_result_with(body, list_of::<R>())
}

/// Decode a plain serde value (`true`, a number, ..) from the `result` payload.
pub fn read_result_value<T>(body: &[u8]) -> Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    read_result_with(body, PhantomData::<T>)
}

/// Check only the `ok` flag; the payload, if any, is skipped.
pub fn ensure_ok(body: &[u8]) -> Result<()> {
    match decode_with(body, EnvelopeVisitor::<PhantomData<IgnoredAny>> { seed: None })? {
        Outcome::Ok(_) => Ok(()),
        Outcome::Failed { code, description } => Err(into_api_error(code, description)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decode::decode_record,
        domain::UserId,
        types::{Update, User},
    };

    #[test]
    fn ok_result_equals_direct_decoding() {
        let inner = br#"{"id":42,"first_name":"A","is_bot":true,"can_join_groups":true}"#;
        let mut body = br#"{"ok":true,"result":"#.to_vec();
        body.extend_from_slice(inner);
        body.push(b'}');

        let via_envelope: User = read_result(&body).unwrap();
        let direct: User = decode_record(inner).unwrap();
        assert_eq!(via_envelope, direct);
        assert_eq!(via_envelope.id, UserId(42));
    }

    #[test]
    fn failure_carries_code_and_description() {
        let err = read_result::<User>(
            br#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#,
        )
        .unwrap_err();
        match err {
            Error::Api { code, description } => {
                assert_eq!(code, 401);
                assert_eq!(description, "Unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fields_may_precede_the_flag() {
        let body = br#"{"description":"Bad Request: message to delete not found","error_code":400,"ok":false}"#;
        let err = ensure_ok(body).unwrap_err();
        assert!(err.is_api_code(400));
        assert!(err.to_string().contains("message to delete not found"));
    }

    #[test]
    fn result_may_precede_the_flag() {
        let u: User = read_result(br#"{"result":{"id":5},"ok":true}"#).unwrap();
        assert_eq!(u.id, UserId(5));
    }

    #[test]
    fn absent_code_and_description_default() {
        let err = ensure_ok(br#"{"ok":false}"#).unwrap_err();
        match err {
            Error::Api { code, description } => {
                assert_eq!(code, 0);
                assert_eq!(description, "");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_flag_is_a_failure() {
        let err = read_result::<User>(br#"{"result":{"id":5}}"#).unwrap_err();
        assert!(err.is_api_code(0));
    }

    #[test]
    fn ok_without_result_is_a_decode_error() {
        let err = read_result::<User>(br#"{"ok":true}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(ensure_ok(br#"{"ok":true}"#).is_ok());
    }

    #[test]
    fn ensure_ok_skips_any_payload() {
        ensure_ok(br#"{"ok":true,"result":{"deep":[{"a":[1,2,3]}]}}"#).unwrap();
        ensure_ok(br#"{"ok":true,"result":true}"#).unwrap();
    }

    #[test]
    fn list_and_plain_values() {
        let updates: Vec<Update> =
            read_result_list(br#"{"ok":true,"result":[{"update_id":1},{"update_id":2}]}"#).unwrap();
        assert_eq!(updates.len(), 2);
        let flag: bool = read_result_value(br#"{"ok":true,"result":true}"#).unwrap();
        assert!(flag);
    }

    #[test]
    fn truncated_envelope_is_a_decode_error() {
        let err =
            read_result_list::<Update>(br#"{"ok":true,"result":[{"update_id":1},"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn broken_result_is_a_decode_error_not_an_api_error() {
        let err = read_result::<User>(br#"{"ok":true,"result":{"id":"x"}}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
