use std::{borrow::Cow, fmt, marker::PhantomData};

use chrono::{DateTime, Utc};
use serde::de::{
    self, Deserialize, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Unexpected,
    Visitor,
};

/// One JSON value as seen by a field reader.
///
/// Objects and arrays are drained on the spot and only remembered as
/// `Composite`, since no scalar field can make use of them.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar<'de> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(Cow<'de, str>),
    Composite,
}

impl<'de> Scalar<'de> {
    /// Integer view, accepting numbers and numeric-looking strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::UInt(v) => i64::try_from(*v).ok(),
            Scalar::Float(v) => {
                let in_range = *v >= i64::MIN as f64 && *v < i64::MAX as f64;
                (v.is_finite() && v.fract() == 0.0 && in_range).then_some(*v as i64)
            }
            Scalar::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::UInt(v) => Some(*v as f64),
            Scalar::Float(v) if v.is_finite() => Some(*v),
            Scalar::Str(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(v) => Some(*v),
            Scalar::Str(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Scalar::Str(s) => Some(s.into_owned()),
            _ => None,
        }
    }

    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Scalar::Null => Unexpected::Unit,
            Scalar::Bool(v) => Unexpected::Bool(*v),
            Scalar::Int(v) => Unexpected::Signed(*v),
            Scalar::UInt(v) => Unexpected::Unsigned(*v),
            Scalar::Float(v) => Unexpected::Float(*v),
            Scalar::Str(s) => Unexpected::Str(s),
            Scalar::Composite => Unexpected::Other("object or array"),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar<'de>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Scalar::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Scalar::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Scalar::Float(v))
    }

    fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> Result<Self::Value, E> {
        Ok(Scalar::Str(Cow::Borrowed(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Scalar::Str(Cow::Owned(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Scalar::Str(Cow::Owned(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Scalar::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Scalar::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Scalar::deserialize(deserializer)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Scalar::Composite)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Scalar::Composite)
    }
}

/// Mandatory integer; a number or a numeric string, anything else fails.
pub struct Int<T>(PhantomData<fn() -> T>);

impl<T> Int<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Int<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de, T: TryFrom<i64>> DeserializeSeed<'de> for Int<T> {
    type Value = T;

    fn deserialize<D>(self, deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Scalar::deserialize(deserializer)?;
        let Some(v) = raw.as_i64() else {
            return Err(de::Error::invalid_type(raw.unexpected(), &"an integer"));
        };
        T::try_from(v)
            .map_err(|_| de::Error::invalid_value(Unexpected::Signed(v), &"an integer in range"))
    }
}

/// Optional integer; unreadable values degrade to `None`.
pub struct LenientInt<T>(PhantomData<fn() -> T>);

impl<T> LenientInt<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for LenientInt<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de, T: TryFrom<i64>> DeserializeSeed<'de> for LenientInt<T> {
    type Value = Option<T>;

    fn deserialize<D>(self, deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Scalar::deserialize(deserializer)?;
        Ok(raw.as_i64().and_then(|v| T::try_from(v).ok()))
    }
}

/// Mandatory string. Bare numbers are accepted in their decimal form.
#[derive(Clone, Copy, Debug, Default)]
pub struct Str;

impl<'de> DeserializeSeed<'de> for Str {
    type Value = String;

    fn deserialize<D>(self, deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Scalar::deserialize(deserializer)? {
            Scalar::Str(s) => Ok(s.into_owned()),
            Scalar::Int(v) => Ok(v.to_string()),
            Scalar::UInt(v) => Ok(v.to_string()),
            other => Err(de::Error::invalid_type(other.unexpected(), &"a string")),
        }
    }
}

/// Optional string; `null` and non-strings degrade to `None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LenientStr;

impl<'de> DeserializeSeed<'de> for LenientStr {
    type Value = Option<String>;

    fn deserialize<D>(self, deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Scalar::deserialize(deserializer)?.into_string())
    }
}

/// Optional boolean.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flag;

impl<'de> DeserializeSeed<'de> for Flag {
    type Value = Option<bool>;

    fn deserialize<D>(self, deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Scalar::deserialize(deserializer)?.as_bool())
    }
}

/// Optional Unix timestamp (seconds, UTC), fractional seconds allowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timestamp;

impl Timestamp {
    pub fn from_secs(secs: f64) -> Option<DateTime<Utc>> {
        let whole = secs.floor();
        if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
            return None;
        }
        let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    }
}

impl<'de> DeserializeSeed<'de> for Timestamp {
    type Value = Option<DateTime<Utc>>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Scalar::deserialize(deserializer)?;
        Ok(raw.as_f64().and_then(Timestamp::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read<'de, S: DeserializeSeed<'de>>(json: &'de str, seed: S) -> serde_json::Result<S::Value> {
        let mut de = serde_json::Deserializer::from_str(json);
        seed.deserialize(&mut de)
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        assert_eq!(read("42", Int::<i64>::new()).unwrap(), 42);
        assert_eq!(read("\" 42 \"", Int::<i64>::new()).unwrap(), 42);
        assert_eq!(read("42.0", Int::<i64>::new()).unwrap(), 42);
        assert_eq!(read("-7", Int::<i32>::new()).unwrap(), -7);
    }

    #[test]
    fn mandatory_integer_rejects_garbage() {
        assert!(read("\"abc\"", Int::<i64>::new()).is_err());
        assert!(read("true", Int::<i64>::new()).is_err());
        assert!(read("{\"a\":1}", Int::<i64>::new()).is_err());
        assert!(read("4294967296", Int::<u32>::new()).is_err());
    }

    #[test]
    fn lenient_integer_degrades_to_none() {
        assert_eq!(read("\"abc\"", LenientInt::<i64>::new()).unwrap(), None);
        assert_eq!(read("[1,2]", LenientInt::<i64>::new()).unwrap(), None);
        assert_eq!(read("null", LenientInt::<i64>::new()).unwrap(), None);
        assert_eq!(read("-1", LenientInt::<u64>::new()).unwrap(), None);
        assert_eq!(read("\"15\"", LenientInt::<u64>::new()).unwrap(), Some(15));
    }

    #[test]
    fn strings() {
        assert_eq!(read("\"a\\nb\"", Str).unwrap(), "a\nb");
        assert_eq!(read("12", Str).unwrap(), "12");
        assert!(read("null", Str).is_err());
        assert_eq!(read("null", LenientStr).unwrap(), None);
        assert_eq!(read("{}", LenientStr).unwrap(), None);
    }

    #[test]
    fn flags() {
        assert_eq!(read("true", Flag).unwrap(), Some(true));
        assert_eq!(read("\"false\"", Flag).unwrap(), Some(false));
        assert_eq!(read("1", Flag).unwrap(), None);
    }

    #[test]
    fn timestamp_zero_is_epoch() {
        let t = read("0", Timestamp).unwrap().unwrap();
        assert_eq!(t, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn timestamp_keeps_fractional_seconds() {
        let t = read("1.5", Timestamp).unwrap().unwrap();
        assert_eq!(t.timestamp(), 1);
        assert_eq!(t.timestamp_subsec_millis(), 500);
        assert_eq!(read("\"1700000000\"", Timestamp).unwrap().unwrap().timestamp(), 1_700_000_000);
        assert_eq!(read("\"soon\"", Timestamp).unwrap(), None);
    }
}
