//! Forward-only record decoding on top of `serde_json`'s streaming deserializer.
//!
//! Every entity implements [`Record`]: it names a transient builder, says which
//! keys it understands, and freezes the builder once the object closes. The
//! generic [`RecordVisitor`] walks the object key by key and skips (with
//! [`serde::de::IgnoredAny`]) exactly one value for every key the record does
//! not claim, so no intermediate `serde_json::Value` tree is ever built.
//!
//! Skipping is bounded: `serde_json` enforces a nesting limit of 128 levels and
//! reports anything deeper as a decode error instead of recursing further.

mod scalar;

use std::{borrow::Cow, fmt, marker::PhantomData};

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

pub use scalar::{Flag, Int, LenientInt, LenientStr, Scalar, Str, Timestamp};

use crate::Result;

/// A type that can consume its own JSON object from a positioned cursor.
pub trait Record: Sized {
    /// Name used in decode error messages.
    const NAME: &'static str;

    /// Mutable accumulator filled while the object is being read.
    type Builder: Default;

    /// Consume the value stored under `key`, if this record understands it.
    ///
    /// Returns `Ok(false)` without touching `map` for unknown keys; the caller
    /// then skips the value.
    fn accept<'de, A>(
        builder: &mut Self::Builder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>;

    /// Freeze the builder. Fails only when a mandatory field never showed up.
    fn finish(builder: Self::Builder) -> std::result::Result<Self, MissingField>;
}

/// A mandatory field that was absent when the record's object closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

/// Returns the value in `slot` or a [`MissingField`] naming `field`.
pub fn required<T>(slot: Option<T>, field: &'static str) -> std::result::Result<T, MissingField> {
    slot.ok_or(MissingField(field))
}

/// Fill `slot` from the current value unless it was already written.
///
/// Later duplicates are consumed and dropped (first write wins).
pub fn first<'de, A, S>(
    slot: &mut Option<S::Value>,
    map: &mut A,
    seed: S,
) -> std::result::Result<(), A::Error>
where
    A: MapAccess<'de>,
    S: DeserializeSeed<'de>,
{
    if slot.is_some() {
        map.next_value::<IgnoredAny>()?;
        return Ok(());
    }
    *slot = Some(map.next_value_seed(seed)?);
    Ok(())
}

/// Like [`first`] for seeds that degrade to `None` instead of failing.
///
/// A value that could not be read does not count as a write.
pub fn first_lenient<'de, A, S, T>(
    slot: &mut Option<T>,
    map: &mut A,
    seed: S,
) -> std::result::Result<(), A::Error>
where
    A: MapAccess<'de>,
    S: DeserializeSeed<'de, Value = Option<T>>,
{
    if slot.is_some() {
        map.next_value::<IgnoredAny>()?;
        return Ok(());
    }
    *slot = map.next_value_seed(seed)?;
    Ok(())
}

/// Visitor driving a [`Record`] through one JSON object.
pub struct RecordVisitor<R>(PhantomData<R>);

impl<R> RecordVisitor<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for RecordVisitor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de, R: Record> Visitor<'de> for RecordVisitor<R> {
    type Value = R;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a {} object", R::NAME)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<R, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut builder = R::Builder::default();
        while let Some(key) = map.next_key::<Key<'de>>()? {
            if !R::accept(&mut builder, key.as_str(), &mut map)? {
                map.next_value::<IgnoredAny>()?;
            }
        }
        R::finish(builder).map_err(|MissingField(field)| de::Error::missing_field(field))
    }
}

/// Seed decoding one [`Record`]; use it for nested objects.
pub struct RecordSeed<R>(PhantomData<R>);

impl<R> RecordSeed<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for RecordSeed<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for RecordSeed<R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<'de, R: Record> DeserializeSeed<'de> for RecordSeed<R> {
    type Value = R;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<R, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor::<R>::new())
    }
}

/// Seed decoding a JSON array, every element through the inner seed.
#[derive(Clone, Default)]
pub struct ListSeed<S>(pub S);

impl<'de, S> DeserializeSeed<'de> for ListSeed<S>
where
    S: DeserializeSeed<'de> + Clone,
{
    type Value = Vec<S::Value>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, S> Visitor<'de> for ListSeed<S>
where
    S: DeserializeSeed<'de> + Clone,
{
    type Value = Vec<S::Value>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(128));
        while let Some(item) = seq.next_element_seed(self.0.clone())? {
            out.push(item);
        }
        Ok(out)
    }
}

/// Shorthand for a list of records.
pub fn list_of<R>() -> ListSeed<RecordSeed<R>> {
    ListSeed(RecordSeed::new())
}

/// Object key, borrowed from the input whenever it holds no escapes.
struct Key<'de>(Cow<'de, str>);

impl Key<'_> {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> de::Deserialize<'de> for Key<'de> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = Key<'de>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object key")
            }

            fn visit_borrowed_str<E>(self, v: &'de str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Key(Cow::Borrowed(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(Key(Cow::Owned(v.to_owned())))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Key(Cow::Owned(v)))
            }
        }

        deserializer.deserialize_identifier(KeyVisitor)
    }
}

/// Decode a complete JSON document with `seed`, rejecting trailing garbage.
pub fn decode_with<'de, S>(body: &'de [u8], seed: S) -> Result<S::Value>
where
    S: DeserializeSeed<'de>,
{
    let mut de = serde_json::Deserializer::from_slice(body);
    let value = seed.deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Decode one record from a complete JSON document.
pub fn decode_record<R: Record>(body: &[u8]) -> Result<R> {
    decode_with(body, RecordSeed::<R>::new())
}
