use chrono::{DateTime, Utc};
use serde::de::MapAccess;

use crate::decode::{
    first, first_lenient, Flag, LenientInt, LenientStr, ListSeed, MissingField, Record,
    Timestamp,
};

/// Current webhook status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WebhookInfo {
    /// Empty when no webhook is set.
    pub url: String,
    pub has_custom_certificate: bool,
    pub pending_update_count: u32,
    pub ip_address: Option<String>,
    pub last_error_date: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
    pub last_synchronization_error_date: Option<DateTime<Utc>>,
    pub max_connections: Option<u32>,
    pub allowed_updates: Vec<String>,
}

#[derive(Default)]
pub struct WebhookInfoBuilder {
    url: Option<String>,
    has_custom_certificate: Option<bool>,
    pending_update_count: Option<u32>,
    ip_address: Option<String>,
    last_error_date: Option<DateTime<Utc>>,
    last_error_message: Option<String>,
    last_synchronization_error_date: Option<DateTime<Utc>>,
    max_connections: Option<u32>,
    allowed_updates: Option<Vec<Option<String>>>,
}

impl Record for WebhookInfo {
    const NAME: &'static str = "WebhookInfo";
    type Builder = WebhookInfoBuilder;

    fn accept<'de, A>(
        b: &mut WebhookInfoBuilder,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "url" => first_lenient(&mut b.url, map, LenientStr)?,
            "has_custom_certificate" => first_lenient(&mut b.has_custom_certificate, map, Flag)?,
            "pending_update_count" => {
                first_lenient(&mut b.pending_update_count, map, LenientInt::new())?
            }
            "ip_address" => first_lenient(&mut b.ip_address, map, LenientStr)?,
            "last_error_date" => first_lenient(&mut b.last_error_date, map, Timestamp)?,
            "last_error_message" => first_lenient(&mut b.last_error_message, map, LenientStr)?,
            "last_synchronization_error_date" => {
                first_lenient(&mut b.last_synchronization_error_date, map, Timestamp)?
            }
            "max_connections" => first_lenient(&mut b.max_connections, map, LenientInt::new())?,
            "allowed_updates" => first(&mut b.allowed_updates, map, ListSeed(LenientStr))?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: WebhookInfoBuilder) -> std::result::Result<Self, MissingField> {
        Ok(WebhookInfo {
            url: b.url.unwrap_or_default(),
            has_custom_certificate: b.has_custom_certificate.unwrap_or(false),
            pending_update_count: b.pending_update_count.unwrap_or(0),
            ip_address: b.ip_address,
            last_error_date: b.last_error_date,
            last_error_message: b.last_error_message,
            last_synchronization_error_date: b.last_synchronization_error_date,
            max_connections: b.max_connections,
            allowed_updates: b
                .allowed_updates
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect(),
        })
    }
}
