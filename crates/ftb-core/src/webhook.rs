//! Intake for updates pushed by the service instead of polled.

use crate::{decode::decode_record, types::Update, Result};

/// Header the service sets when the webhook was registered with a secret.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Decode one pushed update.
///
/// With `expected_secret` configured, a request whose secret header is absent
/// or different is not from the service: `Ok(None)`, nothing is decoded.
pub fn parse_update(
    body: &[u8],
    expected_secret: Option<&str>,
    received_secret: Option<&str>,
) -> Result<Option<Update>> {
    if let Some(expected) = expected_secret.filter(|s| !s.is_empty()) {
        if received_secret != Some(expected) {
            tracing::warn!("rejected webhook call with a missing or wrong secret token");
            return Ok(None);
        }
    }
    decode_record(body).map(Some)
}
