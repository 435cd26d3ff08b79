use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::de::MapAccess;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    decode::{decode_record, first_lenient, MissingField, Record, Scalar},
    ports::{ApiRequest, BotTransport, RawResponse, RequestBody},
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* two API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls addressed to the same chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }

    /// No reservation is pending; a fresh limiter would behave the same.
    fn is_idle(&self, now: Instant) -> bool {
        self.next <= now
    }
}

/// Chat key of an outgoing request: the `chat_id` member of its JSON body.
#[derive(Default)]
struct ChatTarget {
    chat: Option<String>,
}

impl Record for ChatTarget {
    const NAME: &'static str = "request";
    type Builder = ChatTarget;

    fn accept<'de, A>(
        b: &mut ChatTarget,
        key: &str,
        map: &mut A,
    ) -> std::result::Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        match key {
            "chat_id" => first_lenient(&mut b.chat, map, ChatKey)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(b: ChatTarget) -> std::result::Result<Self, MissingField> {
        Ok(b)
    }
}

/// Numeric ids and `@channel` names both identify a chat.
#[derive(Clone, Copy)]
struct ChatKey;

impl<'de> serde::de::DeserializeSeed<'de> for ChatKey {
    type Value = Option<String>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize;
        Ok(match Scalar::deserialize(deserializer)? {
            Scalar::Int(v) => Some(v.to_string()),
            Scalar::UInt(v) => Some(v.to_string()),
            Scalar::Str(s) => Some(s.into_owned()),
            _ => None,
        })
    }
}

fn chat_of(req: &ApiRequest) -> Option<String> {
    match req.body.as_ref()? {
        RequestBody::Json(body) => decode_record::<ChatTarget>(body).ok()?.chat,
        RequestBody::Form(parts) => parts
            .iter()
            .find(|p| p.name == "chat_id")
            .and_then(|p| p.as_text())
            .map(str::to_string),
    }
}

/// [`BotTransport`] decorator that rate-limits outbound calls.
///
/// Best-effort defense against 429 answers for send/edit heavy bots. Calls
/// that name a `chat_id` wait for both the global and the per-chat slot, the
/// rest only for the global one. `getUpdates` is never delayed.
pub struct ThrottledTransport {
    inner: Arc<dyn BotTransport>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<String, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledTransport {
    pub fn new(inner: Arc<dyn BotTransport>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat: String) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        if let Some(lim) = map.get(&chat) {
            return lim.clone();
        }

        // Drop chats whose slot has already passed. Limiters held by an
        // in-flight call are locked or shared and stay.
        let now = Instant::now();
        map.retain(|_, lim| {
            Arc::strong_count(lim) > 1 || lim.try_lock().map_or(true, |l| !l.is_idle(now))
        });

        let lim = Arc::new(Mutex::new(IntervalLimiter::new(
            self.cfg.per_chat_min_interval,
        )));
        map.insert(chat, lim.clone());
        lim
    }

    async fn throttle(&self, chat: Option<String>) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = match chat {
            Some(chat) => {
                let lim = self.limiter_for_chat(chat).await;
                let mut guard = lim.lock().await;
                guard.reserve()
            }
            None => Duration::ZERO,
        };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "throttling api call");
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl BotTransport for ThrottledTransport {
    async fn call(&self, req: ApiRequest) -> Result<RawResponse> {
        if req.method != "getUpdates" {
            self.throttle(chat_of(&req)).await;
        }
        self.inner.call(req).await
    }

    async fn download(&self, file_path: &str) -> Result<RawResponse> {
        self.throttle(None).await;
        self.inner.download(file_path).await
    }
}
