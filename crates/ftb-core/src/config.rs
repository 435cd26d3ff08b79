use std::{env, fs, path::Path, time::Duration};

use crate::{
    errors::Error,
    polling::{ErrorPolicy, PollingOptions, MAX_LIMIT},
    throttled::ThrottleConfig,
    types::UpdateKind,
    Result,
};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org/";

/// Typed configuration, read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Service root, always ending in `/`.
    pub api_url: String,
    pub request_timeout: Duration,

    // Polling
    pub poll_limit: u8,
    pub poll_timeout_secs: u32,
    pub poll_offset: i64,
    pub allowed_updates: Option<Vec<UpdateKind>>,
    pub error_policy: ErrorPolicy,

    // Outbound rate limiting; `None` when disabled.
    pub throttle: Option<ThrottleConfig>,
}

impl Config {
    /// Read the process environment, after loading `.env` if there is one.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(&lookup);

        let telegram_bot_token = env.str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let mut api_url = env
            .str("TELEGRAM_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        let request_timeout =
            Duration::from_millis(env.u64("REQUEST_TIMEOUT_MS").unwrap_or(10_000));

        let poll_limit = env.u64("POLL_LIMIT").unwrap_or(u64::from(MAX_LIMIT));
        if !(1..=u64::from(MAX_LIMIT)).contains(&poll_limit) {
            return Err(Error::Config(format!(
                "POLL_LIMIT must be within 1..={MAX_LIMIT}, got {poll_limit}"
            )));
        }
        let poll_limit = poll_limit as u8;
        let poll_timeout_secs = env.u32("POLL_TIMEOUT").unwrap_or(0);
        let poll_offset = env.i64("POLL_OFFSET").unwrap_or(0);
        let allowed_updates = parse_allowed_updates(env.str("ALLOWED_UPDATES"))?;

        let retry_delay = Duration::from_millis(env.u64("POLL_RETRY_DELAY_MS").unwrap_or(1000));
        let error_policy = match env.str("POLL_ON_ERROR").map(|s| s.trim().to_lowercase()) {
            None => ErrorPolicy::Stop,
            Some(s) if s.is_empty() || s == "stop" => ErrorPolicy::Stop,
            Some(s) if s == "retry" => ErrorPolicy::Retry { delay: retry_delay },
            Some(other) => {
                return Err(Error::Config(format!(
                    "POLL_ON_ERROR must be `stop` or `retry`, got `{other}`"
                )))
            }
        };

        let throttle = env.bool("THROTTLE_ENABLED").unwrap_or(false).then(|| {
            let defaults = ThrottleConfig::default();
            ThrottleConfig {
                global_min_interval: env
                    .u64("THROTTLE_GLOBAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.global_min_interval),
                per_chat_min_interval: env
                    .u64("THROTTLE_PER_CHAT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.per_chat_min_interval),
            }
        });

        Ok(Self {
            telegram_bot_token,
            api_url,
            request_timeout,
            poll_limit,
            poll_timeout_secs,
            poll_offset,
            allowed_updates,
            error_policy,
            throttle,
        })
    }

    pub fn polling_options(&self) -> PollingOptions {
        PollingOptions {
            offset: self.poll_offset,
            limit: self.poll_limit,
            timeout_secs: self.poll_timeout_secs,
            allowed_updates: self.allowed_updates.clone(),
            error_policy: self.error_policy,
        }
    }
}

struct Lookup<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Lookup<'_> {
    fn str(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn bool(&self, key: &str) -> Option<bool> {
        self.str(key).map(|s| {
            matches!(
                s.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    fn u64(&self, key: &str) -> Option<u64> {
        self.str(key).and_then(|s| s.trim().parse::<u64>().ok())
    }

    fn u32(&self, key: &str) -> Option<u32> {
        self.str(key).and_then(|s| s.trim().parse::<u32>().ok())
    }

    fn i64(&self, key: &str) -> Option<i64> {
        self.str(key).and_then(|s| s.trim().parse::<i64>().ok())
    }
}

fn parse_allowed_updates(v: Option<String>) -> Result<Option<Vec<UpdateKind>>> {
    let Some(v) = v else {
        return Ok(None);
    };
    let kinds = v
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<UpdateKind>()
                .map_err(|_| Error::Config(format!("ALLOWED_UPDATES: unknown update kind `{s}`")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((!kinds.is_empty()).then_some(kinds))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
