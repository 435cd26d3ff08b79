//! HTTPS adapter for the bot API transport port.
//!
//! Method calls go to `{api}bot{token}/{method}`: GET for parameterless
//! methods, POST with a JSON or `multipart/form-data` body otherwise. Files
//! come from `{api}file/bot{token}/{file_path}`.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use ftb_core::{
    config::Config,
    errors::Error,
    ports::{ApiRequest, BotTransport, FormPart, FormValue, RawResponse, RequestBody},
    Result,
};
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};

#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    method_base: String,
    file_base: String,
    request_timeout: Duration,
}

impl fmt::Debug for HttpTransport {
    // URLs embed the bot token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// `api_url` is the service root, e.g. `https://api.telegram.org/`.
    pub fn new(api_url: &str, token: &str, request_timeout: Duration) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::Config("bot token is empty".to_string()));
        }
        let root = api_url.trim_end_matches('/');
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("http client build error: {e}")))?;

        Ok(Self {
            http,
            method_base: format!("{root}/bot{token}/"),
            file_base: format!("{root}/file/bot{token}/"),
            request_timeout,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.api_url, &cfg.telegram_bot_token, cfg.request_timeout)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}{method}", self.method_base)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}{}", self.file_base, file_path.trim_start_matches('/'))
    }

    async fn send(&self, what: &str, req: reqwest::RequestBuilder) -> Result<RawResponse> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{what} request error: {}", e.without_url())))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("{what} body error: {}", e.without_url())))?;

        tracing::debug!(what, status, bytes = body.len(), "http response");
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn multipart(parts: Vec<FormPart>) -> Result<Form> {
    let mut form = Form::new();
    for FormPart { name, value } in parts {
        form = match value {
            FormValue::Text(text) => form.text(name, text),
            FormValue::File { file_name, bytes } => form.part(
                name,
                Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("application/octet-stream")
                    .map_err(|e| Error::Transport(format!("multipart error: {e}")))?,
            ),
        };
    }
    Ok(form)
}

#[async_trait]
impl BotTransport for HttpTransport {
    async fn call(&self, req: ApiRequest) -> Result<RawResponse> {
        let url = self.method_url(req.method);
        let builder = match req.body {
            None => self.http.get(url),
            Some(RequestBody::Json(body)) => self
                .http
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body),
            Some(RequestBody::Form(parts)) => self.http.post(url).multipart(multipart(parts)?),
        };
        let builder = builder.timeout(self.request_timeout + req.long_poll);
        self.send(req.method, builder).await
    }

    async fn download(&self, file_path: &str) -> Result<RawResponse> {
        let builder = self
            .http
            .get(self.file_url(file_path))
            .timeout(self.request_timeout);
        self.send("download", builder).await
    }
}
