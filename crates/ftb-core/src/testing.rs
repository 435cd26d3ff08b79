//! In-crate fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    ports::{ApiRequest, BotTransport, FormPart, RawResponse, RequestBody},
    Result,
};

/// Transport that records every request and replays canned answers in order.
///
/// Once the script runs dry, calls hang until the caller gives up on them,
/// the way a long poll with nothing to report does.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
    downloads: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn reply(&self, status: u16, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(RawResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub(crate) fn reply_ok(&self, result: &str) {
        self.reply(200, &format!(r#"{{"ok":true,"result":{result}}}"#));
    }

    pub(crate) fn fail(&self, err: crate::Error) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn methods(&self) -> Vec<&'static str> {
        self.requests().iter().map(|r| r.method).collect()
    }

    /// JSON request bodies as text, `""` for bodiless and multipart calls.
    pub(crate) fn bodies(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| match &r.body {
                Some(RequestBody::Json(body)) => String::from_utf8(body.clone()).unwrap(),
                _ => String::new(),
            })
            .collect()
    }

    pub(crate) fn last_body(&self) -> serde_json::Value {
        match self.requests().last().and_then(|r| r.body.clone()) {
            Some(RequestBody::Json(body)) => serde_json::from_slice(&body).unwrap(),
            other => panic!("last request has no JSON body: {other:?}"),
        }
    }

    pub(crate) fn last_form(&self) -> Vec<FormPart> {
        match self.requests().last().and_then(|r| r.body.clone()) {
            Some(RequestBody::Form(parts)) => parts,
            other => panic!("last request is not multipart: {other:?}"),
        }
    }

    pub(crate) fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    async fn next_reply(&self) -> Result<RawResponse> {
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => std::future::pending().await,
        }
    }
}

#[async_trait]
impl BotTransport for ScriptedTransport {
    async fn call(&self, req: ApiRequest) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(req);
        self.next_reply().await
    }

    async fn download(&self, file_path: &str) -> Result<RawResponse> {
        self.downloads.lock().unwrap().push(file_path.to_string());
        self.next_reply().await
    }
}

/// Yield to spawned tasks until `cond` holds; panics after a few seconds.
pub(crate) async fn wait_until(cond: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached in time");
}
