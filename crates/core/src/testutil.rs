//! In-memory doubles of the identity broker's collaborators.
//!
//! Feature-gated behind `testutil` so they never leak into production
//! builds. [`InMemoryIdentity`] plays the host attribute store and
//! [`StubHttp`] replays a scripted provider answer while counting requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;

use crate::errors::{AttributeWriteError, TransportError};
use crate::github::{HttpCapability, HttpResponse};
use crate::identity::IdentityTarget;

/// Which setter a recorded write went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    List,
    Single,
}

/// One call into the attribute store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub name: String,
    pub kind: WriteKind,
    pub values: Vec<String>,
}

/// Attribute store backed by a `HashMap`, recording every write.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentity {
    username: String,
    attributes: HashMap<String, Vec<String>>,
    writes: Vec<RecordedWrite>,
    reject_writes: bool,
}

impl InMemoryIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// A store whose setters all fail, like a read-only user.
    pub fn rejecting_writes(username: impl Into<String>) -> Self {
        Self {
            reject_writes: true,
            ..Self::new(username)
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    pub fn single_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    fn record(
        &mut self,
        name: &str,
        kind: WriteKind,
        values: Vec<String>,
    ) -> Result<(), AttributeWriteError> {
        if self.reject_writes {
            return Err(AttributeWriteError::new(name, "user is read-only"));
        }
        self.writes.push(RecordedWrite {
            name: name.to_string(),
            kind,
            values: values.clone(),
        });
        self.attributes.insert(name.to_string(), values);
        Ok(())
    }
}

impl IdentityTarget for InMemoryIdentity {
    fn username(&self) -> &str {
        &self.username
    }

    fn set_attribute_list(
        &mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<(), AttributeWriteError> {
        self.record(name, WriteKind::List, values)
    }

    fn set_attribute_single(
        &mut self,
        name: &str,
        value: String,
    ) -> Result<(), AttributeWriteError> {
        self.record(name, WriteKind::Single, vec![value])
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    Transport(String),
}

/// [`HttpCapability`] that answers every request with the same scripted
/// reply. Clones share the request log.
#[derive(Debug, Clone)]
pub struct StubHttp {
    reply: Reply,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubHttp {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer `200 OK` with `body`.
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::with_reply(Reply::Response(HttpResponse::new(status, body)))
    }

    /// Fail every request before a response arrives.
    pub fn transport_failure(detail: &str) -> Self {
        Self::with_reply(Reply::Transport(detail.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.requested_urls().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpCapability for StubHttp {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }
        match &self.reply {
            Reply::Response(resp) => Ok(resp.clone()),
            Reply::Transport(detail) => {
                Err(TransportError::new("connection failed", detail.clone()))
            }
        }
    }
}
