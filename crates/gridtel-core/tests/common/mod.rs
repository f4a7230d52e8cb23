// Shared fixtures: a scripted dialer and subscribe-response builders.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use gridtel_api::proto::{
    Any, Notification, SubscribeRequest, SubscribeResponse, TypedValue, Update,
    subscribe_response, typed_value,
};
use gridtel_core::{DecodedPath, Device, DeviceRole, Dialer, ResponseStream};
use tokio::time::Instant;
use tokio_stream::StreamExt as _;

// ── Scripted dialer ─────────────────────────────────────────────────

/// What one dial attempt does.
pub enum Step {
    Fail(gridtel_api::Error),
    /// Never resolves; exercises the connect timeout.
    Hang,
    /// Deliver `responses`, then either end the stream or hold it open.
    Serve {
        responses: Vec<SubscribeResponse>,
        end: bool,
    },
}

impl Step {
    pub fn unavailable() -> Self {
        Self::Fail(gridtel_api::Error::Status {
            code: gridtel_api::StatusCode::Unavailable,
            message: "connection refused".into(),
        })
    }

    pub fn rejected() -> Self {
        Self::Fail(gridtel_api::Error::Status {
            code: gridtel_api::StatusCode::Unauthenticated,
            message: "bad password".into(),
        })
    }

    pub fn hold(responses: Vec<SubscribeResponse>) -> Self {
        Self::Serve {
            responses,
            end: false,
        }
    }

    pub fn end_after(responses: Vec<SubscribeResponse>) -> Self {
        Self::Serve {
            responses,
            end: true,
        }
    }
}

/// Plays back per-device scripts. An exhausted script holds an empty
/// stream open forever.
#[derive(Default)]
pub struct ScriptedDialer {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    dials: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, device: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(device.to_owned(), steps.into_iter().collect());
        self
    }

    /// Seconds after `start` at which `device` was dialed.
    pub fn dial_offsets(&self, device: &str, start: Instant) -> Vec<u64> {
        self.dials
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == device)
            .map(|(_, at)| at.duration_since(start).as_secs())
            .collect()
    }
}

impl Dialer for ScriptedDialer {
    async fn dial(
        &self,
        device: &Device,
        _request: SubscribeRequest,
    ) -> Result<ResponseStream, gridtel_api::Error> {
        self.dials
            .lock()
            .unwrap()
            .push((device.id.clone(), Instant::now()));
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&device.id)
            .and_then(VecDeque::pop_front);

        match step.unwrap_or_else(|| Step::hold(Vec::new())) {
            Step::Fail(e) => Err(e),
            Step::Hang => std::future::pending().await,
            Step::Serve { responses, end } => {
                let items = tokio_stream::iter(responses.into_iter().map(Ok::<_, gridtel_api::Error>));
                if end {
                    Ok(Box::pin(items))
                } else {
                    Ok(Box::pin(items.chain(tokio_stream::pending())))
                }
            }
        }
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn device(id: &str) -> Device {
    Device {
        id: id.into(),
        name: id.to_uppercase(),
        host: "127.0.0.1".into(),
        port: 57400,
        role: DeviceRole::Leaf,
        credentials: None,
    }
}

pub fn json_value(value: &serde_json::Value) -> TypedValue {
    TypedValue {
        value: Some(typed_value::Value::JsonIetfVal(
            serde_json::to_vec(value).unwrap(),
        )),
    }
}

pub fn update(path: &str, value: TypedValue) -> Update {
    Update {
        path: Some(DecodedPath::parse(path).unwrap().to_proto()),
        val: Some(value),
        duplicates: 0,
    }
}

/// A notification with one JSON_IETF update at `path`.
pub fn json_update(path: &str, value: serde_json::Value) -> SubscribeResponse {
    notification(vec![update(path, json_value(&value))])
}

pub fn notification(updates: Vec<Update>) -> SubscribeResponse {
    SubscribeResponse {
        response: Some(subscribe_response::Response::Update(Notification {
            update: updates,
            ..Notification::default()
        })),
    }
}

pub fn sync_response() -> SubscribeResponse {
    SubscribeResponse {
        response: Some(subscribe_response::Response::SyncResponse(true)),
    }
}

/// An update whose value cannot be decoded.
pub fn undecodable(path: &str) -> Update {
    update(
        path,
        TypedValue {
            value: Some(typed_value::Value::AnyVal(Any::default())),
        },
    )
}
