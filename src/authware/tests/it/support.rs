//! In-memory transport standing in for the Authware backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use authware::{Application, AuthwareError, OutboundRequest, RawResponse, Transport};

pub const APP_ID: &str = "app-123";
pub const APP_VERSION: &str = "1.0.0";

pub const APP_INFO: &str = r#"{
    "name": "Example App",
    "id": "app-123",
    "version": "1.0.0",
    "date_created": "2022-03-01T12:00:00Z",
    "is_hwid_checking_enabled": false,
    "apis": [{"id": "api-1", "name": "Lookup"}],
    "user_count": 42,
    "request_count": 1337
}"#;

pub const APP_INFO_HWID: &str = r#"{
    "name": "Locked App",
    "id": "app-123",
    "version": "1.0.0",
    "date_created": "2022-03-01T12:00:00Z",
    "is_hwid_checking_enabled": true
}"#;

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<RawResponse, AuthwareError>>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(RawResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn fail(&self, error: AuthwareError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> OutboundRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request sent")
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &OutboundRequest) -> Result<RawResponse, AuthwareError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request: no scripted response left")
    }
}

pub fn app_with(transport: &Arc<ScriptedTransport>) -> Application {
    Application::builder(APP_ID, APP_VERSION)
        .transport(transport.clone())
        .build()
        .unwrap()
}

pub fn initialized_app(transport: &Arc<ScriptedTransport>) -> Application {
    let app = app_with(transport);
    transport.respond(200, APP_INFO);
    app.initialize().unwrap();
    app
}

pub fn body_json(request: &OutboundRequest) -> serde_json::Value {
    serde_json::from_slice(&request.body).unwrap()
}
