//! Shared fixtures for integration tests
//!
//! `MockTransport` records every request the client makes and answers from a
//! queue of canned responses, so tests can check exactly what went over the
//! wire without a server.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use shotgun_api::api::{HttpRequest, HttpResponse, Transport, UploadRequest};
use shotgun_api::{Config, Result, Shotgun, ShotgunError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    uploads: Mutex<Vec<UploadRequest>>,
    downloads: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Queue a successful RPC answer carrying `results`
    pub fn push_results(&self, results: Value) {
        self.push_response(HttpResponse::ok(json!({ "results": results }).to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    /// Decoded JSON bodies of every RPC request, in order
    pub fn sent_bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    /// The params element of every RPC call
    pub fn sent_params(&self) -> Vec<Value> {
        self.sent_bodies().into_iter().map(|body| body["params"][1].clone()).collect()
    }

    pub fn last_params(&self) -> Value {
        self.sent_params().pop().expect("no request was sent")
    }

    fn next_response(&self) -> Result<HttpResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ShotgunError::Transport("no response queued".to_string()))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.next_response()
    }

    async fn upload(&self, request: UploadRequest) -> Result<HttpResponse> {
        self.uploads.lock().unwrap().push(request);
        self.next_response()
    }

    async fn download(&self, url: &str) -> Result<HttpResponse> {
        self.downloads.lock().unwrap().push(url.to_string());
        self.next_response()
    }
}

pub fn test_config() -> Config {
    Config::new("http://server_path", "script_name", "api_key").with_local_timezone("Europe/Brussels")
}

pub fn client(mock: &Arc<MockTransport>) -> Shotgun {
    Shotgun::new(test_config(), mock.clone()).unwrap()
}

pub fn client_with(config: Config, mock: &Arc<MockTransport>) -> Shotgun {
    Shotgun::new(config, mock.clone()).unwrap()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
