#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use serde_json::Value;
use url::Url;

/// Serves `router` on an ephemeral local port and returns its base URL.
/// Keep in step with `spawn_server` in `src/testing.rs`.
pub async fn spawn_server(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake server");
    let addr = listener.local_addr().expect("fake server address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Url::parse(&format!("http://{addr}/")).expect("fake server url")
}

/// Requests seen by a fake server, as `(label, body)` in arrival order.
#[derive(Clone, Debug, Default)]
pub struct Calls(Arc<Mutex<Vec<(String, Value)>>>);

impl Calls {
    pub fn push(&self, label: impl Into<String>, body: Value) {
        self.0.lock().expect("calls lock").push((label.into(), body));
    }

    pub fn labels(&self) -> Vec<String> {
        self.0
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.0
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().expect("calls lock").len()
    }
}

pub fn client() -> reqwest::Client {
    lingopost::http::build_client().expect("http client")
}
