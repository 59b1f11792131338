//! Test helpers: a throwaway HTTP server standing in for remote services.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use crate::error::LingoError;
use crate::outcome::{OutcomeLogger, OutcomeRecord};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub(crate) async fn spawn_server(router: axum::Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake server");
    let addr = listener.local_addr().expect("fake server address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Url::parse(&format!("http://{addr}/")).expect("fake server url")
}

/// Keeps every record, optionally failing after storing it.
#[derive(Debug, Default)]
pub(crate) struct RecordingLogger {
    pub(crate) records: Mutex<Vec<OutcomeRecord>>,
    pub(crate) fail: bool,
}

impl RecordingLogger {
    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub(crate) fn taken(&self) -> Vec<OutcomeRecord> {
        self.records.lock().expect("records lock").clone()
    }
}

#[async_trait]
impl OutcomeLogger for RecordingLogger {
    async fn record(&self, record: &OutcomeRecord) -> Result<(), LingoError> {
        self.records
            .lock()
            .expect("records lock")
            .push(record.clone());
        if self.fail {
            return Err(LingoError::Io(std::io::Error::other("sink offline")));
        }
        Ok(())
    }
}
