//! Shared utilities for integration tests.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cloudnative_app::config::AppConfig;
use cloudnative_app::datastore::{Connector, Datastore, DatastoreError, DatastoreResult};
use cloudnative_app::lifecycle::{startup, StartupError};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// How a [`RecordingConnector`] answers.
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub enum Outcome {
    Succeed,
    Fail,
    Hang,
}

/// Test double that records every connection target it is asked for.
#[derive(Clone)]
pub struct RecordingConnector {
    pub targets: Arc<Mutex<Vec<String>>>,
    outcome: Outcome,
}

impl RecordingConnector {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            targets: Arc::new(Mutex::new(Vec::new())),
            outcome,
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    /// Wait until at least `n` attempts have been recorded.
    #[allow(dead_code)]
    pub async fn wait_for_attempts(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.targets.lock().unwrap().len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("connector was never called");
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    type Handle = ();

    async fn connect(&self, uri: &str) -> DatastoreResult<()> {
        self.targets.lock().unwrap().push(uri.to_string());
        match self.outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(DatastoreError::Unreachable("connection refused".into())),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

/// An app serving on an ephemeral local port.
pub struct RunningApp {
    pub addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), StartupError>>,
}

impl RunningApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Send the shutdown signal and wait for the server to drain.
    pub async fn stop(self) -> Result<(), StartupError> {
        let _ = self.stop.send(());
        self.task.await.expect("server task panicked")
    }
}

/// Start the full server with the given datastore handle.
pub async fn start_app<H>(datastore: Datastore<H>) -> RunningApp
where
    H: Clone + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let config = AppConfig::default();

    let task = tokio::spawn(async move {
        startup::serve(&config, datastore, listener, async {
            let _ = stopped.await;
        })
        .await
    });

    RunningApp { addr, stop, task }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Layer that keeps the message of every event it sees.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct LogCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl LogCapture {
    /// Install as the default subscriber for the current thread.
    ///
    /// Tasks spawned on a current-thread runtime are polled on this thread,
    /// so their events are captured too.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn count(&self, message: &str) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| *m == message)
            .count()
    }

    pub fn find_prefix(&self, prefix: &str) -> Option<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.starts_with(prefix))
            .cloned()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.messages.lock().unwrap().push(message);
        }
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}
