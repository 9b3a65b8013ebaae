//! Log lines emitted around the datastore attempt and startup.

use std::time::Duration;

use cloudnative_app::config::loader::load_with;
use cloudnative_app::datastore::Datastore;

mod common;
use common::{LogCapture, Outcome, RecordingConnector};

const CONNECTED: &str = "Connected to MongoDB";
const CONNECTION_ERROR: &str = "MongoDB connection error";

#[tokio::test]
async fn failed_attempt_logs_one_error() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let connector = RecordingConnector::new(Outcome::Fail);
    let datastore = Datastore::connect(connector.clone(), &load_with(|_| None).unwrap().datastore);
    assert!(datastore.wait_ready(Duration::from_secs(2)).await.is_err());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(logs.count(CONNECTION_ERROR), 1);
    assert_eq!(logs.count(CONNECTED), 0);
    assert_eq!(logs.count("Connecting to MongoDB"), 1);
}

#[tokio::test]
async fn successful_attempt_logs_one_success() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let connector = RecordingConnector::new(Outcome::Succeed);
    let datastore = Datastore::connect(connector, &load_with(|_| None).unwrap().datastore);
    datastore.wait_ready(Duration::from_secs(2)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(logs.count(CONNECTED), 1);
    assert_eq!(logs.count(CONNECTION_ERROR), 0);
}

#[tokio::test]
async fn pending_attempt_logs_neither_outcome() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let connector = RecordingConnector::new(Outcome::Hang);
    let _datastore = Datastore::connect(connector.clone(), &load_with(|_| None).unwrap().datastore);
    connector.wait_for_attempts(1).await;

    assert_eq!(logs.count(CONNECTED), 0);
    assert_eq!(logs.count(CONNECTION_ERROR), 0);
}

#[tokio::test]
async fn startup_logs_readiness_with_port() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let datastore = Datastore::connect(
        RecordingConnector::new(Outcome::Hang),
        &load_with(|_| None).unwrap().datastore,
    );
    let app = common::start_app(datastore).await;
    let res = common::client().get(app.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let ready = logs.find_prefix("Server is running on port").unwrap();
    assert_eq!(ready, format!("Server is running on port {}", app.addr.port()));

    app.stop().await.unwrap();
}
