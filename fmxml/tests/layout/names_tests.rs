use std::time::Duration;

use fmxml::{ConnectionConfig, FmError, Server};

use crate::support::{DATABASE_NAMES, RecordingTransport, server};

#[tokio::test]
async fn lists_database_names() {
    let server = server(RecordingTransport::replying(DATABASE_NAMES));
    let names = server.database_names().await.unwrap();
    assert_eq!(names, vec!["Contacts".to_string(), "Inventory".to_string()]);
    assert_eq!(server.transport().last_body(), "-dbnames=");
}

#[tokio::test]
async fn layout_and_script_listings_are_scoped_to_a_database() {
    let server = server(RecordingTransport::replying(DATABASE_NAMES));
    let contacts = server.database("Contacts");

    // The fixture lists DATABASE_NAME rows, so neither listing finds its column.
    assert!(contacts.layout_names().await.unwrap().is_empty());
    assert!(contacts.script_names().await.unwrap().is_empty());
    assert_eq!(
        server.transport().bodies(),
        vec!["-db=Contacts&-layoutnames=".to_string(), "-db=Contacts&-scriptnames=".to_string()]
    );
}

#[tokio::test]
async fn layout_without_default_database_is_rejected() {
    let server = Server::new(
        ConnectionConfig::new("fm.example.com"),
        RecordingTransport::replying(DATABASE_NAMES),
    );
    assert!(matches!(server.layout("Web"), Err(FmError::Parameter { .. })));
}

#[tokio::test]
async fn communication_failures_pass_through() {
    let server = server(RecordingTransport::failing(503));
    let err = server.database_names().await.unwrap_err();
    assert!(matches!(err, FmError::Communication { status: Some(503), .. }));
}

#[tokio::test]
async fn configured_credentials_reach_the_transport() {
    let server = server(RecordingTransport::replying(DATABASE_NAMES));
    server.database_names().await.unwrap();

    let context = server.transport().last_context();
    assert_eq!(context.account_name, "web");
    assert_eq!(context.password, "secret");
    assert_eq!(context.max_redirects, 3);
    assert_eq!(context.timeout, Duration::from_secs(60));
}

#[tokio::test]
async fn unresolved_password_stops_before_sending() {
    crate::support::init_logging();
    let config = ConnectionConfig::new("fm.example.com")
        .with_credentials("web", "${FMXML_LAYOUT_TEST_UNSET_PASSWORD}");
    let server = Server::new(config, RecordingTransport::replying(DATABASE_NAMES));

    assert!(matches!(server.database_names().await, Err(FmError::Config { .. })));
    assert!(server.transport().bodies().is_empty());
}
