use fmxml::{ErrorKind, FindRequest, FmError, LogicalOperator, QueryOptions, ScriptCall, SortOrder};

use crate::support::{NO_RECORDS, PEOPLE, RecordingTransport, server};

#[tokio::test]
async fn find_posts_criteria_then_options_then_action() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let people = server.database("Contacts").layout("Web");

    let options = QueryOptions::new()
        .with_max_records(10)
        .with_sort("Name", SortOrder::Descend)
        .with_logical_operator(LogicalOperator::Or);
    let found = people.find([("Name", "Bill"), ("City", "Rome")], &options).await.unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(
        server.transport().last_body(),
        "-db=Contacts&-lay=Web&Name=Bill&City=Rome&-max=10&-sortfield.1=Name&-sortorder.1=descend&-lop=or&-find="
    );
    assert_eq!(server.transport().last_url().path(), "/fmi/xml/fmresultset.xml");
}

#[tokio::test]
async fn default_database_layout_finds_all() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let people = server.layout("Web").unwrap();
    assert_eq!(people.database(), "Contacts");

    let options = QueryOptions::new()
        .with_skip_records(20)
        .with_post_script(ScriptCall::new("Audit").with_param("find all"));
    let all = people.all(&options).await.unwrap();

    assert_eq!(all.total_count(), 250);
    assert_eq!(
        server.transport().last_body(),
        "-db=Contacts&-lay=Web&-skip=20&-script=Audit&-script.param=find+all&-findall="
    );
}

#[tokio::test]
async fn portals_follow_connection_setting() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let found = server.database("Contacts").layout("Web").any(&QueryOptions::new()).await.unwrap();
    assert_eq!(found.records[0].portal("Orders").map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn edit_sends_record_and_modification_ids() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let people = server.database("Contacts").layout("Web");

    let options = QueryOptions::new().with_modification_id("3");
    people.edit("12", [("Name", "William")], &options).await.unwrap();

    assert_eq!(
        server.transport().last_body(),
        "-db=Contacts&-lay=Web&-recid=12&Name=William&-modid=3&-edit="
    );
}

#[tokio::test]
async fn record_operations_need_a_record_id() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let people = server.database("Contacts").layout("Web");

    let err = people.delete("  ", &QueryOptions::new()).await.unwrap_err();
    assert!(matches!(err, FmError::Parameter { .. }));
    assert!(matches!(
        people.duplicate("", &QueryOptions::new()).await,
        Err(FmError::Parameter { .. })
    ));
    assert!(matches!(
        people.find_by_record_id("").await,
        Err(FmError::Parameter { .. })
    ));
    assert!(server.transport().bodies().is_empty());
}

#[tokio::test]
async fn delete_duplicate_and_create_use_their_commands() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let people = server.database("Contacts").layout("Web");

    people.delete("12", &QueryOptions::new()).await.unwrap();
    people.duplicate("13", &QueryOptions::new()).await.unwrap();
    people.create([("Name", "Cleo")], &QueryOptions::new()).await.unwrap();
    people.find_by_record_id("12").await.unwrap();
    people.view().await.unwrap();

    assert_eq!(
        server.transport().bodies(),
        vec![
            "-db=Contacts&-lay=Web&-recid=12&-delete=".to_string(),
            "-db=Contacts&-lay=Web&-recid=13&-dup=".to_string(),
            "-db=Contacts&-lay=Web&Name=Cleo&-new=".to_string(),
            "-db=Contacts&-lay=Web&-recid=12&-find=".to_string(),
            "-db=Contacts&-lay=Web&-view=".to_string(),
        ]
    );
}

#[tokio::test]
async fn compound_query_groups_requests() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let people = server.database("Contacts").layout("Web");

    let requests = [
        FindRequest::new().with("Name", "Bill").with("City", "Rome"),
        FindRequest::omit().with("Status", "Closed"),
    ];
    people.query(&requests, &QueryOptions::new()).await.unwrap();

    assert_eq!(
        server.transport().last_body(),
        "-db=Contacts&-lay=Web&-query=%28q1%2Cq2%29%3B%21%28q3%29&-q1=Name&-q1.value=Bill&-q2=City&-q2.value=Rome\
         &-q3=Status&-q3.value=Closed&-findquery="
    );
}

#[tokio::test]
async fn too_many_sort_fields_never_reach_the_server() {
    let server = server(RecordingTransport::replying(PEOPLE));
    let people = server.database("Contacts").layout("Web");

    let options = (1..=10).fold(QueryOptions::new(), |options, n| {
        options.with_sort(format!("F{n}"), SortOrder::Ascend)
    });
    assert!(matches!(people.all(&options).await, Err(FmError::Parameter { .. })));
    assert!(server.transport().bodies().is_empty());
}

#[tokio::test]
async fn empty_find_returns_no_records() {
    let server = server(RecordingTransport::replying(NO_RECORDS));
    let people = server.database("Contacts").layout("Web");
    let found = people.find([("Name", "Nobody")], &QueryOptions::new()).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn empty_find_raises_when_configured() {
    crate::support::init_logging();
    let config = fmxml::ConnectionConfig::new("fm.example.com").with_raise_on_401(true);
    let server = fmxml::Server::new(config, RecordingTransport::replying(NO_RECORDS));

    let err = server
        .database("Contacts")
        .layout("Web")
        .find([("Name", "Nobody")], &QueryOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.as_filemaker().map(|fm| fm.kind()), Some(ErrorKind::NoRecordsFound));
}

#[tokio::test]
async fn http_unauthorized_is_an_authentication_error() {
    let server = server(RecordingTransport::failing(401));
    let err = server.database("Contacts").layout("Web").view().await.unwrap_err();
    assert!(matches!(err, FmError::Authentication { .. }));
}
