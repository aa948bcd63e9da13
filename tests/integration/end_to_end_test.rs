//! End-to-end query tests against the scripted service.
//!
//! Tests the full submit, poll, paginate and map flow.

use std::sync::Arc;
use std::time::Duration;

use athena_query::query::{QueryClient, QueryContext, Record};
use athena_query::service::{
    ExecutionStatus, RawRow, ResultPage, ScriptedExecutionService, ServiceCall,
};
use athena_query::AthenaError;
use pretty_assertions::assert_eq;

fn row(cells: &[Option<&str>]) -> RawRow {
    cells.iter().map(|c| c.map(String::from)).collect()
}

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs.iter().copied().collect()
}

fn client(service: &Arc<ScriptedExecutionService>) -> QueryClient {
    QueryClient::new(
        service.clone(),
        QueryContext::new("sales", "AwsDataCatalog"),
    )
}

#[tokio::test(start_paused = true)]
async fn test_queued_running_succeeded_with_two_pages() {
    let service = Arc::new(
        ScriptedExecutionService::new()
            .with_statuses([
                ExecutionStatus::queued(),
                ExecutionStatus::running(),
                ExecutionStatus::succeeded(),
            ])
            .with_page(
                None,
                ResultPage::with_next(
                    vec![
                        row(&[Some("id"), Some("email"), Some("name")]),
                        row(&[Some("1"), Some("alice@example.com"), Some("Alice")]),
                    ],
                    "page-2",
                ),
            )
            .with_page(
                Some("page-2"),
                ResultPage::last(vec![
                    row(&[Some("2"), Some("bob@example.com"), Some("Bob")]),
                    row(&[Some("3"), Some("carol@example.com"), None]),
                ]),
            ),
    );

    let records = client(&service)
        .query("SELECT id, email, name FROM users ORDER BY id")
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            record(&[("id", "1"), ("email", "alice@example.com"), ("name", "Alice")]),
            record(&[("id", "2"), ("email", "bob@example.com"), ("name", "Bob")]),
            record(&[("id", "3"), ("email", "carol@example.com"), ("name", "")]),
        ]
    );
    assert_eq!(service.status_calls(), 3);
    assert_eq!(
        service.page_requests(),
        vec![None, Some("page-2".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_call_order_is_submit_then_status_then_pages() {
    let service = Arc::new(
        ScriptedExecutionService::new()
            .with_statuses([ExecutionStatus::running(), ExecutionStatus::succeeded()])
            .with_pages([vec![row(&[Some("n")]), row(&[Some("1")])]]),
    );

    client(&service).query("SELECT 1 AS n").await.unwrap();

    let calls = service.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(calls[0], ServiceCall::Submit(_)));
    assert!(matches!(calls[1], ServiceCall::GetStatus(_)));
    assert!(matches!(calls[2], ServiceCall::GetStatus(_)));
    assert!(matches!(
        calls[3],
        ServiceCall::GetResultsPage {
            next_token: None,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_failed_execution_never_fetches() {
    let service = Arc::new(ScriptedExecutionService::new().with_statuses([
        ExecutionStatus::queued(),
        ExecutionStatus::running(),
        ExecutionStatus::failed("syntax error"),
    ]));

    let err = client(&service).query("SELEC 1").await.unwrap_err();

    assert_eq!(
        err,
        AthenaError::ExecutionFailed {
            reason: "syntax error".to_string()
        }
    );
    assert!(service.page_requests().is_empty());
}

#[tokio::test]
async fn test_header_only_result_is_empty() {
    let service = Arc::new(
        ScriptedExecutionService::new()
            .with_statuses([ExecutionStatus::succeeded()])
            .with_pages([vec![row(&[Some("id"), Some("name")])]]),
    );

    let records = client(&service)
        .query("SELECT id, name FROM users WHERE false")
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_page_failure_returns_no_partial_results() {
    let service = Arc::new(
        ScriptedExecutionService::new()
            .with_statuses([ExecutionStatus::succeeded()])
            .with_page(
                None,
                ResultPage::with_next(vec![row(&[Some("n")]), row(&[Some("1")])], "t1"),
            )
            .with_page_error(Some("t1"), "ThrottlingException: Rate exceeded"),
    );

    let err = client(&service).query("SELECT n FROM t").await.unwrap_err();

    assert_eq!(
        err,
        AthenaError::service("ThrottlingException: Rate exceeded")
    );
}

#[tokio::test(start_paused = true)]
async fn test_records_serialize_in_column_order() {
    let service = Arc::new(
        ScriptedExecutionService::new()
            .with_statuses([ExecutionStatus::running(), ExecutionStatus::succeeded()])
            .with_pages([
                vec![row(&[Some("z"), Some("a")])],
                vec![row(&[Some("26"), Some("1")])],
            ]),
    );

    let records = client(&service)
        .with_poll_interval(Duration::from_millis(10))
        .query("SELECT z, a FROM letters")
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&records).unwrap(),
        r#"[{"z":"26","a":"1"}]"#
    );
}
