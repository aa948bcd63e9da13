//! HTTP service tests against a local fake endpoint.
//!
//! A minimal HTTP/1.1 server on 127.0.0.1 answers the three Athena actions
//! from a script, so the real reqwest client is exercised end to end.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use athena_query::query::{QueryClient, QueryContext};
use athena_query::service::{HttpExecutionService, HttpServiceConfig};
use athena_query::AthenaError;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// One request as seen by the fake endpoint.
#[derive(Debug, Clone)]
struct Received {
    target: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Default)]
struct FakeAthena {
    statuses: Mutex<VecDeque<Value>>,
    pages: Mutex<VecDeque<Value>>,
    start_error: Option<(u16, String)>,
    received: Mutex<Vec<Received>>,
}

impl FakeAthena {
    fn respond(&self, request: &Received) -> (u16, String) {
        match request.target.as_str() {
            "AmazonAthena.StartQueryExecution" => match &self.start_error {
                Some((code, body)) => (*code, body.clone()),
                None => (200, json!({ "QueryExecutionId": "qe-123" }).to_string()),
            },
            "AmazonAthena.GetQueryExecution" => {
                let status = self
                    .statuses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| json!({ "State": "SUCCEEDED" }));
                (
                    200,
                    json!({ "QueryExecution": { "QueryExecutionId": "qe-123", "Status": status } })
                        .to_string(),
                )
            }
            "AmazonAthena.GetQueryResults" => {
                let page = self.pages.lock().unwrap().pop_front();
                match page {
                    Some(page) => (200, page.to_string()),
                    None => (400, json!({ "Message": "no more pages" }).to_string()),
                }
            }
            other => (400, json!({ "Message": format!("unknown target {other}") }).to_string()),
        }
    }

    fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

fn result_page(rows: &[&[Option<&str>]], next_token: Option<&str>) -> Value {
    let rows: Vec<Value> = rows
        .iter()
        .map(|cells| {
            let data: Vec<Value> = cells
                .iter()
                .map(|cell| match cell {
                    Some(v) => json!({ "VarCharValue": v }),
                    None => json!({}),
                })
                .collect();
            json!({ "Data": data })
        })
        .collect();

    let mut page = json!({ "ResultSet": { "Rows": rows } });
    if let Some(token) = next_token {
        page["NextToken"] = json!(token);
    }
    page
}

async fn handle_connection(stream: TcpStream, fake: Arc<FakeAthena>) {
    let mut reader = BufReader::new(stream);

    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }

        let mut content_length = 0usize;
        let mut target = String::new();
        let mut authorization = None;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let value = value.trim().to_string();
                match name.to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.parse().unwrap_or(0),
                    "x-amz-target" => target = value,
                    "authorization" => authorization = Some(value),
                    _ => {}
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let received = Received {
            target,
            authorization,
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        };
        let (code, response_body) = fake.respond(&received);
        fake.received.lock().unwrap().push(received);

        let response = format!(
            "HTTP/1.1 {code} X\r\nContent-Type: application/x-amz-json-1.1\r\nContent-Length: {}\r\n\r\n{}",
            response_body.len(),
            response_body
        );
        if reader.get_mut().write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Starts the fake endpoint and returns its URL.
async fn start(fake: Arc<FakeAthena>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_connection(stream, fake.clone()));
        }
    });

    format!("http://{addr}/")
}

fn client(endpoint: String, token: Option<&str>) -> QueryClient {
    let mut config = HttpServiceConfig::new(endpoint).with_timeout(5);
    if let Some(token) = token {
        config = config.with_bearer_token(token);
    }
    let service = HttpExecutionService::new(config).unwrap();
    QueryClient::new(Arc::new(service), QueryContext::new("sales", "AwsDataCatalog"))
        .with_poll_interval(Duration::from_millis(5))
}

#[tokio::test]
async fn test_http_query_end_to_end() {
    let fake = Arc::new(FakeAthena {
        statuses: Mutex::new(VecDeque::from([
            json!({ "State": "QUEUED" }),
            json!({ "State": "RUNNING" }),
            json!({ "State": "SUCCEEDED" }),
        ])),
        pages: Mutex::new(VecDeque::from([
            result_page(&[&[Some("id"), Some("name")], &[Some("1"), Some("Alice")]], Some("t1")),
            result_page(&[&[Some("2"), None]], None),
        ])),
        ..Default::default()
    });
    let endpoint = start(fake.clone()).await;

    let records = client(endpoint, Some("secret"))
        .query("SELECT id, name FROM users")
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("name"), Some("Alice"));
    assert_eq!(records[1].get("id"), Some("2"));
    assert_eq!(records[1].get("name"), Some(""));

    let received = fake.received();
    let targets: Vec<_> = received.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(
        targets,
        vec![
            "AmazonAthena.StartQueryExecution",
            "AmazonAthena.GetQueryExecution",
            "AmazonAthena.GetQueryExecution",
            "AmazonAthena.GetQueryExecution",
            "AmazonAthena.GetQueryResults",
            "AmazonAthena.GetQueryResults",
        ]
    );

    assert_eq!(received[0].authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(
        received[0].body,
        json!({
            "QueryString": "SELECT id, name FROM users",
            "QueryExecutionContext": { "Database": "sales", "Catalog": "AwsDataCatalog" },
            "WorkGroup": "primary",
            "ResultReuseConfiguration": {
                "ResultReuseByAgeConfiguration": { "Enabled": true, "MaxAgeInMinutes": 60 }
            }
        })
    );
    assert_eq!(received[4].body, json!({ "QueryExecutionId": "qe-123" }));
    assert_eq!(
        received[5].body,
        json!({ "QueryExecutionId": "qe-123", "NextToken": "t1" })
    );
}

#[tokio::test]
async fn test_http_failed_execution() {
    let fake = Arc::new(FakeAthena {
        statuses: Mutex::new(VecDeque::from([json!({
            "State": "FAILED",
            "StateChangeReason": "syntax error"
        })])),
        ..Default::default()
    });
    let endpoint = start(fake.clone()).await;

    let err = client(endpoint, None).query("SELEC 1").await.unwrap_err();

    assert_eq!(err, AthenaError::execution_failed("syntax error"));
    assert!(fake
        .received()
        .iter()
        .all(|r| r.target != "AmazonAthena.GetQueryResults"));
    assert_eq!(fake.received()[0].authorization, None);
}

#[tokio::test]
async fn test_http_service_error_on_submit() {
    let fake = Arc::new(FakeAthena {
        start_error: Some((
            400,
            json!({ "__type": "InvalidRequestException", "Message": "Database sales does not exist" })
                .to_string(),
        )),
        ..Default::default()
    });
    let endpoint = start(fake.clone()).await;

    let err = client(endpoint, None).query("SELECT 1").await.unwrap_err();

    assert_eq!(
        err,
        AthenaError::service("InvalidRequestException: Database sales does not exist")
    );
    assert_eq!(fake.received().len(), 1);
}

#[tokio::test]
async fn test_http_connection_refused_is_service_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{addr}/"), None)
        .query("SELECT 1")
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaError::Service(_)), "{err:?}");
}
