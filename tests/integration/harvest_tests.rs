//! Integration tests for the search harvester
//!
//! These tests use wiremock to stand in for the search API and run harvests
//! against a temporary SQLite store.

use proxy_harvest::config::SearchConfig;
use proxy_harvest::search::{daily_query, today_at_offset};
use proxy_harvest::storage::{
    open_storage, CheckpointStore, HarvestedRecord, RecordSink, SqliteStorage,
};
use proxy_harvest::{HarvestError, SearchCursor, SearchHarvester, StopReason};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const SEARCH_PATH: &str = "/api/v1/search/";
const QUERY: &str = "domain:translate.goog";

/// Matches requests that carry no `search_after` parameter
struct FirstPage;

impl Match for FirstPage {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(k, _)| k == "search_after")
    }
}

fn search_config(server: &MockServer, keys: &[&str]) -> SearchConfig {
    SearchConfig {
        api_url: format!("{}{}", server.uri(), SEARCH_PATH),
        api_keys: keys.iter().map(|k| k.to_string()).collect(),
        query: QUERY.to_string(),
        proxy_type: None,
        page_size: 100,
        max_pages: 50,
        empty_page_streak: 5,
        backoff_secs: 0,
        page_delay_ms: 0,
        request_timeout_secs: 5,
        utc_offset_hours: 9,
    }
}

fn temp_storage() -> (TempDir, SqliteStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir.path().join("db").join("urls.db")).unwrap();
    (dir, storage)
}

fn id(n: u64) -> String {
    format!("00000000-0000-4000-8000-{:012}", n)
}

fn ts(n: u64) -> String {
    (1_714_521_600_000u64 - n * 1000).to_string()
}

fn item(n: u64) -> Value {
    json!({
        "_id": id(n),
        "sort": [ts(n).parse::<u64>().unwrap(), id(n)],
        "task": {
            "url": format!("https://site{}-example-com.translate.goog/", n),
            "time": "2024-05-01T00:00:00.000Z",
            "uuid": id(n)
        },
        "page": {
            "url": format!("https://site{}-example-com.translate.goog/", n),
            "country": "US",
            "ip": "203.0.113.7",
            "requests": 10,
            "uniqIPs": 2
        },
        "verdicts": { "overall": { "score": 0, "malicious": false } }
    })
}

fn page(items: &[u64]) -> ResponseTemplate {
    let results: Vec<Value> = items.iter().map(|n| item(*n)).collect();
    ResponseTemplate::new(200).set_body_json(json!({ "results": results, "total": 1000 }))
}

fn after(n: u64) -> String {
    format!("{},{}", ts(n), id(n))
}

/// Mounts a three-page result set: [1, 2] -> [3] -> []
async fn mount_three_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", QUERY))
        .and(FirstPage)
        .respond_with(page(&[1, 2]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("search_after", after(2).as_str()))
        .respond_with(page(&[3]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("search_after", after(3).as_str()))
        .respond_with(page(&[]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_paginates_until_end_of_results() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;
    let (_dir, mut storage) = temp_storage();

    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.inserted, 3);
    assert_eq!(report.stop, StopReason::EndOfResults);
    assert_eq!(storage.count_records().unwrap(), 3);

    // The last committed cursor is kept
    let checkpoint = storage.get_checkpoint(QUERY).unwrap().unwrap();
    assert_eq!(checkpoint.to_param(), after(3));
}

#[tokio::test]
async fn test_interrupted_harvest_resumes_from_checkpoint() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;
    let (_dir, mut storage) = temp_storage();
    let config = search_config(&server, &["k1"]);

    let mut first = SearchHarvester::from_config(&config).unwrap();
    let report = first.harvest(&mut storage, QUERY, 1, 100).await.unwrap();
    assert_eq!(report.stop, StopReason::PageLimit);
    assert_eq!(report.inserted, 2);
    assert_eq!(
        storage.get_checkpoint(QUERY).unwrap().map(|c| c.to_param()),
        Some(after(2))
    );

    let mut second = SearchHarvester::from_config(&config).unwrap();
    let report = second.harvest(&mut storage, QUERY, 50, 100).await.unwrap();
    assert_eq!(report.pages, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(storage.count_records().unwrap(), 3);

    let requests = server.received_requests().await.unwrap();
    let first_page_requests = requests.iter().filter(|r| FirstPage.matches(r)).count();
    assert_eq!(first_page_requests, 1);
}

#[tokio::test]
async fn test_replayed_boundary_page_adds_nothing() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;
    let (_dir, mut storage) = temp_storage();
    let config = search_config(&server, &["k1"]);

    let mut harvester = SearchHarvester::from_config(&config).unwrap();
    harvester.harvest(&mut storage, QUERY, 2, 100).await.unwrap();

    // Simulate a crash before the page-2 cursor was committed
    storage
        .put_checkpoint(QUERY, &SearchCursor::new(&ts(2), &id(2)).unwrap())
        .unwrap();

    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(storage.count_records().unwrap(), 3);
}

#[tokio::test]
async fn test_malformed_checkpoint_starts_from_newest() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;
    let (dir, mut storage) = temp_storage();

    let conn = rusqlite::Connection::open(dir.path().join("db").join("urls.db")).unwrap();
    conn.execute(
        "INSERT INTO harvest_checkpoints (query, search_after, updated_at) VALUES (?1, ?2, 'x')",
        rusqlite::params![QUERY, r#"["123", "short-id"]"#],
    )
    .unwrap();
    drop(conn);

    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    assert_eq!(report.inserted, 3);
}

#[tokio::test]
async fn test_rate_limit_on_every_key_exhausts_pool() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("API-Key", "k1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("API-Key", "k2"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let config = search_config(&server, &["k1", "k2"]);
    let mut harvester = SearchHarvester::from_config(&config).unwrap();
    let result = harvester.harvest(&mut storage, QUERY, 50, 100).await;

    assert!(matches!(
        result,
        Err(HarvestError::CredentialsExhausted { attempts: 3 })
    ));

    // k1, k2, then k1 again: the expectations above are checked on drop
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(storage.count_records().unwrap(), 0);
}

#[tokio::test]
async fn test_rate_limit_rotates_to_next_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("API-Key", "k1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("API-Key", "k2"))
        .respond_with(page(&[1]))
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut config = search_config(&server, &["k1", "k2"]);
    config.empty_page_streak = 1;
    let mut harvester = SearchHarvester::from_config(&config).unwrap();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    // Page 1 inserts, page 2 repeats it and hits the streak of one
    assert_eq!(report.inserted, 1);
    assert_eq!(report.stop, StopReason::EmptyStreak);
}

#[tokio::test]
async fn test_bad_request_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid query"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let config = search_config(&server, &["k1", "k2"]);
    let mut harvester = SearchHarvester::from_config(&config).unwrap();
    let err = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap_err();

    match &err {
        HarvestError::Api { status, body } => {
            assert_eq!(*status, 400);
            assert_eq!(body, "invalid query");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_forbidden_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let result = harvester.harvest(&mut storage, QUERY, 50, 100).await;

    assert!(matches!(result, Err(HarvestError::Api { status: 403, .. })));
}

#[tokio::test]
async fn test_server_error_retries_same_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(FirstPage)
        .respond_with(page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    assert_eq!(report.pages, 1);
    assert_eq!(report.stop, StopReason::EndOfResults);
}

#[tokio::test]
async fn test_timed_out_request_retries_same_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(page(&[1]).set_delay(Duration::from_secs(3)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(FirstPage)
        .respond_with(page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut config = search_config(&server, &["k1"]);
    config.request_timeout_secs = 1;
    let mut harvester = SearchHarvester::from_config(&config).unwrap();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    assert_eq!(report.pages, 1);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.stop, StopReason::EndOfResults);
}

#[tokio::test]
async fn test_repeated_transport_errors_exhaust_single_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(page(&[1]).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut config = search_config(&server, &["k1"]);
    config.request_timeout_secs = 1;
    let mut harvester = SearchHarvester::from_config(&config).unwrap();
    let result = harvester.harvest(&mut storage, QUERY, 50, 100).await;

    assert!(matches!(
        result,
        Err(HarvestError::CredentialsExhausted { attempts: 2 })
    ));
    assert_eq!(storage.count_records().unwrap(), 0);
}

#[tokio::test]
async fn test_retry_after_seconds_delay_rotation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("API-Key", "k1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("API-Key", "k2"))
        .respond_with(page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let config = search_config(&server, &["k1", "k2"]);
    assert_eq!(config.backoff_secs, 0);
    let mut harvester = SearchHarvester::from_config(&config).unwrap();

    let started = Instant::now();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(report.pages, 1);
    assert_eq!(report.stop, StopReason::EndOfResults);
}

#[tokio::test]
async fn test_page_with_null_and_float_fields_still_harvests() {
    let server = MockServer::start().await;

    let mut odd = item(1);
    odd["verdicts"] = Value::Null;
    odd["page"]["requests"] = json!(12.0);
    let mut unsorted = item(2);
    unsorted["sort"] = Value::Null;
    unsorted["task"] = Value::Null;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(FirstPage)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "results": [odd, unsorted, null], "total": 2.0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // The cursor comes from the last hit that still has a sort key
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("search_after", after(1).as_str()))
        .respond_with(page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.stop, StopReason::EndOfResults);
    assert_eq!(storage.count_records().unwrap(), 2);
}

#[tokio::test]
async fn test_empty_page_streak_stops_despite_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(page(&[7]))
        .expect(6)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let report = harvester.harvest(&mut storage, QUERY, 50, 100).await.unwrap();

    assert_eq!(report.pages, 6);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.stop, StopReason::EmptyStreak);
    assert!(storage.get_checkpoint(QUERY).unwrap().is_some());
}

#[tokio::test]
async fn test_daily_schedule_on_empty_store_collects_today_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(page(&[]))
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let reports = harvester.harvest_daily(&mut storage).await.unwrap();

    let today = today_at_offset(9);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, today);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let q = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.into_owned());
    assert_eq!(q, Some(daily_query(QUERY, today)));
}

fn dated_record(external_id: &str, scan_date: chrono::NaiveDate) -> HarvestedRecord {
    HarvestedRecord {
        external_id: external_id.to_string(),
        source: "urlscan".to_string(),
        proxy_type: "google_translate".to_string(),
        task_url: None,
        page_url: None,
        score: None,
        malicious: None,
        country: None,
        ip: None,
        http_requests: None,
        unique_ips: None,
        scan_timestamp: Some(format!("{}T12:00:00.000Z", scan_date.format("%Y-%m-%d"))),
        collected_at: "2024-05-01T00:00:00".to_string(),
    }
}

#[tokio::test]
async fn test_daily_schedule_walks_back_to_newest_stored_day() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(page(&[]))
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let today = today_at_offset(9);
    let two_days_ago = today - chrono::Duration::days(2);
    storage
        .insert_if_absent(&dated_record("seed", two_days_ago))
        .unwrap();

    // A stale cursor for the oldest day must be discarded
    storage
        .put_checkpoint(
            &daily_query(QUERY, two_days_ago),
            &SearchCursor::new(&ts(1), &id(1)).unwrap(),
        )
        .unwrap();

    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let reports = harvester.harvest_daily(&mut storage).await.unwrap();

    let days: Vec<_> = reports.iter().map(|(d, _)| *d).collect();
    assert_eq!(
        days,
        vec![today, today - chrono::Duration::days(1), two_days_ago]
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| FirstPage.matches(r)));
}

#[tokio::test]
async fn test_fatal_error_aborts_daily_schedule() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut storage) = temp_storage();
    let today = today_at_offset(9);
    storage
        .insert_if_absent(&dated_record("seed", today - chrono::Duration::days(3)))
        .unwrap();

    let mut harvester = SearchHarvester::from_config(&search_config(&server, &["k1"])).unwrap();
    let result = harvester.harvest_daily(&mut storage).await;

    assert!(matches!(result, Err(HarvestError::Api { status: 403, .. })));
}
