//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the MediaWiki API and test the full
//! crawl cycle end-to-end: crawl, checkpoint, resume, export and notify.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wikigraph::config::{
    Config, CrawlerConfig, NotifyConfig, OutputConfig, ResilienceConfig, SinkConfig,
    UserAgentConfig, WikiConfig,
};
use wikigraph::crawler::{export_graph, run_crawl_with, wiki_source, CrawlOptions};
use wikigraph::health::{Notification, NotificationSink, NotifyError, HEARTBEAT_SUBJECT};
use wikigraph::output::{read_elements, GraphElement};
use wikigraph::storage::{
    CheckpointStore, EdgeRecord, GraphLog, JsonCheckpointFile, JsonlGraphLog, NodeRecord,
};
use wikigraph::WikiGraphError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock API and a scratch directory
fn create_test_config(server: &MockServer, dir: &TempDir, seeds: &[&str], max_depth: u32) -> Config {
    let out = |name: &str| dir.path().join(name).display().to_string();
    Config {
        crawler: CrawlerConfig {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            max_depth,
            checkpoint_every: 1,
        },
        resilience: ResilienceConfig {
            request_timeout: 2000,
            retry_attempts: 3,
            retry_delay: 0,
            polite_delay: 0,
        },
        wiki: WikiConfig {
            api_url: format!("{}/w/api.php", server.uri()),
            article_base_url: "https://en.wikipedia.org/wiki/".to_string(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            node_log: out("nodes.jsonl"),
            edge_log: out("edges.jsonl"),
            checkpoint: out("checkpoint.json"),
            elements: out("elements.json"),
        },
        notify: NotifyConfig {
            heartbeat_interval: 3600,
            sink: SinkConfig::Log,
        },
    }
}

/// Sink that keeps every notification for inspection
#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    fn terminal(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.subject != HEARTBEAT_SUBJECT)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn links_body(title: &str, links: &[&str]) -> serde_json::Value {
    let links: Vec<_> = links
        .iter()
        .map(|l| serde_json::json!({"ns": 0, "title": l}))
        .collect();
    serde_json::json!({
        "batchcomplete": true,
        "query": {"pages": [{"ns": 0, "title": title, "links": links}]}
    })
}

async fn mount_page(server: &MockServer, title: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body(title, links)))
        .mount(server)
        .await;
}

async fn mount_missing(server: &MockServer, title: &str) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"pages": [{"ns": 0, "title": title, "missing": true}]}
        })))
        .mount(server)
        .await;
}

async fn mount_science_graph(server: &MockServer) {
    mount_page(server, "Science", &["Physics", "Category:Science"]).await;
    mount_page(server, "Physics", &["Energy"]).await;
    mount_page(server, "Energy", &["Science"]).await;
}

/// Titles requested from the mock API, in order
async fn requested_titles(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "titles")
                .map(|(_, v)| v.into_owned())
        })
        .collect()
}

async fn crawl(config: &Config, fresh: bool, sink: Arc<RecordingSink>) -> Result<usize, WikiGraphError> {
    let source = wiki_source(config)?;
    let options = CrawlOptions {
        fresh,
        config_hash: "test".to_string(),
    };
    run_crawl_with(config.clone(), options, Box::new(source), sink)
        .await
        .map(|summary| summary.nodes)
}

fn read_log(config: &Config) -> (Vec<String>, Vec<(String, String)>) {
    let mut log = JsonlGraphLog::open(
        Path::new(&config.output.node_log),
        Path::new(&config.output.edge_log),
    )
    .unwrap();
    let nodes = log.read_nodes().unwrap().map(|n| n.unwrap().id).collect();
    let edges = log
        .read_edges()
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (e.from, e.to)
        })
        .collect();
    (nodes, edges)
}

fn node_sizes(config: &Config) -> Vec<(String, f64)> {
    read_elements(Path::new(&config.output.elements))
        .unwrap()
        .into_iter()
        .filter_map(|element| match element {
            GraphElement::Node { data } => Some((data.id, data.size)),
            GraphElement::Edge { .. } => None,
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_science_graph() {
    let server = MockServer::start().await;
    mount_science_graph(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, &["Science"], 2);
    let sink = Arc::new(RecordingSink::default());

    let nodes = crawl(&config, false, sink.clone()).await.unwrap();

    assert_eq!(nodes, 3);
    assert_eq!(requested_titles(&server).await, vec!["Science", "Physics"]);

    let (logged_nodes, logged_edges) = read_log(&config);
    assert_eq!(logged_nodes, vec!["Science", "Physics", "Energy"]);
    assert_eq!(
        logged_edges,
        vec![
            ("Science".to_string(), "Physics".to_string()),
            ("Physics".to_string(), "Energy".to_string())
        ]
    );

    assert_eq!(
        node_sizes(&config),
        vec![
            ("Science".to_string(), 10.0),
            ("Physics".to_string(), 150.0),
            ("Energy".to_string(), 150.0)
        ]
    );

    let checkpoint = JsonCheckpointFile::new(&config.output.checkpoint)
        .load()
        .unwrap()
        .unwrap();
    assert!(checkpoint.queue.is_empty());

    let terminal = sink.terminal();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].subject, "Crawler Finished Successfully");
    assert!(terminal[0].body.starts_with("Crawl complete: 3 nodes, 2 edges."));
    assert_eq!(
        terminal[0].attachment.as_deref(),
        Some(Path::new(&config.output.elements))
    );
}

#[tokio::test]
async fn test_missing_seed_produces_empty_graph() {
    let server = MockServer::start().await;
    mount_missing(&server, "Nonexistent_Article_XYZ").await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, &["Nonexistent_Article_XYZ"], 3);

    let nodes = crawl(&config, false, Arc::new(RecordingSink::default()))
        .await
        .unwrap();

    assert_eq!(nodes, 0);
    let (logged_nodes, logged_edges) = read_log(&config);
    assert!(logged_nodes.is_empty());
    assert!(logged_edges.is_empty());
    assert!(read_elements(Path::new(&config.output.elements))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_resume_after_fatal_error() {
    let server = MockServer::start().await;
    mount_page(&server, "Science", &["Physics", "Chemistry"]).await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", "Physics"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, &["Science"], 3);
    let sink = Arc::new(RecordingSink::default());

    let err = crawl(&config, false, sink.clone()).await.unwrap_err();
    assert!(matches!(err, WikiGraphError::Fetch { ref title, .. } if title == "Physics"));

    let terminal = sink.terminal();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].subject, "Crawler Failed");
    assert!(terminal[0].body.contains("Physics"));
    assert!(terminal[0].body.contains("500"));
    assert!(!Path::new(&config.output.elements).exists());

    // the API recovers; the second run picks up at Physics
    server.reset().await;
    mount_page(&server, "Science", &["Physics", "Chemistry"]).await;
    mount_page(&server, "Physics", &["Energy"]).await;
    mount_page(&server, "Chemistry", &["Energy"]).await;
    mount_page(&server, "Energy", &[]).await;

    crawl(&config, false, Arc::new(RecordingSink::default()))
        .await
        .unwrap();

    assert_eq!(
        requested_titles(&server).await,
        vec!["Physics", "Chemistry", "Energy"]
    );

    let ids: Vec<String> = node_sizes(&config).into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["Science", "Physics", "Chemistry", "Energy"]);
}

#[tokio::test]
async fn test_fresh_discards_previous_state() {
    let server = MockServer::start().await;
    mount_science_graph(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, &["Science"], 2);

    crawl(&config, false, Arc::new(RecordingSink::default()))
        .await
        .unwrap();

    // a completed checkpoint means a plain rerun fetches nothing
    server.reset().await;
    mount_science_graph(&server).await;
    crawl(&config, false, Arc::new(RecordingSink::default()))
        .await
        .unwrap();
    assert!(requested_titles(&server).await.is_empty());

    server.reset().await;
    mount_science_graph(&server).await;
    crawl(&config, true, Arc::new(RecordingSink::default()))
        .await
        .unwrap();
    assert_eq!(requested_titles(&server).await, vec!["Science", "Physics"]);

    let (logged_nodes, _) = read_log(&config);
    assert_eq!(logged_nodes, vec!["Science", "Physics", "Energy"]);
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", "Science"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(links_body("Science", &["Physics"])),
        )
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(&server, "Science", &["Physics"]).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir, &["Science"], 1);
    config.resilience.request_timeout = 100;
    config.resilience.retry_attempts = 4;

    crawl(&config, false, Arc::new(RecordingSink::default()))
        .await
        .unwrap();

    assert_eq!(requested_titles(&server).await.len(), 4);
    let (_, logged_edges) = read_log(&config);
    assert_eq!(
        logged_edges,
        vec![("Science".to_string(), "Physics".to_string())]
    );
}

#[tokio::test]
async fn test_exhausted_retries_skip_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", "Science"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(links_body("Science", &["Physics"])),
        )
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(&server, "Science", &["Physics"]).await;
    mount_page(&server, "Art", &["Painting"]).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir, &["Science", "Art"], 1);
    config.resilience.request_timeout = 100;
    config.resilience.retry_attempts = 2;

    crawl(&config, false, Arc::new(RecordingSink::default()))
        .await
        .unwrap();

    let (logged_nodes, logged_edges) = read_log(&config);
    assert!(logged_edges.iter().all(|(from, _)| from != "Science"));
    assert!(!logged_nodes.contains(&"Science".to_string()));
    assert_eq!(
        logged_edges,
        vec![("Art".to_string(), "Painting".to_string())]
    );
}

#[tokio::test]
async fn test_finalize_only_from_existing_logs() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, &["A"], 2);

    {
        let mut log = JsonlGraphLog::open(
            Path::new(&config.output.node_log),
            Path::new(&config.output.edge_log),
        )
        .unwrap();
        for id in ["A", "B", "A"] {
            log.append_node(&NodeRecord::new(id)).unwrap();
        }
        for (from, to) in [("A", "B"), ("A", "B"), ("B", "C")] {
            log.append_edge(&EdgeRecord::new(from, to)).unwrap();
        }
        log.sync().unwrap();
    }

    let graph = export_graph(&config).unwrap();

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 2);
    assert_eq!(graph.backfilled, 1);
    assert!(requested_titles(&server).await.is_empty());

    let first = std::fs::read_to_string(&config.output.elements).unwrap();
    export_graph(&config).unwrap();
    let second = std::fs::read_to_string(&config.output.elements).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_finalize_only_leaves_live_logs_untouched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, &["Science"], 2);

    let node_log = Path::new(&config.output.node_log);
    let edge_log = Path::new(&config.output.edge_log);
    std::fs::create_dir_all(node_log.parent().unwrap()).unwrap();
    std::fs::write(node_log, "{\"id\":\"Science\"}\n{\"id\":\"Physics\"}\n{\"id\":\"Ene").unwrap();
    std::fs::write(edge_log, "{\"from\":\"Science\",\"to\":\"Physics\"}\n{\"from\":\"Sci").unwrap();
    let nodes_before = std::fs::read(node_log).unwrap();
    let edges_before = std::fs::read(edge_log).unwrap();

    let graph = export_graph(&config).unwrap();

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(std::fs::read(node_log).unwrap(), nodes_before);
    assert_eq!(std::fs::read(edge_log).unwrap(), edges_before);
}

#[tokio::test]
async fn test_finalize_only_without_logs_creates_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, &["Science"], 2);

    let graph = export_graph(&config).unwrap();

    assert!(graph.nodes.is_empty());
    assert!(!Path::new(&config.output.node_log).exists());
    assert!(!Path::new(&config.output.edge_log).exists());
}
