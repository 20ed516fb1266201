//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use catalog_service::config::CatalogConfig;
use catalog_service::http::HttpServer;
use catalog_service::lifecycle::Shutdown;
use catalog_service::observability::logging::init_test_logging;
use catalog_service::observability::tracing::RecordingTracer;
use catalog_service::store::MemoryStore;
use catalog_service::LatencyControl;
use serde_json::Value;
use tokio::net::TcpListener;

/// A catalog server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub tracer: RecordingTracer,
    pub latency: Arc<LatencyControl>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let res = self.client.get(self.url(path)).send().await.expect("server unreachable");
        into_parts(res).await
    }

    pub async fn put(&self, path: &str) -> (u16, Value) {
        let res = self.client.put(self.url(path)).send().await.expect("server unreachable");
        into_parts(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (u16, Value) {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("server unreachable");
        into_parts(res).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

async fn into_parts(res: reqwest::Response) -> (u16, Value) {
    let status = res.status().as_u16();
    let body = res.json().await.expect("body is not JSON");
    (status, body)
}

/// Start a server with default config over `store`.
pub async fn start_server(store: MemoryStore) -> TestServer {
    start_server_with(CatalogConfig::default(), store).await
}

/// Start a server with the given config over `store`.
pub async fn start_server_with(mut config: CatalogConfig, store: MemoryStore) -> TestServer {
    init_test_logging();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let store = Arc::new(store);
    let tracer = RecordingTracer::new();
    let server = HttpServer::new(config, store.clone(), Arc::new(tracer.clone()));
    let latency = server.state().latency.clone();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestServer {
        addr,
        store,
        tracer,
        latency,
        client,
        shutdown,
    }
}
