#![allow(dead_code)]

use axum::{http::StatusCode, routing::post, Json, Router};
use planet_service::config::{CollectorConfig, MongoConfig, PlanetConfig, WebConfig};
use planet_service::models::Planet;
use planet_service::services::{InMemoryPlanetStore, PlanetStore};
use planet_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const TEST_ENVIRONMENT: &str = "test";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

pub fn test_config(mongo_uri: Option<String>, collector_url: Option<String>) -> PlanetConfig {
    PlanetConfig {
        common: CoreConfig { port: 0 },
        mongodb: MongoConfig {
            uri: mongo_uri,
            username: None,
            password: None,
            database: None,
        },
        collector: CollectorConfig {
            url: collector_url,
            queue_size: 64,
            request_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(5),
        },
        web: WebConfig {
            root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
        },
        environment: Some(TEST_ENVIRONMENT.to_string()),
    }
}

pub fn mars() -> Planet {
    Planet {
        name: Some("Mars".to_string()),
        id: Some(3),
        description: Some("Red planet".to_string()),
        image: Some("mars.png".to_string()),
        velocity: Some("24.1 km/s".to_string()),
        distance: Some("227.9M km".to_string()),
    }
}

pub fn seeded_store() -> Arc<dyn PlanetStore> {
    Arc::new(InMemoryPlanetStore::new(vec![
        Planet {
            name: Some("Mercury".to_string()),
            id: Some(1),
            ..Default::default()
        },
        mars(),
    ]))
}

impl TestApp {
    /// Spawn the service around the seeded in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with_store(seeded_store(), None).await
    }

    pub async fn spawn_with_store(
        store: Arc<dyn PlanetStore>,
        collector_url: Option<String>,
    ) -> Self {
        let app = Application::build_with_store(test_config(None, collector_url), store)
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    /// Spawn through the real startup path, including the MongoDB connection attempt.
    pub async fn spawn_with_mongo(
        mongo_uri: Option<String>,
        collector_url: Option<String>,
    ) -> Self {
        let app = Application::build(test_config(mongo_uri, collector_url))
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    async fn run(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the liveness probe
        let client = reqwest::Client::new();
        let live_url = format!("{}/live", address);
        for _ in 0..50 {
            if client.get(&live_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_planet(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/planet", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Stand-in for the external log collector. Records every JSON body it receives.
pub struct StubCollector {
    pub url: String,
    entries: mpsc::UnboundedReceiver<serde_json::Value>,
}

impl StubCollector {
    pub async fn spawn() -> Self {
        Self::spawn_with_status(StatusCode::OK).await
    }

    pub async fn spawn_with_status(status: StatusCode) -> Self {
        let (tx, entries) = mpsc::unbounded_channel();
        let router = Router::new().route(
            "/logs",
            post(move |Json(entry): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(entry);
                    status
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub collector");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        StubCollector {
            url: format!("http://127.0.0.1:{}/logs", port),
            entries,
        }
    }

    /// Next entry whose `msg` equals `msg`, skipping others.
    pub async fn wait_for_msg(&mut self, msg: &str) -> serde_json::Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let entry = tokio::time::timeout_at(deadline, self.entries.recv())
                .await
                .unwrap_or_else(|_| panic!("Timed out waiting for collector entry '{}'", msg))
                .expect("Stub collector channel closed");
            if entry["msg"] == msg {
                return entry;
            }
        }
    }
}

/// A collector that accepts connections and never answers.
pub async fn spawn_silent_collector() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind silent collector");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{}/logs", port)
}
