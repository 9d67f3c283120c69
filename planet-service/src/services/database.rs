use crate::config::MongoConfig;
use crate::models::Planet;
use crate::services::store::PlanetStore;
use async_trait::async_trait;
use mongodb::{bson::doc, options::ClientOptions, Client as MongoClient, Collection, Database};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::time::Duration;

/// Database used when neither `MONGO_DATABASE` nor the URI names one.
pub const DEFAULT_DATABASE: &str = "test";
pub const PLANETS_COLLECTION: &str = "planets";
/// The listener is bound only after the startup `ping`, so this bounds how
/// long probes stay unreachable when the server is down. The URI's
/// `serverSelectionTimeoutMS` wins when present.
pub const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct PlanetDb {
    client: MongoClient,
    db: Database,
}

impl PlanetDb {
    /// Open the client and confirm the deployment answers a `ping`.
    ///
    /// The driver connects lazily, so the ping is what turns an unreachable
    /// server into a startup error.
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        let uri = config
            .uri
            .as_deref()
            .ok_or_else(|| AppError::DatabaseError(anyhow::anyhow!("MONGO_URI is not set")))?;

        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        apply_credentials(&mut options, config);
        options
            .server_selection_timeout
            .get_or_insert(DEFAULT_SERVER_SELECTION_TIMEOUT);

        let client = MongoClient::with_options(options)?;
        let db = match config.database.as_deref() {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        tracing::info!(database = %db.name(), "Connecting to MongoDB");
        let planet_db = Self { client, db };
        planet_db.health_check().await?;
        tracing::info!(
            database = %planet_db.db.name(),
            "Successfully connected to MongoDB database"
        );

        Ok(planet_db)
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn planets(&self) -> Collection<Planet> {
        self.db.collection(PLANETS_COLLECTION)
    }
}

#[async_trait]
impl PlanetStore for PlanetDb {
    async fn find_planet_by_id(&self, id: i64) -> Result<Option<Planet>, AppError> {
        // Numeric comparison in the server also matches ids stored as doubles.
        self.planets()
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(planet_id = id, "Failed to find planet: {}", e);
                AppError::from(e)
            })
    }

    async fn shutdown(&self) {
        tracing::info!("Closing MongoDB client");
        self.client.clone().shutdown().await;
    }
}

/// Explicit username/password override whatever the URI carries.
fn apply_credentials(options: &mut ClientOptions, config: &MongoConfig) {
    if config.username.is_none() && config.password.is_none() {
        return;
    }

    let mut credential = options.credential.take().unwrap_or_default();
    if let Some(username) = &config.username {
        credential.username = Some(username.clone());
    }
    if let Some(password) = &config.password {
        credential.password = Some(password.expose_secret().clone());
    }
    options.credential = Some(credential);
}
