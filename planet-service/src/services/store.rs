use crate::models::Planet;
use async_trait::async_trait;
use service_core::error::AppError;

/// Read-only access to planet records.
#[async_trait]
pub trait PlanetStore: Send + Sync {
    /// First record whose `id` equals `id`, or `None` when nothing matches.
    async fn find_planet_by_id(&self, id: i64) -> Result<Option<Planet>, AppError>;

    /// Release the underlying session. Called once after the server stops.
    async fn shutdown(&self) {}
}

/// Stands in for the database when the startup connection failed.
///
/// The session is never re-established, so every lookup fails.
pub struct DisconnectedStore {
    reason: String,
}

impl DisconnectedStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PlanetStore for DisconnectedStore {
    async fn find_planet_by_id(&self, _id: i64) -> Result<Option<Planet>, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!(
            "database session not established: {}",
            self.reason
        )))
    }
}

/// Fixed set of records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanetStore {
    planets: Vec<Planet>,
}

impl InMemoryPlanetStore {
    pub fn new(planets: Vec<Planet>) -> Self {
        Self { planets }
    }
}

#[async_trait]
impl PlanetStore for InMemoryPlanetStore {
    async fn find_planet_by_id(&self, id: i64) -> Result<Option<Planet>, AppError> {
        Ok(self
            .planets
            .iter()
            .find(|planet| planet.id == Some(id))
            .cloned())
    }
}
