pub mod collector;
pub mod database;
pub mod store;

pub use collector::{CollectorLogger, CollectorWorker, LogEntry, LogLevel};
pub use database::PlanetDb;
pub use store::{DisconnectedStore, InMemoryPlanetStore, PlanetStore};
