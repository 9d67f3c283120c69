pub mod health;
pub mod metrics;
pub mod planet;
pub mod system;

pub use health::{liveness, readiness};
pub use metrics::metrics;
pub use planet::find_planet;
pub use system::host_info;
