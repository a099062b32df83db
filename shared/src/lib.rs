//! Host-side adapters for the trade engine: environment configuration,
//! MySQL persistence through sea-orm, Redis live updates and tracing setup.

pub mod config;
pub mod database;
pub mod entity;
pub mod notifier;
pub mod repository;
pub mod telemetry;

pub use config::Config;
pub use database::get_db_connection;
pub use notifier::{get_redis_client, RedisNotifier};
pub use repository::SeaOrmRepository;
pub use telemetry::init_tracing;
