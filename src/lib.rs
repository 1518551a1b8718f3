pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod validation;

pub use config::Config;
pub use error::ApiError;
pub use routes::router;
