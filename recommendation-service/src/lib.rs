pub mod config;
pub mod models;
pub mod service;
pub mod workflow;

pub use config::ServiceConfig;
pub use service::{build_router, create_app};
pub use workflow::{ServiceState, build_controller, create_runner, expire_idle_sessions};
pub use models::*;
