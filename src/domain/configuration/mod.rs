mod app_config;
pub mod loader;
mod locator_strategy;

pub use app_config::{
    ApiConfig, AppConfig, ChartConfig, DocumentConfig, ExecutionConfig, LocatorConfig,
};
pub use locator_strategy::LocatorStrategy;
