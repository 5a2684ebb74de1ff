mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, EngineSettings, LlmConfig, LogFormat, LoggingConfig,
    ModelSettings, NotificationConfig,
};
