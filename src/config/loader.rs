//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, SpeechEngineKind};
use crate::application::playback::{MAX_RATE, MIN_RATE};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `TINGSHU_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `TINGSHU_SERVER__PORT=8080`
/// - `TINGSHU_SPEECH__ENGINE=fake`
/// - `TINGSHU_SPEECH__RATE=1.2`
/// - `TINGSHU_DATABASE__PATH=/data/tingshu.db`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("speech.engine", "command")?
        .set_default("speech.program", "espeak-ng")?
        .set_default("speech.language_tag", "zh-CN")?
        .set_default("speech.rate", 0.9)?
        .set_default("speech.pitch", 1.0)?
        .set_default("speech.fake_chars_per_sec", 5.0)?
        .set_default("playback.split_mode", "line")?
        .set_default("playback.min_sentence_chars", 20)?
        .set_default("import.min_content_chars", 50)?
        .set_default("import.max_upload_size", 10 * 1024 * 1024)?
        .set_default("session.idle_timeout_secs", 1800)?
        .set_default("session.reap_interval_secs", 60)?
        .set_default("database.path", "data/tingshu.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: TINGSHU_SPEECH__PROGRAM=/usr/bin/espeak-ng
    builder = builder.add_source(
        Environment::with_prefix("TINGSHU")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.speech.engine == SpeechEngineKind::Command && config.speech.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Speech program cannot be empty for the command engine".to_string(),
        ));
    }

    if !(MIN_RATE..=MAX_RATE).contains(&config.speech.rate) {
        return Err(ConfigError::ValidationError(format!(
            "Speech rate {} out of range {}..={}",
            config.speech.rate, MIN_RATE, MAX_RATE
        )));
    }

    if config.speech.pitch <= 0.0 || config.speech.fake_chars_per_sec <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Speech pitch and fake_chars_per_sec must be positive".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.session.reap_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Session reap interval cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Speech Engine: {}", config.speech.engine.as_str());
    if config.speech.engine == SpeechEngineKind::Command {
        tracing::info!("Speech Program: {}", config.speech.program);
    }
    tracing::info!(
        "Speech Options: lang={} rate={} pitch={}",
        config.speech.language_tag,
        config.speech.rate,
        config.speech.pitch
    );
    tracing::info!("Split Mode: {:?}", config.playback.split_mode);
    tracing::info!("Min Content Chars: {}", config.import.min_content_chars);
    tracing::info!("Session Idle Timeout: {}s", config.session.idle_timeout_secs);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
