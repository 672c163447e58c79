//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::domain::book::DEFAULT_MIN_CONTENT_CHARS;
use crate::domain::line_splitter::{SplitConfig, SplitMode, DEFAULT_MIN_SENTENCE_CHARS};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音引擎配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 朗读配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 导入配置
    #[serde(default)]
    pub import: ImportConfig,

    /// 会话配置
    #[serde(default)]
    pub session: SessionConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 语音引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEngineKind {
    /// 本地命令行引擎（espeak-ng 等）
    Command,
    /// 不发声，按字数计时
    Fake,
}

impl SpeechEngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechEngineKind::Command => "command",
            SpeechEngineKind::Fake => "fake",
        }
    }
}

/// 语音引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// 引擎类型
    #[serde(default = "default_engine")]
    pub engine: SpeechEngineKind,

    /// 命令行引擎的可执行文件
    #[serde(default = "default_program")]
    pub program: String,

    /// 命令行引擎的音色名，为空时使用 language_tag
    #[serde(default)]
    pub voice: Option<String>,

    /// 语言标签
    #[serde(default = "default_language_tag")]
    pub language_tag: String,

    /// 默认语速倍率
    #[serde(default = "default_rate")]
    pub rate: f32,

    /// 默认音高倍率
    #[serde(default = "default_pitch")]
    pub pitch: f32,

    /// Fake 引擎 1.0 倍速下每秒朗读的字数
    #[serde(default = "default_fake_chars_per_sec")]
    pub fake_chars_per_sec: f32,
}

fn default_engine() -> SpeechEngineKind {
    SpeechEngineKind::Command
}

fn default_program() -> String {
    "espeak-ng".to_string()
}

fn default_language_tag() -> String {
    "zh-CN".to_string()
}

fn default_rate() -> f32 {
    0.9
}

fn default_pitch() -> f32 {
    1.0
}

fn default_fake_chars_per_sec() -> f32 {
    5.0
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            program: default_program(),
            voice: None,
            language_tag: default_language_tag(),
            rate: default_rate(),
            pitch: default_pitch(),
            fake_chars_per_sec: default_fake_chars_per_sec(),
        }
    }
}

/// 朗读配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 朗读单位：line（按行）或 sentence（按短句）
    #[serde(default)]
    pub split_mode: SplitMode,

    /// 句子模式下的最小字符数
    #[serde(default = "default_min_sentence_chars")]
    pub min_sentence_chars: usize,
}

fn default_min_sentence_chars() -> usize {
    DEFAULT_MIN_SENTENCE_CHARS
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::default(),
            min_sentence_chars: default_min_sentence_chars(),
        }
    }
}

impl PlaybackConfig {
    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            mode: self.split_mode,
            min_sentence_chars: self.min_sentence_chars,
        }
    }
}

/// 导入配置
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// 内容少于此字符数的文件拒绝导入
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    /// 上传文件最大大小（字节），默认 10MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_min_content_chars() -> usize {
    DEFAULT_MIN_CONTENT_CHARS
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 空闲超时（秒）
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// 空闲扫描间隔（秒）
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,
}

fn default_idle_timeout() -> u64 {
    1800 // 30 分钟
}

fn default_reap_interval() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            reap_interval_secs: default_reap_interval(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/tingshu.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.speech.engine, SpeechEngineKind::Command);
        assert_eq!(config.speech.language_tag, "zh-CN");
        assert_eq!(config.speech.rate, 0.9);
        assert_eq!(config.import.min_content_chars, 50);
        assert_eq!(config.database.path, "data/tingshu.db");
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5070");
    }

    #[test]
    fn test_database_url() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database_url(), "sqlite:data/tingshu.db?mode=rwc");
    }

    #[test]
    fn test_split_config() {
        let config = PlaybackConfig {
            split_mode: SplitMode::Sentence,
            min_sentence_chars: 8,
        };
        let split = config.split_config();
        assert_eq!(split.mode, SplitMode::Sentence);
        assert_eq!(split.min_sentence_chars, 8);
    }
}
