//! Tingshu - 文本小说顺序朗读服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book: 书籍、章节、播放位置
//! - Playback: 顺序朗读状态机与代际标记
//! - 分章器、行分割器
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechEngine, ProgressTracker, EventSink, SessionManager, Repositories）
//! - Playback: 每个会话一个的朗读控制器
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: SessionManager 内存实现
//! - Worker: 进度写入、空闲会话回收
//! - Persistence: SQLite 存储
//! - Adapters: 命令行语音引擎、计时假引擎
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
