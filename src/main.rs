//! Tingshu - 文本小说朗读服务
//!
//! - Domain: book/, playback/, 分章器与行分割器
//! - Application: commands, queries, ports, playback controller
//! - Infrastructure: http, memory, worker, persistence, adapters, events

use std::sync::Arc;
use std::time::Duration;

use tingshu::application::{SpeechEngineFactory, SpeechOptions};
use tingshu::config::{load_config, print_config, AppConfig, SpeechEngineKind};
use tingshu::infrastructure::adapters::{
    CommandSpeechEngineConfig, CommandSpeechEngineFactory, FakeSpeechEngineConfig,
    FakeSpeechEngineFactory,
};
use tingshu::infrastructure::events::EventPublisher;
use tingshu::infrastructure::http::{AppSettings, AppState, HttpServer, ServerConfig};
use tingshu::infrastructure::memory::InMemorySessionManager;
use tingshu::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
};
use tingshu::infrastructure::worker::{
    close_all_sessions, ProgressWriter, SessionReaper, SessionReaperConfig,
};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},tingshu={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 每个会话从工厂领取自己的引擎
fn build_speech_engines(config: &AppConfig) -> Arc<dyn SpeechEngineFactory> {
    match config.speech.engine {
        SpeechEngineKind::Command => Arc::new(CommandSpeechEngineFactory::new(CommandSpeechEngineConfig {
            program: config.speech.program.clone(),
            voice: config.speech.voice.clone(),
            extra_args: Vec::new(),
        })),
        SpeechEngineKind::Fake => Arc::new(FakeSpeechEngineFactory::new(FakeSpeechEngineConfig {
            chars_per_sec: config.speech.fake_chars_per_sec,
        })),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Tingshu - 文本小说朗读服务");
    print_config(&config);

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let book_repo = Arc::new(SqliteBookRepository::new(pool.clone()));
    let speech_engines = build_speech_engines(&config);
    let event_publisher = Arc::new(EventPublisher::new());
    let session_manager = Arc::new(InMemorySessionManager::new());

    // 进度写入按顺序落盘
    let (progress_writer, progress_worker) = ProgressWriter::new(book_repo.clone());
    let progress_writer = Arc::new(progress_writer);
    tokio::spawn(progress_worker.run());

    let reaper = SessionReaper::new(
        SessionReaperConfig {
            idle_timeout_secs: config.session.idle_timeout_secs,
            interval: Duration::from_secs(config.session.reap_interval_secs),
        },
        session_manager.clone(),
    );
    let reaper_task = tokio::spawn(reaper.run());

    let settings = AppSettings {
        split_config: config.playback.split_config(),
        speech_options: SpeechOptions {
            language_tag: config.speech.language_tag.clone(),
            rate: config.speech.rate,
            pitch: config.speech.pitch,
        },
        min_content_chars: config.import.min_content_chars,
        max_upload_size: config.import.max_upload_size,
    };
    let state = Arc::new(AppState::new(
        session_manager.clone(),
        book_repo,
        speech_engines,
        progress_writer.clone(),
        event_publisher,
        settings,
    ));

    let body_limit = usize::try_from(config.import.max_upload_size).unwrap_or(usize::MAX);
    let server_config = ServerConfig::new(&config.server.host, config.server.port, body_limit);
    let server = HttpServer::new(server_config, state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 关闭所有会话，等待最后的进度写入完成
    reaper_task.abort();
    let closed = close_all_sessions(session_manager.as_ref()).await;
    progress_writer.flush().await;
    pool.close().await;

    tracing::info!(closed_sessions = closed, "Server shutdown complete");

    Ok(())
}
