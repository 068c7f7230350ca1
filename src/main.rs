use anyhow::Context;
use fflogs_percentile::config::Config;
use fflogs_percentile::fflogs::FFLogsPlugin;
use fflogs_percentile::plugin::PluginManager;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[tokio::main]
async fn main() {
    // 로깅 초기화: 콘솔 + 일별 로테이션 파일
    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("bot")
        .filename_suffix("log")
        .build("logs")
        .expect("initializing rolling file appender failed");

    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(std::io::stderr.and(non_blocking))
        .with_ansi(true)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = if args.is_empty() {
        Cow::from("./config.toml")
    } else {
        Cow::from(args.remove(0))
    };

    let config = match get_config(&*config_path).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return;
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!("Bot error: {}", e);
        tracing::error!("  {:?}", e);
    }
}

/// 표준 입력의 한 줄을 채팅 메시지 하나로 취급합니다.
async fn run(config: Config) -> anyhow::Result<()> {
    let mut plugins = PluginManager::new();

    let fflogs = FFLogsPlugin::new(&config.fflogs, &config.data_dir)
        .context("could not initialize fflogs plugin")?;
    plugins.register(Arc::new(fflogs))?;
    plugins.enable_all();

    tracing::info!("reading messages from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("could not read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for reply in plugins.dispatch(line).await {
            println!("{}", reply);
        }
    }

    plugins.disable_all();
    Ok(())
}

async fn get_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let mut f = File::open(path)
        .await
        .context("could not open config file")?;
    let mut toml = String::new();
    f.read_to_string(&mut toml)
        .await
        .context("could not read config file")?;
    let config = toml::from_str(&toml).context("could not parse config file")?;

    Ok(config)
}
