use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rechat::{
    config::{AppConfig, ConfigManager},
    logging, CancellationToken, InnerTubeTransport, Outcome, RejectReason, SessionError,
    SessionRunner,
};

/// Fetch the chat replay of an archived YouTube stream and save it as CSV
#[derive(Parser, Debug)]
#[command(name = "rechat")]
#[command(version)]
struct Cli {
    /// Video URL (watch or live share link) or bare video id
    locator: String,

    /// Destination CSV file
    #[arg(short, long)]
    output: PathBuf,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Column delimiter, overrides the config file
    #[arg(long)]
    delimiter: Option<char>,

    /// Log level or filter directive, overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config()?;

    if let Some(delimiter) = cli.delimiter {
        config.export.delimiter = delimiter;
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

/// `HH:MM:SS`
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Records per second, whole numbers only.
fn throughput(total: usize, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (total as f64 / secs) as u64
    } else {
        total as u64
    }
}

/// Drives `session` until it finishes or `cancel` fires. Retrieval observes
/// the token itself; this covers the waits before it, such as the watch page
/// request during validation.
async fn until_cancelled<F>(session: F, cancel: &CancellationToken) -> Result<Outcome, SessionError>
where
    F: Future<Output = Result<Outcome, SessionError>>,
{
    tokio::select! {
        biased;
        outcome = session => outcome,
        _ = cancel.cancelled() => {
            tracing::info!("🛑 Session interrupted");
            Ok(Outcome::Cancelled)
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<ExitCode> {
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::info!("🛑 中止シグナルを受信しました");
        handler_token.cancel();
    })
    .context("Failed to set signal handler")?;

    let transport = InnerTubeTransport::new(config.fetch.clone());
    let runner = SessionRunner::new(&transport)
        .with_exporter(config.export.exporter())
        .with_header(config.export.header.clone());

    let mut progress = |total: usize| tracing::info!(total, "📥 取得数 {}", total);
    let destination = cli.output.to_string_lossy();

    let outcome = until_cancelled(
        runner.run(&cli.locator, &destination, &mut progress, &cancel),
        &cancel,
    )
    .await?;

    match outcome {
        Outcome::Completed { total, elapsed } => {
            println!("取得総数  {}", total);
            println!("経過時間  {}", format_elapsed(elapsed));
            println!("処理速度  {} 件/秒", throughput(total, elapsed));
            println!("保存先    {}", cli.output.display());
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Cancelled => {
            eprintln!("チャットデータ取得 / CSV出力の処理を中止しました。");
            Ok(ExitCode::from(130))
        }
        Outcome::Rejected { reason } => {
            let message = match reason {
                RejectReason::EmptyField => "URL ( ID ) または保存先が未設定です。",
                RejectReason::InvalidOrNotReplayable => {
                    "URL ( ID ) が無効、またはアーカイブ配信ではありません。"
                }
            };
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定読み込みエラー: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match logging::init_logging(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("🎬 Starting rechat");
    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
