//! アプリケーション設定管理モジュール
//!
//! XDGディレクトリ（または明示パス）の TOML 設定ファイルを読み書きします。

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::export::{validate_header, CsvExporter, DEFAULT_HEADER};

/// InnerTube request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub hl: String,
    pub gl: String,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            hl: "ja".to_string(),
            gl: "JP".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

/// 出力設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub delimiter: char,
    /// Column names in field order
    pub header: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            header: DEFAULT_HEADER.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl ExportSettings {
    pub fn exporter(&self) -> CsvExporter {
        CsvExporter::new().with_delimiter(self.delimiter)
    }
}

/// ログ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// ログレベル (trace/debug/info/warn/error)
    pub level: String,
    /// ファイル出力有効化
    pub enable_file_logging: bool,
    /// カスタムログディレクトリ（Noneの場合はXDGデフォルト使用）
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_file_logging: false,
            log_dir: None,
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        validate_header(self.export.header.as_slice()).context("Invalid [export] header")?;
        if matches!(self.export.delimiter, '"' | '\r' | '\n') {
            bail!("Invalid [export] delimiter: {:?}", self.export.delimiter);
        }
        Ok(())
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "rechat", "rechat").context("Failed to get project directories")
}

/// 設定管理マネージャー
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// XDG設定ディレクトリの `config.toml` を使う
    pub fn new() -> Result<Self> {
        let config_path = project_dirs()?.config_dir().join("config.toml");
        debug!("Config file path: {}", config_path.display());
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// 設定を読み込み。ファイルが無ければデフォルト設定
    pub fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Config file not found, using default settings: {}",
                self.config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let config_content = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        let config: AppConfig = toml::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse config file: {}",
                self.config_path.display()
            )
        })?;
        config.validate()?;

        info!(
            "✅ Configuration loaded from: {}",
            self.config_path.display()
        );
        Ok(config)
    }
}
