//! 配置加载
//!
//! 配置文件 (~/.config/wave-assistant/config.toml) 提供默认值，命令行参数覆盖

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const APP_DIR: &str = "wave-assistant";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// 0 表示不设超时
    pub timeout_secs: u64,
    pub export_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            export_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// 从 TOML 文件加载，文件不存在时返回默认配置
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.api_base_url {
            self.api_base_url = url;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
        if overrides.export_dir.is_some() {
            self.export_dir = overrides.export_dir;
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// 导出目录：配置值 > 下载目录 > 当前目录
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// 获取数据目录路径 (~/.local/share/wave-assistant/)，不存在时创建
pub fn data_dir() -> Result<PathBuf, AppError> {
    let dir = dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
