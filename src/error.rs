//! 错误类型
//!
//! `ApiError` 描述一次 HTTP 调用的失败，`AppError` 描述进程级失败

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 接口调用错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// 连接失败、超时等没有拿到响应的情况
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// 拿到响应但无法解析
    #[error("malformed response from {url} (HTTP {status}): {message}")]
    Decode {
        url: String,
        status: u16,
        message: String,
    },
}

impl ApiError {
    pub fn transport(url: &str, err: impl ToString) -> Self {
        ApiError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(url: &str, status: u16, err: impl ToString) -> Self {
        ApiError::Decode {
            url: url.to_string(),
            status,
            message: err.to_string(),
        }
    }
}

/// 应用启动及运行期的致命错误
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
