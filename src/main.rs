mod api;
mod config;
mod effects;
mod error;
mod models;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::HttpScriptApi;
use crate::config::{Config, Overrides};
use crate::effects::{EffectRunner, SystemClipboard};
use crate::error::AppError;
use crate::ui::{App, render};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Wave AI Assistant: 终端里的 Lua 脚本生成客户端
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// 配置文件路径，默认 ~/.config/wave-assistant/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// 生成服务地址（包含 /api）
    #[arg(long, env = "WAVE_API_URL")]
    api_url: Option<String>,

    /// 请求超时秒数，0 表示不限制
    #[arg(long)]
    timeout: Option<u64>,

    /// 脚本导出目录
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// 日志文件路径，默认 ~/.local/share/wave-assistant/wave-assistant.log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// 日志写入文件，避免干扰 TUI
fn init_logging(args: &Args, config: &Config) -> Result<PathBuf, AppError> {
    let log_path = match &args.log_file {
        Some(path) => path.clone(),
        None => config::data_dir()?.join("wave-assistant.log"),
    };
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| AppError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(log_path)
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(config::default_config_path);
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .apply(Overrides {
        api_base_url: args.api_url.clone(),
        timeout_secs: args.timeout,
        export_dir: args.export_dir.clone(),
    });

    let log_path = init_logging(&args, &config)?;
    let api = Arc::new(HttpScriptApi::new(&config.api_base_url, config.timeout()));
    info!(
        api = %api.base_url(),
        timeout_secs = config.timeout_secs,
        log = %log_path.display(),
        "starting wave-assistant"
    );

    let mut runner = EffectRunner::new(
        api,
        Box::new(SystemClipboard::default()),
        config.export_dir(),
    );

    // 创建应用状态
    let mut app = App::new();

    // 设置终端
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 主循环
    let result = run_app(&mut terminal, &mut app, &mut runner);

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    runner: &mut EffectRunner,
) -> Result<(), AppError> {
    if runner.run(app.startup()) {
        return Ok(());
    }

    loop {
        terminal.draw(|f| render(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break;
                    }
                    if runner.run(ui::handle_key_event(app, key.code)) {
                        break;
                    }
                }
            }
        }

        // 处理后台完成的请求
        for action in runner.drain() {
            if runner.run(app.dispatch(action)) {
                return Ok(());
            }
        }
    }
    Ok(())
}
