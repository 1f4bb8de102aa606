//! 副作用执行
//!
//! 网络请求在后台线程完成，结果以 Action 形式通过 channel 送回 UI 线程；
//! 剪贴板和文件导出直接在 UI 线程执行

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{error, info, warn};

use crate::api::ScriptApi;
use crate::ui::actions::{Action, Effect};

/// 系统剪贴板
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String>;
}

/// 基于 arboard 的剪贴板，首次使用时创建并保持存活
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().map_err(|e| e.to_string())?);
        }
        match self.inner.as_mut() {
            Some(clipboard) => clipboard.set_text(text).map_err(|e| e.to_string()),
            None => Err("clipboard unavailable".to_string()),
        }
    }
}

pub struct EffectRunner {
    api: Arc<dyn ScriptApi>,
    clipboard: Box<dyn Clipboard>,
    export_dir: PathBuf,
    tx: Sender<Action>,
    rx: Receiver<Action>,
}

impl EffectRunner {
    pub fn new(
        api: Arc<dyn ScriptApi>,
        clipboard: Box<dyn Clipboard>,
        export_dir: PathBuf,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            clipboard,
            export_dir,
            tx,
            rx,
        }
    }

    /// 执行一组 Effect，返回是否需要退出
    pub fn run(&mut self, effects: Vec<Effect>) -> bool {
        let mut quit = false;
        for effect in effects {
            match effect {
                Effect::Quit => quit = true,
                Effect::LoadProviders => {
                    self.spawn(|api| Action::ProvidersLoaded(api.fetch_providers()))
                }
                Effect::LoadTemplates => {
                    self.spawn(|api| Action::TemplatesLoaded(api.fetch_templates()))
                }
                Effect::Generate { ticket, request } => {
                    info!(%ticket, "dispatching generation request");
                    self.spawn(move |api| Action::GenerationFinished {
                        ticket,
                        outcome: api.generate(&request),
                    })
                }
                Effect::CopyToClipboard(code) => {
                    let result = self.clipboard.set_text(&code);
                    if let Err(e) = &result {
                        warn!(error = %e, "clipboard write failed");
                    }
                    self.send(Action::ClipboardFinished(result));
                }
                Effect::Export { filename, code } => {
                    let result = export_script(&self.export_dir, &filename, &code);
                    match &result {
                        Ok(path) => info!(path = %path.display(), "script exported"),
                        Err(e) => error!(error = %e, "script export failed"),
                    }
                    self.send(Action::ExportFinished(result));
                }
            }
        }
        quit
    }

    /// 取出所有已完成的结果，不阻塞
    pub fn drain(&self) -> Vec<Action> {
        self.rx.try_iter().collect()
    }

    fn send(&self, action: Action) {
        // 接收端由 self 持有，发送不会失败
        let _ = self.tx.send(action);
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&dyn ScriptApi) -> Action + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let action = job(&*api);
            if tx.send(action).is_err() {
                warn!("ui closed before request completed");
            }
        });
    }
}

/// 将脚本写入导出目录
pub fn export_script(dir: &Path, filename: &str, code: &str) -> Result<PathBuf, String> {
    fs::create_dir_all(dir).map_err(|e| format!("{}: {}", dir.display(), e))?;
    let path = dir.join(filename);
    fs::write(&path, code).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{
        Complexity, GenerationReply, GenerationRequest, Provider, ScriptType, Template,
    };

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct FakeApi {
        generate_calls: AtomicUsize,
        sent: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptApi for FakeApi {
        fn fetch_providers(&self) -> Result<Vec<Provider>, ApiError> {
            Err(ApiError::transport("http://fake/api/ai/providers", "unreachable"))
        }

        fn fetch_templates(&self) -> Result<Vec<Template>, ApiError> {
            Ok(Vec::new())
        }

        fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply, ApiError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(request.clone());
            Ok(GenerationReply::Failure(Some("rate limited".to_string())))
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        texts: Arc<Mutex<Vec<String>>>,
    }

    impl Clipboard for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), String> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn wait_for(runner: &EffectRunner, count: usize) -> Vec<Action> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut actions = Vec::new();
        while actions.len() < count && Instant::now() < deadline {
            actions.extend(runner.drain());
            thread::sleep(Duration::from_millis(10));
        }
        actions
    }

    fn runner(api: Arc<FakeApi>, dir: &Path) -> EffectRunner {
        EffectRunner::new(api, Box::new(RecordingClipboard::default()), dir.to_path_buf())
    }

    #[test]
    fn test_startup_effects_report_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner(Arc::new(FakeApi::default()), dir.path());

        assert!(!runner.run(vec![Effect::LoadProviders, Effect::LoadTemplates]));
        let actions = wait_for(&runner, 2);

        assert_eq!(actions.len(), 2);
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::ProvidersLoaded(Err(ApiError::Transport { .. })))));
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::TemplatesLoaded(Ok(list)) if list.is_empty())));
    }

    #[test]
    fn test_generation_round_trip_through_app() {
        use crate::ui::App;

        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeApi::default());
        let mut runner = runner(Arc::clone(&api), dir.path());
        let mut app = App::new();
        app.draft.prompt = "Create a speed hack".to_string();
        app.draft.script_type = ScriptType::Speed;
        app.draft.complexity = Complexity::Easy;

        let effects = app.dispatch(Action::Generate);
        runner.run(effects);
        // 请求未完成前再次触发不会产生新的调用
        runner.run(app.dispatch(Action::Generate));

        for action in wait_for(&runner, 1) {
            runner.run(app.dispatch(action));
        }

        assert_eq!(api.generate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.sent.lock().unwrap()[0].prompt, "Create a speed hack");
        assert!(!app.is_generating());
        assert!(app.result.is_none());
        assert_eq!(app.last_error.as_ref().unwrap().to_string(), "rate limited");
    }

    #[test]
    fn test_copy_uses_clipboard() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let texts = Arc::clone(&clipboard.texts);
        let mut runner = EffectRunner::new(
            Arc::new(FakeApi::default()),
            Box::new(clipboard),
            dir.path().to_path_buf(),
        );

        runner.run(vec![Effect::CopyToClipboard("-- code".to_string())]);

        assert_eq!(*texts.lock().unwrap(), vec!["-- code".to_string()]);
        assert_eq!(runner.drain(), vec![Action::ClipboardFinished(Ok(()))]);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scripts");
        let mut runner = runner(Arc::new(FakeApi::default()), &out);

        runner.run(vec![Effect::Export {
            filename: "roblox_script.lua".to_string(),
            code: "print('hi')\n".to_string(),
        }]);

        let path = out.join("roblox_script.lua");
        assert_eq!(runner.drain(), vec![Action::ExportFinished(Ok(path.clone()))]);
        assert_eq!(fs::read_to_string(path).unwrap(), "print('hi')\n");
    }

    #[test]
    fn test_quit_effect() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner(Arc::new(FakeApi::default()), dir.path());
        assert!(runner.run(vec![Effect::Quit]));
        assert!(runner.drain().is_empty());
    }
}
