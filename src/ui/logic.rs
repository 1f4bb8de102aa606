//! 业务逻辑处理 (Update/Dispatch)
//!
//! 所有状态变更都经由 dispatch，返回需要执行的 Effect

use std::path::Path;

use tracing::{debug, warn};
use uuid::Uuid;

use super::actions::{Action, Effect};
use super::state::{
    App, AppMode, DEFAULT_EXPORT_FILENAME, GenerateError, GenerationStatus,
    SERVER_FALLBACK_MESSAGE, View,
};
use crate::error::ApiError;
use crate::models::{GenerationReply, Provider, Template};

/// 横向滚动步长（列）
const HSCROLL_STEP: i32 = 8;

impl App {
    /// 启动时的两个独立请求
    pub fn startup(&self) -> Vec<Effect> {
        vec![Effect::LoadProviders, Effect::LoadTemplates]
    }

    /// 核心逻辑分发
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Quit => return vec![Effect::Quit],
            Action::NextView => self.switch_view(self.view.next()),
            Action::PrevView => self.switch_view(self.view.prev()),
            Action::SwitchView(view) => self.switch_view(view),
            Action::MoveSelectionUp => self.move_up(),
            Action::MoveSelectionDown => self.move_down(),

            Action::StartEditPrompt => self.mode = AppMode::EditingPrompt,
            Action::NextScriptType => self.draft.script_type = self.draft.script_type.next(),
            Action::PrevScriptType => self.draft.script_type = self.draft.script_type.prev(),
            Action::NextComplexity => self.draft.complexity = self.draft.complexity.next(),
            Action::PrevComplexity => self.draft.complexity = self.draft.complexity.prev(),
            Action::Generate => return self.generate(),
            Action::CopyCode => return self.copy_code(),
            Action::StartExport => self.start_export(),
            Action::ScrollCodeDown(rows) => self.scroll_code(i32::from(rows), 0),
            Action::ScrollCodeUp(rows) => self.scroll_code(-i32::from(rows), 0),
            Action::ScrollCodeRight => self.scroll_code(0, HSCROLL_STEP),
            Action::ScrollCodeLeft => self.scroll_code(0, -HSCROLL_STEP),

            Action::UseTemplate => {
                if let Some(template) = self.selected_template().cloned() {
                    self.select_template(&template);
                }
            }

            Action::Cancel => self.cancel(),
            Action::Submit => match self.mode {
                AppMode::EditingPrompt => self.mode = AppMode::Normal,
                AppMode::ExportingFile => return self.confirm_export(),
                AppMode::Normal => {}
            },

            Action::Input(c) => match self.mode {
                AppMode::EditingPrompt => self.draft.prompt.push(c),
                AppMode::ExportingFile => self.input_buffer.push(c),
                AppMode::Normal => {}
            },

            Action::DeleteChar => match self.mode {
                AppMode::EditingPrompt => {
                    self.draft.prompt.pop();
                }
                AppMode::ExportingFile => {
                    self.input_buffer.pop();
                }
                AppMode::Normal => {}
            },

            Action::ProvidersLoaded(result) => self.providers_loaded(result),
            Action::TemplatesLoaded(result) => self.templates_loaded(result),
            Action::GenerationFinished { ticket, outcome } => {
                self.generation_finished(ticket, outcome)
            }
            Action::ClipboardFinished(result) => {
                self.message = Some(match result {
                    Ok(()) => "Script copied to clipboard".to_string(),
                    Err(e) => format!("Failed to copy: {}", e),
                });
            }
            Action::ExportFinished(result) => {
                self.message = Some(match result {
                    Ok(path) => format!("Script saved to {}", path.display()),
                    Err(e) => format!("Failed to save script: {}", e),
                });
            }
        }
        Vec::new()
    }

    // ============ 导航相关 ============

    pub fn switch_view(&mut self, view: View) {
        self.view = view;
        self.mode = AppMode::Normal;
    }

    /// 向上移动选择
    pub fn move_up(&mut self) {
        let index = match self.view {
            View::Templates => &mut self.template_index,
            View::Providers => &mut self.provider_index,
            View::Generate => return,
        };
        if *index > 0 {
            *index -= 1;
        }
    }

    /// 向下移动选择
    pub fn move_down(&mut self) {
        let (index, len) = match self.view {
            View::Templates => (&mut self.template_index, self.templates.len()),
            View::Providers => (&mut self.provider_index, self.providers.len()),
            View::Generate => return,
        };
        if *index + 1 < len {
            *index += 1;
        }
    }

    // ============ 生成相关 ============

    /// 提交生成请求
    pub fn generate(&mut self) -> Vec<Effect> {
        if self.is_generating() {
            debug!("generation already in flight, ignoring");
            return Vec::new();
        }
        if self.draft.is_blank() {
            self.last_error = Some(GenerateError::Validation);
            return Vec::new();
        }

        let ticket = Uuid::new_v4();
        self.last_error = None;
        self.result = None;
        self.reset_scroll();
        self.generation = GenerationStatus::InFlight(ticket);
        self.mode = AppMode::Normal;

        vec![Effect::Generate {
            ticket,
            request: self.draft.to_request(),
        }]
    }

    fn generation_finished(&mut self, ticket: Uuid, outcome: Result<GenerationReply, ApiError>) {
        if self.generation != GenerationStatus::InFlight(ticket) {
            debug!(%ticket, "dropping stale generation result");
            return;
        }
        self.generation = GenerationStatus::Idle;

        match outcome {
            Ok(GenerationReply::Success(result)) => {
                debug!(provider = %result.metadata.provider, "generation succeeded");
                self.last_error = None;
                self.result = Some(result);
                self.reset_scroll();
            }
            Ok(GenerationReply::Failure(error)) => {
                let message = error.unwrap_or_else(|| SERVER_FALLBACK_MESSAGE.to_string());
                warn!(error = %message, "server rejected generation");
                self.result = None;
                self.last_error = Some(GenerateError::Server(message));
            }
            Err(e) => {
                warn!(error = %e, "generation request failed");
                self.result = None;
                self.last_error = Some(GenerateError::Network(e.to_string()));
            }
        }
    }

    /// 滚动代码区，最多滚到最后一行或最长一行的末尾
    fn scroll_code(&mut self, rows: i32, cols: i32) {
        let Some(result) = &self.result else {
            return;
        };
        let code = result.code();
        let max_row = code.lines().count().saturating_sub(1);
        let max_col = code
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .saturating_sub(1);

        self.result_scroll = shift_offset(self.result_scroll, rows, max_row);
        self.result_hscroll = shift_offset(self.result_hscroll, cols, max_col);
    }

    fn reset_scroll(&mut self) {
        self.result_scroll = 0;
        self.result_hscroll = 0;
    }

    // ============ 模板相关 ============

    /// 将模板内容复制到草稿并回到生成页
    pub fn select_template(&mut self, template: &Template) {
        debug!(template = %template.id, "applying template");
        self.draft.prompt = template.synthesized_prompt();
        self.draft.script_type = template.category;
        self.draft.complexity = template.complexity;
        self.switch_view(View::Generate);
    }

    // ============ 列表加载 ============

    fn providers_loaded(&mut self, result: Result<Vec<Provider>, ApiError>) {
        match result {
            Ok(providers) => {
                let ids: Vec<&str> = providers.iter().map(|p| p.id.as_str()).collect();
                debug!(?ids, "providers loaded");
                self.providers = providers;
                self.provider_index = 0;
            }
            Err(e) => warn!(error = %e, "failed to fetch providers"),
        }
    }

    fn templates_loaded(&mut self, result: Result<Vec<Template>, ApiError>) {
        match result {
            Ok(templates) => {
                debug!(count = templates.len(), "templates loaded");
                self.templates = templates;
                self.template_index = 0;
            }
            Err(e) => warn!(error = %e, "failed to fetch templates"),
        }
    }

    // ============ 复制/导出 ============

    pub fn copy_code(&mut self) -> Vec<Effect> {
        match &self.result {
            Some(result) => vec![Effect::CopyToClipboard(result.code().to_string())],
            None => Vec::new(),
        }
    }

    /// 打开文件名输入框
    pub fn start_export(&mut self) {
        if self.result.is_some() {
            self.mode = AppMode::ExportingFile;
            self.input_buffer = DEFAULT_EXPORT_FILENAME.to_string();
        }
    }

    pub fn confirm_export(&mut self) -> Vec<Effect> {
        let filename = export_filename(&self.input_buffer);
        self.mode = AppMode::Normal;
        self.input_buffer.clear();

        match &self.result {
            Some(result) => vec![Effect::Export {
                filename,
                code: result.code().to_string(),
            }],
            None => Vec::new(),
        }
    }

    // ============ 通用操作 ============

    /// 取消当前操作
    pub fn cancel(&mut self) {
        self.mode = AppMode::Normal;
        self.input_buffer.clear();
        self.message = None;
    }
}

fn shift_offset(current: u16, delta: i32, max: usize) -> u16 {
    let max = i32::try_from(max.min(usize::from(u16::MAX))).unwrap_or(i32::from(u16::MAX));
    let next = (i32::from(current) + delta).clamp(0, max);
    u16::try_from(next).unwrap_or(u16::MAX)
}

/// 只保留文件名部分，空输入使用默认文件名
fn export_filename(input: &str) -> String {
    Path::new(input.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Complexity, GenerationMetadata, GenerationResult, ProviderStatus, Script, ScriptType,
    };

    fn speed_result() -> GenerationResult {
        GenerationResult::new(
            Script {
                code: "-- speed script".to_string(),
            },
            GenerationMetadata {
                provider: "openai".to_string(),
                model: "gpt-4".to_string(),
                generation_time: 1.1,
                cost_estimate: 0.0008,
                fallback_used: false,
            },
        )
    }

    fn template() -> Template {
        Template {
            id: "fly".to_string(),
            name: "Fly Script".to_string(),
            description: "Lets the player fly".to_string(),
            category: ScriptType::Speed,
            complexity: Complexity::Hard,
        }
    }

    fn typed_app(prompt: &str) -> App {
        let mut app = App::new();
        app.draft.prompt = prompt.to_string();
        app
    }

    fn ticket_of(effects: &[Effect]) -> Uuid {
        match effects {
            [Effect::Generate { ticket, .. }] => *ticket,
            other => panic!("expected a single generate effect, got {:?}", other),
        }
    }

    #[test]
    fn test_startup_loads_both_lists() {
        let app = App::new();
        assert_eq!(app.startup(), vec![Effect::LoadProviders, Effect::LoadTemplates]);
    }

    #[test]
    fn test_blank_prompt_is_rejected_locally() {
        for prompt in ["", "   ", "\n\t "] {
            let mut app = typed_app(prompt);
            let effects = app.dispatch(Action::Generate);

            assert!(effects.is_empty());
            assert_eq!(app.last_error, Some(GenerateError::Validation));
            assert!(!app.is_generating());
        }
    }

    #[test]
    fn test_generate_clears_previous_state() {
        let mut app = typed_app("Create a speed hack");
        app.result = Some(speed_result());
        app.last_error = Some(GenerateError::Server("old".to_string()));

        let effects = app.dispatch(Action::Generate);

        ticket_of(&effects);
        assert!(app.is_generating());
        assert!(app.result.is_none());
        assert!(app.last_error.is_none());
    }

    #[test]
    fn test_generate_while_in_flight_is_noop() {
        let mut app = typed_app("Create a speed hack");
        let first = app.dispatch(Action::Generate);
        let ticket = ticket_of(&first);

        assert!(app.dispatch(Action::Generate).is_empty());
        assert_eq!(app.generation, GenerationStatus::InFlight(ticket));
        assert!(!app.can_generate());
    }

    #[test]
    fn test_speed_hack_success() {
        let mut app = typed_app("Create a speed hack");
        app.draft.script_type = ScriptType::Speed;
        app.draft.complexity = Complexity::Easy;

        let effects = app.dispatch(Action::Generate);
        match &effects[..] {
            [Effect::Generate { request, .. }] => {
                assert_eq!(request.prompt, "Create a speed hack");
                assert_eq!(request.script_type, ScriptType::Speed);
                assert_eq!(request.complexity, Complexity::Easy);
            }
            other => panic!("unexpected effects {:?}", other),
        }

        let ticket = ticket_of(&effects);
        app.dispatch(Action::GenerationFinished {
            ticket,
            outcome: Ok(GenerationReply::Success(speed_result())),
        });

        assert!(!app.is_generating());
        assert!(app.last_error.is_none());
        assert_eq!(app.result.as_ref().map(|r| r.code()), Some("-- speed script"));
    }

    #[test]
    fn test_server_failure_shows_server_text() {
        let mut app = typed_app("Create a speed hack");
        let ticket = ticket_of(&app.dispatch(Action::Generate));

        app.dispatch(Action::GenerationFinished {
            ticket,
            outcome: Ok(GenerationReply::Failure(Some("rate limited".to_string()))),
        });

        assert!(!app.is_generating());
        assert!(app.result.is_none());
        assert_eq!(app.last_error.as_ref().unwrap().to_string(), "rate limited");
    }

    #[test]
    fn test_server_failure_without_text_uses_fallback() {
        let mut app = typed_app("x");
        let ticket = ticket_of(&app.dispatch(Action::Generate));

        app.dispatch(Action::GenerationFinished {
            ticket,
            outcome: Ok(GenerationReply::Failure(None)),
        });

        assert_eq!(
            app.last_error,
            Some(GenerateError::Server(SERVER_FALLBACK_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let mut app = typed_app("x");
        let ticket = ticket_of(&app.dispatch(Action::Generate));

        app.dispatch(Action::GenerationFinished {
            ticket,
            outcome: Err(ApiError::transport("http://h/api/ai/generate", "connection refused")),
        });

        let error = app.last_error.clone().unwrap();
        assert!(matches!(error, GenerateError::Network(_)));
        assert!(error.to_string().starts_with("Network error: "));
        assert!(!app.is_generating());
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut app = typed_app("x");
        let ticket = ticket_of(&app.dispatch(Action::Generate));

        app.dispatch(Action::GenerationFinished {
            ticket: Uuid::new_v4(),
            outcome: Ok(GenerationReply::Success(speed_result())),
        });

        assert_eq!(app.generation, GenerationStatus::InFlight(ticket));
        assert!(app.result.is_none());
    }

    #[test]
    fn test_use_template_overwrites_draft() {
        let mut app = typed_app("something else entirely");
        app.draft.script_type = ScriptType::Gui;
        app.draft.complexity = Complexity::Easy;
        app.result = Some(speed_result());
        app.templates = vec![template()];
        app.dispatch(Action::SwitchView(View::Templates));

        app.dispatch(Action::UseTemplate);

        assert_eq!(app.draft.prompt, "Create a fly script - Lets the player fly");
        assert_eq!(app.draft.script_type, ScriptType::Speed);
        assert_eq!(app.draft.complexity, Complexity::Hard);
        assert_eq!(app.view, View::Generate);
        assert!(app.result.is_some());
    }

    #[test]
    fn test_provider_failure_is_silent() {
        let mut app = App::new();
        app.dispatch(Action::ProvidersLoaded(Err(ApiError::transport(
            "http://h/api/ai/providers",
            "dns error",
        ))));

        assert!(app.providers.is_empty());
        assert!(app.last_error.is_none());
        assert!(app.message.is_none());
        assert!(app.result.is_none());
    }

    #[test]
    fn test_lists_populate_and_navigation_clamps() {
        let mut app = App::new();
        app.dispatch(Action::ProvidersLoaded(Ok(vec![
            Provider {
                id: "a".to_string(),
                name: "A".to_string(),
                status: ProviderStatus::Available,
                models: vec![],
            },
            Provider {
                id: "b".to_string(),
                name: "B".to_string(),
                status: ProviderStatus::Unavailable,
                models: vec![],
            },
        ])));
        app.dispatch(Action::SwitchView(View::Providers));

        app.dispatch(Action::MoveSelectionUp);
        assert_eq!(app.provider_index, 0);
        app.dispatch(Action::MoveSelectionDown);
        app.dispatch(Action::MoveSelectionDown);
        assert_eq!(app.provider_index, 1);
    }

    #[test]
    fn test_copy_and_export_need_result() {
        let mut app = App::new();
        assert!(app.dispatch(Action::CopyCode).is_empty());
        app.dispatch(Action::StartExport);
        assert_eq!(app.mode, AppMode::Normal);

        app.result = Some(speed_result());
        assert_eq!(
            app.dispatch(Action::CopyCode),
            vec![Effect::CopyToClipboard("-- speed script".to_string())]
        );

        app.dispatch(Action::StartExport);
        assert_eq!(app.mode, AppMode::ExportingFile);
        assert_eq!(app.input_buffer, DEFAULT_EXPORT_FILENAME);
    }

    #[test]
    fn test_export_filename_is_sanitised() {
        let mut app = App::new();
        app.result = Some(speed_result());
        app.dispatch(Action::StartExport);
        for _ in 0..DEFAULT_EXPORT_FILENAME.len() {
            app.dispatch(Action::DeleteChar);
        }
        for c in "../../etc/fly.lua".chars() {
            app.dispatch(Action::Input(c));
        }

        let effects = app.dispatch(Action::Submit);
        assert_eq!(
            effects,
            vec![Effect::Export {
                filename: "fly.lua".to_string(),
                code: "-- speed script".to_string(),
            }]
        );
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(export_filename("   "), DEFAULT_EXPORT_FILENAME);
    }

    #[test]
    fn test_prompt_editing() {
        let mut app = App::new();
        app.dispatch(Action::Input('x'));
        assert_eq!(app.draft.prompt, "");

        app.dispatch(Action::StartEditPrompt);
        for c in "fly".chars() {
            app.dispatch(Action::Input(c));
        }
        app.dispatch(Action::DeleteChar);
        app.dispatch(Action::Submit);

        assert_eq!(app.draft.prompt, "fl");
        assert_eq!(app.mode, AppMode::Normal);
    }

    fn long_result(lines: usize) -> GenerationResult {
        let code = (1..=lines)
            .map(|i| format!("print({})", i))
            .collect::<Vec<_>>()
            .join("\n");
        GenerationResult::new(Script { code }, GenerationMetadata::default())
    }

    #[test]
    fn test_view_switching_has_no_effects_once_loaded() {
        let mut app = App::new();
        app.dispatch(Action::ProvidersLoaded(Ok(Vec::new())));
        app.dispatch(Action::TemplatesLoaded(Ok(vec![template()])));

        for action in [
            Action::SwitchView(View::Templates),
            Action::SwitchView(View::Providers),
            Action::NextView,
            Action::NextView,
            Action::PrevView,
        ] {
            assert!(app.dispatch(action).is_empty());
        }
        assert_eq!(app.view, View::Generate);
        assert_eq!(app.templates.len(), 1);
    }

    #[test]
    fn test_code_scroll_clamps_to_last_line() {
        let mut app = App::new();
        app.dispatch(Action::ScrollCodeDown(5));
        assert_eq!(app.result_scroll, 0);

        app.result = Some(long_result(80));
        app.dispatch(Action::ScrollCodeDown(1));
        app.dispatch(Action::ScrollCodeDown(10));
        assert_eq!(app.result_scroll, 11);

        for _ in 0..20 {
            app.dispatch(Action::ScrollCodeDown(10));
        }
        assert_eq!(app.result_scroll, 79);

        app.dispatch(Action::ScrollCodeUp(100));
        assert_eq!(app.result_scroll, 0);
    }

    #[test]
    fn test_code_hscroll_stops_at_longest_line() {
        let mut app = App::new();
        app.result = Some(long_result(3)); // print(1) 共 8 列
        app.dispatch(Action::ScrollCodeRight);
        app.dispatch(Action::ScrollCodeRight);
        assert_eq!(app.result_hscroll, 7);

        app.dispatch(Action::ScrollCodeLeft);
        assert_eq!(app.result_hscroll, 0);
    }

    #[test]
    fn test_new_generation_resets_scroll() {
        let mut app = typed_app("x");
        app.result = Some(long_result(80));
        app.dispatch(Action::ScrollCodeDown(30));
        app.dispatch(Action::ScrollCodeRight);

        let ticket = ticket_of(&app.dispatch(Action::Generate));
        assert_eq!((app.result_scroll, app.result_hscroll), (0, 0));

        app.dispatch(Action::GenerationFinished {
            ticket,
            outcome: Ok(GenerationReply::Success(long_result(80))),
        });
        assert_eq!((app.result_scroll, app.result_hscroll), (0, 0));
    }
}
