//! App 状态定义 (Model)
//!
//! 包含应用状态结构体及相关枚举

use std::fmt;

use uuid::Uuid;

use crate::models::{
    Complexity, GenerationRequest, GenerationResult, Provider, ScriptType, Template,
};

pub const DEFAULT_EXPORT_FILENAME: &str = "roblox_script.lua";
pub const VALIDATION_MESSAGE: &str = "Please enter a script description";
pub const SERVER_FALLBACK_MESSAGE: &str = "Failed to generate script";

/// 应用状态
pub struct App {
    pub draft: Draft,
    pub generation: GenerationStatus,
    pub last_error: Option<GenerateError>,
    pub result: Option<GenerationResult>,
    pub providers: Vec<Provider>,
    pub templates: Vec<Template>,
    pub view: View,
    pub mode: AppMode,
    pub template_index: usize,
    pub provider_index: usize,
    pub input_buffer: String, // 导出文件名输入
    pub message: Option<String>,
    pub result_scroll: u16,  // 代码区纵向偏移（行）
    pub result_hscroll: u16, // 代码区横向偏移（列）
}

/// 正在编辑的请求草稿
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    pub prompt: String,
    pub script_type: ScriptType,
    pub complexity: Complexity,
}

impl Draft {
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }

    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest::new(self.prompt.clone(), self.script_type, self.complexity)
    }
}

/// 生成流程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    InFlight(Uuid),
}

/// 生成失败的三种来源
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// 本地校验：提示词为空
    Validation,
    /// 服务端 `success: false`
    Server(String),
    /// 网络或响应格式错误
    Network(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Validation => f.write_str(VALIDATION_MESSAGE),
            GenerateError::Server(message) => f.write_str(message),
            GenerateError::Network(detail) => write!(f, "Network error: {}", detail),
        }
    }
}

/// 当前页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Generate,
    Templates,
    Providers,
}

impl View {
    pub const ALL: [View; 3] = [View::Generate, View::Templates, View::Providers];

    pub fn title(self) -> &'static str {
        match self {
            View::Generate => "Generate Script",
            View::Templates => "Templates",
            View::Providers => "AI Providers",
        }
    }

    pub fn index(self) -> usize {
        match self {
            View::Generate => 0,
            View::Templates => 1,
            View::Providers => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// 应用模式
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AppMode {
    #[default]
    Normal,
    EditingPrompt,
    ExportingFile,
}

impl App {
    /// 创建新的应用实例
    pub fn new() -> Self {
        Self {
            draft: Draft::default(),
            generation: GenerationStatus::Idle,
            last_error: None,
            result: None,
            providers: Vec::new(),
            templates: Vec::new(),
            view: View::Generate,
            mode: AppMode::Normal,
            template_index: 0,
            provider_index: 0,
            input_buffer: String::new(),
            message: None,
            result_scroll: 0,
            result_hscroll: 0,
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.generation, GenerationStatus::InFlight(_))
    }

    /// 生成按钮是否可用
    pub fn can_generate(&self) -> bool {
        !self.is_generating() && !self.draft.is_blank()
    }

    /// 获取当前选中的模板
    pub fn selected_template(&self) -> Option<&Template> {
        self.templates.get(self.template_index)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
