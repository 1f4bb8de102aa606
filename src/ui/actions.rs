//! Action / Effect 枚举定义 (Intent)
//!
//! 用户交互和异步完成事件都转化为明确的语义化 Action；
//! dispatch 产生的副作用以 Effect 描述，交由 EffectRunner 执行

use std::path::PathBuf;

use uuid::Uuid;

use super::state::View;
use crate::error::ApiError;
use crate::models::{GenerationReply, GenerationRequest, Provider, Template};

/// 用户操作及异步结果
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    SwitchView(View),
    MoveSelectionUp,
    MoveSelectionDown,

    // 生成页
    StartEditPrompt,
    NextScriptType,
    PrevScriptType,
    NextComplexity,
    PrevComplexity,
    Generate,
    CopyCode,
    StartExport,
    ScrollCodeDown(u16), // 行数
    ScrollCodeUp(u16),
    ScrollCodeRight,
    ScrollCodeLeft,

    // 模板页
    UseTemplate,

    // 表单/通用交互
    Cancel,      // Esc
    Submit,      // Enter
    Input(char), // 输入字符
    DeleteChar,  // Backspace

    // 异步结果
    ProvidersLoaded(Result<Vec<Provider>, ApiError>),
    TemplatesLoaded(Result<Vec<Template>, ApiError>),
    GenerationFinished {
        ticket: Uuid,
        outcome: Result<GenerationReply, ApiError>,
    },
    ClipboardFinished(Result<(), String>),
    ExportFinished(Result<PathBuf, String>),
}

/// 需要执行的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Quit,
    LoadProviders,
    LoadTemplates,
    Generate {
        ticket: Uuid,
        request: GenerationRequest,
    },
    CopyToClipboard(String),
    Export {
        filename: String,
        code: String,
    },
}
