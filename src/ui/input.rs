//! 键盘事件映射 (Input -> Action)
//!
//! 将按键事件转换为 Action

use crossterm::event::KeyCode;

use super::actions::{Action, Effect};
use super::state::{App, AppMode, View};

/// PageUp/PageDown 一次滚动的行数
const CODE_PAGE: u16 = 10;

/// 根据当前模式、页面和按键获取对应的 Action
pub fn get_action(mode: &AppMode, view: View, key: KeyCode) -> Option<Action> {
    match mode {
        AppMode::Normal => global_action(key).or_else(|| view_action(view, key)),
        AppMode::EditingPrompt => match key {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => Some(Action::DeleteChar),
            KeyCode::Char(c) => Some(Action::Input(c)),
            _ => None,
        },
        AppMode::ExportingFile => match key {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => Some(Action::DeleteChar),
            KeyCode::Char(c) => Some(Action::Input(c)),
            _ => None,
        },
    }
}

fn global_action(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Char('1') => Some(Action::SwitchView(View::Generate)),
        KeyCode::Char('2') => Some(Action::SwitchView(View::Templates)),
        KeyCode::Char('3') => Some(Action::SwitchView(View::Providers)),
        _ => None,
    }
}

fn view_action(view: View, key: KeyCode) -> Option<Action> {
    match view {
        View::Generate => match key {
            KeyCode::Char('e') | KeyCode::Char('i') => Some(Action::StartEditPrompt),
            KeyCode::Char('t') => Some(Action::NextScriptType),
            KeyCode::Char('T') => Some(Action::PrevScriptType),
            KeyCode::Char('c') => Some(Action::NextComplexity),
            KeyCode::Char('C') => Some(Action::PrevComplexity),
            KeyCode::Char('g') | KeyCode::Enter => Some(Action::Generate),
            KeyCode::Char('y') => Some(Action::CopyCode),
            KeyCode::Char('s') => Some(Action::StartExport),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollCodeDown(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollCodeUp(1)),
            KeyCode::PageDown => Some(Action::ScrollCodeDown(CODE_PAGE)),
            KeyCode::PageUp => Some(Action::ScrollCodeUp(CODE_PAGE)),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::ScrollCodeRight),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::ScrollCodeLeft),
            _ => None,
        },
        View::Templates => match key {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveSelectionDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveSelectionUp),
            KeyCode::Char('u') | KeyCode::Enter => Some(Action::UseTemplate),
            _ => None,
        },
        View::Providers => match key {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveSelectionDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveSelectionUp),
            _ => None,
        },
    }
}

/// 处理按键事件
pub fn handle_key_event(app: &mut App, key: KeyCode) -> Vec<Effect> {
    match get_action(&app.mode, app.view, key) {
        Some(action) => app.dispatch(action),
        None => Vec::new(),
    }
}
