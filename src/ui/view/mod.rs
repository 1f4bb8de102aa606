//! 视图层模块
//!
//! 包含主渲染入口和各种视图组件，所有函数只读取 App

pub mod components;
pub mod layouts;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use super::state::{App, AppMode, View};
use components::{badge, complexity_color, render_dialog_framework, render_input_widget};
use layouts::{centered_rect, two_columns};

pub const FALLBACK_NOTICE: &str = "Primary provider was unavailable, fallback provider was used.";
pub const EMPTY_RESULT_TEXT: &str = "Generated script will appear here";

/// 渲染 UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // 标题
            Constraint::Length(3), // 统计
            Constraint::Length(3), // 标签页
            Constraint::Min(10),   // 内容
            Constraint::Length(3), // 帮助
        ])
        .split(frame.area());

    render_title(frame, chunks[0]);
    render_stats(frame, app, chunks[1]);
    render_tabs(frame, app, chunks[2]);

    match app.view {
        View::Generate => render_generate(frame, app, chunks[3]),
        View::Templates => render_templates(frame, app, chunks[3]),
        View::Providers => render_providers(frame, app, chunks[3]),
    }

    render_help(frame, app, chunks[4]);

    if app.mode == AppMode::ExportingFile {
        render_export_dialog(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new("⚡ Wave AI Assistant · Lua script generator")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let (time, cost) = match &app.result {
        Some(result) => (
            format!("{}s", result.metadata.generation_time),
            format!("${}", result.metadata.cost_estimate),
        ),
        None => ("-".to_string(), "-".to_string()),
    };

    let label = Style::default().fg(Color::Gray);
    let value = Style::default().add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::styled("AI Models: ", label),
        Span::styled(app.providers.len().to_string(), value),
        Span::styled("   Templates: ", label),
        Span::styled(app.templates.len().to_string(), value),
        Span::styled("   Generation: ", label),
        Span::styled(time, value),
        Span::styled("   Cost/Script: ", label),
        Span::styled(cost, value),
    ]);

    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| format!("{} {}", i + 1, view.title()));

    let tabs = Tabs::new(titles)
        .select(app.view.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(tabs, area);
}

// ============ 生成页 ============

fn render_generate(frame: &mut Frame, app: &App, area: Rect) {
    let (left, right) = two_columns(area);
    render_request_form(frame, app, left);
    render_result(frame, app, right);
}

fn render_request_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title("Script Requirements")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let error_height = if app.last_error.is_some() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // 描述
            Constraint::Length(2), // 选项
            Constraint::Length(3), // 按钮
            Constraint::Length(error_height),
        ])
        .split(inner);

    render_input_widget(
        frame,
        chunks[0],
        "Script Description",
        &app.draft.prompt,
        app.mode == AppMode::EditingPrompt,
        Color::Yellow,
    );

    let label = Style::default().fg(Color::Gray);
    let options = Text::from(vec![
        Line::from(vec![
            Span::styled("Script Type: ", label),
            Span::styled(
                app.draft.script_type.label(),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::styled("Complexity:  ", label),
            Span::styled(
                app.draft.complexity.label(),
                Style::default().fg(complexity_color(app.draft.complexity)),
            ),
        ]),
    ]);
    frame.render_widget(Paragraph::new(options), chunks[1]);

    let (button_text, button_style) = if app.is_generating() {
        ("⏳ Generating Script...", Style::default().fg(Color::Yellow))
    } else if app.can_generate() {
        (
            "▶ Generate Script",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("▶ Generate Script", Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(
        Paragraph::new(button_text)
            .style(button_style)
            .block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    if let Some(error) = &app.last_error {
        let alert = Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Error").borders(Borders::ALL));
        frame.render_widget(alert, chunks[3]);
    }
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.result {
        Some(result) => format!(
            "Generated Script ({}) line {}/{}",
            result.received_at.format("%H:%M:%S"),
            usize::from(app.result_scroll) + 1,
            result.code().lines().count().max(1)
        ),
        None => "Generated Script".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(result) = &app.result else {
        let placeholder = Paragraph::new(EMPTY_RESULT_TEXT)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(placeholder, inner);
        return;
    };

    let meta = &result.metadata;
    let notice_height = if meta.fallback_used { 2 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(notice_height),
        ])
        .split(inner);

    let badges = Line::from(vec![
        badge(meta.provider.clone(), Color::Magenta),
        Span::raw(" "),
        badge(meta.model.clone(), Color::Cyan),
        Span::raw(" "),
        badge(format!("{}s", meta.generation_time), Color::Gray),
        Span::raw(" "),
        badge(format!("${}", meta.cost_estimate), Color::Gray),
    ]);
    frame.render_widget(Paragraph::new(badges), chunks[0]);

    // 代码原样显示，不折行，超出部分靠滚动查看
    let code = Paragraph::new(result.code())
        .style(Style::default().fg(Color::Green))
        .scroll((app.result_scroll, app.result_hscroll));
    frame.render_widget(code, chunks[1]);

    if meta.fallback_used {
        frame.render_widget(
            Paragraph::new(FALLBACK_NOTICE)
                .style(Style::default().fg(Color::Yellow))
                .wrap(Wrap { trim: true }),
            chunks[2],
        );
    }
}

// ============ 模板页 ============

fn render_templates(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title("Script Templates").borders(Borders::ALL);

    if app.templates.is_empty() {
        frame.render_widget(
            Paragraph::new("No templates available")
                .style(Style::default().fg(Color::Gray))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .templates
        .iter()
        .map(|template| {
            ListItem::new(Text::from(vec![
                Line::from(vec![
                    Span::styled(
                        template.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    badge(
                        template.complexity.as_str(),
                        complexity_color(template.complexity),
                    ),
                    Span::raw(" "),
                    badge(template.category.as_str(), Color::Gray),
                ]),
                Line::styled(
                    format!("  {}", template.description),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.template_index));
    frame.render_stateful_widget(list, area, &mut state);
}

// ============ 提供商页 ============

fn render_providers(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title("AI Providers").borders(Borders::ALL);

    if app.providers.is_empty() {
        frame.render_widget(
            Paragraph::new("No providers available")
                .style(Style::default().fg(Color::Gray))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .providers
        .iter()
        .map(|provider| {
            let status_color = if provider.status.is_available() {
                Color::Green
            } else {
                Color::Red
            };
            ListItem::new(Text::from(vec![
                Line::from(vec![
                    Span::styled(
                        provider.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    badge(provider.status.as_str(), status_color),
                ]),
                Line::styled(
                    format!("  Models: {}", provider.models.join(", ")),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.provider_index));
    frame.render_stateful_widget(list, area, &mut state);
}

// ============ 帮助栏/弹窗 ============

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match (&app.mode, app.view) {
        (AppMode::EditingPrompt, _) => "Type the description  [Enter/Esc] done",
        (AppMode::ExportingFile, _) => "[Enter] save  [Esc] cancel",
        (AppMode::Normal, View::Generate) => {
            "[e] edit  [t] type  [c] complexity  [g] generate  [y] copy  [s] save  [j/k/h/l] scroll  [Tab] view  [q] quit"
        }
        (AppMode::Normal, View::Templates) => {
            "[j/k] navigate  [Enter] use template  [Tab] view  [q] quit"
        }
        (AppMode::Normal, View::Providers) => "[j/k] navigate  [Tab] view  [q] quit",
    };

    let message = app.message.as_deref().unwrap_or("");
    let text = if message.is_empty() {
        help_text.to_string()
    } else {
        format!("{}  |  {}", help_text, message)
    };

    let help = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn render_export_dialog(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 7, frame.area());
    let inner = render_dialog_framework(frame, area, "Save Script");

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(inner);

    render_input_widget(
        frame,
        chunks[0],
        "File name",
        &app.input_buffer,
        true,
        Color::Yellow,
    );

    let hint = Paragraph::new("Enter to save, Esc to cancel")
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(hint, chunks[1]);
}
