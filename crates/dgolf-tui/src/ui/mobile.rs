//! Compact (mobile) composition: single-pane list/detail toggle with a
//! one-line header and footer. Mounted when the device profile is mobile.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use dgolf_core::auth::ViewMode;

use crate::app::{App, Tab};

use super::{styles, truncate};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(5),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_content(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let tab = app.current_tab.title();
    let marker = if app.online { "" } else { " [offline]" };
    let line = Line::from(vec![
        Span::styled(" DGolf ", styles::title_style()),
        Span::styled(format!("- {tab}"), styles::muted_style()),
        Span::styled(marker, styles::offline_style()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Destinations => {
            if app.detail_open {
                render_destination_detail(frame, app, area);
            } else {
                render_destination_list(frame, app, area);
            }
        }
        Tab::Articles => {
            if app.detail_open {
                render_article_detail(frame, app, area);
            } else {
                render_article_list(frame, app, area);
            }
        }
        Tab::Account => render_account(frame, app, area),
    }
}

fn render_destination_list(frame: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(3) as usize;
    let items: Vec<ListItem> = app
        .destinations
        .iter()
        .map(|d| {
            // Two stacked lines per row instead of columns.
            let lines = vec![
                Line::from(Span::styled(
                    truncate(&d.name, width),
                    styles::list_item_style(),
                )),
                Line::from(Span::styled(
                    truncate(&format!("{} - {}", d.country, d.price_display()), width),
                    styles::muted_style(),
                )),
            ];
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::NONE))
        .highlight_style(styles::selected_style())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.destinations.is_empty() {
        state.select(Some(app.destination_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_destination_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(dest) = app.selected_destination() else {
        frame.render_widget(
            Paragraph::new("Nothing selected").style(styles::muted_style()),
            area,
        );
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(dest.name.clone(), styles::title_style())),
        Line::from(Span::styled(dest.location_display(), styles::muted_style())),
        Line::from(Span::styled(dest.price_display(), styles::highlight_style())),
        Line::from(""),
        Line::from(dest.short_desc.clone()),
    ];
    for highlight in dest.highlights.iter().take(4) {
        lines.push(Line::from(format!("* {highlight}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[i] Inquire  [Esc] Back",
        styles::muted_style(),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_article_list(frame: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(3) as usize;
    let items: Vec<ListItem> = app
        .articles
        .iter()
        .map(|a| {
            let lines = vec![
                Line::from(Span::styled(
                    truncate(&a.title, width),
                    styles::list_item_style(),
                )),
                Line::from(Span::styled(
                    truncate(&a.summary(width), width),
                    styles::muted_style(),
                )),
            ];
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::NONE))
        .highlight_style(styles::selected_style())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.articles.is_empty() {
        state.select(Some(app.article_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_article_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(article) = app.selected_article() else {
        frame.render_widget(
            Paragraph::new("Nothing selected").style(styles::muted_style()),
            area,
        );
        return;
    };

    let lines = vec![
        Line::from(Span::styled(article.title.clone(), styles::title_style())),
        Line::from(""),
        Line::from(article.content.clone()),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_account(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    match app.auth.user() {
        Some(user) => {
            lines.push(Line::from(Span::styled(
                user.full_name.clone(),
                styles::title_style(),
            )));
            if user.is_admin {
                lines.push(Line::from(Span::styled(
                    "Administrator",
                    styles::highlight_style(),
                )));
            }
            lines.push(Line::from(Span::styled("[o] Log out", styles::muted_style())));
        }
        None => {
            let mode = match app.view_mode() {
                ViewMode::DemoClient => "Demo: client",
                ViewMode::DemoAdmin => "Demo: admin",
                _ => "Guest",
            };
            lines.push(Line::from(Span::styled(mode, styles::title_style())));
            lines.push(Line::from(Span::styled(
                "[l] Log in  [c]/[a] Demo  [g] Guest",
                styles::muted_style(),
            )));
        }
    }

    let pending = app.outbox.pending_count();
    if pending > 0 {
        lines.push(Line::from(Span::styled(
            format!("{pending} queued"),
            styles::offline_style(),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let text = match app.status_message {
        Some(ref message) => format!(" {message}"),
        None => " [Tab] Next  [Enter] Open  [q] Quit".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(text, styles::muted_style())),
        area,
    );
}
