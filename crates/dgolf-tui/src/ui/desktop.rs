//! Wide (desktop) composition: title bar, tab row, two-pane content,
//! status bar. Mounted when the device profile is not mobile.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use dgolf_core::auth::ViewMode;

use crate::app::{App, Tab};

use super::{short_date, styles, truncate};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  DGolf";
    let connectivity = if app.online { "" } else { "  OFFLINE" };
    let help_hint = "[?] Help";

    let padding = area
        .width
        .saturating_sub((title.len() + connectivity.len() + help_hint.len() + 4) as u16)
        as usize;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(connectivity, styles::offline_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [
        ("[1] Destinations", app.current_tab == Tab::Destinations),
        ("[2] Articles", app.current_tab == Tab::Articles),
        ("[3] Account", app.current_tab == Tab::Account),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, selected)) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if *selected {
            styles::highlight_style()
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(*label, style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Destinations | Tab::Articles => {
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(area);

            match app.current_tab {
                Tab::Destinations => {
                    render_destination_list(frame, app, panes[0]);
                    render_destination_detail(frame, app, panes[1]);
                }
                Tab::Articles => {
                    render_article_list(frame, app, panes[0]);
                    render_article_detail(frame, app, panes[1]);
                }
                Tab::Account => unreachable!(),
            }
        }
        Tab::Account => render_account(frame, app, area),
    }
}

fn render_destination_list(frame: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .destinations
        .iter()
        .map(|d| {
            let line = format!("{}  ({})", d.name, d.country);
            let mut item = ListItem::new(truncate(&line, width));
            if d.featured {
                item = item.style(styles::highlight_style());
            }
            item
        })
        .collect();

    let title = format!(" Destinations ({}) ", app.destinations.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(styles::selected_style())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.destinations.is_empty() {
        state.select(Some(app.destination_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_destination_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");

    let Some(dest) = app.selected_destination() else {
        frame.render_widget(
            Paragraph::new("No destinations loaded. Press [r] to refresh.")
                .style(styles::muted_style())
                .block(block),
            area,
        );
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(dest.name.clone(), styles::title_style())),
        Line::from(Span::styled(
            dest.location_display(),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("From ", styles::muted_style()),
            Span::styled(dest.price_display(), styles::highlight_style()),
        ]),
        Line::from(""),
    ];

    for highlight in &dest.highlights {
        lines.push(Line::from(vec![
            Span::styled("  * ", styles::success_style()),
            Span::raw(highlight.clone()),
        ]));
    }
    if !dest.highlights.is_empty() {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(dest.short_desc.clone()));

    let reviews = app.selected_destination_testimonials();
    if !reviews.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Reviews",
            styles::title_style(),
        )));
        for review in reviews.iter().take(3) {
            lines.push(Line::from(vec![
                Span::styled(review.stars(), styles::highlight_style()),
                Span::styled(format!("  {}", review.name), styles::muted_style()),
            ]));
            lines.push(Line::from(truncate(&review.content, 100)));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[i] Send inquiry",
        styles::muted_style(),
    )));

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn render_article_list(frame: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .articles
        .iter()
        .map(|a| ListItem::new(truncate(&a.title, width)))
        .collect();

    let title = format!(" Articles ({}) ", app.articles.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(styles::selected_style())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.articles.is_empty() {
        state.select(Some(app.article_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_article_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Article ");

    let Some(article) = app.selected_article() else {
        frame.render_widget(
            Paragraph::new("No articles loaded. Press [r] to refresh.")
                .style(styles::muted_style())
                .block(block),
            area,
        );
        return;
    };

    let byline = match article.author {
        Some(ref author) => format!("{}  {}", author, short_date(&article.publish_date)),
        None => short_date(&article.publish_date),
    };

    let lines = vec![
        Line::from(Span::styled(article.title.clone(), styles::title_style())),
        Line::from(Span::styled(byline, styles::muted_style())),
        Line::from(""),
        Line::from(article.content.clone()),
    ];

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn render_account(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Account ");

    let mut lines = Vec::new();

    match app.auth.user() {
        Some(user) => {
            lines.push(Line::from(vec![
                Span::styled("Signed in as ", styles::muted_style()),
                Span::styled(user.full_name.clone(), styles::title_style()),
                Span::styled(format!("  <{}>", user.email), styles::muted_style()),
            ]));
            if user.is_admin {
                lines.push(Line::from(Span::styled(
                    "Administrator",
                    styles::highlight_style(),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "[o] Log out",
                styles::muted_style(),
            )));
        }
        None => {
            let mode_label = match app.view_mode() {
                ViewMode::Guest => "Browsing as guest",
                ViewMode::DemoClient => "Demo: client preview",
                ViewMode::DemoAdmin => "Demo: admin preview",
                ViewMode::Authenticated => unreachable!("no user while authenticated"),
            };
            lines.push(Line::from(Span::styled(mode_label, styles::title_style())));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "[l] Log in   [c] Preview client view   [a] Preview admin view   [g] Back to guest",
                styles::muted_style(),
            )));
        }
    }

    lines.push(Line::from(""));

    let pending = app.outbox.pending_count();
    if pending > 0 {
        lines.push(Line::from(Span::styled(
            format!("{pending} inquiries queued for sync"),
            styles::offline_style(),
        )));
    }

    if let Some(version) = app.registration.active_version() {
        lines.push(Line::from(vec![
            Span::styled("Cache version: ", styles::muted_style()),
            Span::raw(version),
        ]));
    }

    if let Some(ref version) = app.update_available {
        lines.push(Line::from(vec![
            Span::styled(format!("Update ready: {version}  "), styles::highlight_style()),
            Span::styled("[u] Apply", styles::muted_style()),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left = match app.status_message {
        Some(ref message) => message.clone(),
        None => "[Tab] Switch  [j/k] Move  [r] Refresh  [q] Quit".to_string(),
    };

    let connectivity = if app.online { "online" } else { "offline" };
    let padding = area
        .width
        .saturating_sub((left.len() + connectivity.len() + 3) as u16) as usize;

    let line = Line::from(vec![
        Span::styled(format!(" {left}"), styles::muted_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(
            connectivity,
            if app.online {
                styles::success_style()
            } else {
                styles::offline_style()
            },
        ),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(line).block(block), area);
}
