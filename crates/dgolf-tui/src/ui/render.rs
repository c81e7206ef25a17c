//! Top-level render dispatch and overlays.
//!
//! The device profile decides which composition mounts; overlays render
//! identically on both.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use dgolf_core::device::LayoutKind;

use crate::app::{App, AppState, LoginFocus};

use super::{desktop, mobile, styles};

pub fn render(frame: &mut Frame, app: &App) {
    match app.device.current().layout() {
        LayoutKind::Desktop => desktop::render(frame, app),
        LayoutKind::Mobile => mobile::render(frame, app),
    }

    match app.state {
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ComposingInquiry => render_inquiry_overlay(frame, app),
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingUpdate => render_update_overlay(frame, app),
        AppState::Normal | AppState::Quitting => {}
    }
}

/// Centered overlay rectangle with the given size, clamped to the frame.
fn centered_rect(width: u16, height: u16, frame_area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(frame_area.height)),
            Constraint::Min(0),
        ])
        .split(frame_area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width.min(frame_area.width)),
            Constraint::Min(0),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn field_line<'a>(label: &'a str, value: String, focused: bool, mask: bool) -> Line<'a> {
    let shown = if mask {
        "*".repeat(value.chars().count())
    } else {
        value
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(
            format!("{label:>10}: "),
            if focused {
                styles::highlight_style()
            } else {
                styles::muted_style()
            },
        ),
        Span::raw(format!("{shown}{cursor}")),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 11, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        field_line(
            "Email",
            app.login_email.clone(),
            app.login_focus == LoginFocus::Email,
            false,
        ),
        field_line(
            "Password",
            app.login_password.clone(),
            app.login_focus == LoginFocus::Password,
            true,
        ),
        Line::from(""),
        Line::from(Span::styled(
            if app.login_focus == LoginFocus::Button {
                "        [ Sign in ]"
            } else {
                "          Sign in"
            },
            if app.login_focus == LoginFocus::Button {
                styles::selected_style()
            } else {
                styles::muted_style()
            },
        )),
    ];

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {error}"),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Sign in to DGolf ")
        .border_style(styles::title_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_inquiry_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 10, frame.area());
    frame.render_widget(Clear, area);

    let destination = app
        .selected_destination()
        .map(|d| d.name.clone())
        .unwrap_or_default();

    let lines = vec![
        Line::from(vec![
            Span::styled("Destination: ", styles::muted_style()),
            Span::styled(destination, styles::highlight_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Message:", styles::muted_style())),
        Line::from(format!("{}_", app.inquiry_message)),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Send   [Esc] Cancel",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Booking inquiry ")
        .border_style(styles::title_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(56, 16, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from("  1/2/3, Tab     Switch tabs"),
        Line::from("  j/k, arrows    Move selection"),
        Line::from("  Enter          Open detail (compact layout)"),
        Line::from("  Esc            Back / close"),
        Line::from("  r              Refresh from network"),
        Line::from("  i              Send inquiry for destination"),
        Line::from("  l              Log in"),
        Line::from("  o              Log out (Account tab)"),
        Line::from("  c / a / g      Demo client / admin / guest view"),
        Line::from("  u              Apply pending cache update"),
        Line::from("  q              Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Cached content keeps working offline.",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(styles::title_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect(34, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::raw("  Quit DGolf? [y/N]")),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::title_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_update_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(52, 7, frame.area());
    frame.render_widget(Clear, area);

    let version = app.update_available.clone().unwrap_or_default();
    let lines = vec![
        Line::from(""),
        Line::from(format!("  New version available: {version}")),
        Line::from(""),
        Line::from(Span::styled(
            "  [Enter] Update now   [Esc] Later",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Update ")
        .border_style(styles::title_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
