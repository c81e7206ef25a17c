//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Returns true
//! from `handle_input` when the app should quit.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use dgolf_core::auth::ViewMode;

use crate::app::{
    App, AppState, LoginFocus, Tab, MAX_EMAIL_LENGTH, MAX_MESSAGE_LENGTH, MAX_PASSWORD_LENGTH,
};

pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => {
            handle_login_input(app, key).await;
            return Ok(false);
        }
        AppState::ComposingInquiry => {
            handle_inquiry_input(app, key).await;
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                _ => app.state = AppState::Normal,
            }
            return Ok(false);
        }
        AppState::ConfirmingUpdate => {
            match key.code {
                KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('u') => {
                    app.apply_update().await;
                }
                _ => app.dismiss_update(),
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,

        KeyCode::Char('1') => switch_tab(app, Tab::Destinations),
        KeyCode::Char('2') => switch_tab(app, Tab::Articles),
        KeyCode::Char('3') => switch_tab(app, Tab::Account),
        KeyCode::Tab => switch_tab(app, app.current_tab.next()),
        KeyCode::BackTab => switch_tab(app, app.current_tab.prev()),

        KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
        KeyCode::PageDown => app.move_selection(10),
        KeyCode::PageUp => app.move_selection(-10),

        KeyCode::Enter => {
            if matches!(app.current_tab, Tab::Destinations | Tab::Articles) {
                app.detail_open = true;
            }
        }
        KeyCode::Esc => app.detail_open = false,

        KeyCode::Char('r') => app.refresh_all_background(),

        KeyCode::Char('i') => {
            if app.current_tab == Tab::Destinations && app.selected_destination().is_some() {
                app.state = AppState::ComposingInquiry;
            }
        }

        KeyCode::Char('l') => {
            if !app.auth.is_authenticated() {
                app.login_error = None;
                app.login_focus = if app.login_email.is_empty() {
                    LoginFocus::Email
                } else {
                    LoginFocus::Password
                };
                app.state = AppState::LoggingIn;
            }
        }
        KeyCode::Char('o') => {
            if app.current_tab == Tab::Account && app.auth.is_authenticated() {
                app.logout();
            }
        }

        KeyCode::Char('c') => {
            if app.current_tab == Tab::Account {
                app.set_demo_mode(ViewMode::DemoClient);
            }
        }
        KeyCode::Char('a') => {
            if app.current_tab == Tab::Account {
                app.set_demo_mode(ViewMode::DemoAdmin);
            }
        }
        KeyCode::Char('g') => {
            if app.current_tab == Tab::Account {
                app.set_demo_mode(ViewMode::Guest);
            }
        }

        KeyCode::Char('u') => {
            if app.update_available.is_some() {
                app.apply_update().await;
            }
        }

        _ => {}
    }

    Ok(false)
}

fn switch_tab(app: &mut App, tab: Tab) {
    app.current_tab = tab;
    app.detail_open = false;
}

async fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.login_password.clear();
            app.login_error = None;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.submit_login().await,
        },
        KeyCode::Backspace => {
            match app.login_focus {
                LoginFocus::Email => {
                    app.login_email.pop();
                }
                LoginFocus::Password => {
                    app.login_password.pop();
                }
                LoginFocus::Button => {}
            };
        }
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if app.login_email.len() < MAX_EMAIL_LENGTH {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if app.login_password.len() < MAX_PASSWORD_LENGTH {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
}

async fn handle_inquiry_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.inquiry_message.clear();
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.submit_inquiry().await,
        KeyCode::Backspace => {
            app.inquiry_message.pop();
        }
        KeyCode::Char(c) => {
            if app.inquiry_message.len() < MAX_MESSAGE_LENGTH {
                app.inquiry_message.push(c);
            }
        }
        _ => {}
    }
}
