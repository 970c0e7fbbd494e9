use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::info;

use crate::db::Database;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_up};

pub(crate) fn as_tui(db: &mut Database) -> Result<()> {
    let mut app = App::new();
    app.refresh_all(db)?;
    info!("dashboard started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // tab bar + status + command bar + borders + table header
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if app.show_help {
                app.show_help = false;
                continue;
            }
            let handled = match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db),
                InputMode::Command => {
                    handle_command_input(key, app, db);
                    Ok(())
                }
                InputMode::Search => handle_search_input(key, app, db),
                InputMode::Confirm => handle_confirm_input(key, app, db),
            };
            // Store failures are shown, not fatal
            if let Err(e) = handled {
                app.set_status(format!("Error: {e:#}"));
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Search;
            app.search_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('1') => switch_screen(app, db, Screen::Expenses)?,
        KeyCode::Char('2') => switch_screen(app, db, Screen::Categories)?,
        KeyCode::Char('3') => switch_screen(app, db, Screen::PaymentMethods)?,
        KeyCode::Char('4') => switch_screen(app, db, Screen::Reports)?,
        KeyCode::Tab => cycle_screen(app, db, 1)?,
        KeyCode::BackTab => cycle_screen(app, db, -1)?,
        KeyCode::Char('H') => commands::advance_month(app, db, -1)?,
        KeyCode::Char('L') => commands::advance_month(app, db, 1)?,
        KeyCode::Char('a') => {
            app.input_mode = InputMode::Command;
            app.command_input = "add ".into();
        }
        KeyCode::Char('e') if app.screen == Screen::Expenses => {
            commands::handle_command("edit", app, db);
        }
        KeyCode::Char('D') => commands::request_delete(app),
        KeyCode::Esc => {
            if !app.search_input.is_empty() {
                app.search_input.clear();
                app.refresh_expenses(db)?;
                app.set_status("Search cleared");
            } else {
                app.status_message.clear();
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db);
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
}

fn handle_search_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input.clear();
            app.refresh_expenses(db)?;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            live_search(app, db)?;
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            live_search(app, db)?;
        }
        _ => {}
    }
    Ok(())
}

fn live_search(app: &mut App, db: &mut Database) -> Result<()> {
    app.screen = Screen::Expenses;
    app.expense_index = 0;
    app.expense_scroll = 0;
    app.refresh_expenses(db)
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            if let Some(action) = app.pending_action.take() {
                commands::execute_pending(action, app, db)?;
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    match screen {
        Screen::Expenses => app.refresh_expenses(db)?,
        Screen::Categories => app.refresh_categories(db)?,
        Screen::PaymentMethods => app.refresh_methods(db)?,
        Screen::Reports => app.refresh_reports(db)?,
    }
    app.set_status(format!("{screen}"));
    Ok(())
}

fn cycle_screen(app: &mut App, db: &mut Database, delta: isize) -> Result<()> {
    let screens = Screen::all();
    let len = screens.len() as isize;
    let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0) as isize;
    let next = (idx + delta).rem_euclid(len) as usize;
    switch_screen(app, db, screens[next])
}

fn handle_move_down(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Expenses => scroll_down(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        Screen::Categories => {
            if app.category_index + 1 < app.categories.len() {
                app.category_index += 1;
            }
        }
        Screen::PaymentMethods => {
            if app.method_index + 1 < app.methods.len() {
                app.method_index += 1;
            }
        }
        Screen::Reports => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Expenses => scroll_up(&mut app.expense_index, &mut app.expense_scroll),
        Screen::Categories => app.category_index = app.category_index.saturating_sub(1),
        Screen::PaymentMethods => app.method_index = app.method_index.saturating_sub(1),
        Screen::Reports => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Expenses => {
            app.expense_index = 0;
            app.expense_scroll = 0;
        }
        Screen::Categories => app.category_index = 0,
        Screen::PaymentMethods => app.method_index = 0,
        Screen::Reports => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Expenses => scroll_to_bottom(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        Screen::Categories => app.category_index = app.categories.len().saturating_sub(1),
        Screen::PaymentMethods => app.method_index = app.methods.len().saturating_sub(1),
        Screen::Reports => {}
    }
}
