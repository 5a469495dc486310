use std::fs::{self};
#[cfg(feature = "ratatui_support")]
use std::io;
use std::path::{Path, PathBuf};

#[cfg(feature = "ratatui_support")]
use chrono::Datelike;
#[cfg(feature = "ratatui_support")]
use ratatui::{
    backend::{Backend, CrosstermBackend},
    crossterm::{
        cursor::MoveTo,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
        execute,
        terminal::{
            disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
            LeaveAlternateScreen,
        },
    },
    Terminal,
};

#[cfg(feature = "ratatui_support")]
use crate::app::app::App;
#[cfg(feature = "ratatui_support")]
use crate::app::screen::CurrentScreen;
#[cfg(feature = "ratatui_support")]
use crate::app::ui;
use crate::database::DbConn;
#[cfg(feature = "ratatui_support")]
use crate::tui::tui_user::create_admin;

#[cfg(feature = "ratatui_support")]
mod app;
mod database;
mod ledger;
mod tui;
mod types;

fn main() -> Result<(), std::io::Error> {
    env_logger::init();

    let db_dir: String = String::from("./db");
    match Path::new(&db_dir).try_exists() {
        Ok(true) => {}
        Ok(false) => {
            let _ = fs::create_dir(&db_dir);
        }
        Err(_) => {
            panic!("Unable to verify existence of database directory!");
        }
    }

    let mut db_path = PathBuf::new();
    db_path.push(&db_dir);
    db_path.push("hoa.db");
    let mut _db = match DbConn::new(db_path) {
        Ok(db) => db,
        Err(error) => {
            panic!("unable to open db: {}", error);
        }
    };

    #[cfg(feature = "ratatui_support")]
    init_and_run_app(&mut _db)?;

    #[cfg(not(feature = "ratatui_support"))]
    print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
    #[cfg(not(feature = "ratatui_support"))]
    println!("Welcome to HoaTool!");
    #[cfg(not(feature = "ratatui_support"))]
    tui::menu(&mut _db);

    Ok(())
}

#[cfg(feature = "ratatui_support")]
fn init_and_run_app(_db: &mut DbConn) -> io::Result<bool> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let mut app = App::new(_db);
    let res = run_app(&mut terminal, &mut app)?;

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(res)
}

#[cfg(feature = "ratatui_support")]
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<bool> {
    loop {
        app.sync();
        terminal.draw(|f| ui::ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == event::KeyEventKind::Release {
                // Skip events that are not KeyEventKind::Press
                continue;
            }
            match app.current_screen {
                CurrentScreen::Login => match (key.modifiers, key.code) {
                    (_, KeyCode::Enter) => {
                        if let Some(id) = app.validate_admin(app.key_input.to_string()) {
                            app.admin_id = Some(id);
                            let period = chrono::Local::now().year().to_string();
                            app.open_period(period.as_str());
                            app.current_screen = CurrentScreen::Dues;
                        } else {
                            app.invalid_input = true;
                        }
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
                        return Ok(true)
                    }
                    (_, KeyCode::Char(':')) => {
                        disable_raw_mode()?;
                        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)).unwrap();
                        create_admin(&mut app.db);
                        enable_raw_mode()?;
                        terminal.clear().unwrap();
                    }
                    (_, KeyCode::Char(value)) => {
                        app.key_input.push(value);
                    }
                    (_, KeyCode::Backspace) => {
                        app.key_input.pop();
                    }
                    _ => {}
                },
                CurrentScreen::Dues => match (key.modifiers, key.code) {
                    (_, KeyCode::Char('q'))
                    | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
                        return Ok(true)
                    }
                    (_, KeyCode::Char('j')) | (_, KeyCode::Down) => {
                        app.advance_dues_table_row();
                    }
                    (_, KeyCode::Char('k')) | (_, KeyCode::Up) => {
                        app.retreat_dues_table_row();
                    }
                    (_, KeyCode::Char('G')) => {
                        app.go_to_last_dues_table_row();
                    }
                    (_, KeyCode::Char('H')) => {
                        app.go_to_first_dues_table_row();
                    }
                    (_, KeyCode::Char('e')) => {
                        // the guarded edit flow runs in the inquire tui;
                        // drop out of raw mode for the duration
                        disable_raw_mode()?;
                        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)).unwrap();
                        if let Some(uid) = app.admin_id {
                            tui::tui_dues::dues_dashboard(uid, app.period.clone(), &mut app.db);
                        }
                        enable_raw_mode()?;
                        terminal.clear().unwrap();
                        let period = app.period.clone();
                        app.open_period(period.as_str());
                    }
                    (_, KeyCode::Char('p')) => {
                        disable_raw_mode()?;
                        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)).unwrap();
                        if let Some(period) = tui::select_period(&mut app.db) {
                            app.open_period(period.as_str());
                        }
                        enable_raw_mode()?;
                        terminal.clear().unwrap();
                    }
                    _ => {}
                },
            }
        }
    }
}
