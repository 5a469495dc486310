use ratatui::widgets::TableState;

use crate::app::screen::PALETTES;
use crate::database::DbConn;
use crate::ledger::view::LedgerViewModel;
use shared_lib::SlotName;
use strum::IntoEnumIterator;

use super::screen::{CurrentScreen, DisplayableDuesRow, LedgerColors};

pub struct App {
    pub key_input: String,
    pub invalid_input: bool,
    pub current_screen: CurrentScreen,
    pub db: DbConn,
    pub admin_id: Option<u32>,
    pub period: String,
    pub view: Option<LedgerViewModel>,
    pub dues_table_state: TableState,
    pub dues_table_colors: LedgerColors,
}

impl App {
    pub fn new(db: &DbConn) -> App {
        App {
            key_input: String::new(),
            invalid_input: false,
            current_screen: CurrentScreen::Login,
            db: db.clone(),
            admin_id: None,
            period: String::new(),
            view: None,
            dues_table_state: TableState::default().with_selected(0),
            dues_table_colors: LedgerColors::new(&PALETTES[1]),
        }
    }

    pub fn validate_admin(&mut self, name: String) -> Option<u32> {
        let users: Vec<String> = self.db.get_users().unwrap();
        if users.contains(&name) {
            return Some(self.db.get_user_id(name).unwrap());
        } else {
            return None;
        }
    }

    pub fn open_period(&mut self, period: &str) {
        let mut view = LedgerViewModel::new(period);
        view.attach(&self.db);
        if let Err(error) = view.load_period(&self.db, period) {
            log::warn!("unable to load period {}: {}", period, error);
        }
        self.period = period.to_string();
        self.view = Some(view);
        self.dues_table_state.select(Some(0));
    }

    /// Picks up writes that happened since the last draw, e.g. a commit
    /// finished in the inquire edit flow.
    pub fn sync(&mut self) {
        if let Some(view) = self.view.as_mut() {
            if let Err(error) = view.sync_if_stale(&self.db) {
                log::warn!("view sync failed: {}", error);
            }
        }
    }

    pub fn displayable_rows(&self) -> Vec<DisplayableDuesRow> {
        let mut rows: Vec<DisplayableDuesRow> = Vec::new();
        if let Some(view) = self.view.as_ref() {
            for (member, row) in view.record.members.iter() {
                let cells = SlotName::iter()
                    .map(|slot_name| {
                        let slot = row.slot(slot_name);
                        if slot.paid {
                            format!("{:.2}", slot.amount)
                        } else {
                            "--".to_string()
                        }
                    })
                    .collect();
                rows.push(DisplayableDuesRow {
                    member: member.clone(),
                    cells,
                });
            }
        }
        rows
    }

    pub fn member_count(&self) -> usize {
        self.view
            .as_ref()
            .map(|view| view.record.members.len())
            .unwrap_or(0)
    }

    pub fn advance_dues_table_row(&mut self) {
        if self.member_count() == 0 {
            return;
        }
        let i = match self.dues_table_state.selected() {
            Some(i) => Some(i.saturating_add(1).min(self.member_count() - 1)),
            None => Some(0),
        };
        self.dues_table_state.select(i);
    }

    pub fn retreat_dues_table_row(&mut self) {
        let i = match self.dues_table_state.selected() {
            Some(i) => Some(i.saturating_sub(1)),
            None => Some(0),
        };
        self.dues_table_state.select(i);
    }

    pub fn go_to_first_dues_table_row(&mut self) {
        self.dues_table_state.select(Some(0));
    }

    pub fn go_to_last_dues_table_row(&mut self) {
        if self.member_count() == 0 {
            return;
        }
        self.dues_table_state.select(Some(self.member_count() - 1));
    }
}
