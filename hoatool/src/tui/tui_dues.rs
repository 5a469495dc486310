use inquire::*;
use strum::IntoEnumIterator;

use crate::database::DbConn;
use crate::ledger::session::{EditSession, SessionState};
use crate::ledger::store::{AdminDirectory, AuthService};
use crate::ledger::view::LedgerViewModel;
use crate::ledger::LedgerError;
use shared_lib::SlotName;

pub fn dues_dashboard(uid: u32, period: String, db: &mut DbConn) {
    match DuesDashboard::new(uid, period, db) {
        Ok(mut dashboard) => dashboard.run(),
        Err(error) => {
            println!("Unable to open dues ledger: {}", error);
        }
    }
}

/// Interactive dues grid for one period. All mutation goes through the
/// edit session; this layer only prompts and prints.
pub struct DuesDashboard {
    uid: u32,
    period: String,
    db: DbConn,
    view: LedgerViewModel,
    session: EditSession,
}

impl DuesDashboard {
    pub fn new(uid: u32, period: String, db: &DbConn) -> Result<Self, LedgerError> {
        let mut view = LedgerViewModel::new(period.as_str());
        view.attach(db);
        view.load_period(db, period.as_str())?;
        Ok(DuesDashboard {
            uid,
            period,
            db: db.clone(),
            view,
            session: EditSession::new(),
        })
    }

    pub fn run(&mut self) {
        loop {
            if self.session.state() == SessionState::Viewing {
                if let Err(error) = self.view.sync_if_stale(&self.db) {
                    println!("{}", error);
                }
            }
            self.print_grid();
            match self.session.state() {
                SessionState::Viewing => {
                    if !self.viewing_menu() {
                        break;
                    }
                }
                SessionState::Editing => self.editing_menu(),
                SessionState::PendingCommit => self.pending_menu(),
            }
        }
    }

    fn print_grid(&self) {
        println!();
        match self.session.state() {
            SessionState::Viewing => println!("== Dues Ledger {} ==", self.period),
            SessionState::Editing => println!(
                "== Dues Ledger {} [EDITING, {} cell(s) selected] ==",
                self.period,
                self.session.selected_cells().len()
            ),
            SessionState::PendingCommit => println!(
                "== Dues Ledger {} [AWAITING COMMIT, {} cell(s) selected] ==",
                self.period,
                self.session.selected_cells().len()
            ),
        }

        print!("{:<20}", "Member");
        for slot in SlotName::iter() {
            print!("{:>9}", slot.to_string());
        }
        println!();

        if self.view.record.is_empty() {
            println!("(no members in this period)");
        }
        for (member, row) in self.view.record.members.iter() {
            print!("{:<20}", member);
            for slot_name in SlotName::iter() {
                let slot = row.slot(slot_name);
                if slot.paid {
                    print!("{:>9.2}", slot.amount);
                } else {
                    print!("{:>9}", "--");
                }
            }
            println!();
        }

        println!(
            "Totals: dues paid {:.2} / membership fees paid {:.2}",
            self.view.totals.total_dues_paid, self.view.totals.total_fee_paid
        );
        println!("Membership fee rate: {:.2}", self.view.rates.hoa_fee());
    }

    fn viewing_menu(&mut self) -> bool {
        const VIEW_OPTIONS: [&'static str; 6] = [
            "Enter Edit Mode",
            "Add Member",
            "Remove Member",
            "View Audit Trail",
            "Refresh",
            "Exit",
        ];
        let choice = Select::new("What would you like to do:", VIEW_OPTIONS.to_vec())
            .prompt()
            .unwrap()
            .to_string();

        match choice.as_str() {
            "Enter Edit Mode" => {
                if let Err(error) = self.session.enter_edit(&self.view) {
                    println!("{}", error);
                }
            }
            "Add Member" => {
                self.add_member();
            }
            "Remove Member" => {
                self.remove_member();
            }
            "View Audit Trail" => {
                self.print_audit_trail();
            }
            "Refresh" => {
                let period = self.period.clone();
                if let Err(error) = self.view.load_period(&self.db, period.as_str()) {
                    println!("{}", error);
                }
            }
            "Exit" => {
                return false;
            }
            _ => {
                panic!("Invalid menu option!");
            }
        }
        true
    }

    fn editing_menu(&mut self) {
        const EDIT_OPTIONS: [&'static str; 6] = [
            "Toggle Cell",
            "Mark Selected Paid",
            "Adjust Monthly Rate",
            "Adjust Membership Fee",
            "Review & Commit",
            "Discard Changes",
        ];
        let choice = Select::new("Edit session:", EDIT_OPTIONS.to_vec())
            .prompt()
            .unwrap()
            .to_string();

        match choice.as_str() {
            "Toggle Cell" => {
                let member = match self.select_member("Toggle which member:") {
                    Some(member) => member,
                    None => return,
                };
                let slot = match self.select_slot("Toggle which slot:", true) {
                    Some(slot) => slot,
                    None => return,
                };
                if let Err(error) = self.session.toggle_cell(&mut self.view, member.as_str(), slot)
                {
                    println!("{}", error);
                }
            }
            "Mark Selected Paid" => match self.session.bulk_mark_selected_paid(&mut self.view) {
                Ok(marked) => println!("Marked {} cell(s) paid.", marked),
                Err(error) => println!("{}", error),
            },
            "Adjust Monthly Rate" => {
                let slot = match self.select_slot("Adjust rate for which month:", false) {
                    Some(slot) => slot,
                    None => return,
                };
                let amount = CustomType::<f32>::new("Enter new standard amount:")
                    .with_placeholder("00000.00")
                    .with_error_message("Please type a valid amount!")
                    .prompt()
                    .unwrap();
                if let Err(error) = self.session.adjust_rate(&mut self.view, slot, amount) {
                    println!("{}", error);
                }
            }
            "Adjust Membership Fee" => {
                let amount = CustomType::<f32>::new("Enter new membership fee:")
                    .with_placeholder("00000.00")
                    .with_error_message("Please type a valid amount!")
                    .prompt()
                    .unwrap();
                if let Err(error) = self.session.adjust_hoa_rate(&mut self.view, amount) {
                    println!("{}", error);
                }
            }
            "Review & Commit" => {
                for cell in self.session.selected_cells().iter() {
                    println!("  {}", cell);
                }
                let proceed = Confirm::new("Freeze these changes for commit?")
                    .with_default(true)
                    .prompt()
                    .unwrap();
                if proceed {
                    if let Err(error) = self.session.request_commit(&self.view) {
                        println!("{}", error);
                    }
                }
            }
            "Discard Changes" => {
                let discard = Confirm::new("Discard all changes made in this session?")
                    .with_default(false)
                    .prompt()
                    .unwrap();
                if discard {
                    if let Err(error) = self.session.cancel(&mut self.view, &self.db) {
                        println!("{}", error);
                    }
                }
            }
            _ => {
                panic!("Invalid menu option!");
            }
        }
    }

    fn pending_menu(&mut self) {
        const PENDING_OPTIONS: [&'static str; 3] =
            ["Enter Password", "Back to Editing", "Discard Changes"];
        let choice = Select::new("Commit pending changes:", PENDING_OPTIONS.to_vec())
            .prompt()
            .unwrap()
            .to_string();

        match choice.as_str() {
            "Enter Password" => {
                let password = Password::new("Re-enter your password to commit:")
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .unwrap();
                let identity = match self.db.current_admin_identity(self.uid) {
                    Ok(identity) => identity,
                    Err(error) => {
                        println!("Unable to look up administrator: {}", error);
                        return;
                    }
                };
                match self.session.verify_and_commit(
                    &mut self.view,
                    &self.db,
                    &identity,
                    password.as_str(),
                ) {
                    Ok(receipt) => {
                        println!("Committed {} cell change(s).", receipt.cells);
                        if receipt.audit_written < receipt.cells {
                            println!(
                                "Warning: only {} of {} audit entries were written.",
                                receipt.audit_written, receipt.cells
                            );
                        }
                    }
                    Err(LedgerError::IncorrectPassword) => {
                        println!("Incorrect password! Your edits are still pending.");
                    }
                    Err(error) => {
                        println!("{}", error);
                    }
                }
            }
            "Back to Editing" => {
                if let Err(error) = self.session.abort_commit() {
                    println!("{}", error);
                }
            }
            "Discard Changes" => {
                let discard = Confirm::new("Discard all changes made in this session?")
                    .with_default(false)
                    .prompt()
                    .unwrap();
                if discard {
                    if let Err(error) = self.session.cancel(&mut self.view, &self.db) {
                        println!("{}", error);
                    }
                }
            }
            _ => {
                panic!("Invalid menu option!");
            }
        }
    }

    fn select_member(&self, prompt: &str) -> Option<String> {
        let mut names = self.view.record.member_names();
        if names.is_empty() {
            println!("No members in this period yet!");
            return None;
        }
        names.push("None".to_string());
        let selected = Select::new(prompt, names).prompt().unwrap().to_string();
        if selected == "None" {
            return None;
        }
        Some(selected)
    }

    fn select_slot(&self, prompt: &str, include_fee: bool) -> Option<SlotName> {
        let mut slots: Vec<String> = if include_fee {
            SlotName::iter().map(|s| s.to_string()).collect()
        } else {
            SlotName::months().map(|s| s.to_string()).collect()
        };
        slots.push("None".to_string());
        let selected = Select::new(prompt, slots).prompt().unwrap().to_string();
        if selected == "None" {
            return None;
        }
        Some(selected.parse::<SlotName>().unwrap())
    }

    fn add_member(&mut self) {
        let mut eligible = self.db.list_eligible_members(self.period.as_str()).unwrap();
        eligible.push("New Member".to_string());
        eligible.push("None".to_string());
        let selected = Select::new("Add which member:", eligible)
            .prompt()
            .unwrap()
            .to_string();

        let name = match selected.as_str() {
            "None" => return,
            "New Member" => {
                let mut name: String;
                loop {
                    name = Text::new("Enter member name:").prompt().unwrap();
                    if name.trim().is_empty() {
                        println!("Invalid member name!");
                    } else {
                        break;
                    }
                }
                let name = name.trim().to_string();
                if let Err(error) = self.db.check_and_add_directory_member(name.as_str()) {
                    println!("Unable to register member: {}", error);
                    return;
                }
                name
            }
            _ => selected,
        };

        match self.db.has_member_in_period(self.period.as_str(), name.as_str()) {
            Ok(true) => {
                println!("{} is already in period {}.", name, self.period);
                return;
            }
            Ok(false) => {}
            Err(error) => {
                println!("Unable to check member: {}", error);
                return;
            }
        }

        if let Err(error) = self.db.add_member_to_period(self.period.as_str(), name.as_str()) {
            println!("Unable to add member: {}", error);
            return;
        }
        let period = self.period.clone();
        if let Err(error) = self.view.load_period(&self.db, period.as_str()) {
            println!("{}", error);
        }
    }

    fn remove_member(&mut self) {
        let member = match self.select_member("Remove which member:") {
            Some(member) => member,
            None => return,
        };
        let confirmed = Confirm::new(
            format!("Remove {} and all their {} dues rows?", member, self.period).as_str(),
        )
        .with_default(false)
        .prompt()
        .unwrap();
        if !confirmed {
            return;
        }
        if let Err(error) = self
            .db
            .remove_member_from_period(self.period.as_str(), member.as_str())
        {
            println!("Unable to remove member: {}", error);
            return;
        }
        let period = self.period.clone();
        if let Err(error) = self.view.load_period(&self.db, period.as_str()) {
            println!("{}", error);
        }
    }

    fn print_audit_trail(&self) {
        match self.db.get_audit_trail(self.period.as_str()) {
            Ok(entries) => {
                if entries.is_empty() {
                    println!("No audit entries for {} yet.", self.period);
                }
                for entry in entries {
                    println!(
                        "{}  {:<12} set {} / {} to {}",
                        entry.timestamp, entry.admin, entry.member, entry.slot, entry.status
                    );
                }
            }
            Err(error) => {
                println!("Unable to read audit trail: {}", error);
            }
        }
    }
}
