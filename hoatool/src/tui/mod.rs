use inquire::*;

use crate::database::DbConn;
use crate::tui::tui_user::*;

pub mod tui_dues;
pub mod tui_user;

pub fn menu(_db: &mut DbConn) {
    let mut uid: u32;

    // set current administrator first!
    uid = tui_set_admin(_db);

    let menu_options: Vec<&str>;
    if _db.is_admin(uid).unwrap() {
        menu_options = vec![
            "Open Dues Ledger",
            "Manage Members",
            "Create Administrator",
            "Change Administrator",
            "Exit",
        ];
    } else {
        menu_options = vec!["Open Dues Ledger", "Change Administrator", "Exit"];
    }

    let rf = &menu_options;

    loop {
        let command: String = Select::new("What would you like to do:", rf.to_vec())
            .prompt()
            .unwrap()
            .to_string();

        match command.as_str() {
            "Open Dues Ledger" => {
                if let Some(period) = select_period(_db) {
                    tui_dues::dues_dashboard(uid, period, _db);
                }
            }
            "Manage Members" => {
                manage_members(_db);
            }
            "Create Administrator" => {
                create_admin(_db);
            }
            "Change Administrator" => {
                uid = tui_set_admin(_db);
            }
            "Exit" => {
                println!("Exiting...");
                break;
            }
            _ => {
                panic!("Invalid command.");
            }
        }
    }
}

pub fn select_period(db: &mut DbConn) -> Option<String> {
    let mut periods = db.get_periods().unwrap_or_default();
    periods.push("New Period".to_string());
    periods.push("None".to_string());

    let selected = Select::new("Select period:", periods)
        .prompt()
        .unwrap()
        .to_string();

    match selected.as_str() {
        "None" => None,
        "New Period" => {
            let mut period: String;
            loop {
                period = Text::new("Enter period (year):").prompt().unwrap();
                if period.trim().is_empty() {
                    println!("Invalid period!");
                } else {
                    break;
                }
            }
            Some(period.trim().to_string())
        }
        _ => Some(selected),
    }
}

fn manage_members(db: &mut DbConn) {
    const MEMBER_OPTIONS: [&'static str; 3] = ["Register Member", "List Members", "Exit"];
    loop {
        let choice = Select::new("What would you like to do:", MEMBER_OPTIONS.to_vec())
            .prompt()
            .unwrap()
            .to_string();
        match choice.as_str() {
            "Register Member" => {
                let mut name: String;
                loop {
                    name = Text::new("Enter member name:").prompt().unwrap();
                    if name.trim().is_empty() {
                        println!("Invalid member name!");
                    } else {
                        break;
                    }
                }
                match db.check_and_add_directory_member(name.trim()) {
                    Ok(_) => println!("Registered {}.", name.trim()),
                    Err(error) => println!("Unable to register member: {}", error),
                }
            }
            "List Members" => {
                let members = db.get_directory_members().unwrap_or_default();
                if members.is_empty() {
                    println!("No members registered yet.");
                }
                for member in members {
                    println!("{}", member);
                }
            }
            "Exit" => {
                break;
            }
            _ => {
                panic!("Invalid menu option!");
            }
        }
    }
}
