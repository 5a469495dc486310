/* ------------------------------------------------------------------------
    Copyright (C) 2025  Andrew J. Eberhard

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
  -----------------------------------------------------------------------*/
use crate::database::DbConn;
use inquire::*;

pub fn create_admin(_db: &mut DbConn) -> u32 {
    let mut name: String;
    loop {
        name = Text::new("Enter administrator name:").prompt().unwrap();
        if name.len() == 0 {
            println!("Invalid administrator name!");
        } else {
            break;
        }
    }
    let email: String = Text::new("Enter email (or phone):").prompt().unwrap();
    let password: String = Password::new("Set password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .unwrap();
    _db.add_user(name, email, password.as_str(), true).unwrap()
}

pub fn tui_set_admin(_db: &mut DbConn) -> u32 {
    let id: u32;
    let users = _db.get_users().unwrap();
    if users.is_empty() {
        id = create_admin(_db);
    } else {
        let name: String = Select::new("Select current administrator:", users.to_vec())
            .prompt()
            .unwrap()
            .to_string();
        println!("Welcome {}!", name);
        let rid = _db.get_user_id(name);
        match rid {
            Ok(rid) => {
                id = rid;
            }
            Err(error) => {
                panic!("Error is {}", error);
            }
        }
    }
    return id;
}
