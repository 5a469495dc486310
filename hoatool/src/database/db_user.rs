use super::DbConn;
use crate::types::admins::{AdminIdentity, AdminRecord};
use rusqlite::Error;
use sha2::{Digest, Sha256};

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl DbConn {
    pub fn create_users_id_table(&self) -> rusqlite::Result<()> {
        let sql = "
            CREATE TABLE IF NOT EXISTS user_ids (
            next_user_id INTEGER NOT NULL PRIMARY KEY
        )";
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, ())?;
        let sql: &str = "SELECT * FROM user_ids";
        let mut stmt = conn_lock.prepare(sql)?;
        let exists = stmt.exists(())?;
        if !exists {
            let sql = "INSERT INTO user_ids (next_user_id) VALUES (?1)";
            conn_lock.execute(sql, [0])?;
        }
        Ok(())
    }

    pub fn get_next_user_id(&self) -> rusqlite::Result<u32> {
        let sql = "SELECT next_user_id FROM user_ids";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let exists = stmt.exists(())?;
        match exists {
            true => {
                let id = stmt.query_row((), |row| row.get::<_, u32>(0))?;
                let sql = "UPDATE user_ids SET next_user_id = next_user_id + 1";
                conn_lock.execute(sql, ())?;
                Ok(id)
            }
            false => {
                panic!("The next user ID within table 'user_ids' does not exist.");
            }
        }
    }

    pub fn create_user_table(&self) -> rusqlite::Result<()> {
        let sql: &str = "CREATE TABLE IF NOT EXISTS users (
                id          INTEGER NOT NULL PRIMARY KEY,
                name        TEXT    NOT NULL,
                email       TEXT    NOT NULL,
                pw_hash     TEXT    NOT NULL,
                admin       BOOL    NOT NULL
            )";
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, ())?;
        Ok(())
    }

    pub fn add_user(
        &self,
        name: String,
        email: String,
        password: &str,
        admin: bool,
    ) -> rusqlite::Result<u32, Error> {
        let sql: &str = "INSERT INTO users (id, name, email, pw_hash, admin) VALUES ( ?1, ?2, ?3, ?4, ?5)";
        let id = self.get_next_user_id()?;
        let p = rusqlite::params![id, name, email, hash_password(password), admin];
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, p)?;
        Ok(id)
    }

    pub fn get_users(&self) -> rusqlite::Result<Vec<String>, rusqlite::Error> {
        let sql: &str = "SELECT name FROM users";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let exists = stmt.exists(())?;
        let mut users: Vec<String> = Vec::new();
        match exists {
            true => {
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Vec<_>>();
                for name in names {
                    users.push(name?);
                }
                Ok(users)
            }
            false => Ok(users),
        }
    }

    pub fn get_user_id(&self, name: String) -> rusqlite::Result<u32, rusqlite::Error> {
        let sql: &str = "SELECT id FROM users WHERE name = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        stmt.query_row((&name,), |row| row.get::<_, u32>(0))
    }

    pub fn get_user_record(&self, uid: u32) -> rusqlite::Result<AdminRecord, rusqlite::Error> {
        let sql: &str = "SELECT id, name, email, admin FROM users WHERE id = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        stmt.query_row((&uid,), |row| {
            Ok(AdminRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                admin: row.get(3)?,
            })
        })
    }

    pub fn get_admin_identity(&self, uid: u32) -> rusqlite::Result<AdminIdentity, rusqlite::Error> {
        let record = self.get_user_record(uid)?;
        Ok(AdminIdentity {
            id: record.id,
            name: record.name,
            email: record.email,
        })
    }

    pub fn is_admin(&self, uid: u32) -> rusqlite::Result<bool, Error> {
        let sql: &str = "SELECT admin FROM users WHERE id = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        stmt.query_row((&uid,), |row| row.get::<_, bool>(0))
    }

    /// Compares the supplied password against the stored hash. No lockout
    /// and no attempt counting; repeated failures just keep returning
    /// false.
    pub fn verify_password(&self, uid: u32, password: &str) -> rusqlite::Result<bool, Error> {
        let sql: &str = "SELECT pw_hash FROM users WHERE id = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let stored: String = stmt.query_row((&uid,), |row| row.get::<_, String>(0))?;
        Ok(stored == hash_password(password))
    }
}
