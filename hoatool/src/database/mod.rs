use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub mod db_audit;
pub mod db_dues;
pub mod db_members;
pub mod db_rates;
mod db_user;

const CURRENT_DATABASE_SCHEMA_VERSION: i32 = 0;

/// Callback registered against one period; invoked after every write to
/// that period's ledger so read-only views can re-synchronize.
pub type PeriodSubscriber = (String, Box<dyn Fn(&str) + Send>);

#[derive(Clone)]
pub struct DbConn {
    pub conn: Arc<Mutex<Connection>>,
    pub subscribers: Arc<Mutex<Vec<PeriodSubscriber>>>,
}

impl DbConn {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let rs_conn = Connection::open(db_path)?;
        let conn = Self {
            conn: Arc::new(Mutex::new(rs_conn)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        };
        conn.initialize_database()?;
        Ok(conn)
    }

    fn initialize_database(&self) -> Result<(), rusqlite::Error> {
        Self::allow_foreign_keys(&self.conn.lock().unwrap())?;
        Self::create_users_id_table(self)?;
        Self::create_user_table(self)?;
        Self::create_members_table(self)?;
        Self::create_dues_table(self)?;
        Self::create_rates_table(self)?;
        Self::create_period_summary_table(self)?;
        Self::create_audit_table(self)?;

        let conn_lock = &self.conn.lock().unwrap();
        Self::set_schema_version(conn_lock, CURRENT_DATABASE_SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn subscribe_to_period(&self, period: &str, on_change: Box<dyn Fn(&str) + Send>) {
        self.subscribers
            .lock()
            .unwrap()
            .push((period.to_string(), on_change));
    }

    pub fn notify_period_changed(&self, period: &str) {
        let subscribers = self.subscribers.lock().unwrap();
        for (subscribed, on_change) in subscribers.iter() {
            if subscribed == period {
                on_change(period);
            }
        }
    }

    fn allow_foreign_keys(conn: &Connection) -> rusqlite::Result<()> {
        conn.pragma_update(None, "foreign_keys", "on")
    }

    #[allow(dead_code)]
    fn get_schema_version(conn: &Connection) -> rusqlite::Result<i32> {
        conn.pragma_query_value(None, "user_version", |row| row.get::<_, i32>(0))
    }

    fn set_schema_version(conn: &Connection, schema_version: i32) -> rusqlite::Result<()> {
        conn.pragma_update(None, "user_version", schema_version)
    }
}
