use super::DbConn;

impl DbConn {
    pub fn create_members_table(&self) -> rusqlite::Result<()> {
        let sql: &str = "CREATE TABLE IF NOT EXISTS members (
                id          INTEGER NOT NULL PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE
            )";
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, ())?;
        Ok(())
    }

    pub fn get_directory_member_id(&self, name: &str) -> Option<u32> {
        let sql = "SELECT id FROM members WHERE name = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = match conn_lock.prepare(sql) {
            Ok(stmt) => stmt,
            Err(_) => return None,
        };
        match stmt.query_row((&name,), |row| row.get::<_, u32>(0)) {
            Ok(id) => Some(id),
            Err(_) => None,
        }
    }

    /// Registers a member in the association directory; adding an
    /// already-known name returns the existing id.
    pub fn check_and_add_directory_member(&self, name: &str) -> rusqlite::Result<u32> {
        if let Some(id) = self.get_directory_member_id(name) {
            return Ok(id);
        }
        let conn_lock = self.conn.lock().unwrap();
        let sql = "SELECT COALESCE(MAX(id), 0) + 1 FROM members";
        let mut stmt = conn_lock.prepare(sql)?;
        let id: u32 = stmt.query_row((), |row| row.get(0))?;
        let sql = "INSERT INTO members (id, name) VALUES (?1, ?2)";
        conn_lock.execute(sql, rusqlite::params![id, name])?;
        Ok(id)
    }

    pub fn get_directory_members(&self) -> rusqlite::Result<Vec<String>> {
        let sql = "SELECT name FROM members ORDER BY name ASC";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let mut members: Vec<String> = Vec::new();
        let names = stmt
            .query_map((), |row| row.get::<_, String>(0))?
            .collect::<Vec<_>>();
        for name in names {
            members.push(name?);
        }
        Ok(members)
    }

    /// Directory members that do not yet have a row in the given period's
    /// ledger. Feeds the add-member flow only; the edit session never
    /// calls this.
    pub fn get_eligible_members(&self, period: &str) -> rusqlite::Result<Vec<String>> {
        let sql = "SELECT name FROM members WHERE name NOT IN
                (SELECT DISTINCT member FROM dues WHERE period = (?1))
            ORDER BY name ASC";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let mut members: Vec<String> = Vec::new();
        let names = stmt
            .query_map((&period,), |row| row.get::<_, String>(0))?
            .collect::<Vec<_>>();
        for name in names {
            members.push(name?);
        }
        Ok(members)
    }
}
