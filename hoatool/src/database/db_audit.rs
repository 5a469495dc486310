use super::DbConn;
use shared_lib::{AuditEntry, PaymentStatus, SlotName};

impl DbConn {
    pub fn create_audit_table(&self) -> rusqlite::Result<()> {
        let sql: &str = "CREATE TABLE IF NOT EXISTS audit (
                id          INTEGER NOT NULL PRIMARY KEY,
                admin       TEXT NOT NULL,
                member      TEXT NOT NULL,
                slot        INTEGER NOT NULL,
                status      INTEGER NOT NULL,
                timestamp   TEXT NOT NULL,
                period      TEXT NOT NULL
            )";
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, ())?;
        Ok(())
    }

    /// Appends one immutable audit row. Rows are never updated or deleted
    /// through this layer.
    pub fn append_audit_entry(&self, entry: &AuditEntry) -> rusqlite::Result<u32> {
        let conn_lock = self.conn.lock().unwrap();
        let sql = "SELECT COALESCE(MAX(id), 0) + 1 FROM audit";
        let mut stmt = conn_lock.prepare(sql)?;
        let id: u32 = stmt.query_row((), |row| row.get(0))?;
        let sql = "INSERT INTO audit (id, admin, member, slot, status, timestamp, period)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
        let p = rusqlite::params![
            id,
            entry.admin,
            entry.member,
            entry.slot as u32,
            entry.status as u32,
            entry.timestamp,
            entry.period
        ];
        conn_lock.execute(sql, p)?;
        Ok(id)
    }

    pub fn get_audit_trail(&self, period: &str) -> rusqlite::Result<Vec<AuditEntry>> {
        let sql = "SELECT admin, member, slot, status, timestamp, period
            FROM audit WHERE period = (?1) ORDER BY id ASC";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let mut entries: Vec<AuditEntry> = Vec::new();
        let rows = stmt
            .query_map((&period,), |row| {
                Ok(AuditEntry {
                    admin: row.get(0)?,
                    member: row.get(1)?,
                    slot: SlotName::from(row.get::<_, u32>(2)?),
                    status: PaymentStatus::from(row.get::<_, u32>(3)?),
                    timestamp: row.get(4)?,
                    period: row.get(5)?,
                })
            })?
            .collect::<Vec<_>>();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn count_audit_entries(&self, period: &str) -> rusqlite::Result<u32> {
        let sql = "SELECT COUNT(*) FROM audit WHERE period = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        stmt.query_row((&period,), |row| row.get(0))
    }
}
