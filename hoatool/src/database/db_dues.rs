use std::collections::BTreeMap;

use super::DbConn;
use crate::types::dues::{DuesRecord, DuesTotals, MemberRow};
use shared_lib::{Slot, SlotName};
use strum::IntoEnumIterator;

impl DbConn {
    pub fn create_dues_table(&self) -> rusqlite::Result<()> {
        let sql: &str = "CREATE TABLE IF NOT EXISTS dues (
                period      TEXT NOT NULL,
                member      TEXT NOT NULL,
                slot        INTEGER NOT NULL,
                paid        BOOL NOT NULL,
                amount      REAL NOT NULL,
                PRIMARY KEY(period, member, slot)
            )";
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, ())?;
        Ok(())
    }

    pub fn create_period_summary_table(&self) -> rusqlite::Result<()> {
        let sql: &str = "CREATE TABLE IF NOT EXISTS period_summary (
                period           TEXT NOT NULL PRIMARY KEY,
                total_dues_paid  REAL NOT NULL,
                total_fee_paid   REAL NOT NULL
            )";
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, ())?;
        Ok(())
    }

    /// Reads every dues row of one period, grouped per member and
    /// normalized so each row carries all 13 slots. Returns None when the
    /// period has no rows at all.
    pub fn read_period_record(&self, period: &str) -> rusqlite::Result<Option<DuesRecord>> {
        let sql = "SELECT member, slot, paid, amount FROM dues WHERE period = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let exists = stmt.exists((&period,))?;
        if !exists {
            return Ok(None);
        }
        let rows = stmt
            .query_map((&period,), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    SlotName::from(row.get::<_, u32>(1)?),
                    Slot {
                        paid: row.get(2)?,
                        amount: row.get(3)?,
                    },
                ))
            })?
            .collect::<Vec<_>>();

        let mut raw: BTreeMap<String, BTreeMap<SlotName, Slot>> = BTreeMap::new();
        for row in rows {
            let (member, slot_name, slot) = row?;
            raw.entry(member).or_default().insert(slot_name, slot);
        }

        let mut record = DuesRecord::default();
        for (member, slots) in raw {
            record.members.insert(member, MemberRow::normalized(slots));
        }
        Ok(Some(record))
    }

    /// Replaces the whole period's ledger with the supplied record. The
    /// previous rows are dropped first; this is a whole-document
    /// overwrite, not a merge.
    pub fn replace_period_record(&self, period: &str, record: &DuesRecord) -> rusqlite::Result<()> {
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute("DELETE FROM dues WHERE period = (?1)", (&period,))?;
        let sql = "INSERT INTO dues (period, member, slot, paid, amount) VALUES (?1, ?2, ?3, ?4, ?5)";
        for (member, row) in record.members.iter() {
            for slot_name in SlotName::iter() {
                let slot = row.slot(slot_name);
                let p = rusqlite::params![period, member, slot_name as u32, slot.paid, slot.amount];
                conn_lock.execute(sql, p)?;
            }
        }
        Ok(())
    }

    /// Initializes a member's 13 slots to unpaid in the given period.
    /// Adding a member who already has rows is a no-op.
    pub fn add_member_to_period(&self, period: &str, member: &str) -> rusqlite::Result<()> {
        let conn_lock = self.conn.lock().unwrap();
        let sql = "INSERT OR IGNORE INTO dues (period, member, slot, paid, amount) VALUES (?1, ?2, ?3, ?4, ?5)";
        for slot_name in SlotName::iter() {
            let p = rusqlite::params![period, member, slot_name as u32, false, 0.0_f32];
            conn_lock.execute(sql, p)?;
        }
        Ok(())
    }

    /// Whole-member removal, outside any edit session. Removing a member
    /// twice is a no-op after the first.
    pub fn remove_member_from_period(&self, period: &str, member: &str) -> rusqlite::Result<()> {
        let conn_lock = self.conn.lock().unwrap();
        let sql = "DELETE FROM dues WHERE period = (?1) and member = (?2)";
        conn_lock.execute(sql, (&period, &member))?;
        Ok(())
    }

    pub fn has_member_in_period(&self, period: &str, member: &str) -> rusqlite::Result<bool> {
        let sql = "SELECT 1 FROM dues WHERE period = (?1) and member = (?2)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        stmt.exists((&period, &member))
    }

    pub fn write_period_summary_row(
        &self,
        period: &str,
        totals: DuesTotals,
    ) -> rusqlite::Result<()> {
        let sql = "INSERT INTO period_summary (period, total_dues_paid, total_fee_paid)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(period) DO UPDATE SET total_dues_paid = ?2, total_fee_paid = ?3";
        let p = rusqlite::params![period, totals.total_dues_paid, totals.total_fee_paid];
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, p)?;
        Ok(())
    }

    pub fn read_period_summary_row(&self, period: &str) -> rusqlite::Result<Option<DuesTotals>> {
        let sql =
            "SELECT total_dues_paid, total_fee_paid FROM period_summary WHERE period = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let exists = stmt.exists((&period,))?;
        match exists {
            true => {
                let totals = stmt.query_row((&period,), |row| {
                    Ok(DuesTotals {
                        total_dues_paid: row.get(0)?,
                        total_fee_paid: row.get(1)?,
                    })
                })?;
                Ok(Some(totals))
            }
            false => Ok(None),
        }
    }

    pub fn get_periods(&self) -> rusqlite::Result<Vec<String>> {
        let sql = "SELECT DISTINCT period FROM dues
            UNION SELECT period FROM period_summary
            UNION SELECT DISTINCT period FROM rates
            ORDER BY period DESC";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let mut periods: Vec<String> = Vec::new();
        let rows = stmt
            .query_map((), |row| row.get::<_, String>(0))?
            .collect::<Vec<_>>();
        for row in rows {
            periods.push(row?);
        }
        Ok(periods)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::DbConn;
    use crate::types::dues::DuesRecord;
    use shared_lib::{Slot, SlotName};

    fn test_db() -> (tempfile::TempDir, DbConn) {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConn::new(dir.path().join("hoa.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn absent_period_reads_back_as_none() {
        let (_dir, db) = test_db();
        assert!(db.read_period_record("2024").unwrap().is_none());
    }

    #[test]
    fn added_member_gets_all_slots_unpaid() {
        let (_dir, db) = test_db();
        db.add_member_to_period("2024", "Dela Cruz").unwrap();
        let record = db.read_period_record("2024").unwrap().unwrap();
        let row = record.members.get("Dela Cruz").unwrap();
        assert_eq!(row.slots.len(), shared_lib::SLOT_COUNT);
        assert!(row.slots.values().all(|s| !s.paid && s.amount == 0.0));
    }

    #[test]
    fn replace_overwrites_the_whole_period() {
        let (_dir, db) = test_db();
        db.add_member_to_period("2024", "Dela Cruz").unwrap();
        db.add_member_to_period("2024", "Reyes").unwrap();

        let mut record = db.read_period_record("2024").unwrap().unwrap();
        record.members.remove("Reyes");
        record
            .members
            .get_mut("Dela Cruz")
            .unwrap()
            .set_slot(SlotName::Jan, Slot::paid(500.0));
        db.replace_period_record("2024", &record).unwrap();

        let reread = db.read_period_record("2024").unwrap().unwrap();
        assert_eq!(reread, record);
        assert!(!reread.members.contains_key("Reyes"));
    }

    #[test]
    fn member_removal_is_idempotent() {
        let (_dir, db) = test_db();
        db.add_member_to_period("2024", "Dela Cruz").unwrap();
        db.remove_member_from_period("2024", "Dela Cruz").unwrap();
        db.remove_member_from_period("2024", "Dela Cruz").unwrap();
        assert!(db.read_period_record("2024").unwrap().is_none());
        assert_eq!(
            db.read_period_record("2024").unwrap().unwrap_or_default(),
            DuesRecord::default()
        );
    }
}
