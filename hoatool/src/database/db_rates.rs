use std::collections::BTreeMap;

use super::DbConn;
use crate::types::dues::RateTable;
use shared_lib::SlotName;
use strum::IntoEnumIterator;

impl DbConn {
    pub fn create_rates_table(&self) -> rusqlite::Result<()> {
        let sql: &str = "CREATE TABLE IF NOT EXISTS rates (
                period      TEXT NOT NULL,
                slot        INTEGER NOT NULL,
                amount      REAL NOT NULL,
                PRIMARY KEY(period, slot)
            )";
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute(sql, ())?;
        Ok(())
    }

    /// Reads the period's rate table, zero-filled for any slot without a
    /// stored rate. A period with no rate rows yields the all-zero table.
    pub fn read_rate_table(&self, period: &str) -> rusqlite::Result<RateTable> {
        let sql = "SELECT slot, amount FROM rates WHERE period = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        let rows = stmt
            .query_map((&period,), |row| {
                Ok((
                    SlotName::from(row.get::<_, u32>(0)?),
                    row.get::<_, f32>(1)?,
                ))
            })?
            .collect::<Vec<_>>();

        let mut raw: BTreeMap<SlotName, f32> = BTreeMap::new();
        for row in rows {
            let (slot, amount) = row?;
            raw.insert(slot, amount);
        }
        Ok(RateTable::normalized(raw))
    }

    pub fn has_rate_rows(&self, period: &str) -> rusqlite::Result<bool> {
        let sql = "SELECT 1 FROM rates WHERE period = (?1)";
        let conn_lock = self.conn.lock().unwrap();
        let mut stmt = conn_lock.prepare(sql)?;
        stmt.exists((&period,))
    }

    /// Replaces all 13 rate rows of the period with the supplied table.
    pub fn replace_rate_table(&self, period: &str, rates: &RateTable) -> rusqlite::Result<()> {
        let conn_lock = self.conn.lock().unwrap();
        conn_lock.execute("DELETE FROM rates WHERE period = (?1)", (&period,))?;
        let sql = "INSERT INTO rates (period, slot, amount) VALUES (?1, ?2, ?3)";
        for slot in SlotName::iter() {
            let p = rusqlite::params![period, slot as u32, rates.rate(slot)];
            conn_lock.execute(sql, p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::database::DbConn;
    use crate::types::dues::RateTable;
    use shared_lib::SlotName;

    #[test]
    fn rate_table_round_trips_and_zero_fills() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConn::new(dir.path().join("hoa.db")).unwrap();

        assert_eq!(db.read_rate_table("2024").unwrap(), RateTable::zeroed());

        let mut rates = RateTable::zeroed();
        rates.set_rate(SlotName::Jan, 500.0);
        rates.set_rate(SlotName::Hoa, 1200.0);
        db.replace_rate_table("2024", &rates).unwrap();

        let reread = db.read_rate_table("2024").unwrap();
        assert_eq!(reread.rate(SlotName::Jan), 500.0);
        assert_eq!(reread.hoa_fee(), 1200.0);
        assert_eq!(reread.rate(SlotName::Feb), 0.0);
    }
}
