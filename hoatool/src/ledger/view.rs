use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ledger::store::LedgerStore;
use crate::ledger::LedgerError;
use crate::types::dues::{DuesRecord, DuesTotals, RateTable};
use shared_lib::SlotName;

/// Read-mostly projection of one period's ledger, rate table and derived
/// totals, kept current from the store by a one-way subscription.
pub struct LedgerViewModel {
    pub period: String,
    pub record: DuesRecord,
    pub rates: RateTable,
    pub totals: DuesTotals,
    /// Last totals successfully pushed to the period summary; None until
    /// the first push.
    persisted_totals: Option<DuesTotals>,
    stale: Arc<AtomicBool>,
}

impl LedgerViewModel {
    pub fn new(period: &str) -> Self {
        LedgerViewModel {
            period: period.to_string(),
            record: DuesRecord::default(),
            rates: RateTable::zeroed(),
            totals: DuesTotals::default(),
            persisted_totals: None,
            stale: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers this view with the store so writes to the current period
    /// flag it stale. Call once per view.
    pub fn attach(&self, store: &impl LedgerStore) {
        let flag = Arc::clone(&self.stale);
        store.subscribe(
            self.period.as_str(),
            Box::new(move |_period| {
                flag.store(true, Ordering::SeqCst);
            }),
        );
    }

    /// Replaces the projection with the store's record for `period`. An
    /// absent period yields an empty record and all-zero rates. On store
    /// failure the previous projection is retained and the condition is
    /// surfaced to the caller.
    pub fn load_period(
        &mut self,
        store: &impl LedgerStore,
        period: &str,
    ) -> Result<(), LedgerError> {
        let loaded = store.read_period(period)?;
        let (record, rates) = loaded.unwrap_or_else(|| (DuesRecord::default(), RateTable::zeroed()));
        if self.period != period {
            self.persisted_totals = None;
        }
        self.period = period.to_string();
        self.record = record;
        self.rates = rates;
        self.refresh_totals(store);
        Ok(())
    }

    /// Re-loads from the store if a subscription callback flagged this
    /// view stale since the last look. Returns whether a reload happened.
    pub fn sync_if_stale(&mut self, store: &impl LedgerStore) -> Result<bool, LedgerError> {
        if self.stale.swap(false, Ordering::SeqCst) {
            let period = self.period.clone();
            self.load_period(store, period.as_str())?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Pure fold over members x 13 slots; cheap at the few-hundred-member
    /// scale this tool targets.
    pub fn compute_totals(&self) -> DuesTotals {
        let mut totals = DuesTotals::default();
        for row in self.record.members.values() {
            for month in SlotName::months() {
                let slot = row.slot(month);
                if slot.paid {
                    totals.total_dues_paid += slot.amount;
                }
            }
            let fee = row.slot(SlotName::Hoa);
            if fee.paid {
                totals.total_fee_paid += fee.amount;
            }
        }
        totals
    }

    /// Recomputes totals and pushes changed totals to the period summary,
    /// fire-and-forget: a failed summary write is logged and the
    /// projection stays authoritative. A period that has never had
    /// anything to report does not get an empty summary row.
    pub fn refresh_totals(&mut self, store: &impl LedgerStore) {
        let next = self.compute_totals();
        self.totals = next;
        if self.persisted_totals.is_none() && next == DuesTotals::default() {
            return;
        }
        if self.persisted_totals != Some(next) {
            match store.write_period_summary(self.period.as_str(), next) {
                Ok(()) => {
                    self.persisted_totals = Some(next);
                }
                Err(error) => {
                    log::warn!(
                        "unable to persist summary for period {}: {}",
                        self.period,
                        error
                    );
                }
            }
        }
    }

    /// Totals refresh for in-session local mutation: the summary is not
    /// persisted until the change-set is committed back to the store.
    pub fn recompute_local_totals(&mut self) {
        self.totals = self.compute_totals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DbConn;
    use shared_lib::Slot;

    fn test_db() -> (tempfile::TempDir, DbConn) {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConn::new(dir.path().join("hoa.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn empty_period_totals_are_zero() {
        let (_dir, db) = test_db();
        let mut view = LedgerViewModel::new("2024");
        view.load_period(&db, "2024").unwrap();
        assert_eq!(
            view.totals,
            DuesTotals {
                total_dues_paid: 0.0,
                total_fee_paid: 0.0
            }
        );
        assert!(view.record.is_empty());
    }

    #[test]
    fn totals_split_monthly_dues_from_the_fee() {
        let (_dir, db) = test_db();
        db.add_member_to_period("2024", "Dela Cruz").unwrap();
        let mut record = db.read_period_record("2024").unwrap().unwrap();
        {
            let row = record.members.get_mut("Dela Cruz").unwrap();
            row.set_slot(SlotName::Jan, Slot::paid(500.0));
            row.set_slot(SlotName::Feb, Slot::paid(500.0));
            row.set_slot(SlotName::Hoa, Slot::paid(1200.0));
        }
        db.replace_period_record("2024", &record).unwrap();

        let mut view = LedgerViewModel::new("2024");
        view.load_period(&db, "2024").unwrap();
        assert_eq!(view.totals.total_dues_paid, 1000.0);
        assert_eq!(view.totals.total_fee_paid, 1200.0);

        // summary side effect landed in the store
        let summary = db.read_period_summary_row("2024").unwrap().unwrap();
        assert_eq!(summary.total_dues_paid, 1000.0);
        assert_eq!(summary.total_fee_paid, 1200.0);
    }

    #[test]
    fn subscription_flags_the_view_stale_after_a_write() {
        let (_dir, db) = test_db();
        db.add_member_to_period("2024", "Dela Cruz").unwrap();

        let mut view = LedgerViewModel::new("2024");
        view.attach(&db);
        view.load_period(&db, "2024").unwrap();
        assert!(!view.sync_if_stale(&db).unwrap());

        let mut record = db.read_period_record("2024").unwrap().unwrap();
        record
            .members
            .get_mut("Dela Cruz")
            .unwrap()
            .set_slot(SlotName::Mar, Slot::paid(500.0));
        let rates = db.read_rate_table("2024").unwrap();
        LedgerStore::write_period(&db, "2024", &record, &rates).unwrap();

        assert!(view.sync_if_stale(&db).unwrap());
        assert_eq!(view.totals.total_dues_paid, 500.0);
    }
}
