use crate::database::DbConn;
use crate::ledger::LedgerError;
use crate::types::admins::AdminIdentity;
use crate::types::dues::{DuesRecord, DuesTotals, RateTable};
use shared_lib::AuditEntry;

/// The persistent ledger document store, one record + rate table per
/// period. Writes are whole-document and last-write-wins; there is no
/// version check, so two administrators committing the same period will
/// silently overwrite each other. That property is inherited, not added.
pub trait LedgerStore {
    fn read_period(&self, period: &str) -> Result<Option<(DuesRecord, RateTable)>, LedgerError>;
    fn write_period(
        &self,
        period: &str,
        record: &DuesRecord,
        rates: &RateTable,
    ) -> Result<(), LedgerError>;
    fn write_period_summary(&self, period: &str, totals: DuesTotals) -> Result<(), LedgerError>;
    fn subscribe(&self, period: &str, on_change: Box<dyn Fn(&str) + Send>);
}

/// Append-only audit sink. `append_batch` writes what it can and reports
/// how many entries landed; a short count is the caller's signal of a
/// partial audit failure.
pub trait AuditStore {
    fn append_batch(&self, entries: &[AuditEntry]) -> Result<usize, LedgerError>;
}

/// Re-authentication collaborator for the commit gate.
pub trait AuthService {
    fn current_admin_identity(&self, uid: u32) -> Result<AdminIdentity, LedgerError>;
    fn reauthenticate(&self, identity: &AdminIdentity, password: &str)
        -> Result<bool, LedgerError>;
}

/// Used only by the external add-member flow, never by the edit session.
pub trait AdminDirectory {
    fn list_eligible_members(&self, period: &str) -> Result<Vec<String>, LedgerError>;
}

impl LedgerStore for DbConn {
    fn read_period(&self, period: &str) -> Result<Option<(DuesRecord, RateTable)>, LedgerError> {
        let record = self.read_period_record(period)?;
        let has_rates = self.has_rate_rows(period)?;
        if record.is_none() && !has_rates {
            return Ok(None);
        }
        let rates = self.read_rate_table(period)?;
        Ok(Some((record.unwrap_or_default(), rates)))
    }

    fn write_period(
        &self,
        period: &str,
        record: &DuesRecord,
        rates: &RateTable,
    ) -> Result<(), LedgerError> {
        self.replace_period_record(period, record)?;
        self.replace_rate_table(period, rates)?;
        self.notify_period_changed(period);
        Ok(())
    }

    fn write_period_summary(&self, period: &str, totals: DuesTotals) -> Result<(), LedgerError> {
        self.write_period_summary_row(period, totals)?;
        Ok(())
    }

    fn subscribe(&self, period: &str, on_change: Box<dyn Fn(&str) + Send>) {
        self.subscribe_to_period(period, on_change);
    }
}

impl AuditStore for DbConn {
    fn append_batch(&self, entries: &[AuditEntry]) -> Result<usize, LedgerError> {
        let mut written = 0;
        for entry in entries {
            match self.append_audit_entry(entry) {
                Ok(_) => written += 1,
                Err(error) => {
                    log::warn!(
                        "audit entry for {}#{} not written: {}",
                        entry.member,
                        entry.slot,
                        error
                    );
                }
            }
        }
        Ok(written)
    }
}

impl AuthService for DbConn {
    fn current_admin_identity(&self, uid: u32) -> Result<AdminIdentity, LedgerError> {
        Ok(self.get_admin_identity(uid)?)
    }

    fn reauthenticate(
        &self,
        identity: &AdminIdentity,
        password: &str,
    ) -> Result<bool, LedgerError> {
        Ok(self.verify_password(identity.id, password)?)
    }
}

impl AdminDirectory for DbConn {
    fn list_eligible_members(&self, period: &str) -> Result<Vec<String>, LedgerError> {
        Ok(self.get_eligible_members(period)?)
    }
}
