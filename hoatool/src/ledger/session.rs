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
use std::collections::BTreeSet;

use chrono::Local;
use shared_lib::{AuditEntry, PaymentStatus, Slot, SlotName};

use crate::ledger::gate::CommitGate;
use crate::ledger::store::{AuditStore, AuthService, LedgerStore};
use crate::ledger::view::LedgerViewModel;
use crate::ledger::{CellId, LedgerError};
use crate::types::admins::AdminIdentity;
use crate::types::dues::{DuesRecord, RateTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Viewing,
    Editing,
    PendingCommit,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Viewing => "Viewing",
            SessionState::Editing => "Editing",
            SessionState::PendingCommit => "PendingCommit",
        }
    }
}

/// Deep copy of the projection taken at `enter_edit`, restored verbatim
/// on cancel.
#[derive(Clone, Debug)]
struct Snapshot {
    record: DuesRecord,
    rates: RateTable,
}

/// The frozen local projection + selected cells captured at
/// `request_commit`. Immutable until committed or discarded.
#[derive(Clone, Debug)]
pub struct ChangeSet {
    pub record: DuesRecord,
    pub rates: RateTable,
    pub selected: BTreeSet<CellId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub cells: usize,
    pub audit_written: usize,
}

/// The state machine guarding every mutation of the dues ledger:
/// `Viewing -> Editing -> PendingCommit -> Viewing`. Toggles and rate
/// changes only ever touch the local projection; nothing reaches the
/// store until a change-set passes the commit gate.
pub struct EditSession {
    state: SessionState,
    snapshot: Option<Snapshot>,
    selected: BTreeSet<CellId>,
    pending: Option<ChangeSet>,
}

impl EditSession {
    pub fn new() -> Self {
        EditSession {
            state: SessionState::Viewing,
            snapshot: None,
            selected: BTreeSet::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selected_cells(&self) -> &BTreeSet<CellId> {
        &self.selected
    }

    fn expect_state(&self, want: SessionState, op: &'static str) -> Result<(), LedgerError> {
        if self.state != want {
            return Err(LedgerError::InvalidTransition {
                op,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    /// Snapshots the current projection and opens the session for
    /// editing. No external effect.
    pub fn enter_edit(&mut self, view: &LedgerViewModel) -> Result<(), LedgerError> {
        self.expect_state(SessionState::Viewing, "enter_edit")?;
        self.snapshot = Some(Snapshot {
            record: view.record.clone(),
            rates: view.rates.clone(),
        });
        self.selected.clear();
        self.pending = None;
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Flips `paid` for one cell of the local projection. Becoming paid
    /// assigns the amount from the current rate table; becoming unpaid
    /// zeroes it. The cell also enters or leaves the selection set, which
    /// feeds the audit trail at commit time.
    pub fn toggle_cell(
        &mut self,
        view: &mut LedgerViewModel,
        member: &str,
        slot: SlotName,
    ) -> Result<(), LedgerError> {
        self.expect_state(SessionState::Editing, "toggle_cell")?;
        let rate = view.rates.rate(slot);
        let row = view
            .record
            .members
            .get_mut(member)
            .ok_or_else(|| LedgerError::UnknownMember(member.to_string()))?;
        let current = row.slot(slot);
        if current.paid {
            row.set_slot(slot, Slot::unpaid());
        } else {
            row.set_slot(slot, Slot::paid(rate));
        }
        let cell = CellId::new(member, slot);
        if !self.selected.remove(&cell) {
            self.selected.insert(cell);
        }
        view.recompute_local_totals();
        Ok(())
    }

    /// Forces every selected cell to paid at the current rate. Cells that
    /// are already paid are left untouched, so re-invoking is a no-op.
    pub fn bulk_mark_selected_paid(
        &mut self,
        view: &mut LedgerViewModel,
    ) -> Result<usize, LedgerError> {
        self.expect_state(SessionState::Editing, "bulk_mark_selected_paid")?;
        if self.selected.is_empty() {
            return Err(LedgerError::EmptySelection);
        }
        let mut marked = 0;
        for cell in self.selected.iter() {
            let rate = view.rates.rate(cell.slot);
            let row = match view.record.members.get_mut(cell.member.as_str()) {
                Some(row) => row,
                None => continue,
            };
            if !row.slot(cell.slot).paid {
                row.set_slot(cell.slot, Slot::paid(rate));
                marked += 1;
            }
        }
        view.recompute_local_totals();
        Ok(marked)
    }

    /// Updates one slot's standard rate in the local rate table. Amounts
    /// already assigned to paid cells are not touched.
    pub fn adjust_rate(
        &mut self,
        view: &mut LedgerViewModel,
        slot: SlotName,
        amount: f32,
    ) -> Result<(), LedgerError> {
        self.expect_state(SessionState::Editing, "adjust_rate")?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        view.rates.set_rate(slot, amount);
        Ok(())
    }

    pub fn adjust_hoa_rate(
        &mut self,
        view: &mut LedgerViewModel,
        amount: f32,
    ) -> Result<(), LedgerError> {
        self.expect_state(SessionState::Editing, "adjust_hoa_rate")?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        view.rates.set_rate(SlotName::Hoa, amount);
        Ok(())
    }

    /// Freezes the local projection and the selection into a pending
    /// change-set. No external effect yet; the store is only touched by
    /// `verify_and_commit`.
    pub fn request_commit(&mut self, view: &LedgerViewModel) -> Result<(), LedgerError> {
        self.expect_state(SessionState::Editing, "request_commit")?;
        self.pending = Some(ChangeSet {
            record: view.record.clone(),
            rates: view.rates.clone(),
            selected: self.selected.clone(),
        });
        self.state = SessionState::PendingCommit;
        Ok(())
    }

    /// Backs out of the password prompt and returns to editing. The
    /// frozen change-set is dropped but every local edit stays in place.
    pub fn abort_commit(&mut self) -> Result<(), LedgerError> {
        self.expect_state(SessionState::PendingCommit, "abort_commit")?;
        self.pending = None;
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Runs the commit gate, then writes the pending change-set and its
    /// audit batch. A failed gate or a failed ledger write leaves the
    /// session in `PendingCommit` with the change-set intact so the
    /// administrator can retry without losing edits. A short audit batch
    /// after a successful ledger write is logged and accepted; the ledger
    /// remains the system of record.
    pub fn verify_and_commit<S>(
        &mut self,
        view: &mut LedgerViewModel,
        store: &S,
        identity: &AdminIdentity,
        password: &str,
    ) -> Result<CommitReceipt, LedgerError>
    where
        S: LedgerStore + AuditStore + AuthService,
    {
        self.expect_state(SessionState::PendingCommit, "verify_and_commit")?;
        CommitGate::verify(store, identity, password)?;

        let (record, rates, selected) = match self.pending.as_ref() {
            Some(pending) => (
                pending.record.clone(),
                pending.rates.clone(),
                pending.selected.clone(),
            ),
            None => {
                return Err(LedgerError::InvalidTransition {
                    op: "verify_and_commit",
                    state: self.state.name(),
                })
            }
        };

        let period = view.period.clone();
        store.write_period(period.as_str(), &record, &rates)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let entries: Vec<AuditEntry> = selected
            .iter()
            .map(|cell| {
                let paid = record
                    .members
                    .get(cell.member.as_str())
                    .map(|row| row.slot(cell.slot).paid)
                    .unwrap_or(false);
                AuditEntry {
                    admin: identity.name.clone(),
                    member: cell.member.clone(),
                    slot: cell.slot,
                    status: PaymentStatus::from(paid),
                    timestamp: timestamp.clone(),
                    period: period.clone(),
                }
            })
            .collect();

        let expected = entries.len();
        let written = match store.append_batch(&entries) {
            Ok(written) => written,
            Err(error) => {
                log::warn!("audit batch failed after ledger write: {}", error);
                0
            }
        };
        if written < expected {
            log::warn!(
                "{}",
                LedgerError::PartialAuditFailure { written, expected }
            );
        }

        self.selected.clear();
        self.pending = None;
        self.snapshot = None;
        self.state = SessionState::Viewing;

        if let Err(error) = view.load_period(store, period.as_str()) {
            log::warn!("view re-sync after commit failed: {}", error);
        }

        Ok(CommitReceipt {
            cells: expected,
            audit_written: written,
        })
    }

    /// Discards every local mutation and the pending change-set, restores
    /// the snapshot into the view, and rewrites the store with the
    /// snapshot so store and view cannot diverge after an earlier partial
    /// write. The store-side write is best-effort.
    pub fn cancel<S>(&mut self, view: &mut LedgerViewModel, store: &S) -> Result<(), LedgerError>
    where
        S: LedgerStore,
    {
        if self.state != SessionState::Editing && self.state != SessionState::PendingCommit {
            return Err(LedgerError::InvalidTransition {
                op: "cancel",
                state: self.state.name(),
            });
        }
        let snapshot = match self.snapshot.take() {
            Some(snapshot) => snapshot,
            None => {
                return Err(LedgerError::InvalidTransition {
                    op: "cancel",
                    state: self.state.name(),
                })
            }
        };
        view.record = snapshot.record;
        view.rates = snapshot.rates;
        if let Err(error) = store.write_period(view.period.as_str(), &view.record, &view.rates) {
            log::warn!("rollback write after cancel failed: {}", error);
        }
        view.refresh_totals(store);
        self.selected.clear();
        self.pending = None;
        self.state = SessionState::Viewing;
        Ok(())
    }
}

impl Default for EditSession {
    fn default() -> Self {
        EditSession::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DbConn;
    use crate::types::dues::DuesTotals;

    /// One period "2024" with member "Dela Cruz" (all unpaid), Jan rate
    /// 500, HOA fee 1200, and admin Santos with a known password.
    fn seeded() -> (tempfile::TempDir, DbConn, AdminIdentity, LedgerViewModel) {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConn::new(dir.path().join("hoa.db")).unwrap();
        let uid = db
            .add_user(
                "Santos".to_string(),
                "santos@example.com".to_string(),
                "s3cret",
                true,
            )
            .unwrap();
        let identity = db.current_admin_identity(uid).unwrap();

        db.add_member_to_period("2024", "Dela Cruz").unwrap();
        let mut rates = RateTable::zeroed();
        rates.set_rate(SlotName::Jan, 500.0);
        rates.set_rate(SlotName::Feb, 500.0);
        rates.set_rate(SlotName::Hoa, 1200.0);
        db.replace_rate_table("2024", &rates).unwrap();

        let mut view = LedgerViewModel::new("2024");
        view.load_period(&db, "2024").unwrap();
        (dir, db, identity, view)
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let (_dir, _db, _identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();

        let before = view.record.clone();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        assert_eq!(
            view.record.members["Dela Cruz"].slot(SlotName::Jan),
            Slot::paid(500.0)
        );
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        assert_eq!(view.record, before);
        // the selection set also returned to empty
        assert!(session.selected_cells().is_empty());
    }

    #[test]
    fn cancel_restores_the_pre_edit_snapshot() {
        let (_dir, db, _identity, mut view) = seeded();
        let before_record = view.record.clone();
        let before_rates = view.rates.clone();
        let before_totals = view.totals;

        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Hoa)
            .unwrap();
        session.adjust_rate(&mut view, SlotName::Mar, 750.0).unwrap();
        session.adjust_hoa_rate(&mut view, 1500.0).unwrap();

        session.cancel(&mut view, &db).unwrap();
        assert_eq!(session.state(), SessionState::Viewing);
        assert_eq!(view.record, before_record);
        assert_eq!(view.rates, before_rates);
        assert_eq!(view.totals, before_totals);

        // the store matches the restored projection as well
        let (stored_record, stored_rates) =
            crate::ledger::store::LedgerStore::read_period(&db, "2024")
                .unwrap()
                .unwrap();
        assert_eq!(stored_record, before_record);
        assert_eq!(stored_rates, before_rates);
        assert_eq!(db.count_audit_entries("2024").unwrap(), 0);
    }

    #[test]
    fn bulk_mark_selected_paid_is_idempotent() {
        let (_dir, db, _identity, mut view) = seeded();

        // pre-seed Feb paid so one toggle leaves a selected, unpaid cell
        let mut record = db.read_period_record("2024").unwrap().unwrap();
        record
            .members
            .get_mut("Dela Cruz")
            .unwrap()
            .set_slot(SlotName::Feb, Slot::paid(500.0));
        db.replace_period_record("2024", &record).unwrap();
        view.load_period(&db, "2024").unwrap();

        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Feb)
            .unwrap();
        // selection: Jan (paid), Feb (unpaid)

        let marked = session.bulk_mark_selected_paid(&mut view).unwrap();
        assert_eq!(marked, 1);
        let once = view.record.clone();
        let marked_again = session.bulk_mark_selected_paid(&mut view).unwrap();
        assert_eq!(marked_again, 0);
        assert_eq!(view.record, once);
        assert_eq!(
            view.record.members["Dela Cruz"].slot(SlotName::Jan),
            Slot::paid(500.0)
        );
        assert_eq!(
            view.record.members["Dela Cruz"].slot(SlotName::Feb),
            Slot::paid(500.0)
        );
    }

    #[test]
    fn commit_writes_ledger_audit_and_totals() {
        let (_dir, db, identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session.request_commit(&view).unwrap();
        assert_eq!(session.state(), SessionState::PendingCommit);

        let receipt = session
            .verify_and_commit(&mut view, &db, &identity, "s3cret")
            .unwrap();
        assert_eq!(
            receipt,
            CommitReceipt {
                cells: 1,
                audit_written: 1
            }
        );
        assert_eq!(session.state(), SessionState::Viewing);

        let record = db.read_period_record("2024").unwrap().unwrap();
        assert_eq!(
            record.members["Dela Cruz"].slot(SlotName::Jan),
            Slot::paid(500.0)
        );

        let trail = db.get_audit_trail("2024").unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].admin, "Santos");
        assert_eq!(trail[0].member, "Dela Cruz");
        assert_eq!(trail[0].slot, SlotName::Jan);
        assert_eq!(trail[0].status, PaymentStatus::Paid);
        assert_eq!(trail[0].period, "2024");

        assert_eq!(
            view.totals,
            DuesTotals {
                total_dues_paid: 500.0,
                total_fee_paid: 0.0
            }
        );
        let summary = db.read_period_summary_row("2024").unwrap().unwrap();
        assert_eq!(summary.total_dues_paid, 500.0);
    }

    #[test]
    fn audit_entries_match_the_selection_and_final_status() {
        let (_dir, db, identity, mut view) = seeded();

        // pre-seed Feb as paid so a toggle can leave a selected cell unpaid
        let mut record = db.read_period_record("2024").unwrap().unwrap();
        record
            .members
            .get_mut("Dela Cruz")
            .unwrap()
            .set_slot(SlotName::Feb, Slot::paid(500.0));
        db.replace_period_record("2024", &record).unwrap();
        view.load_period(&db, "2024").unwrap();

        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Feb)
            .unwrap();
        // selection holds Jan (ends paid) and Feb (ends unpaid)
        session.request_commit(&view).unwrap();
        let receipt = session
            .verify_and_commit(&mut view, &db, &identity, "s3cret")
            .unwrap();
        assert_eq!(receipt.cells, 2);
        assert_eq!(receipt.audit_written, 2);

        let trail = db.get_audit_trail("2024").unwrap();
        assert_eq!(trail.len(), 2);
        let jan = trail.iter().find(|e| e.slot == SlotName::Jan).unwrap();
        let feb = trail.iter().find(|e| e.slot == SlotName::Feb).unwrap();
        assert_eq!(jan.status, PaymentStatus::Paid);
        assert_eq!(feb.status, PaymentStatus::Unpaid);
    }

    #[test]
    fn wrong_password_retains_the_pending_change_set() {
        let (_dir, db, identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session.request_commit(&view).unwrap();

        let err = session
            .verify_and_commit(&mut view, &db, &identity, "wrong")
            .unwrap_err();
        assert!(matches!(err, LedgerError::IncorrectPassword));
        assert_eq!(session.state(), SessionState::PendingCommit);

        // nothing reached the store
        let record = db.read_period_record("2024").unwrap().unwrap();
        assert!(!record.members["Dela Cruz"].slot(SlotName::Jan).paid);
        assert_eq!(db.count_audit_entries("2024").unwrap(), 0);

        // the local toggle is still visible and the commit is retryable
        assert!(view.record.members["Dela Cruz"].slot(SlotName::Jan).paid);
        let receipt = session
            .verify_and_commit(&mut view, &db, &identity, "s3cret")
            .unwrap();
        assert_eq!(receipt.cells, 1);
    }

    #[test]
    fn cancel_after_toggle_writes_nothing() {
        let (_dir, db, _identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session.cancel(&mut view, &db).unwrap();

        let record = db.read_period_record("2024").unwrap().unwrap();
        assert_eq!(
            record.members["Dela Cruz"].slot(SlotName::Jan),
            Slot::unpaid()
        );
        assert!(!view.record.members["Dela Cruz"].slot(SlotName::Jan).paid);
        assert_eq!(db.count_audit_entries("2024").unwrap(), 0);
    }

    #[test]
    fn mutations_are_rejected_outside_editing() {
        let (_dir, db, _identity, mut view) = seeded();
        let mut session = EditSession::new();

        assert!(matches!(
            session.toggle_cell(&mut view, "Dela Cruz", SlotName::Jan),
            Err(LedgerError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.request_commit(&view),
            Err(LedgerError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.cancel(&mut view, &db),
            Err(LedgerError::InvalidTransition { .. })
        ));

        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session.request_commit(&view).unwrap();

        // a change-set already being written must not be mutated
        assert!(matches!(
            session.toggle_cell(&mut view, "Dela Cruz", SlotName::Feb),
            Err(LedgerError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.adjust_rate(&mut view, SlotName::Feb, 750.0),
            Err(LedgerError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn invalid_rate_amounts_are_rejected_locally() {
        let (_dir, _db, _identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();

        assert!(matches!(
            session.adjust_rate(&mut view, SlotName::Jan, -5.0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            session.adjust_rate(&mut view, SlotName::Jan, f32::NAN),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            session.adjust_hoa_rate(&mut view, f32::INFINITY),
            Err(LedgerError::InvalidAmount(_))
        ));
        // the rate is untouched after every rejection
        assert_eq!(view.rates.rate(SlotName::Jan), 500.0);
    }

    #[test]
    fn bulk_requires_a_selection() {
        let (_dir, _db, _identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        assert!(matches!(
            session.bulk_mark_selected_paid(&mut view),
            Err(LedgerError::EmptySelection)
        ));
    }

    #[test]
    fn rate_changes_are_not_retroactive() {
        let (_dir, _db, _identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();

        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session.adjust_rate(&mut view, SlotName::Jan, 600.0).unwrap();
        session.adjust_rate(&mut view, SlotName::Feb, 600.0).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Feb)
            .unwrap();

        // Jan keeps the amount assigned when it was marked paid
        assert_eq!(
            view.record.members["Dela Cruz"].slot(SlotName::Jan),
            Slot::paid(500.0)
        );
        // Feb picks up the adjusted rate
        assert_eq!(
            view.record.members["Dela Cruz"].slot(SlotName::Feb),
            Slot::paid(600.0)
        );
    }

    #[test]
    fn abort_commit_returns_to_editing_with_edits_intact() {
        let (_dir, db, identity, mut view) = seeded();
        let mut session = EditSession::new();
        session.enter_edit(&view).unwrap();
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Jan)
            .unwrap();
        session.request_commit(&view).unwrap();

        session.abort_commit().unwrap();
        assert_eq!(session.state(), SessionState::Editing);
        assert!(view.record.members["Dela Cruz"].slot(SlotName::Jan).paid);

        // editing continues and a fresh commit still goes through
        session
            .toggle_cell(&mut view, "Dela Cruz", SlotName::Hoa)
            .unwrap();
        session.request_commit(&view).unwrap();
        let receipt = session
            .verify_and_commit(&mut view, &db, &identity, "s3cret")
            .unwrap();
        assert_eq!(receipt.cells, 2);
        let record = db.read_period_record("2024").unwrap().unwrap();
        assert_eq!(
            record.members["Dela Cruz"].slot(SlotName::Hoa),
            Slot::paid(1200.0)
        );
    }
}
