use std::collections::BTreeMap;

use shared_lib::{Slot, SlotName};
use strum::IntoEnumIterator;

/// One member's line of the dues grid: always exactly the 13 recognized
/// slots. Rows read back from storage are normalized through
/// [`MemberRow::normalized`] so a missing slot never reaches the view.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberRow {
    pub slots: BTreeMap<SlotName, Slot>,
}

impl MemberRow {
    pub fn empty() -> Self {
        let mut slots = BTreeMap::new();
        for slot in SlotName::iter() {
            slots.insert(slot, Slot::unpaid());
        }
        MemberRow { slots }
    }

    /// Fills any slot the stored row was missing with the unpaid default.
    pub fn normalized(raw: BTreeMap<SlotName, Slot>) -> Self {
        let mut row = MemberRow::empty();
        for (name, slot) in raw {
            row.slots.insert(name, slot);
        }
        row
    }

    pub fn slot(&self, name: SlotName) -> Slot {
        self.slots.get(&name).copied().unwrap_or_default()
    }

    pub fn set_slot(&mut self, name: SlotName, value: Slot) {
        self.slots.insert(name, value);
    }
}

impl Default for MemberRow {
    fn default() -> Self {
        MemberRow::empty()
    }
}

/// The full ledger record of one period: member name -> member row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DuesRecord {
    pub members: BTreeMap<String, MemberRow>,
}

impl DuesRecord {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }
}

/// Per-period standard amounts for each of the 13 slots. The `Hoa` entry
/// is the membership-fee rate.
#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    pub rates: BTreeMap<SlotName, f32>,
}

impl RateTable {
    pub fn zeroed() -> Self {
        let mut rates = BTreeMap::new();
        for slot in SlotName::iter() {
            rates.insert(slot, 0.0);
        }
        RateTable { rates }
    }

    pub fn normalized(raw: BTreeMap<SlotName, f32>) -> Self {
        let mut table = RateTable::zeroed();
        for (name, amount) in raw {
            table.rates.insert(name, amount);
        }
        table
    }

    pub fn rate(&self, slot: SlotName) -> f32 {
        *self.rates.get(&slot).unwrap_or(&0.0)
    }

    pub fn set_rate(&mut self, slot: SlotName, amount: f32) {
        self.rates.insert(slot, amount);
    }

    pub fn hoa_fee(&self) -> f32 {
        self.rate(SlotName::Hoa)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable::zeroed()
    }
}

/// Derived running totals of one period's projection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DuesTotals {
    pub total_dues_paid: f32,
    pub total_fee_paid: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_fills_missing_slots() {
        let mut raw = BTreeMap::new();
        raw.insert(SlotName::Mar, Slot::paid(250.0));
        let row = MemberRow::normalized(raw);
        assert_eq!(row.slots.len(), shared_lib::SLOT_COUNT);
        assert_eq!(row.slot(SlotName::Mar), Slot::paid(250.0));
        assert_eq!(row.slot(SlotName::Jan), Slot::unpaid());
        assert_eq!(row.slot(SlotName::Hoa), Slot::unpaid());
    }

    #[test]
    fn rate_table_defaults_to_zero_rates() {
        let table = RateTable::zeroed();
        assert_eq!(table.rates.len(), shared_lib::SLOT_COUNT);
        assert_eq!(table.rate(SlotName::Jul), 0.0);
        assert_eq!(table.hoa_fee(), 0.0);
    }
}
