use serde::de;
use serde::de::Visitor;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use strum::{Display, EnumIter, EnumString, FromRepr, IntoEnumIterator};

/// Number of payable slots per member per period: 12 months + the HOA
/// membership fee.
pub const SLOT_COUNT: usize = 13;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
    Serialize,
    Deserialize,
)]
pub enum SlotName {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
    Hoa,
}

impl SlotName {
    pub fn is_month(self) -> bool {
        !matches!(self, SlotName::Hoa)
    }

    pub fn months() -> impl Iterator<Item = SlotName> {
        SlotName::iter().filter(|s| s.is_month())
    }
}

impl From<u32> for SlotName {
    fn from(value: u32) -> Self {
        match SlotName::from_repr(value as usize) {
            Some(slot) => slot,
            None => panic!("Invalid numeric value for SlotName!"),
        }
    }
}

/// One payable cell of the dues grid. `amount` only carries meaning while
/// `paid` is set; an unpaid slot is stored as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Slot {
    pub paid: bool,
    pub amount: f32,
}

impl Slot {
    pub fn paid(amount: f32) -> Self {
        Slot { paid: true, amount }
    }

    pub fn unpaid() -> Self {
        Slot {
            paid: false,
            amount: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, FromRepr)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl From<bool> for PaymentStatus {
    fn from(paid: bool) -> Self {
        if paid {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }
}

impl From<u32> for PaymentStatus {
    fn from(value: u32) -> Self {
        match value {
            0 => PaymentStatus::Unpaid,
            1 => PaymentStatus::Paid,
            _ => panic!("Invalid numeric value for PaymentStatus!"),
        }
    }
}

/// One immutable line of the audit trail: a single cell change that was
/// part of a committed change-set.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuditEntry {
    pub admin: String,
    pub member: String,
    pub slot: SlotName,
    #[serde(
        serialize_with = "serialize_payment_status",
        deserialize_with = "deserialize_payment_status"
    )]
    pub status: PaymentStatus,
    pub timestamp: String,
    pub period: String,
}

pub fn serialize_payment_status<S>(status: &PaymentStatus, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(status.to_string().as_str())
}

pub fn deserialize_payment_status<'de, D>(deserializer: D) -> Result<PaymentStatus, D::Error>
where
    D: Deserializer<'de>,
{
    struct PaymentStatusVisitor;

    impl<'de> Visitor<'de> for PaymentStatusVisitor {
        type Value = PaymentStatus;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("either 'Paid' or 'Unpaid'")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match v {
                "Paid" => Ok(PaymentStatus::Paid),
                "Unpaid" => Ok(PaymentStatus::Unpaid),
                _ => Err(de::Error::unknown_variant(v, &["Paid", "Unpaid"])),
            }
        }
    }

    deserializer.deserialize_str(PaymentStatusVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_cover_twelve_months_and_the_fee() {
        assert_eq!(SlotName::iter().count(), SLOT_COUNT);
        assert_eq!(SlotName::months().count(), 12);
        assert!(!SlotName::Hoa.is_month());
    }

    #[test]
    fn slot_name_display_matches_parse() {
        for slot in SlotName::iter() {
            let parsed: SlotName = slot.to_string().parse().unwrap();
            assert_eq!(parsed, slot);
        }
    }

    #[test]
    fn payment_status_follows_paid_flag() {
        assert_eq!(PaymentStatus::from(true), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from(false), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::Paid.to_string(), "Paid");
    }
}
