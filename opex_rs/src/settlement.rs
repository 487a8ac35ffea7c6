use ahash::AHashMap;
use chrono::NaiveDate;

use crate::bar::SettlementRecord;
use crate::error::SettlementError;

#[derive(Clone, Copy, Debug)]
struct SettlementSlot {
    price: f64,
    matches: usize,
}

/// Exact-date settlement lookup.
///
/// Duplicate dates are kept (counted) so that only the expirations which
/// are actually resolved fail, matching a single-match query over the raw
/// series.
#[derive(Clone, Debug, Default)]
pub struct SettlementBook {
    by_date: AHashMap<NaiveDate, SettlementSlot>,
    records: usize,
}

impl SettlementBook {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = SettlementRecord>,
    {
        let mut book = Self::default();
        for record in records {
            book.insert(record);
        }
        book
    }

    pub fn insert(&mut self, record: SettlementRecord) {
        self.records += 1;
        self.by_date
            .entry(record.date)
            .and_modify(|slot| slot.matches += 1)
            .or_insert(SettlementSlot {
                price: record.settle_price,
                matches: 1,
            });
    }

    pub fn resolve(&self, expiration: NaiveDate) -> Result<f64, SettlementError> {
        match self.by_date.get(&expiration) {
            None => Err(SettlementError::NotFound { date: expiration }),
            Some(slot) if slot.matches == 1 => Ok(slot.price),
            Some(slot) => Err(SettlementError::Ambiguous {
                date: expiration,
                matches: slot.matches,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Dates that appear more than once, ascending.
    pub fn duplicate_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .by_date
            .iter()
            .filter(|(_, slot)| slot.matches > 1)
            .map(|(date, _)| *date)
            .collect();
        dates.sort();
        dates
    }
}
