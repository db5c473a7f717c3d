//! Insert-or-update persistence of reconciled records.

use crate::{CountryRecord, CountryStore, StoreError, Timestamp};

/// Outcome of [`upsert_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Rows created because no stored name matched.
    pub inserted: usize,
    /// Rows overwritten in place.
    pub updated: usize,
}

impl UpsertSummary {
    /// Total rows written.
    pub const fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Write each record, updating a case-insensitive name match or inserting a
/// new row.
///
/// Records are written in slice order, each stamped with `refreshed_at`.
/// Rows absent from `records` are left untouched. Processing stops at the
/// first store failure; rows written before it stay written.
///
/// # Examples
/// ```
/// use fxatlas_core::{CountryRecord, CountryStore, Timestamp, upsert_records};
///
/// fn load(store: &dyn CountryStore) -> Result<(), fxatlas_core::StoreError> {
///     let summary = upsert_records(store, &[CountryRecord::new("Chad", 1)], Timestamp::now())?;
///     assert_eq!(summary.written(), 1);
///     Ok(())
/// }
/// ```
pub fn upsert_records(
    store: &dyn CountryStore,
    records: &[CountryRecord],
    refreshed_at: Timestamp,
) -> Result<UpsertSummary, StoreError> {
    let mut summary = UpsertSummary::default();
    for record in records {
        if store.find_by_name(&record.name)?.is_some()
            && store.update_by_name(record, refreshed_at)?
        {
            summary.updated += 1;
        } else {
            store.insert(record, refreshed_at)?;
            summary.inserted += 1;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use rstest::{fixture, rstest};

    fn priced(name: &str, gdp: f64) -> CountryRecord {
        let mut record = CountryRecord::new(name, 1_000);
        record.currency_code = Some("XOF".to_owned());
        record.exchange_rate = Some(600.0);
        record.estimated_gdp = Some(gdp);
        record
    }

    #[fixture]
    fn seeded() -> MemoryStore {
        let store = MemoryStore::default();
        store
            .insert(&priced("Benin", 1.0), Timestamp::from_millis(10))
            .expect("seed Benin");
        store
            .insert(&priced("Togo", 2.0), Timestamp::from_millis(10))
            .expect("seed Togo");
        store
    }

    #[rstest]
    fn updates_matches_and_inserts_new_names(seeded: MemoryStore) {
        let now = Timestamp::from_millis(99);
        let records = [priced("BENIN", 3.0), priced("Niger", 4.0)];

        let summary = upsert_records(&seeded, &records, now).expect("upsert succeeds");

        assert_eq!(summary, UpsertSummary { inserted: 1, updated: 1 });
        let benin = seeded
            .find_by_name("benin")
            .expect("lookup")
            .expect("Benin kept");
        assert_eq!(benin.record.name, "Benin");
        assert_eq!(benin.record.estimated_gdp, Some(3.0));
        assert_eq!(benin.last_refreshed_at, now);
        assert_eq!(seeded.count().expect("count"), 3);
    }

    #[rstest]
    fn leaves_unmentioned_rows_alone(seeded: MemoryStore) {
        upsert_records(&seeded, &[priced("Benin", 8.0)], Timestamp::from_millis(50))
            .expect("upsert succeeds");
        let togo = seeded
            .find_by_name("Togo")
            .expect("lookup")
            .expect("Togo kept");
        assert_eq!(togo.record.estimated_gdp, Some(2.0));
        assert_eq!(togo.last_refreshed_at, Timestamp::from_millis(10));
    }

    #[rstest]
    fn stops_at_first_failure_keeping_earlier_writes() {
        let store = MemoryStore::default().with_write_limit(1);
        let records = [priced("Mali", 1.0), priced("Chad", 2.0)];

        let err = upsert_records(&store, &records, Timestamp::from_millis(5))
            .expect_err("second write fails");

        assert!(matches!(err, StoreError::Backend { .. }));
        assert!(store.find_by_name("Mali").expect("lookup").is_some());
        assert!(store.find_by_name("Chad").expect("lookup").is_none());
    }

    #[rstest]
    fn empty_batch_writes_nothing(seeded: MemoryStore) {
        let summary =
            upsert_records(&seeded, &[], Timestamp::from_millis(1)).expect("upsert succeeds");
        assert_eq!(summary.written(), 0);
        assert_eq!(seeded.count().expect("count"), 2);
    }
}
