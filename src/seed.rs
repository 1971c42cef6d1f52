//! Sample data generation for trying out dashboards and exports.

use crate::{
    form::{CollectedResponse, FieldKind, FieldValue, FormStructure, SUBMITTED_AT_FIELD},
    store::{DocumentStore, MAX_BATCH_WRITES, StoreError},
};
use fastrand::Rng;
use itertools::Itertools;

/// The number of documents written per batch.
pub(crate) const SEED_BATCH_SIZE: usize = 250;

const _: () = assert!(SEED_BATCH_SIZE <= MAX_BATCH_WRITES);

/// The most options picked for a multiple choice field.
const MAX_PICKS: usize = 2;

/// Generate a random response that fits the given form.
pub(crate) fn generate_entry(structure: &FormStructure, rng: &mut Rng) -> CollectedResponse {
    let mut entry = CollectedResponse::default();
    for field in structure.fields() {
        let value = match &field.kind {
            FieldKind::Text => FieldValue::Text(rng.choice(&field.samples).cloned().unwrap_or_default()),
            FieldKind::SingleChoice { options } => match rng.choice(options) {
                Some(option) => FieldValue::Text(option.value.clone()),
                None => continue,
            },
            FieldKind::MultiChoice { options } => {
                let count = rng.usize(0..=MAX_PICKS).min(options.len());
                let mut indexes: Vec<usize> = (0..options.len()).collect();
                rng.shuffle(&mut indexes);
                let picked = indexes.into_iter().take(count).sorted();
                FieldValue::List(picked.map(|index| options[index].value.clone()).collect())
            }
            FieldKind::Slider { min, max, .. } => FieldValue::Number(rng.i64(*min..=*max)),
        };
        entry.insert(field.name.clone(), value);
    }
    entry.insert(SUBMITTED_AT_FIELD, FieldValue::ServerTimestamp);
    entry
}

/// Insert `count` random responses into a collection, in batches of at most
/// [SEED_BATCH_SIZE] documents. Returns the number of documents inserted.
pub(crate) fn insert_sample_entries(
    store: &dyn DocumentStore,
    collection: &str,
    structure: &FormStructure,
    count: usize,
    rng: &mut Rng,
) -> Result<usize, SeedError> {
    let mut inserted = 0;
    let entries = (0..count).map(|_| generate_entry(structure, rng));
    for (batch, chunk) in entries.chunks(SEED_BATCH_SIZE).into_iter().enumerate() {
        let records: Vec<_> = chunk.collect();
        let ids = store.commit_batch(collection, records).map_err(|source| SeedError { batch, source })?;
        inserted += ids.len();
        tracing::info!(batch, count = ids.len(), "inserted entries");
    }
    tracing::info!(total = inserted, collection, "all entries inserted");
    Ok(inserted)
}

#[derive(thiserror::Error, Debug)]
#[error("inserting batch {batch}: {source}")]
pub struct SeedError {
    batch: usize,
    source: StoreError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentId, MemoryStore};
    use rstest::rstest;
    use std::sync::Mutex;

    /// Records the size of every committed batch.
    #[derive(Default)]
    struct BatchSizes {
        store: MemoryStore,
        sizes: Mutex<Vec<usize>>,
    }

    impl DocumentStore for BatchSizes {
        fn commit_batch(
            &self,
            collection: &str,
            records: Vec<CollectedResponse>,
        ) -> Result<Vec<DocumentId>, StoreError> {
            self.sizes.lock().expect("poisoned").push(records.len());
            self.store.commit_batch(collection, records)
        }
    }

    fn structure() -> FormStructure {
        FormStructure::builtin().expect("invalid builtin survey")
    }

    #[rstest]
    #[case(0, &[])]
    #[case(1, &[1])]
    #[case(250, &[250])]
    #[case(251, &[250, 1])]
    #[case(600, &[250, 250, 100])]
    fn chunked_inserts(#[case] count: usize, #[case] expected: &[usize]) {
        let store = BatchSizes::default();
        let inserted =
            insert_sample_entries(&store, "responses", &structure(), count, &mut Rng::with_seed(5)).expect("seed failed");
        assert_eq!(inserted, count);
        assert_eq!(*store.sizes.lock().expect("poisoned"), expected);
        assert_eq!(store.store.documents("responses").len(), count);
    }

    #[test]
    fn entries_fit_the_form() {
        let structure = structure();
        let mut rng = Rng::with_seed(11);
        for _ in 0..200 {
            let entry = generate_entry(&structure, &mut rng);
            for field in structure.fields() {
                let value = entry.get(&field.name);
                match (&field.kind, value) {
                    (FieldKind::Text, Some(FieldValue::Text(text))) => {
                        assert!(text.is_empty() || field.samples.contains(text));
                    }
                    (FieldKind::SingleChoice { options }, Some(FieldValue::Text(text))) => {
                        assert!(options.iter().any(|option| &option.value == text));
                    }
                    (FieldKind::MultiChoice { options }, Some(FieldValue::List(values))) => {
                        assert!(values.len() <= MAX_PICKS);
                        let positions: Vec<_> = values
                            .iter()
                            .map(|value| options.iter().position(|option| &option.value == value))
                            .collect();
                        assert!(positions.iter().all(Option::is_some));
                        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
                    }
                    (FieldKind::Slider { min, max, .. }, Some(FieldValue::Number(number))) => {
                        assert!((*min..=*max).contains(number));
                    }
                    (kind, value) => panic!("unexpected value {value:?} for {kind:?}"),
                }
            }
            assert_eq!(entry.get(SUBMITTED_AT_FIELD), Some(&FieldValue::ServerTimestamp));
        }
    }

    #[test]
    fn failures_name_the_batch() {
        let store = MemoryStore::default();
        store.fail_with("offline");
        let error = insert_sample_entries(&store, "responses", &structure(), 10, &mut Rng::with_seed(1))
            .expect_err("seed succeeded");
        assert_eq!(error.batch, 0);
    }
}
