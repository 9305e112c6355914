//! Dataset registry identity and reuse

mod test_data_gen;

use provflow_core::hash::hash_table;
use provflow_core::id::DatasetId;
use provflow_core::registry::DatasetRegistry;
use provflow_core::types::{Scalar, Table};
use test_data_gen::{cities, people};

#[test]
fn test_register_is_idempotent_by_content() {
    let mut reg = DatasetRegistry::new();
    let a = reg.register(&people()).unwrap();
    let b = reg.register(&people()).unwrap();
    assert_eq!(a, b);
    assert_eq!(reg.len(), 1);
}

#[test]
fn test_one_changed_cell_changes_the_id() {
    let mut reg = DatasetRegistry::new();
    let a = reg.register(&people()).unwrap();

    let mut changed = people();
    changed.columns[1].values[2] = Scalar::Str("c".into());
    let b = reg.register(&changed).unwrap();

    assert_ne!(a, b);
    assert_eq!(reg.len(), 2);
}

#[test]
fn test_id_is_the_profiler_hash() {
    let mut reg = DatasetRegistry::new();
    let id = reg.register(&cities()).unwrap();
    assert_eq!(id, DatasetId::from(hash_table(&cities())));
}

#[test]
fn test_column_names_are_part_of_identity() {
    let a = Table::from_rows(&["x"], vec![vec![Scalar::I64(1)]]);
    let b = Table::from_rows(&["y"], vec![vec![Scalar::I64(1)]]);
    let mut reg = DatasetRegistry::new();
    assert_ne!(reg.register(&a).unwrap(), reg.register(&b).unwrap());
}

#[test]
fn test_missing_and_nan_cells_are_stable() {
    let t = Table::from_rows(
        &["v"],
        vec![vec![Scalar::Null], vec![Scalar::F64(f64::NAN)]],
    );
    let mut reg = DatasetRegistry::new();
    let a = reg.register(&t).unwrap();
    let b = reg.register(&t.clone()).unwrap();
    assert_eq!(a, b);
    assert_eq!(reg.len(), 1);
}

#[test]
fn test_profile_and_schema_are_kept() {
    let mut reg = DatasetRegistry::new();
    let id = reg.register(&people()).unwrap();
    let profile = reg.profile(&id).unwrap();
    assert_eq!(profile.data["rows"], 3);
    assert_eq!(reg.schema(&id).unwrap().column_names(), vec!["id", "name"]);
}
