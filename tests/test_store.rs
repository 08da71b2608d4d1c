//! Medicine store on disk: seeding, restarts and lookups.

use std::fs;

use tempfile::TempDir;

use bolota::subsystems::store::seed::{SeedOutcome, seed_from_csv};
use bolota::subsystems::store::{DrugLookup, MedicineStore};

const CSV: &str = "\
descricao,preco,estoque
SIMPARIC 10 A 20KG 3 COMPRIMIDOS,89.90,12
APOQUEL 16MG 20 COMPRIMIDOS,289.00,5
";

#[test]
fn seeding_survives_restart_without_duplicates() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("medication.db");
    let csv = dir.path().join("dados_produtos.csv");
    fs::write(&csv, CSV).unwrap();

    {
        let store = MedicineStore::open(&db).unwrap();
        let outcome = seed_from_csv(&store, &csv, b',').unwrap();
        assert_eq!(outcome, SeedOutcome::Seeded { inserted: 2, skipped: 0 });
    }

    let store = MedicineStore::open(&db).unwrap();
    let outcome = seed_from_csv(&store, &csv, b',').unwrap();
    assert_eq!(outcome, SeedOutcome::AlreadyPopulated(2));
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn lookup_after_seed() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("dados_produtos.csv");
    fs::write(&csv, CSV).unwrap();

    let store = MedicineStore::open(&dir.path().join("medication.db")).unwrap();
    seed_from_csv(&store, &csv, b',').unwrap();

    let rec = store.find_drug("Simparic").unwrap().unwrap();
    assert_eq!(rec.description, "SIMPARIC 10 A 20KG 3 COMPRIMIDOS");
    assert_eq!(rec.price, 89.9);
    assert_eq!(rec.stock, 12);

    assert_eq!(store.find_drug("apoquel 16").unwrap().unwrap().stock, 5);
    assert!(store.find_drug("Bravecto").unwrap().is_none());
}

#[test]
fn bundled_seed_file_loads() {
    let csv = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/dados_produtos.csv");
    let store = MedicineStore::open_in_memory().unwrap();

    let SeedOutcome::Seeded { inserted, skipped } = seed_from_csv(&store, &csv, b',').unwrap() else {
        panic!("fresh store should be seeded");
    };
    assert!(inserted > 0);
    assert_eq!(skipped, 0);
    assert!(store.find_drug("simparic").unwrap().is_some());
    assert!(store.find_drug("apoquel").unwrap().is_some());
}

#[test]
fn empty_table_without_seed_file_fails() {
    let dir = TempDir::new().unwrap();
    let store = MedicineStore::open(&dir.path().join("medication.db")).unwrap();
    assert!(seed_from_csv(&store, &dir.path().join("missing.csv"), b',').is_err());
}
