use bonlib::{
    error::BonError,
    model::{NewReceipt, OrderMode},
    service::LedgerService,
    store::json_file::JsonFileStore,
    traits::{CompanyRegistry, EntryStore, HistoryLog},
};
use rust_decimal::Decimal;

#[test]
fn survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger").join("bon.json");

    let company = {
        let mut store = JsonFileStore::open(&path).unwrap();
        let c = store.add_company("Sarl Atlas").unwrap().id;
        let mut svc = LedgerService::new(store);
        for (date, billed) in [("2025-01-16", 1870), ("2025", 6662)] {
            svc.add(
                &c,
                NewReceipt {
                    date: date.into(),
                    billed_amount: Some(Decimal::new(billed, 0)),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        let first = svc.ledger(&c).unwrap()[0].id.clone();
        svc.reorder(&c, &first, 1).unwrap();
        c
    };
    assert!(path.exists());

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(store.company(&company).unwrap().order_mode, OrderMode::Manual);
    let rows = store.list_entries(&company).unwrap();
    let totals: Vec<_> = rows.iter().map(|r| r.total).collect();
    assert_eq!(totals, vec![Decimal::new(1870, 0), Decimal::new(8532, 0)]);
    assert_eq!(store.history(Some(&company)).unwrap().len(), 2);
}

#[test]
fn missing_file_is_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path().join("absent.json")).unwrap();
    assert!(store.companies().unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(JsonFileStore::open(&path), Err(BonError::Json(_))));
}

#[test]
fn removing_company_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bon.json");
    let mut store = JsonFileStore::open(&path).unwrap();
    let c = store.add_company("Gone").unwrap().id;
    store.remove_company(&c).unwrap();

    let reopened = JsonFileStore::open(&path).unwrap();
    assert!(reopened.companies().unwrap().is_empty());
    assert!(reopened.snapshot().receipts.is_empty());
}

#[test]
fn failed_write_leaves_memory_as_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bon.json");
    let mut store = JsonFileStore::open(&path).unwrap();
    let c = store.add_company("Sarl Atlas").unwrap().id;
    let mut svc = LedgerService::new(store);
    let row = |date: &str, billed: i64| NewReceipt {
        date: date.into(),
        billed_amount: Some(Decimal::new(billed, 0)),
        ..Default::default()
    };
    svc.add(&c, row("2025-01-10", 10)).unwrap();

    // the temp file path is taken by a directory
    let tmp = path.with_extension("json.tmp");
    std::fs::create_dir(&tmp).unwrap();
    let err = svc.add(&c, row("2025-01-20", 5)).unwrap_err();
    assert!(matches!(err, BonError::Store { op: "insert_entry", .. }));
    assert!(err.is_persistence());

    let rows = svc.ledger(&c).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total, Decimal::new(10, 0));
    assert_eq!(svc.store().history(Some(&c)).unwrap().len(), 1);
    assert_eq!(JsonFileStore::open(&path).unwrap().list_entries(&c).unwrap().len(), 1);

    std::fs::remove_dir(&tmp).unwrap();
    let added = svc.add(&c, row("2025-01-20", 5)).unwrap();
    assert_eq!(added.total, Decimal::new(15, 0));
    assert_eq!(JsonFileStore::open(&path).unwrap().list_entries(&c).unwrap().len(), 2);
}
