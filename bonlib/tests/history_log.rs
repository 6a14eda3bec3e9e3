use bonlib::{
    model::{HistoryAction, NewReceipt, ReceiptSnapshot},
    service::LedgerService,
    store::memory::MemoryStore,
    traits::{CompanyRegistry, HistoryLog},
};
use rust_decimal::Decimal;

fn two_companies() -> (LedgerService<MemoryStore>, String, String) {
    let mut store = MemoryStore::new();
    let a = store.add_company("Alpha").unwrap().id;
    let b = store.add_company("Beta").unwrap().id;
    let mut svc = LedgerService::new(store);
    for (c, billed) in [(&a, 10), (&b, 20), (&a, 30)] {
        svc.add(
            c,
            NewReceipt {
                date: "2025-01-01".into(),
                billed_amount: Some(Decimal::new(billed, 0)),
                ..Default::default()
            },
        )
        .unwrap();
    }
    (svc, a, b)
}

#[test]
fn newest_first_and_filtered_by_company() {
    let (svc, a, b) = two_companies();
    let all = svc.store().history(None).unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].at >= w[1].at));
    assert_eq!(all[0].details.billed_amount, Some(Decimal::new(30, 0)));

    assert_eq!(svc.store().history(Some(&a)).unwrap().len(), 2);
    assert_eq!(svc.store().history(Some(&b)).unwrap().len(), 1);
}

#[test]
fn update_details_merges_into_every_record_of_the_entry() {
    let (mut svc, a, _) = two_companies();
    let id = svc.store().history(Some(&a)).unwrap()[0].receipt_id.clone();
    svc.store_mut()
        .record_action(HistoryAction::Update, &id, ReceiptSnapshot::default(), &a)
        .unwrap();

    let patch = ReceiptSnapshot {
        nb: Some("BL2702".into()),
        ..Default::default()
    };
    assert_eq!(svc.store_mut().update_details(&id, &patch).unwrap(), 2);

    let latest = svc.store().latest_for(&id).unwrap().unwrap();
    assert_eq!(latest.action, HistoryAction::Update);
    assert_eq!(latest.details.nb.as_deref(), Some("BL2702"));
    assert_eq!(latest.details.billed_amount, None);
}

#[test]
fn delete_for_entries_and_clear() {
    let (mut svc, a, b) = two_companies();
    let ids: Vec<String> = svc
        .store()
        .history(Some(&a))
        .unwrap()
        .into_iter()
        .map(|h| h.receipt_id)
        .collect();

    assert_eq!(svc.store_mut().delete_for_entries(&ids[..1]).unwrap(), 1);
    assert_eq!(svc.store_mut().clear(Some(&b)).unwrap(), 1);
    assert_eq!(svc.store().history(None).unwrap().len(), 1);
    assert_eq!(svc.store_mut().clear(None).unwrap(), 1);
    assert!(svc.store().history(None).unwrap().is_empty());
}

#[test]
fn history_does_not_drive_the_ledger() {
    let (mut svc, a, _) = two_companies();
    svc.store_mut().clear(None).unwrap();
    let ledger = svc.refresh(&a).unwrap();
    assert_eq!(ledger.last().unwrap().total, Decimal::new(40, 0));
}
