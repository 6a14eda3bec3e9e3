use bonlib::{
    formats::xml::SimpleXml,
    model::{LedgerSheet, Receipt},
    traits::{ReadFormat, WriteFormat},
};
use rust_decimal::Decimal;
use std::io::Cursor;

fn receipt(id: &str, date: &str, billed: Option<Decimal>, advance: Option<Decimal>, total: Decimal) -> Receipt {
    Receipt {
        id: id.into(),
        company_id: "c1".into(),
        date: date.into(),
        nb: None,
        billed_amount: billed,
        advance_amount: advance,
        total,
        position: 0,
    }
}

#[test]
fn simple_xml_roundtrip() {
    let sheet = LedgerSheet {
        company_name: "Sarl Atlas".into(),
        receipts: vec![
            receipt("a", "2025", Some(Decimal::from_str_exact("6662.00").unwrap()), None, Decimal::new(6662, 0)),
            receipt("b", "2025-01-16", Some(Decimal::new(1870, 0)), Some(Decimal::new(25, 1)), Decimal::new(85295, 1)),
        ],
    };

    let mut out = Vec::new();
    SimpleXml::write(&mut out, &sheet).expect("write simple xml");
    let text = String::from_utf8(out.clone()).unwrap();
    assert!(text.contains("<company>Sarl Atlas</company>"));

    let rows = SimpleXml::read(Cursor::new(out)).expect("read simple xml");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2025");
    assert_eq!(rows[0].advance_amount, None);
    assert_eq!(rows[1].advance_amount, Some(Decimal::new(25, 1)));
    assert_eq!(rows[1].billed_amount, Some(Decimal::new(1870, 0)));
}

#[test]
fn simple_xml_bad_amount() {
    let xml = "<Ledger><company>X</company><receipt><date>2025</date><billed_amount>lots</billed_amount></receipt></Ledger>";
    assert!(SimpleXml::read(Cursor::new(xml)).is_err());
}
