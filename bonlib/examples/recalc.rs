use bonlib::{
    formats::csv::Csv,
    model::{LedgerSheet, Receipt},
    recalculate_ledger,
    traits::{ReadFormat, WriteFormat},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Пример: CSV со строками (stdin) -> CSV с пересчитанными итогами (stdout)
    let rows = Csv::read(std::io::BufReader::new(std::io::stdin()))?;
    let receipts = rows
        .into_iter()
        .enumerate()
        .map(|(i, r)| Receipt {
            id: format!("row-{}", i + 1),
            company_id: "stdin".into(),
            date: r.date,
            nb: r.nb,
            billed_amount: r.billed_amount,
            advance_amount: r.advance_amount,
            total: Default::default(),
            position: i as u32,
        })
        .collect();

    let sheet = LedgerSheet {
        company_name: "stdin".into(),
        receipts: recalculate_ledger(receipts)?,
    };
    Csv::write(std::io::stdout(), &sheet)?;
    Ok(())
}
