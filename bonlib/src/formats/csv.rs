//! CSV для табличных программ.
//!
//! Экспорт: `company,date,nb,montant_bl,avance,total`, строки в порядке ledger.
//! Импорт понимает разные варианты заголовков:
//! `Date|date|DATE`, `NB|nb|Nb|N°`, `Montant BL|montantBL|montant_bl|MONTANT|Amount`, `Avance|avance|AVANCE|Advance`.
//! Колонка total при импорте игнорируется, итоги всегда пересчитываются.

use crate::{
    amount::parse_amount,
    date::normalize,
    error::{BonError, Result},
    model::{LedgerSheet, NewReceipt},
};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io::{BufRead, Write};

const DATE: &[&str] = &["Date", "date", "DATE"];
const NB: &[&str] = &["NB", "nb", "Nb", "N°"];
const BILLED: &[&str] = &["Montant BL", "montantBL", "montant_bl", "MONTANT", "Amount"];
const ADVANCE: &[&str] = &["Avance", "avance", "AVANCE", "Advance"];

#[derive(serde::Serialize)]
struct CsvOutRow<'a> {
    company: &'a str,
    date: String,
    nb: Option<&'a str>,
    montant_bl: Option<String>,
    avance: Option<String>,
    total: String,
}

pub struct Csv;

fn column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|h| aliases.contains(&h.trim()))
}

fn cell<'r>(rec: &'r StringRecord, col: Option<usize>) -> &'r str {
    col.and_then(|i| rec.get(i)).map(str::trim).unwrap_or("")
}

impl crate::traits::ReadFormat for Csv {
    fn read<R: BufRead>(r: R) -> Result<Vec<NewReceipt>> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(r);
        let headers = rdr.headers()?.clone();

        let date_col = column(&headers, DATE);
        let nb_col = column(&headers, NB);
        let billed_col = column(&headers, BILLED);
        let advance_col = column(&headers, ADVANCE);
        if date_col.is_none() && billed_col.is_none() && advance_col.is_none() {
            return Err(BonError::Parse("no date or amount column in CSV header".into()));
        }

        let mut out = Vec::new();
        for (i, rec) in rdr.records().enumerate() {
            let rec = rec?;
            // строка данных i+2: первая строка файла — заголовок
            let line = i + 2;
            let amount = |col| {
                parse_amount(cell(&rec, col)).map_err(|e| BonError::Parse(format!("line {line}: {e}")))
            };

            let nb = cell(&rec, nb_col);
            out.push(NewReceipt {
                date: cell(&rec, date_col).to_string(),
                nb: (!nb.is_empty()).then(|| nb.to_string()),
                billed_amount: amount(billed_col)?,
                advance_amount: amount(advance_col)?,
            });
        }
        Ok(out)
    }
}

impl crate::traits::WriteFormat for Csv {
    fn write<W: Write>(mut w: W, sheet: &LedgerSheet) -> Result<()> {
        let mut wrt = WriterBuilder::new().has_headers(false).from_writer(&mut w);
        // заголовок пишем сами, чтобы пустой ledger тоже давал валидный файл
        wrt.write_record(["company", "date", "nb", "montant_bl", "avance", "total"])?;

        for r in &sheet.receipts {
            let out = CsvOutRow {
                company: &sheet.company_name,
                date: normalize(&r.date).display_or(&r.date).into_owned(),
                nb: r.nb.as_deref(),
                montant_bl: r.billed_amount.map(|a| a.to_string()),
                avance: r.advance_amount.map(|a| a.to_string()),
                total: r.total.to_string(),
            };
            wrt.serialize(out)?;
        }
        wrt.flush()?;
        Ok(())
    }
}
