//! Простой XML ledger: <Ledger><company/><receipt>...</receipt>...</Ledger>

use crate::{
    error::{BonError, Result},
    model::{LedgerSheet, NewReceipt},
};
use quick_xml::{de::from_reader, se::to_string};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

#[derive(Serialize, Deserialize, Debug)]
struct XmlReceipt {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    date: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    nb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    billed_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    advance_amount: Option<String>,
    // только для чтения человеком, при импорте не используется
    #[serde(skip_serializing_if = "Option::is_none", default)]
    total: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename = "Ledger")]
struct XmlLedger {
    #[serde(default)]
    company: String,
    #[serde(rename = "receipt", default)]
    receipts: Vec<XmlReceipt>,
}

fn parse_dec(v: Option<String>) -> Result<Option<Decimal>> {
    v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Decimal>().map_err(|e| BonError::Parse(format!("amount {s:?}: {e}"))))
        .transpose()
}

pub struct SimpleXml;

impl crate::traits::ReadFormat for SimpleXml {
    fn read<R: BufRead>(r: R) -> Result<Vec<NewReceipt>> {
        let x: XmlLedger = from_reader(r).map_err(|e| BonError::Xml(format!("{e}")))?;

        let mut out = Vec::with_capacity(x.receipts.len());
        for e in x.receipts {
            out.push(NewReceipt {
                date: e.date,
                nb: e.nb.filter(|s| !s.trim().is_empty()),
                billed_amount: parse_dec(e.billed_amount)?,
                advance_amount: parse_dec(e.advance_amount)?,
            });
        }
        Ok(out)
    }
}

impl crate::traits::WriteFormat for SimpleXml {
    fn write<W: Write>(mut w: W, sheet: &LedgerSheet) -> Result<()> {
        let receipts = sheet
            .receipts
            .iter()
            .map(|r| XmlReceipt {
                date: r.date.clone(),
                nb: r.nb.clone(),
                billed_amount: r.billed_amount.map(|a| a.to_string()),
                advance_amount: r.advance_amount.map(|a| a.to_string()),
                total: Some(r.total.to_string()),
            })
            .collect();

        let x = XmlLedger {
            company: sheet.company_name.clone(),
            receipts,
        };

        let s = to_string(&x).map_err(|e| BonError::Xml(format!("{e}")))?;
        w.write_all(s.as_bytes())?;
        Ok(())
    }
}
