//! bonlib — ledger накладных (bon de livraison): нарастающий баланс по компании,
//! журнал истории, импорт/экспорт CSV и XML.

pub mod aggregate;
pub mod amount;
pub mod calc;
pub mod date;
pub mod error;
pub mod ledger;
pub mod model;
pub mod service;
pub mod traits;

pub mod store {
    pub mod json_file;
    pub mod memory;
}

pub mod formats {
    pub mod csv;
    pub mod xml;
}

pub use calc::contribution as compute_contribution;
pub use ledger::recalculate_ledger;
