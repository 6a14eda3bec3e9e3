mod config;

use bonlib::{
    aggregate::{rows_in_period, Granularity, Period},
    amount::{format_amount, format_opt, parse_amount},
    date::normalize,
    error::{BonError, Result},
    formats::{csv::Csv, xml::SimpleXml},
    model::{Company, NewReceipt, OrderMode, Receipt, ReceiptPatch, ReceiptSnapshot},
    service::LedgerService,
    store::json_file::JsonFileStore,
    traits::{CompanyRegistry, EntryStore, HistoryLog, ReadFormat, WriteFormat},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, CellAlignment, Table};
use config::Settings;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Fmt {
    Csv,
    Xml,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum By {
    Year,
    Month,
}

#[derive(Parser, Debug)]
#[command(name = "bon", version, about = "Ledger des bons de livraison")]
struct Cli {
    /// Файл данных (JSON)
    #[arg(long = "data", env = "BON_DATA", global = true)]
    data: Option<PathBuf>,

    /// TOML с настройками
    #[arg(long = "config", env = "BON_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Подробный лог в stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CompanyArg {
    /// Компания: id или имя
    #[arg(short = 'c', long = "company")]
    company: Option<String>,
}

#[derive(Args, Debug)]
struct Fields {
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    nb: Option<String>,
    /// Montant BL
    #[arg(long)]
    billed: Option<String>,
    /// Avance
    #[arg(long)]
    advance: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Компании
    #[command(subcommand)]
    Company(CompanyCmd),
    /// Добавить строку
    Add {
        #[command(flatten)]
        company: CompanyArg,
        #[command(flatten)]
        fields: Fields,
    },
    /// Изменить строку; пустое значение очищает поле
    Update {
        id: String,
        #[command(flatten)]
        fields: Fields,
    },
    /// Удалить строку
    Delete { id: String },
    /// Переставить строку (ручной порядок до `resort`)
    Move {
        #[command(flatten)]
        company: CompanyArg,
        id: String,
        index: usize,
    },
    /// Вернуть порядок по датам
    Resort {
        #[command(flatten)]
        company: CompanyArg,
    },
    /// Пересчитать и записать итоги
    Refresh {
        #[command(flatten)]
        company: CompanyArg,
    },
    /// Показать ledger
    List {
        #[command(flatten)]
        company: CompanyArg,
        /// Только период: YYYY или YYYY-MM
        #[arg(long)]
        period: Option<String>,
    },
    /// Балансы по годам или месяцам
    Summary {
        #[command(flatten)]
        company: CompanyArg,
        #[arg(long, value_enum, default_value = "month")]
        by: By,
    },
    /// Журнал изменений
    #[command(subcommand)]
    History(HistoryCmd),
    /// Импорт строк из файла
    Import {
        #[command(flatten)]
        company: CompanyArg,
        #[arg(long = "format", value_enum)]
        format: Fmt,
        /// Входной файл (по умолчанию stdin)
        #[arg(short = 'i', long = "input")]
        input: Option<String>,
    },
    /// Экспорт ledger
    Export {
        #[command(flatten)]
        company: CompanyArg,
        #[arg(long = "format", value_enum)]
        format: Fmt,
        /// Выходной файл (по умолчанию stdout)
        #[arg(short = 'o', long = "output")]
        output: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CompanyCmd {
    Add { name: String },
    List,
    Rename { company: String, name: String },
    Logo { company: String, path: String },
    /// Цвет колонки или строки таблицы
    Color { company: String, slot: String, hex: String },
    /// Удалить вместе со строками и историей
    Remove { company: String },
}

#[derive(Subcommand, Debug)]
enum HistoryCmd {
    List {
        #[arg(short = 'c', long = "company")]
        company: Option<String>,
    },
    /// Вставить заново последнюю версию строки из истории
    Restore { id: String },
    /// Поправить сохранённые поля во всех записях строки
    Edit {
        id: String,
        #[command(flatten)]
        fields: Fields,
    },
    /// Удалить записи по строкам
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Clear {
        #[arg(short = 'c', long = "company")]
        company: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();

    let settings = Settings::load(cli.config.as_deref())?;
    let store = JsonFileStore::open(settings.data_file(cli.data.clone()))?;
    debug!(path = %store.path().display(), "data file opened");
    let mut svc = LedgerService::new(store);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Company(cmd) => company_cmd(&mut svc, cmd, &mut out)?,
        Command::Add { company, fields } => {
            let c = resolve(&svc, &settings, company)?;
            let r = svc.add(&c.id, new_receipt(fields)?)?;
            writeln!(out, "{}\t{}", r.id, format_amount(r.total))?;
        }
        Command::Update { id, fields } => {
            let r = svc.update(&id, &patch(fields)?)?;
            writeln!(out, "{}\t{}", r.id, format_amount(r.total))?;
        }
        Command::Delete { id } => svc.delete(&id)?,
        Command::Move { company, id, index } => {
            let c = resolve(&svc, &settings, company)?;
            let rows = svc.reorder(&c.id, &id, index)?;
            print_ledger(&mut out, &c, &rows)?;
        }
        Command::Resort { company } => {
            let c = resolve(&svc, &settings, company)?;
            let rows = svc.resort(&c.id)?;
            print_ledger(&mut out, &c, &rows)?;
        }
        Command::Refresh { company } => {
            let c = resolve(&svc, &settings, company)?;
            let rows = svc.refresh(&c.id)?;
            print_ledger(&mut out, &c, &rows)?;
        }
        Command::List { company, period } => {
            let c = resolve(&svc, &settings, company)?;
            let rows = svc.refresh(&c.id)?;
            match period {
                Some(p) => {
                    let p = parse_period(&p)?;
                    let picked: Vec<Receipt> = rows_in_period(&rows, p).into_iter().cloned().collect();
                    print_ledger(&mut out, &c, &picked)?;
                }
                None => print_ledger(&mut out, &c, &rows)?,
            }
        }
        Command::Summary { company, by } => {
            let c = resolve(&svc, &settings, company)?;
            let g = match by {
                By::Year => Granularity::Year,
                By::Month => Granularity::Month,
            };
            let mut t = Table::new();
            t.set_header(vec!["Période", "Lignes", "Mouvement", "Solde"]);
            for b in svc.summary(&c.id, g)? {
                t.add_row(vec![
                    Cell::new(b.period),
                    Cell::new(b.rows).set_alignment(CellAlignment::Right),
                    Cell::new(format_amount(b.net)).set_alignment(CellAlignment::Right),
                    Cell::new(format_amount(b.balance)).set_alignment(CellAlignment::Right),
                ]);
            }
            writeln!(out, "{}\n{t}", c.name)?;
        }
        Command::History(cmd) => history_cmd(&mut svc, &settings, cmd, &mut out)?,
        Command::Import { company, format, input } => {
            let c = resolve(&svc, &settings, company)?;
            let reader: Box<dyn io::Read> = match input {
                Some(path) => Box::new(File::open(path)?),
                None => Box::new(io::stdin()),
            };
            let br = BufReader::new(reader);
            let rows = match format {
                Fmt::Csv => Csv::read(br),
                Fmt::Xml => SimpleXml::read(br),
            }?;
            let n = rows.len();
            svc.import(&c.id, rows)?;
            writeln!(out, "imported {n} rows into {}", c.name)?;
        }
        Command::Export { company, format, output } => {
            let c = resolve(&svc, &settings, company)?;
            let sheet = svc.sheet(&c.id)?;
            let mut writer: Box<dyn Write> = match output {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(io::stdout()),
            };
            match format {
                Fmt::Csv => Csv::write(&mut writer, &sheet),
                Fmt::Xml => SimpleXml::write(&mut writer, &sheet),
            }?;
            writer.flush()?;
        }
    }

    out.flush().map_err(BonError::from)
}

/// Компания по id или по имени (без учёта регистра).
fn find_company(svc: &LedgerService<JsonFileStore>, key: &str) -> Result<Company> {
    let all = svc.store().companies()?;
    all.iter()
        .find(|c| c.id == key)
        .or_else(|| all.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
        .cloned()
        .ok_or_else(|| BonError::UnknownCompany(key.to_string()))
}

fn resolve(svc: &LedgerService<JsonFileStore>, settings: &Settings, arg: CompanyArg) -> Result<Company> {
    find_company(svc, &settings.company(arg.company)?)
}

fn company_cmd(svc: &mut LedgerService<JsonFileStore>, cmd: CompanyCmd, out: &mut impl Write) -> Result<()> {
    match cmd {
        CompanyCmd::Add { name } => {
            let c = svc.store_mut().add_company(&name)?;
            writeln!(out, "{}\t{}", c.id, c.name)?;
        }
        CompanyCmd::List => {
            let mut t = Table::new();
            t.set_header(vec!["Id", "Nom", "Ordre", "Lignes"]);
            for c in svc.store().companies()? {
                let rows = svc.store().list_entries(&c.id)?.len();
                let mode = match c.order_mode {
                    OrderMode::Chronological => "date",
                    OrderMode::Manual => "manuel",
                };
                t.add_row(vec![Cell::new(&c.id), Cell::new(&c.name), Cell::new(mode), Cell::new(rows)]);
            }
            writeln!(out, "{t}")?;
        }
        CompanyCmd::Rename { company, name } => {
            let mut c = find_company(svc, &company)?;
            if name.trim().is_empty() {
                return Err(BonError::Validation("company name is empty".into()));
            }
            c.name = name.trim().to_string();
            svc.store_mut().save_company(&c)?;
        }
        CompanyCmd::Logo { company, path } => {
            let mut c = find_company(svc, &company)?;
            c.logo = (!path.is_empty()).then_some(path);
            svc.store_mut().save_company(&c)?;
        }
        CompanyCmd::Color { company, slot, hex } => {
            let mut c = find_company(svc, &company)?;
            c.set_color(&slot, &hex)?;
            svc.store_mut().save_company(&c)?;
        }
        CompanyCmd::Remove { company } => {
            let c = find_company(svc, &company)?;
            svc.store_mut().remove_company(&c.id)?;
            writeln!(out, "removed {}", c.name)?;
        }
    }
    Ok(())
}

/// История можно смотреть и без компании: тогда берём все записи.
fn history_company(
    svc: &LedgerService<JsonFileStore>,
    settings: &Settings,
    key: Option<String>,
) -> Result<Option<String>> {
    key.or_else(|| settings.default_company.clone())
        .map(|k| find_company(svc, &k).map(|c| c.id))
        .transpose()
}

fn history_cmd(
    svc: &mut LedgerService<JsonFileStore>,
    settings: &Settings,
    cmd: HistoryCmd,
    out: &mut impl Write,
) -> Result<()> {
    match cmd {
        HistoryCmd::List { company } => {
            let cid = history_company(svc, settings, company)?;
            let mut t = Table::new();
            t.set_header(vec!["Quand", "Action", "Ligne", "Date", "Montant BL", "Avance", "Total"]);
            for h in svc.store().history(cid.as_deref())? {
                let d = &h.details;
                let date = d.date.as_deref().unwrap_or("");
                t.add_row(vec![
                    Cell::new(h.at.format("%d/%m/%Y %H:%M")),
                    Cell::new(h.action.as_str()),
                    Cell::new(&h.receipt_id),
                    Cell::new(normalize(date).display_or(date)),
                    Cell::new(format_opt(d.billed_amount)),
                    Cell::new(format_opt(d.advance_amount)),
                    Cell::new(format_opt(d.total)),
                ]);
            }
            writeln!(out, "{t}")?;
        }
        HistoryCmd::Restore { id } => {
            let r = svc.restore(&id)?;
            writeln!(out, "{}\t{}", r.id, format_amount(r.total))?;
        }
        HistoryCmd::Edit { id, fields } => {
            let n = svc.store_mut().update_details(&id, &snapshot(fields)?)?;
            if n == 0 {
                return Err(BonError::NotFound(format!("history for {id}")));
            }
            writeln!(out, "updated {n} history entries")?;
        }
        HistoryCmd::Delete { ids } => {
            let n = svc.store_mut().delete_for_entries(&ids)?;
            writeln!(out, "deleted {n} history entries")?;
        }
        HistoryCmd::Clear { company } => {
            let cid = history_company(svc, settings, company)?;
            let n = svc.store_mut().clear(cid.as_deref())?;
            writeln!(out, "cleared {n} history entries")?;
        }
    }
    Ok(())
}

fn print_ledger(out: &mut impl Write, company: &Company, rows: &[Receipt]) -> Result<()> {
    let mut t = Table::new();
    t.set_header(vec!["#", "Date", "NB", "Montant BL", "Avance", "Total", "Id"]);
    for r in rows {
        t.add_row(vec![
            Cell::new(r.position + 1),
            Cell::new(normalize(&r.date).display_or(&r.date)),
            Cell::new(r.nb.as_deref().unwrap_or("")),
            Cell::new(format_opt(r.billed_amount)).set_alignment(CellAlignment::Right),
            Cell::new(format_opt(r.advance_amount)).set_alignment(CellAlignment::Right),
            Cell::new(format_amount(r.total)).set_alignment(CellAlignment::Right),
            Cell::new(&r.id),
        ]);
    }
    writeln!(out, "{}\n{t}", company.name)?;
    Ok(())
}

fn parse_period(s: &str) -> Result<Period> {
    let bad = || BonError::Parse(format!("period {s:?} is not YYYY or YYYY-MM"));
    match s.split_once('-') {
        None => s.parse().map(Period::Year).map_err(|_| bad()),
        Some((y, m)) => {
            let y: i32 = y.parse().map_err(|_| bad())?;
            let m: u32 = m.parse().map_err(|_| bad())?;
            if !(1..=12).contains(&m) {
                return Err(bad());
            }
            Ok(Period::Month(y, m))
        }
    }
}

fn opt_text(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn new_receipt(f: Fields) -> Result<NewReceipt> {
    Ok(NewReceipt {
        date: f.date.unwrap_or_default().trim().to_string(),
        nb: opt_text(f.nb),
        billed_amount: f.billed.as_deref().map(parse_amount).transpose()?.flatten(),
        advance_amount: f.advance.as_deref().map(parse_amount).transpose()?.flatten(),
    })
}

/// Флаг не передан — поле не трогаем; передан пустым — очищаем.
fn patch(f: Fields) -> Result<ReceiptPatch> {
    Ok(ReceiptPatch {
        date: f.date.map(|d| d.trim().to_string()),
        nb: f.nb.map(|n| opt_text(Some(n))),
        billed_amount: f.billed.as_deref().map(parse_amount).transpose()?,
        advance_amount: f.advance.as_deref().map(parse_amount).transpose()?,
    })
}

/// Правка истории: переданные поля перекрывают сохранённые, пустые флаги игнорируются.
fn snapshot(f: Fields) -> Result<ReceiptSnapshot> {
    let s = ReceiptSnapshot {
        date: opt_text(f.date),
        nb: opt_text(f.nb),
        billed_amount: f.billed.as_deref().map(parse_amount).transpose()?.flatten(),
        advance_amount: f.advance.as_deref().map(parse_amount).transpose()?.flatten(),
        total: None,
    };
    if s == ReceiptSnapshot::default() {
        return Err(BonError::Validation("nothing to change in history entry".into()));
    }
    Ok(s)
}
