//! One-time catalogue seeding from a delimited text file.
//!
//! The file must carry the header columns `descricao`, `preco` and `estoque`
//! (any order, extra columns ignored). Seeding only runs against an empty
//! table, so restarting the server never duplicates rows.

use std::path::Path;

use rusqlite::params;
use tracing::{info, warn};

use super::MedicineStore;
use crate::error::AppError;

const COL_DESCRIPTION: &str = "descricao";
const COL_PRICE: &str = "preco";
const COL_STOCK: &str = "estoque";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The table already held this many rows; the file was not read.
    AlreadyPopulated(usize),
    Seeded { inserted: usize, skipped: usize },
}

/// Populate `store` from the file at `path` if the table is empty.
pub fn seed_from_csv(store: &MedicineStore, path: &Path, delimiter: u8) -> Result<SeedOutcome, AppError> {
    let existing = store.count()?;
    if existing > 0 {
        info!(rows = existing, "medicine store already populated, skipping seed");
        return Ok(SeedOutcome::AlreadyPopulated(existing));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::Store(format!("open seed file {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::Store(format!("read seed header: {e}")))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| AppError::Store(format!("seed file {} has no '{name}' column", path.display())))
    };
    let (desc_idx, price_idx, stock_idx) = (column(COL_DESCRIPTION)?, column(COL_PRICE)?, column(COL_STOCK)?);

    let mut conn = store.lock()?;
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Store(format!("begin seed tx: {e}")))?;

    let mut inserted = 0;
    let mut skipped = 0;
    {
        let mut insert = tx
            .prepare("INSERT OR IGNORE INTO medicines (description, price, stock) VALUES (?1, ?2, ?3)")
            .map_err(|e| AppError::Store(format!("prepare seed insert: {e}")))?;

        for (line, result) in reader.records().enumerate() {
            // +2: one for the header, one for 1-based numbering.
            let line = line + 2;
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(line, error = %e, "unreadable seed row, skipping");
                    skipped += 1;
                    continue;
                }
            };

            let description = record.get(desc_idx).unwrap_or_default();
            let price = record.get(price_idx).and_then(parse_price);
            let stock = record.get(stock_idx).and_then(|s| s.parse::<i64>().ok()).filter(|s| *s >= 0);

            let (Some(price), Some(stock)) = (price, stock) else {
                warn!(line, description, "invalid price or stock in seed row, skipping");
                skipped += 1;
                continue;
            };
            if description.is_empty() {
                warn!(line, "blank description in seed row, skipping");
                skipped += 1;
                continue;
            }

            let changed = insert
                .execute(params![description, price, stock])
                .map_err(|e| AppError::Store(format!("insert seed row {line}: {e}")))?;
            if changed == 0 {
                warn!(line, description, "duplicate description in seed file, skipping");
                skipped += 1;
            } else {
                inserted += 1;
            }
        }
    }

    tx.commit()
        .map_err(|e| AppError::Store(format!("commit seed tx: {e}")))?;

    info!(inserted, skipped, path = %path.display(), "medicine store seeded");
    Ok(SeedOutcome::Seeded { inserted, skipped })
}

/// Accepts `89.90` and `89,90`; rejects negatives and non-finite values.
fn parse_price(raw: &str) -> Option<f64> {
    let normalized = raw.replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}
