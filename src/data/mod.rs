//! Data loading and normalization
//!
//! Reads the two scraped input tables (competitor observations, customer
//! reviews), normalizes column names and values, and serves per-product
//! slices to the rest of the pipeline. Tables are loaded once and cached
//! process-wide; an explicit [`DataStore::reload`] invalidates the cache.

use crate::config::DataConfig;
use crate::error::{RadarError, Result};
use crate::types::{CompetitorRecord, ReviewRecord};
use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

#[derive(Debug, Default)]
struct LoadedTables {
    competitors: Vec<CompetitorRecord>,
    reviews: Vec<ReviewRecord>,
}

/// Cached, read-only view over the two input CSV files.
pub struct DataStore {
    config: DataConfig,
    tables: RwLock<Option<LoadedTables>>,
}

impl DataStore {
    pub fn new(config: DataConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(None),
        }
    }

    /// Load both tables if they are not already cached.
    pub fn ensure_loaded(&self) -> Result<()> {
        if self.tables.read().is_some() {
            return Ok(());
        }
        self.reload()
    }

    /// Drop the cache and re-read both files.
    pub fn reload(&self) -> Result<()> {
        let competitors = load_competitors(&self.config.competitor_csv)?;
        let reviews = load_reviews(&self.config.reviews_csv, self.config.review_max_len)?;
        tracing::info!(
            competitors = competitors.len(),
            reviews = reviews.len(),
            "loaded input tables"
        );
        *self.tables.write() = Some(LoadedTables {
            competitors,
            reviews,
        });
        Ok(())
    }

    /// Distinct product titles present in the competitor table.
    pub fn products(&self) -> Result<Vec<String>> {
        self.ensure_loaded()?;
        let guard = self.tables.read();
        let tables = guard.as_ref().expect("tables loaded above");
        let mut seen = Vec::new();
        for record in &tables.competitors {
            if !seen.contains(&record.title) {
                seen.push(record.title.clone());
            }
        }
        Ok(seen)
    }

    /// The selected product's observations, sorted by date ascending with
    /// duplicate dates collapsed (last observation wins). An empty result
    /// means "no data for this product" and is not an error.
    pub fn competitor_series(&self, product: &str) -> Result<Vec<CompetitorRecord>> {
        self.ensure_loaded()?;
        let guard = self.tables.read();
        let tables = guard.as_ref().expect("tables loaded above");
        let mut by_date: HashMap<NaiveDate, CompetitorRecord> = HashMap::new();
        for record in tables.competitors.iter().filter(|r| r.title == product) {
            by_date.insert(record.date, record.clone());
        }
        let mut series: Vec<CompetitorRecord> = by_date.into_values().collect();
        series.sort_by_key(|r| r.date);
        Ok(series)
    }

    /// The selected product's reviews; empty when none exist.
    pub fn reviews_for(&self, product: &str) -> Result<Vec<ReviewRecord>> {
        self.ensure_loaded()?;
        let guard = self.tables.read();
        let tables = guard.as_ref().expect("tables loaded above");
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.title == product)
            .cloned()
            .collect())
    }
}

fn open_source(path: &str) -> Result<File> {
    File::open(Path::new(path))
        .map_err(|e| RadarError::DataUnavailable(format!("{}: {}", path, e)))
}

/// Load the competitor table from a file path.
pub fn load_competitors(path: &str) -> Result<Vec<CompetitorRecord>> {
    competitors_from_reader(open_source(path)?, path)
}

/// Load the reviews table from a file path.
pub fn load_reviews(path: &str, max_len: usize) -> Result<Vec<ReviewRecord>> {
    reviews_from_reader(open_source(path)?, path, max_len)
}

/// Parse competitor records out of any CSV reader.
pub fn competitors_from_reader<R: Read>(reader: R, source_name: &str) -> Result<Vec<CompetitorRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let index = header_index(&mut rdr, source_name)?;
    let columns = required(&index, source_name, &["title", "date", "price", "discount"])?;
    let (title_col, date_col, price_col, discount_col) =
        (columns[0], columns[1], columns[2], columns[3]);

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in rdr.records() {
        let row = row.map_err(|e| RadarError::DataUnavailable(format!("{}: {}", source_name, e)))?;
        let Some(date) = parse_date(row.get(date_col).unwrap_or_default()) else {
            dropped += 1;
            continue;
        };
        records.push(CompetitorRecord {
            title: row.get(title_col).unwrap_or_default().trim().to_string(),
            date,
            price: parse_decimal(row.get(price_col).unwrap_or_default()),
            discount_percent: parse_percent(row.get(discount_col).unwrap_or_default()),
            predicted_discount: None,
        });
    }
    if dropped > 0 {
        tracing::warn!(source = source_name, dropped, "dropped rows with unparseable dates");
    }
    Ok(records)
}

/// Parse review records out of any CSV reader, clipping text to `max_len`
/// characters before anything downstream sees it.
pub fn reviews_from_reader<R: Read>(
    reader: R,
    source_name: &str,
    max_len: usize,
) -> Result<Vec<ReviewRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let index = header_index(&mut rdr, source_name)?;
    let columns = required(&index, source_name, &["title", "review_statements"])?;
    let (title_col, text_col) = (columns[0], columns[1]);

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(|e| RadarError::DataUnavailable(format!("{}: {}", source_name, e)))?;
        let text = row.get(text_col).unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }
        records.push(ReviewRecord {
            title: row.get(title_col).unwrap_or_default().trim().to_string(),
            text: truncate_text(text, max_len),
        });
    }
    Ok(records)
}

/// Clip text to at most `max_len` characters.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    text.chars().take(max_len).collect()
}

fn header_index<R: Read>(
    rdr: &mut csv::Reader<R>,
    source_name: &str,
) -> Result<HashMap<String, usize>> {
    let headers = rdr
        .headers()
        .map_err(|e| RadarError::DataUnavailable(format!("{}: {}", source_name, e)))?;
    Ok(headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect())
}

fn required(
    index: &HashMap<String, usize>,
    source_name: &str,
    columns: &[&str],
) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|col| {
            index.get(*col).copied().ok_or_else(|| RadarError::SchemaMismatch {
                source_name: source_name.to_string(),
                column: col.to_string(),
            })
        })
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Numeric coercion policy: unparseable or negative values become 0 so that
/// downstream consumers never see missing data.
fn parse_decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim())
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

fn parse_percent(raw: &str) -> Decimal {
    parse_decimal(raw.trim().trim_end_matches('%'))
}
