use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::config::SelectionPolicy;
use crate::core::error::{AgentError, Result};
use crate::core::pipeline::KeywordSource;
use crate::core::types::KeywordRecord;

/// Header names recognized as the keyword column, highest priority first.
/// When none match, the first column is used.
const COLUMN_PRIORITY: [&str; 3] = ["kwName", "Keyword", "keyword"];

/// Keyword source backed by a spreadsheet (`.xlsx`/`.xls`) or delimited
/// text file. The first row is always treated as a header.
pub struct FileKeywordSource {
    path: PathBuf,
    policy: SelectionPolicy,
    used_rows: Mutex<HashSet<usize>>,
}

impl FileKeywordSource {
    pub fn new(path: PathBuf, policy: SelectionPolicy) -> Self {
        Self {
            path,
            policy,
            used_rows: Mutex::new(HashSet::new()),
        }
    }

    fn load_keywords(&self) -> Result<Vec<String>> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        let rows = match extension.as_str() {
            "xlsx" | "xls" => read_spreadsheet(&self.path)?,
            "tsv" | "tab" => read_delimited(&self.path, b'\t')?,
            _ => read_delimited(&self.path, b',')?,
        };
        self.keywords_from_rows(rows)
    }

    fn keywords_from_rows(&self, rows: Vec<Vec<String>>) -> Result<Vec<String>> {
        let Some((header, data)) = rows.split_first() else {
            return Err(AgentError::data_source(format!(
                "no keywords found in {}",
                self.path.display()
            )));
        };

        let column = keyword_column(header);
        let keywords: Vec<String> = data
            .iter()
            .filter_map(|row| row.get(column))
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect();

        if keywords.is_empty() {
            return Err(AgentError::data_source(format!(
                "no keywords found in {}",
                self.path.display()
            )));
        }
        Ok(keywords)
    }

    async fn next_unused_row(&self, len: usize) -> usize {
        let mut used = self.used_rows.lock().await;
        if used.len() >= len {
            used.clear();
        }
        let row = (0..len).find(|idx| !used.contains(idx)).unwrap_or(0);
        used.insert(row);
        row
    }
}

fn keyword_column(header: &[String]) -> usize {
    for candidate in COLUMN_PRIORITY {
        if let Some(idx) = header.iter().position(|cell| cell.trim() == candidate) {
            return idx;
        }
    }
    0
}

fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AgentError::data_source(format!("failed to open {}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            AgentError::data_source(format!("{} contains no worksheets", path.display()))
        })?
        .map_err(|e| AgentError::data_source(format!("failed to read {}: {}", path.display(), e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AgentError::data_source(format!("failed to open {}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            AgentError::data_source(format!("failed to read {}: {}", path.display(), e))
        })?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(rows)
}

#[async_trait]
impl KeywordSource for FileKeywordSource {
    async fn next_keyword(&self, explicit: Option<&str>) -> Result<KeywordRecord> {
        if let Some(raw) = explicit {
            let text = raw.trim();
            if text.is_empty() {
                return Err(AgentError::data_source("explicit keyword is empty"));
            }
            return Ok(KeywordRecord {
                text: text.to_string(),
                row: None,
            });
        }

        let keywords = self.load_keywords()?;
        let row = match self.policy {
            SelectionPolicy::Random => rand::thread_rng().gen_range(0..keywords.len()),
            SelectionPolicy::Sequential => self.next_unused_row(keywords.len()).await,
        };
        debug!("selected keyword row {} of {}", row, keywords.len());

        Ok(KeywordRecord {
            text: keywords[row].clone(),
            row: Some(row),
        })
    }
}
