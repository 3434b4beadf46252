//! The tabular input model.
//!
//! A [`Dataset`] is an ordered list of named columns, each an ordered list of
//! optional cell values. `None` is the single canonical empty marker: the
//! loading layer maps blank cells and placeholder tokens (NA, null, ...) to
//! `None` before the data reaches any pipeline stage, so downstream code
//! never re-interprets missing-value spellings.
//!
//! [`DatasetStore`] is the input-collaborator seam: anything that can turn a
//! [`DatasetId`] into a materialized table. [`DatasetCache`] wraps a store
//! with a bounded least-recently-used cache; dataset ids are never reused, so
//! cached entries only need explicit invalidation when a dataset is replaced
//! wholesale.

use std::{collections::HashMap, fmt, path::Path, sync::Arc};

use anyhow::{Context, Result, ensure};
use encoding_rs::Encoding;
use serde::Serialize;
use uuid::Uuid;

use crate::io_utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DatasetId(Uuid);

impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Non-empty cell values in row order.
    pub fn non_empty(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(|v| v.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for column in &columns {
            ensure!(
                column.values.len() == row_count,
                "Column '{}' has {} row(s) but the dataset has {}",
                column.name,
                column.values.len(),
                row_count
            );
        }
        let mut seen = HashMap::new();
        for column in &columns {
            ensure!(
                seen.insert(column.name.as_str(), ()).is_none(),
                "Duplicate column name '{}'",
                column.name
            );
        }
        Ok(Self {
            id: DatasetId::new(),
            name: name.into(),
            columns,
            row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).and_then(|idx| self.column(idx))
    }

    /// Loads a delimited file into a dataset, normalizing blank and
    /// placeholder cells to the canonical empty marker.
    pub fn from_delimited_path(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)?;
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column::new(name.clone(), Vec::new()))
            .collect();

        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, encoding)?;
            for (idx, column) in columns.iter_mut().enumerate() {
                let cell = decoded.get(idx).map(|s| s.trim()).unwrap_or("");
                column.values.push(normalize_cell(cell));
            }
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("dataset")
            .to_string();
        Dataset::new(name, columns)
    }
}

/// Maps a raw cell onto the canonical empty marker.
pub fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_empty_marker(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Placeholder tokens treated as empty rather than string evidence.
pub fn is_empty_marker(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    matches!(
        lowered.as_str(),
        "na" | "n/a" | "n.a." | "null" | "none" | "missing"
    ) || lowered.chars().all(|c| c == '-') && !lowered.is_empty()
}

/// Input collaborator: materializes a dataset given its identifier.
pub trait DatasetStore {
    fn load(&self, id: DatasetId) -> Result<Dataset>;
}

/// Bounded LRU cache in front of a [`DatasetStore`].
pub struct DatasetCache<S> {
    store: S,
    capacity: usize,
    entries: HashMap<DatasetId, Arc<Dataset>>,
    recency: Vec<DatasetId>,
}

impl<S: DatasetStore> DatasetCache<S> {
    pub fn new(store: S, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fetch(&mut self, id: DatasetId) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.entries.get(&id) {
            let dataset = Arc::clone(dataset);
            self.touch(id);
            return Ok(dataset);
        }
        let dataset = Arc::new(self.store.load(id)?);
        if self.entries.len() >= self.capacity
            && !self.recency.is_empty()
        {
            let evicted = self.recency.remove(0);
            self.entries.remove(&evicted);
            log::debug!("evicted dataset {evicted} from cache");
        }
        self.entries.insert(id, Arc::clone(&dataset));
        self.recency.push(id);
        Ok(dataset)
    }

    /// Drops a cached entry after the underlying dataset was replaced.
    pub fn invalidate(&mut self, id: DatasetId) {
        self.entries.remove(&id);
        self.recency.retain(|cached| *cached != id);
    }

    fn touch(&mut self, id: DatasetId) {
        self.recency.retain(|cached| *cached != id);
        self.recency.push(id);
    }
}
