use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use arrow::array::{Array, BooleanArray};
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

use crate::domain::{SegmentRange, TablePath};
use crate::error::{Error, Result};
use crate::sink::read_segment;

/// Directory tree of an index: `headers/`, `txs/` and one directory per
/// message kind under `tx_msgs/`.
#[derive(Debug, Clone)]
pub struct IndexLayout {
    root: PathBuf,
}

impl IndexLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_dir(&self, table: TablePath) -> PathBuf {
        self.root.join(table.relative_dir())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for table in TablePath::all() {
            let dir = self.table_dir(table);
            fs::create_dir_all(&dir)
                .map_err(|e| Error::Io(format!("create {}: {e}", dir.display())))?;
        }
        Ok(())
    }

    /// Highest block covered by both the header and the transaction segments,
    /// or 0 for an empty index.
    pub fn last_indexed(&self) -> Result<u64> {
        let headers = self.max_upper_bound(TablePath::Headers)?;
        let txs = self.max_upper_bound(TablePath::Txs)?;
        if headers != txs {
            return Err(Error::Config(format!(
                "headers and txs segments don't match: headers end at {headers}, txs end at {txs}"
            )));
        }
        Ok(txs)
    }

    /// Segment files of `table` in block order. A missing directory is an
    /// empty table.
    pub fn segments(&self, table: TablePath) -> Result<Vec<(SegmentRange, PathBuf)>> {
        let dir = self.table_dir(table);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(format!("read {}: {e}", dir.display()))),
        };
        let mut segments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Io(format!("read {}: {e}", dir.display())))?;
            if let Some(range) = entry.file_name().to_str().and_then(parse_segment_name) {
                segments.push((range, entry.path()));
            }
        }
        segments.sort();
        Ok(segments)
    }

    /// Every record batch of `table`, segment by segment in block order.
    pub fn read_table(&self, table: TablePath) -> Result<Vec<RecordBatch>> {
        let mut batches = Vec::new();
        for (_, path) in self.segments(table)? {
            batches.extend(read_segment(&path)?);
        }
        Ok(batches)
    }

    /// Like [`read_table`](Self::read_table), keeping only the first row seen
    /// for each value of `column`. Rows with a null key are all kept.
    pub fn read_table_unique(&self, table: TablePath, column: &str) -> Result<Vec<RecordBatch>> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for batch in self.read_table(table)? {
            let idx = batch.schema().index_of(column).map_err(|e| {
                Error::Schema(format!("{table} has no column {column}: {e}"))
            })?;
            let keys = batch.column(idx);
            let mut keep = Vec::with_capacity(batch.num_rows());
            for row in 0..batch.num_rows() {
                if keys.is_null(row) {
                    keep.push(true);
                    continue;
                }
                let key = array_value_to_string(keys, row)
                    .map_err(|e| Error::Schema(format!("render {table}.{column}: {e}")))?;
                keep.push(seen.insert(key));
            }
            let filtered = filter_record_batch(&batch, &BooleanArray::from(keep))
                .map_err(|e| Error::Schema(format!("filter {table}: {e}")))?;
            if filtered.num_rows() > 0 {
                unique.push(filtered);
            }
        }
        Ok(unique)
    }

    fn max_upper_bound(&self, table: TablePath) -> Result<u64> {
        Ok(self
            .segments(table)?
            .iter()
            .map(|(range, _)| range.end)
            .max()
            .unwrap_or(0))
    }
}

/// Parses `block_{start}-{end}.parquet` back into its range.
pub fn parse_segment_name(file_name: &str) -> Option<SegmentRange> {
    let bounds = file_name
        .strip_prefix("block_")?
        .strip_suffix(".parquet")?;
    let (start, end) = bounds.split_once('-')?;
    Some(SegmentRange::new(start.parse().ok()?, end.parse().ok()?))
}

/// Parses the inclusive end block out of `block_{start}-{end}.parquet`.
pub fn segment_upper_bound(file_name: &str) -> Option<u64> {
    parse_segment_name(file_name).map(|range| range.end)
}
