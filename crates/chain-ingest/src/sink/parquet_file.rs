use std::fs::{self, File};
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::domain::{SegmentRange, TablePath};
use crate::error::{Error, Result};
use crate::sink::SegmentSink;

/// Writes each segment as `root/<table>/block_{start}-{end}.parquet`.
#[derive(Debug, Clone)]
pub struct ParquetSink {
    root: PathBuf,
}

impl ParquetSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn segment_path(&self, table: &TablePath, range: SegmentRange) -> PathBuf {
        self.root.join(table.relative_dir()).join(range.file_name())
    }
}

impl SegmentSink for ParquetSink {
    fn append_segment(
        &self,
        table: &TablePath,
        batch: RecordBatch,
        range: SegmentRange,
    ) -> Result<()> {
        let path = self.segment_path(table, range);
        let dir = self.root.join(table.relative_dir());
        fs::create_dir_all(&dir).map_err(|e| Error::Io(format!("create {}: {e}", dir.display())))?;

        // Written under a temporary name so readers never see a partial segment.
        let tmp = path.with_extension(format!("parquet.tmp.{}", std::process::id()));
        if let Err(e) = write_batch(&tmp, batch) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &path)
            .map_err(|e| Error::Io(format!("rename segment {}: {e}", path.display())))?;
        tracing::debug!(table = %table, range = %range, path = %path.display(), "wrote segment");
        Ok(())
    }
}

fn write_batch(path: &Path, batch: RecordBatch) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::Io(format!("create parquet file: {e}")))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| Error::Io(format!("create parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| Error::Io(format!("write parquet batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::Io(format!("close parquet writer: {e}")))?;
    Ok(())
}

/// Reads every record batch of one segment file.
pub fn read_segment(path: &Path) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(
        File::open(path).map_err(|e| Error::Io(format!("open {}: {e}", path.display())))?,
    )
    .map_err(|e| Error::Io(format!("build segment reader: {e}")))?
    .build()
    .map_err(|e| Error::Io(format!("open segment batch reader: {e}")))?;

    reader
        .map(|batch| batch.map_err(|e| Error::Io(format!("read segment batch: {e}"))))
        .collect()
}
