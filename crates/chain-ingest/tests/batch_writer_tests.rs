mod common;

use std::sync::Arc;

use arrow::array::{Array, Int64Array, StringArray};
use chain_ingest::domain::{MessageKind, SegmentRange, TablePath};
use chain_ingest::error::Error;
use chain_ingest::fetch::RetryingFetcher;
use chain_ingest::ingest::BatchWriter;
use chain_ingest::progress::{ProgressEvent, progress_channel};
use chain_ingest::sink::InMemorySink;
use common::{FakeRpc, collect_events};
use tokio_util::sync::CancellationToken;

fn writer(
    rpc: FakeRpc,
    batch_size: u64,
) -> (BatchWriter<FakeRpc, InMemorySink>, Arc<InMemorySink>) {
    let sink = Arc::new(InMemorySink::new());
    let fetcher = RetryingFetcher::new(Arc::new(rpc), 3);
    let writer = BatchWriter::new(fetcher, Arc::clone(&sink), batch_size).expect("writer");
    (writer, sink)
}

#[tokio::test]
async fn three_full_batches_make_exactly_three_flushes() {
    let (writer, sink) = writer(FakeRpc::new(1), 4);

    let summary = writer.ingest_range(10, 21).await.expect("ingest");
    let ranges: Vec<SegmentRange> = summary.flushes.iter().map(|f| f.range).collect();
    assert_eq!(
        ranges,
        vec![
            SegmentRange::new(10, 13),
            SegmentRange::new(14, 17),
            SegmentRange::new(18, 21),
        ]
    );
    assert_eq!(summary.blocks, 12);
    assert_eq!(sink.table(TablePath::Headers).expect("headers").len(), 3);
}

#[tokio::test]
async fn synthetic_thousand_blocks_flush_twice() {
    let (tx, mut rx, _) = progress_channel(64).expect("progress channel");
    let sink = Arc::new(InMemorySink::new());
    let fetcher = RetryingFetcher::new(Arc::new(FakeRpc::new(2)), 3).with_progress(tx);
    let writer = BatchWriter::new(fetcher, Arc::clone(&sink), 500).expect("writer");

    let summary = writer.ingest_range(1000, 1999).await.expect("ingest");
    assert_eq!(summary.flushes.len(), 2);
    assert_eq!(summary.flushes[0].range, SegmentRange::new(1000, 1499));
    assert_eq!(summary.flushes[1].range, SegmentRange::new(1500, 1999));
    assert_eq!(summary.unrecognized_msgs, 1000);

    for table in [TablePath::Headers, TablePath::Txs, TablePath::Messages(MessageKind::Send)] {
        let segments = sink.table(table).expect("segments");
        let rows: Vec<usize> = segments.iter().map(|s| s.batch.num_rows()).collect();
        let expected = match table {
            TablePath::Txs => vec![1000, 1000],
            _ => vec![500, 500],
        };
        assert_eq!(rows, expected, "{table}");
    }

    for segment in sink
        .table(TablePath::Messages(MessageKind::Send))
        .expect("send segments")
    {
        let batch = &segment.batch;
        let names: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(
            names,
            vec!["height", "hash", "index", "from_address", "to_address", "amount"]
        );
        for column in batch.columns() {
            assert_eq!(column.null_count(), 0);
        }
        let heights = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("height column");
        assert!(heights.iter().flatten().all(|h| {
            h as u64 >= segment.range.start && h as u64 <= segment.range.end
        }));
    }

    // Only known kinds get tables.
    assert_eq!(sink.segments().expect("segments").len(), 6);

    let events = collect_events(&mut rx).await;
    assert_eq!(
        events,
        vec![
            ProgressEvent::Blocks(500),
            ProgressEvent::Txs(1000),
            ProgressEvent::Blocks(500),
            ProgressEvent::Txs(1000),
        ]
    );
}

#[tokio::test]
async fn short_tail_gets_its_own_segment() {
    let (writer, sink) = writer(FakeRpc::new(2), 250);

    let summary = writer.ingest_range(1, 600).await.expect("ingest");
    let ranges: Vec<SegmentRange> = summary.flushes.iter().map(|f| f.range).collect();
    assert_eq!(
        ranges,
        vec![
            SegmentRange::new(1, 250),
            SegmentRange::new(251, 500),
            SegmentRange::new(501, 600),
        ]
    );
    assert_eq!(sink.rows(TablePath::Headers).expect("rows"), 600);
}

#[tokio::test]
async fn empty_blocks_still_write_header_and_tx_segments() {
    let (writer, sink) = writer(FakeRpc::new(0), 10);

    let summary = writer.ingest_range(1, 5).await.expect("ingest");
    assert_eq!(summary.txs, 0);
    let txs = sink.table(TablePath::Txs).expect("txs");
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].batch.num_rows(), 0);
    assert_eq!(txs[0].range, SegmentRange::new(1, 5));
    assert_eq!(sink.table(TablePath::Headers).expect("headers")[0].batch.num_rows(), 5);
}

#[tokio::test]
async fn inverted_range_writes_nothing() {
    let (writer, sink) = writer(FakeRpc::new(1), 10);

    let summary = writer.ingest_range(20, 19).await.expect("ingest");
    assert!(summary.flushes.is_empty());
    assert!(sink.segments().expect("segments").is_empty());
}

#[tokio::test]
async fn failing_block_aborts_the_range_after_earlier_flushes() {
    let (writer, sink) = writer(FakeRpc::new(1).break_height(7), 3);

    let err = writer.ingest_range(1, 9).await.expect_err("block 7 is broken");
    assert!(matches!(err, Error::RetriesExceeded { height: 7, .. }));
    let ranges: Vec<SegmentRange> = sink
        .table(TablePath::Headers)
        .expect("headers")
        .iter()
        .map(|s| s.range)
        .collect();
    assert_eq!(ranges, vec![SegmentRange::new(1, 3), SegmentRange::new(4, 6)]);
}

#[tokio::test]
async fn transaction_at_wrong_height_is_rejected() {
    let stray = common::synthetic_tx(99, 0);
    let (writer, _sink) = writer(FakeRpc::new(1).with_txs(5, vec![stray]), 10);

    let err = writer.ingest_range(5, 5).await.expect_err("height mismatch");
    assert!(matches!(
        err,
        Error::HeightMismatch {
            expected: 5,
            got: 99
        }
    ));
}

#[tokio::test]
async fn cancellation_flushes_gathered_blocks_and_stops() {
    let cancel = CancellationToken::new();
    let rpc = FakeRpc::new(1).cancel_when_reaching(4, cancel.clone());
    let sink = Arc::new(InMemorySink::new());
    let fetcher = RetryingFetcher::new(Arc::new(rpc), 3);
    let writer = BatchWriter::new(fetcher, Arc::clone(&sink), 100)
        .expect("writer")
        .with_cancellation(cancel);

    let err = writer.ingest_range(1, 50).await.expect_err("cancelled");
    assert!(matches!(err, Error::Cancelled));

    // Block 4 was in flight when the token fired and completes; 5 never starts.
    let headers = sink.table(TablePath::Headers).expect("headers");
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].range, SegmentRange::new(1, 4));
    assert_eq!(headers[0].batch.num_rows(), 4);

    let hashes = sink.table(TablePath::Txs).expect("txs")[0].batch.clone();
    let idx = hashes.schema().index_of("hash").expect("hash column");
    let col = hashes
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("utf8");
    assert_eq!(col.len(), 4);
}

#[tokio::test]
async fn zero_batch_size_is_rejected() {
    let fetcher = RetryingFetcher::new(Arc::new(FakeRpc::new(1)), 3);
    let err = BatchWriter::new(fetcher, Arc::new(InMemorySink::new()), 0)
        .err()
        .expect("batch size 0 must fail");
    assert!(err.to_string().contains("batch_size"));
}
