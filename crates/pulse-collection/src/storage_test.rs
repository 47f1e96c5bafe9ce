//! Tests for bounded sample storage

use super::*;
use crate::accumulator::Accumulator;
use pulse_filtering::CollectionConfiguration;

/// Sample whose interval start encodes a sequence number via the etag
fn sample(seq: usize) -> Arc<Sample> {
    let info = pulse_protocol::ConfigurationInfo {
        etag: seq.to_string(),
        ..Default::default()
    };
    let (config, _) = CollectionConfiguration::build(&info, &[]);
    let acc = Accumulator::new(Arc::new(config));
    Arc::new(Sample::collect(&acc, Vec::new(), Vec::new(), false))
}

fn seqs(samples: &[Arc<Sample>]) -> Vec<usize> {
    samples.iter().map(|s| s.config_etag.parse().unwrap()).collect()
}

#[test]
fn test_store_and_drain_fifo() {
    let storage = SampleStorage::new();

    for seq in 0..3 {
        storage.store(sample(seq));
    }
    assert_eq!(storage.len(), 3);

    let drained = storage.drain();
    assert_eq!(seqs(&drained), vec![0, 1, 2]);
    assert!(storage.is_empty());
}

#[test]
fn test_capacity_evicts_exactly_the_oldest() {
    let storage = SampleStorage::new();

    for seq in 0..10 {
        storage.store(sample(seq));
    }
    assert_eq!(storage.len(), 10);

    // The 11th sample evicts exactly the oldest
    storage.store(sample(10));
    assert_eq!(storage.len(), 10);

    let drained = storage.drain();
    assert_eq!(seqs(&drained), (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_requeue_preserves_order() {
    let storage = SampleStorage::new();

    let failed = vec![sample(0), sample(1)];
    storage.store(sample(2));

    storage.requeue_front(failed);

    let drained = storage.drain();
    assert_eq!(seqs(&drained), vec![0, 1, 2]);
}

#[test]
fn test_requeue_then_trim_keeps_newest_ten() {
    let storage = SampleStorage::new();

    // Drain 5 samples for a post that will fail
    for seq in 0..5 {
        storage.store(sample(seq));
    }
    let failed = storage.drain();

    // 8 newer samples arrive while the post is in flight
    for seq in 5..13 {
        storage.store(sample(seq));
    }

    // Re-offering the failed batch trims to the most recent 10 overall
    storage.requeue_front(failed);
    assert_eq!(storage.len(), 10);

    let drained = storage.drain();
    assert_eq!(seqs(&drained), (3..=12).collect::<Vec<_>>());
}

#[test]
fn test_clear() {
    let storage = SampleStorage::new();
    storage.store(sample(0));
    storage.store(sample(1));

    storage.clear();
    assert!(storage.is_empty());
    assert!(storage.drain().is_empty());
}
