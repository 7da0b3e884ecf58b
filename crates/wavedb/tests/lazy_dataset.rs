mod common;

use std::path::Path;
use std::sync::Arc;

use common::{lazy_record, write_dataset, RecordingDecoder};
use wavedb::{DatasetEngine, DatasetKind};
use wavedb_core::{AudioDataset, AugmentConfig, DatasetError, DatasetMetadata, DatasetOptions};

const SR: usize = 24000;
const N_SIGNAL: usize = 4096;

fn two_records(dir: &Path, declared_channels: usize) {
    write_dataset(
        dir,
        &DatasetMetadata {
            lazy: true,
            channels: Some(declared_channels),
            sr: Some(SR),
        },
        &[
            ("00000000", lazy_record("10", "1", "/audio/long.flac")),
            ("00000001", lazy_record("5", "1", "/audio/short.flac")),
        ],
    );
}

#[test]
fn test_lazy_index_and_offsets() {
    let dir = tempfile::tempdir().unwrap();
    two_records(dir.path(), 1);

    let decoder = Arc::new(RecordingDecoder::new(16384));
    let options = DatasetOptions::new(AugmentConfig::plain(SR, N_SIGNAL));
    let engine = DatasetEngine::open_with_decoder(dir.path(), &options, decoder.clone()).unwrap();

    assert_eq!(engine.kind(), DatasetKind::Lazy);
    assert_eq!(engine.len(), 58 + 29);

    let window = engine.get(0).unwrap();
    assert_eq!(window.shape(), (1, N_SIGNAL));
    let window = engine.get(58).unwrap();
    assert_eq!(window.shape(), (1, N_SIGNAL));
    engine.get(86).unwrap();

    let calls = decoder.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].path, Path::new("/audio/long.flac"));
    assert_eq!(calls[0].start_secs, 0.0);
    assert_eq!(calls[0].duration_secs, 2.0 * N_SIGNAL as f64 / SR as f64);
    assert_eq!(calls[0].sample_rate, SR);
    assert_eq!(calls[1].path, Path::new("/audio/short.flac"));
    assert_eq!(calls[1].start_secs, 0.0);
    assert_eq!(calls[2].start_secs, (28 * N_SIGNAL) as f64 / SR as f64);

    assert!(matches!(
        engine.get(87),
        Err(DatasetError::Index { index: 87, len: 87 })
    ));
}

#[test]
fn test_lazy_windows_stay_in_range() {
    let dir = tempfile::tempdir().unwrap();
    two_records(dir.path(), 1);

    let config = AugmentConfig {
        normalize: true,
        gain_db: 12.0,
        eq_p: 1.0,
        ..AugmentConfig::plain(SR, N_SIGNAL)
    };
    let engine = DatasetEngine::open_with_decoder(
        dir.path(),
        &DatasetOptions::new(config),
        Arc::new(RecordingDecoder::new(20000)),
    )
    .unwrap();

    for index in [0, 30, 57, 58, 86] {
        let window = engine.get(index).unwrap();
        assert_eq!(window.shape(), (1, N_SIGNAL));
        assert!(window.peak() <= 1.0 + 1e-4, "peak {} at {index}", window.peak());
    }
}

#[test]
fn test_lazy_upmix_duplicates_channel() {
    let dir = tempfile::tempdir().unwrap();
    two_records(dir.path(), 2);

    let decoder = Arc::new(RecordingDecoder::new(1000));
    let options = DatasetOptions::new(AugmentConfig::plain(SR, N_SIGNAL)).with_channels(2);
    let engine = DatasetEngine::open_with_decoder(dir.path(), &options, decoder.clone()).unwrap();

    let window = engine.get(3).unwrap();
    assert_eq!(window.shape(), (2, N_SIGNAL));
    let channels: Vec<usize> = decoder.calls().iter().map(|c| c.channel).collect();
    assert_eq!(channels, vec![0, 0]);
}

#[test]
fn test_too_many_channels_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    two_records(dir.path(), 1);

    let options = DatasetOptions::new(AugmentConfig::plain(SR, N_SIGNAL)).with_channels(2);
    let err = DatasetEngine::open_with_decoder(dir.path(), &options, Arc::new(RecordingDecoder::new(0)))
        .err()
        .unwrap();
    assert!(matches!(err, DatasetError::Config(_)));
    assert!(err.is_systemic());
}

#[test]
fn test_split_over_lazy_dataset() {
    let dir = tempfile::tempdir().unwrap();
    two_records(dir.path(), 1);

    let options = DatasetOptions::new(AugmentConfig::plain(SR, N_SIGNAL));
    let engine =
        DatasetEngine::open_with_decoder(dir.path(), &options, Arc::new(RecordingDecoder::new(0))).unwrap();

    let (train, val) = engine.split(10, None);
    assert_eq!(val.len(), 8);
    assert_eq!(train.len() + val.len(), engine.len());

    let (train_again, _) = engine.split(10, None);
    assert_eq!(train.indices(), train_again.indices());
    assert_eq!(val.get(0).unwrap().shape(), (1, N_SIGNAL));
}

#[test]
fn test_dataset_rate_differs_from_training_rate() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(
        dir.path(),
        &DatasetMetadata {
            lazy: true,
            channels: Some(1),
            sr: Some(48000),
        },
        &[
            ("00000000", lazy_record("10", "1", "/audio/long.flac")),
            ("00000001", lazy_record("5", "1", "/audio/short.flac")),
        ],
    );

    let decoder = Arc::new(RecordingDecoder::new(16384));
    let options = DatasetOptions::new(AugmentConfig::plain(SR, N_SIGNAL));
    let engine = DatasetEngine::open_with_decoder(dir.path(), &options, decoder.clone()).unwrap();

    let info = engine.info();
    assert_eq!((info.dataset_sample_rate, info.sample_rate), (48000, SR));
    assert_eq!(info.stages[0], "resample");
    // windows are counted at the dataset rate
    assert_eq!(engine.len(), 117 + 58);

    let window = engine.get(117).unwrap();
    assert_eq!(window.shape(), (1, N_SIGNAL));
    assert_eq!(window.sample_rate, SR);
    let head: f32 = window.channel(0)[..32].iter().sum::<f32>() / 32.0;
    assert!(head > 0.4, "leading silence, mean {head}");
    assert!(window.channel(0)[32..N_SIGNAL - 32]
        .iter()
        .all(|v| (v - 0.5).abs() < 0.05));

    let calls = decoder.calls();
    assert_eq!(calls[0].path, Path::new("/audio/short.flac"));
    assert_eq!(calls[0].sample_rate, 48000);
    assert_eq!(calls[0].duration_secs, 2.0 * N_SIGNAL as f64 / 48000.0);
}
