//! Snapshot save/load through the public API.

use hashlearn::persist::native::{HEADER_SIZE, MAGIC};
use hashlearn::testing::random_binary_samples;
use hashlearn::{Algorithm, LearnerConfig, Link, Loss, OnlineModel, SnapshotError};
use rstest::rstest;

const BITS: u32 = 10;

fn trained(algorithm: Algorithm) -> OnlineModel {
    let config = LearnerConfig::builder()
        .algorithm(algorithm)
        .loss(Loss::logistic())
        .link(Link::Logistic)
        .bits(BITS)
        .n_factors(4)
        .build()
        .unwrap();
    let mut model = OnlineModel::new(config).unwrap();
    for sample in random_binary_samples(500, BITS, 8, 0.05, 11) {
        model.learn(&sample);
    }
    model
}

#[rstest]
fn binary_roundtrip_is_bit_identical(
    #[values(
        Algorithm::SgdVw,
        Algorithm::Solo,
        Algorithm::PerCoordinateSolo,
        Algorithm::PerCoordinatePistol,
        Algorithm::Kt,
        Algorithm::PerCoordinateKt,
        Algorithm::Cocob,
        Algorithm::PerCoordinateCocob,
        Algorithm::FactorizationMachine
    )]
    algorithm: Algorithm,
) {
    let mut model = trained(algorithm);
    let bytes = model.to_bytes().unwrap();
    assert_eq!(&bytes[..4], MAGIC);
    assert!(bytes.len() > HEADER_SIZE);

    let mut loaded = OnlineModel::from_bytes(&bytes, BITS).unwrap();
    assert_eq!(loaded.description(), model.description());
    assert_eq!(loaded.weights(), model.weights());

    // Loaded and original keep learning in lockstep.
    for sample in random_binary_samples(50, BITS, 8, 0.05, 12) {
        let a = model.learn(&sample);
        let b = loaded.learn(&sample);
        assert_eq!(a.to_bits(), b.to_bits(), "{algorithm}");
    }
}

#[test]
fn json_roundtrip_keeps_hyperparameters() {
    let model = trained(Algorithm::PerCoordinateKt);
    let mut json = Vec::new();
    model.save_json(&mut json).unwrap();

    let text = std::str::from_utf8(&json).unwrap();
    assert!(text.contains("\"per_coordinate_kt\""));
    assert!(text.contains("\"logistic\""));

    let loaded = OnlineModel::load_json(json.as_slice(), BITS).unwrap();
    assert_eq!(loaded.algorithm(), Algorithm::PerCoordinateKt);
    assert_eq!(loaded.loss(), Loss::logistic());
    assert_eq!(loaded.link(), Link::Logistic);
    assert_eq!(loaded.prediction_range(), model.prediction_range());
    for sample in random_binary_samples(20, BITS, 8, 0.0, 13) {
        approx::assert_relative_eq!(loaded.predict(&sample), model.predict(&sample), max_relative = 1e-12);
    }
}

#[test]
fn loading_into_a_smaller_table_fails() {
    let bytes = trained(Algorithm::SgdVw).to_bytes().unwrap();
    let err = OnlineModel::from_bytes(&bytes, 4).unwrap_err();
    assert!(matches!(err, SnapshotError::IndexOutOfRange { table_size: 16, .. }), "{err}");
}

#[test]
fn garbage_is_not_a_snapshot() {
    let err = OnlineModel::from_bytes(&[0u8; 64], BITS).unwrap_err();
    assert!(matches!(err, SnapshotError::NotASnapshot));
}

#[test]
fn truncated_payload_is_reported() {
    let bytes = trained(Algorithm::Cocob).to_bytes().unwrap();
    let err = OnlineModel::from_bytes(&bytes[..bytes.len() - 3], BITS).unwrap_err();
    assert!(matches!(err, SnapshotError::Truncated { .. }));
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = OnlineModel::load_json(&b"{\"learner\": 3}"[..], BITS).unwrap_err();
    assert!(matches!(err, SnapshotError::Json(_)));
}
