use tessera_logger::{LevelFilter, Logger, LoggerError};

#[test]
fn test_init_twice_returns_subscriber_error() {
    let _logger = Logger::builder()
        .name("tessera-init-twice")
        .level(LevelFilter::INFO)
        .init()
        .expect("first init should succeed");

    let err = Logger::builder()
        .name("tessera-init-twice-second")
        .level(LevelFilter::INFO)
        .init()
        .expect_err("second init should fail");

    assert!(
        matches!(err, LoggerError::Subscriber { .. }),
        "expected subscriber error for second init"
    );
}
