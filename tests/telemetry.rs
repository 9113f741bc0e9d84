use boundq::telemetry::{self, LOG_FORMAT_ENV};
use tracing::info;

// Own test binary: the global subscriber can be installed once per process.
#[test]
fn init_logging_installs_once() {
    std::env::set_var(LOG_FORMAT_ENV, "json");
    telemetry::init_logging().unwrap();
    info!(format = "json", "subscriber installed");

    assert!(
        telemetry::init_logging().is_err(),
        "a second global subscriber must be rejected"
    );
}
