use tokio::sync::mpsc;
use tracing::info;
use underlying_system::logging::init_logging;

#[test]
fn forwarded_logs_reach_the_channel() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    init_logging(Some(tx));
    // A second init must not panic.
    init_logging(None);

    info!("tag engine ready");

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    assert!(lines.iter().any(|l| l.contains("tag engine ready")));
}
