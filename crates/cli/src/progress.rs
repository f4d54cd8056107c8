use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner for a single transfer whose progress the backend does not report.
pub fn transfer_spinner(action: &str, name: &str, bytes: Option<u64>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap(),
    );
    let msg = match bytes {
        Some(bytes) => format!("{action} {name} ({})", format_bytes(bytes)),
        None => format!("{action} {name}"),
    };
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
