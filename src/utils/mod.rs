pub mod attachment;

pub use attachment::{Attachment, MAX_ATTACHMENT_BYTES, strip_data_uri};

/// Count whitespace-separated words of the trimmed text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Format a duration in seconds as e.g. "1d 2h 3m 4s".
pub fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}
