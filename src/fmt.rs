//! Shared pure formatting helpers for the dashboard widgets.

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Byte count as fractional GiB.
pub fn gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Byte count as a whole-MiB table cell, e.g. `"512 MB"`.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.0} MB", bytes as f64 / MIB)
}

/// Used/total memory line, e.g. `"3.2/8.0 GB (40%)"`.
pub fn format_memory(used: u64, total: u64, percent: f64) -> String {
    format!("{:.1}/{:.1} GB ({:.0}%)", gib(used), gib(total), percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gib_converts_bytes() {
        assert_eq!(gib(1024 * 1024 * 1024), 1.0);
        assert_eq!(gib(0), 0.0);
    }

    #[test]
    fn format_mib_rounds_to_whole_mebibytes() {
        assert_eq!(format_mib(512 * 1024 * 1024), "512 MB");
        assert_eq!(format_mib(0), "0 MB");
    }

    #[test]
    fn format_memory_shows_used_total_and_percent() {
        let gib_bytes = 1024u64 * 1024 * 1024;
        assert_eq!(format_memory(gib_bytes, 4 * gib_bytes, 25.0), "1.0/4.0 GB (25%)");
    }
}
