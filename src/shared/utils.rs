//! Utility functions and helpers

/// Format basis points as a percentage string (30 -> "0.30%")
pub fn format_bps(bps: u16) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bps() {
        assert_eq!(format_bps(30), "0.30%");
        assert_eq!(format_bps(10_000), "100.00%");
        assert_eq!(format_bps(5), "0.05%");
    }
}
