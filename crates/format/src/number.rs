//! Compact magnitude rendering for large figures (market caps, volumes).

const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

/// Render `n` with one decimal and a magnitude suffix: `1.5K`, `23.4B`.
///
/// `None` renders as `"N/A"`. Values past the trillions stay in `T`.
pub fn compact_number(n: Option<f64>) -> String {
    let Some(mut n) = n else {
        return "N/A".to_string();
    };
    let mut magnitude = 0;
    while n.abs() >= 1000.0 && magnitude < SUFFIXES.len() - 1 {
        magnitude += 1;
        n /= 1000.0;
    }
    format!("{:.1}{}", n, SUFFIXES[magnitude])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitudes() {
        assert_eq!(compact_number(Some(999.0)), "999.0");
        assert_eq!(compact_number(Some(1_500.0)), "1.5K");
        assert_eq!(compact_number(Some(2_340_000.0)), "2.3M");
        assert_eq!(compact_number(Some(3_100_000_000.0)), "3.1B");
        assert_eq!(compact_number(Some(1_960_000_000_000.0)), "2.0T");
    }

    #[test]
    fn negatives_and_missing() {
        assert_eq!(compact_number(Some(-1_500.0)), "-1.5K");
        assert_eq!(compact_number(None), "N/A");
    }

    #[test]
    fn stays_in_trillions() {
        assert_eq!(compact_number(Some(5_000_000_000_000_000.0)), "5000.0T");
    }
}
