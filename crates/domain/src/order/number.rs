//! Order number generation.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Generates a candidate order number of the form `ORD-yyyyMMddHHmmss-NNNN`.
///
/// The suffix is random, so callers must still check the number is unused.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(1000..=9999);
    format!("ORD-{}-{suffix}", now.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let number = generate_order_number(now);

        assert!(number.starts_with("ORD-20240309070501-"), "{number}");
        let suffix: u16 = number[19..].parse().unwrap();
        assert!((1000..=9999).contains(&suffix));
        assert_eq!(number.len(), 23);
    }
}
