//! Total computation.

/// Round to the cent, halves away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn retail_total(price: f64, qty: i64) -> f64 {
    round_cents(price * qty as f64)
}

/// `discount` is a rate: 0.15 takes 15% off the unit price.
pub fn wholesale_total(price: f64, discount: f64, qty: i64) -> f64 {
    round_cents((price - price * discount) * qty as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retail_total() {
        assert_eq!(retail_total(12.99, 15), 194.85);
        assert_eq!(retail_total(2.90, 3), 8.7);
    }

    #[test]
    fn test_wholesale_total() {
        assert_eq!(wholesale_total(12.99, 0.15, 15), 165.62);
        assert_eq!(wholesale_total(22.50, 0.05, 2), 42.75);
        assert_eq!(wholesale_total(10.0, 0.0, 1), 10.0);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(3.14159), 3.14);
    }
}
