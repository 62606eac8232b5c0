use bigdecimal::{BigDecimal, ToPrimitive, Zero};

/// Points awarded per whole currency unit
pub const POINTS_PER_UNIT: i64 = 10;

/// Points for a receipt total. Fractions of a point are dropped and negative
/// totals earn nothing.
///
/// `timing_delta` is accepted for callers that track capture latency; it does
/// not change the award.
pub fn calculate_points(total: &BigDecimal, _timing_delta: i64) -> i64 {
    if *total <= BigDecimal::zero() {
        return 0;
    }

    (total * BigDecimal::from(POINTS_PER_UNIT))
        .with_scale(0)
        .to_i64()
        .unwrap_or(i64::MAX)
        .max(0)
}
