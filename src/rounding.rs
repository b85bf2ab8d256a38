//! Rounding helpers shared by the ladder, algorithm, and engine modules.

/// Round `x` to the nearest integer, breaking exact `.5` ties to the nearest
/// even integer (banker's rounding).
///
/// The engine pins every integer quantity computation to this rule so that a
/// round trip through the bracket ladder (buy at `node(k-1)`, sell back at
/// `node(k)`) returns the same share count it started with — truncation or
/// round-half-up would drift by a share on alternating cycles.
pub fn round_half_to_even(x: f64) -> i64 {
    if !x.is_finite() {
        return 0;
    }
    let floor = x.floor();
    let diff = x - floor;
    let floor_i = floor as i64;

    if diff < 0.5 {
        floor_i
    } else if diff > 0.5 {
        floor_i + 1
    } else if floor_i % 2 == 0 {
        floor_i
    } else {
        floor_i + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_half_to_even(0.5), 0);
        assert_eq!(round_half_to_even(1.5), 2);
        assert_eq!(round_half_to_even(2.5), 2);
        assert_eq!(round_half_to_even(3.5), 4);
        assert_eq!(round_half_to_even(-0.5), 0);
        assert_eq!(round_half_to_even(-1.5), -2);
    }

    #[test]
    fn non_ties_round_normally() {
        assert_eq!(round_half_to_even(4.2), 4);
        assert_eq!(round_half_to_even(4.8), 5);
        assert_eq!(round_half_to_even(-4.2), -4);
        assert_eq!(round_half_to_even(-4.8), -5);
    }

    #[test]
    fn non_finite_rounds_to_zero() {
        assert_eq!(round_half_to_even(f64::NAN), 0);
        assert_eq!(round_half_to_even(f64::INFINITY), 0);
    }
}
