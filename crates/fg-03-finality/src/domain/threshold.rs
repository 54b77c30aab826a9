//! 2/3 power threshold.

/// Power voters must hold for a block to be finalized: `floor(2 * total / 3) + 1`.
///
/// Computed in `u128`; the result always fits back into `u64`.
pub fn required_power(total_power: u64) -> u64 {
    (u128::from(total_power) * 2 / 3 + 1) as u64
}

/// Whether `voted_power` out of `total_power` finalizes a block.
///
/// No power means no quorum.
pub fn has_quorum(voted_power: u64, total_power: u64) -> bool {
    total_power > 0 && voted_power >= required_power(total_power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_required_power() {
        assert_eq!(required_power(3), 3);
        assert_eq!(required_power(100), 67);
        assert_eq!(required_power(10_000), 6_667);
    }

    #[test]
    fn test_zero_total_never_finalizes() {
        assert!(!has_quorum(0, 0));
    }

    #[test]
    fn test_exact_two_thirds_is_not_enough() {
        assert!(!has_quorum(200, 300));
        assert!(has_quorum(201, 300));
    }

    #[test]
    fn test_overflow_safe() {
        assert!(required_power(u64::MAX) < u64::MAX);
        assert!(has_quorum(u64::MAX, u64::MAX));
    }

    #[test]
    fn test_required_power_above_doubling_range() {
        let total = u64::MAX - 1;
        assert_eq!(required_power(total), 12_297_829_382_473_034_410);
        assert!(!has_quorum(12_297_829_382_473_034_409, total));
        assert!(has_quorum(12_297_829_382_473_034_410, total));
    }

    proptest! {
        #[test]
        fn quorum_is_strict_two_thirds(total in 1u64..1_000_000_000, voted in 0u64..1_000_000_000) {
            let voted = voted.min(total);
            let expected = 3 * voted as u128 > 2 * total as u128;
            prop_assert_eq!(has_quorum(voted, total), expected);
        }

        #[test]
        fn required_power_matches_wide_arithmetic(total in u64::MAX / 2..u64::MAX) {
            let expected = 2 * total as u128 / 3 + 1;
            prop_assert_eq!(required_power(total) as u128, expected);
            prop_assert!(3 * (required_power(total) as u128) > 2 * total as u128);
        }

        #[test]
        fn quorum_is_monotone_in_votes(total in 1u64..u64::MAX, voted in 0u64..u64::MAX) {
            if has_quorum(voted, total) {
                prop_assert!(has_quorum(voted.saturating_add(1), total));
            }
        }
    }
}
