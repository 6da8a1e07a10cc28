/// Balance discretization and state interning
///
/// Search states are vectors of balances snapped to a magnitude-dependent
/// grid: coarse where balances are large and decisions are insensitive to a
/// few hundred dollars, fine near payoff where they matter. A snapped vector
/// is interned to a 32-bit key by combining three independent hashes; all
/// arithmetic is 32-bit modular.
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PRIMES: [u32; 5] = [982_451_653, 982_451_679, 982_451_707, 982_451_719, 982_451_783];
const FIBONACCI: [u32; 10] = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
const GOLDEN: u32 = 0x9e37_79b9;

/// Grid quantum for a balance magnitude, in whole dollars
pub fn quantum(balance: Decimal) -> Decimal {
    if balance <= dec!(500) {
        dec!(25)
    } else if balance <= dec!(5000) {
        dec!(100)
    } else {
        dec!(250)
    }
}

/// Snap a balance to its grid, returning whole dollars.
///
/// Balances at or below $1 collapse to zero, so near-payoff residue does not
/// multiply states.
pub fn discretize(balance: Decimal) -> i64 {
    if balance <= Decimal::ONE {
        return 0;
    }
    let q = quantum(balance);
    let steps = (balance / q).round();
    (steps * q).to_i64().unwrap_or(0)
}

/// Snap a balance to its grid as a decimal dollar amount
pub fn snap(balance: Decimal) -> Decimal {
    Decimal::from(discretize(balance))
}

/// Snap every balance in a vector
pub fn snap_all(balances: &[Decimal]) -> Vec<Decimal> {
    balances.iter().map(|&b| snap(b)).collect()
}

/// Total discretized debt across a balance vector
pub fn grid_total(balances: &[Decimal]) -> i64 {
    balances.iter().map(|&b| discretize(b)).sum()
}

/// Intern a discretized balance vector to a 32-bit state key.
///
/// H1 is a prime-weighted sum, H2 a rolling hash with Fibonacci weights,
/// H3 a golden-ratio xor fold; the final key shifts them apart so single-debt
/// changes perturb all 32 bits.
pub fn state_key(balances: &[Decimal]) -> u32 {
    let mut h1: u32 = 0;
    let mut h2: u32 = 0;
    let mut h3: u32 = 0;
    for (i, &balance) in balances.iter().enumerate() {
        let v = discretize(balance) as u32;
        h1 = h1.wrapping_add(v.wrapping_mul(PRIMES[i % 5]));
        h2 = (h2 << 7)
            .wrapping_sub(h2)
            .wrapping_add(v.wrapping_mul(FIBONACCI[i % 10]));
        h3 ^= v.wrapping_mul(GOLDEN);
    }
    h1 ^ (h2 << 11) ^ (h3 << 21)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_quantum_bands() {
        assert_eq!(quantum(dec!(500)), dec!(25));
        assert_eq!(quantum(dec!(500.01)), dec!(100));
        assert_eq!(quantum(dec!(5000)), dec!(100));
        assert_eq!(quantum(dec!(5000.01)), dec!(250));
    }

    #[test]
    fn test_discretize_small_balances_collapse() {
        assert_eq!(discretize(dec!(0)), 0);
        assert_eq!(discretize(dec!(1)), 0);
        assert_eq!(discretize(dec!(0.99)), 0);
        assert_eq!(discretize(dec!(1.01)), 0); // rounds down to the zero step
    }

    #[test]
    fn test_discretize_snaps_to_nearest_step() {
        assert_eq!(discretize(dec!(112)), 100);
        assert_eq!(discretize(dec!(113)), 125);
        assert_eq!(discretize(dec!(4951)), 5000);
        assert_eq!(discretize(dec!(10100)), 10000);
        assert_eq!(discretize(dec!(10130)), 10250);
    }

    #[test]
    fn test_state_key_distinguishes_order() {
        let a = [dec!(1000), dec!(2000)];
        let b = [dec!(2000), dec!(1000)];
        assert_ne!(state_key(&a), state_key(&b));
    }

    #[test]
    fn test_state_key_stable_for_equal_grids() {
        // different balances inside the same grid cell intern identically
        let a = [dec!(1010), dec!(2040)];
        let b = [dec!(990), dec!(1960)];
        assert_eq!(state_key(&a), state_key(&b));
    }

    #[test]
    fn test_state_key_empty_vector() {
        assert_eq!(state_key(&[]), 0);
    }

    #[quickcheck]
    fn prop_discretize_within_half_quantum(cents: u32) -> bool {
        let balance = Decimal::new(cents as i64, 2);
        if balance <= Decimal::ONE {
            return discretize(balance) == 0;
        }
        let q = quantum(balance);
        let snapped = Decimal::from(discretize(balance));
        // quantum is measured at the input balance; a snap across the band
        // boundary is judged against that input-side quantum
        (balance - snapped).abs() <= q / dec!(2)
    }

    #[quickcheck]
    fn prop_snap_is_idempotent(cents: u32) -> bool {
        let balance = Decimal::new(cents as i64, 2);
        let once = snap(balance);
        snap(once) == once
    }
}
