//! Duel outcome resolution.
//!
//! Pure decision functions: given the two power values, a resolution
//! mode, and a random source, pick the winner. With a fixed rng
//! sequence the outcome is fully reproducible.

use crate::config::ResolutionMode;
use rand::Rng;

/// The two sides of a duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelSide {
    Challenger,
    Target,
}

/// Pick the winner from two power values.
///
/// `HigherWins` compares directly and breaks ties with a coin flip.
/// `Ratio` gives the challenger a `cp / (cp + tp)` win probability via
/// an integer draw; when both powers are zero the draw degenerates to
/// the coin flip.
pub fn resolve<R: Rng + ?Sized>(
    mode: ResolutionMode,
    challenger_power: i64,
    target_power: i64,
    rng: &mut R,
) -> DuelSide {
    match mode {
        ResolutionMode::HigherWins => match challenger_power.cmp(&target_power) {
            std::cmp::Ordering::Greater => DuelSide::Challenger,
            std::cmp::Ordering::Less => DuelSide::Target,
            std::cmp::Ordering::Equal => coin_flip(rng),
        },
        ResolutionMode::Ratio => {
            let cp = challenger_power.max(0) as u64;
            let tp = target_power.max(0) as u64;
            let total = cp + tp;
            if total == 0 {
                coin_flip(rng)
            } else if rng.gen_range(0..total) < cp {
                DuelSide::Challenger
            } else {
                DuelSide::Target
            }
        }
    }
}

/// Fair coin flip between the two sides.
pub fn coin_flip<R: Rng + ?Sized>(rng: &mut R) -> DuelSide {
    if rng.gen_bool(0.5) {
        DuelSide::Challenger
    } else {
        DuelSide::Target
    }
}

/// One percentage gate draw: true with `percent` in 100 probability.
pub fn percent_roll<R: Rng + ?Sized>(percent: u8, rng: &mut R) -> bool {
    rng.gen_range(0u32..100) < percent as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_higher_wins_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            resolve(ResolutionMode::HigherWins, 120, 80, &mut rng),
            DuelSide::Challenger
        );
        assert_eq!(
            resolve(ResolutionMode::HigherWins, 80, 120, &mut rng),
            DuelSide::Target
        );
    }

    #[test]
    fn test_equal_powers_flip_roughly_fair() {
        let mut rng = StdRng::seed_from_u64(7);
        let challenger_wins = (0..2000)
            .filter(|_| {
                resolve(ResolutionMode::HigherWins, 50, 50, &mut rng) == DuelSide::Challenger
            })
            .count();
        assert!((800..=1200).contains(&challenger_wins));
    }

    #[test]
    fn test_ratio_zero_powers_completes() {
        let mut rng = StdRng::seed_from_u64(11);
        let challenger_wins = (0..2000)
            .filter(|_| resolve(ResolutionMode::Ratio, 0, 0, &mut rng) == DuelSide::Challenger)
            .count();
        assert!((800..=1200).contains(&challenger_wins));
    }

    #[test]
    fn test_ratio_biases_toward_stronger_side() {
        let mut rng = StdRng::seed_from_u64(3);
        let challenger_wins = (0..2000)
            .filter(|_| resolve(ResolutionMode::Ratio, 300, 100, &mut rng) == DuelSide::Challenger)
            .count();
        // Expected share 0.75.
        assert!((1350..=1650).contains(&challenger_wins));
    }

    #[test]
    fn test_ratio_one_sided_power() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(
                resolve(ResolutionMode::Ratio, 10, 0, &mut rng),
                DuelSide::Challenger
            );
        }
    }

    #[test]
    fn test_percent_roll_extremes() {
        let mut rng = StdRng::seed_from_u64(9);
        assert!((0..100).all(|_| percent_roll(100, &mut rng)));
        assert!((0..100).all(|_| !percent_roll(0, &mut rng)));
    }

    #[test]
    fn test_seeded_resolution_reproducible() {
        let pick = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            resolve(ResolutionMode::Ratio, 60, 40, &mut rng)
        };
        assert_eq!(pick(42), pick(42));
    }
}
