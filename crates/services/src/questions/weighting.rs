use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::HashSet;

use tutor_core::model::{Fact, FactId};

/// Repeat every high-operand fact `weight` times; other facts appear once.
#[must_use]
pub fn weighted_pool<'a>(facts: impl IntoIterator<Item = &'a Fact>, weight: usize) -> Vec<Fact> {
    let mut pool = Vec::new();
    for fact in facts {
        let copies = if fact.has_high_operand() { weight } else { 1 };
        pool.extend(std::iter::repeat_n(fact.clone(), copies));
    }
    pool
}

/// Pick `count` facts from a weighted pool.
///
/// The pool is shuffled, then walked twice: first taking only ids not seen
/// yet, then (only if still short) taking anything in shuffled order. Repeats
/// therefore appear only when the pool has fewer than `count` distinct ids.
pub fn select_unique_random<R: Rng + ?Sized>(
    pool: &[Fact],
    count: usize,
    rng: &mut R,
) -> Vec<Fact> {
    let mut used: HashSet<FactId> = HashSet::new();
    select_excluding(pool, count, &mut used, rng)
}

/// Same as `select_unique_random`, sharing `used` with earlier selections.
pub fn select_excluding<R: Rng + ?Sized>(
    pool: &[Fact],
    count: usize,
    used: &mut HashSet<FactId>,
    rng: &mut R,
) -> Vec<Fact> {
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);

    let mut selected = Vec::with_capacity(count);
    for fact in &shuffled {
        if selected.len() >= count {
            break;
        }
        if used.insert(fact.id().clone()) {
            selected.push(fact.clone());
        }
    }

    if !shuffled.is_empty() {
        for fact in shuffled.iter().cycle() {
            if selected.len() >= count {
                break;
            }
            selected.push(fact.clone());
        }
    }
    selected
}

/// One weighted draw, `None` for an empty list.
pub fn draw_weighted<R: Rng + ?Sized>(facts: &[Fact], weight: usize, rng: &mut R) -> Option<Fact> {
    weighted_pool(facts, weight).choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomSource;

    fn facts(keys: &[&str]) -> Vec<Fact> {
        keys.iter().map(|k| Fact::parse(k).unwrap()).collect()
    }

    #[test]
    fn high_operand_facts_are_repeated() {
        let pool = weighted_pool(&facts(&["2+1", "6+1", "1+9"]), 3);
        assert_eq!(pool.len(), 7);
        let sixes = pool.iter().filter(|f| f.id().as_str() == "6+1").count();
        assert_eq!(sixes, 3);
    }

    #[test]
    fn unique_until_exhausted() {
        let source = facts(&["2+1", "3+1", "4+1", "6+1", "7+1", "8+1"]);
        let pool = weighted_pool(&source, 5);
        let mut rng = RandomSource::Seeded(11).rng();
        for count in 1..=source.len() {
            let picked = select_unique_random(&pool, count, &mut rng);
            let ids: HashSet<_> = picked.iter().map(|f| f.id().clone()).collect();
            assert_eq!(picked.len(), count);
            assert_eq!(ids.len(), count, "duplicates with {count} of 6 unique");
        }
    }

    #[test]
    fn repeats_only_after_unique_pool_is_spent() {
        let pool = weighted_pool(&facts(&["2+1", "7+1"]), 3);
        let mut rng = RandomSource::Seeded(3).rng();
        let picked = select_unique_random(&pool, 6, &mut rng);
        assert_eq!(picked.len(), 6);
        let first_two: HashSet<_> = picked[..2].iter().map(|f| f.id().clone()).collect();
        assert_eq!(first_two.len(), 2);
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let mut rng = RandomSource::Seeded(1).rng();
        assert!(select_unique_random(&[], 4, &mut rng).is_empty());
        assert!(draw_weighted(&[], 3, &mut rng).is_none());
    }

    #[test]
    fn weighted_draws_follow_multiplicity() {
        let source = facts(&["2+1", "7+1"]);
        let mut rng = RandomSource::Seeded(2024).rng();
        let trials = 20_000;
        let high = (0..trials)
            .filter_map(|_| draw_weighted(&source, 5, &mut rng))
            .filter(|f| f.has_high_operand())
            .count();
        let ratio = high as f64 / (trials - high) as f64;
        assert!((4.5..5.5).contains(&ratio), "ratio {ratio}");
    }
}
