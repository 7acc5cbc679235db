//! Bounded weighted rejection sampling.
//!
//! [`try_choose`] draws candidates proportionally to weight and validates
//! them one at a time, removing rejects, until one passes or the check
//! budget runs out. It puts a hard upper bound on expensive validations at
//! the cost of sometimes returning nothing when a valid candidate existed
//! but was never drawn. Callers treat "nothing" as a signal to fall back.

use std::sync::Mutex;

use rand::Rng;

/// Result of one validation predicate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid,
    /// The predicate itself failed; treated as [`Validation::Invalid`].
    Error(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome<T> {
    pub chosen: Option<T>,
    /// Validation predicate calls made.
    pub validations: usize,
    /// How many of those calls returned [`Validation::Error`].
    pub errors: usize,
}

/// Index drawn with probability proportional to weight, over a uniform
/// value in `[0, total)`. Non-positive weights are never drawn.
pub fn pick_weighted_index<R: Rng + ?Sized>(weights: &[f32], rng: &mut R) -> Option<usize> {
    let total: f32 = weights.iter().filter(|w| **w > 0.0).sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let pick = rng.gen::<f32>() * total;
    let mut acc = 0.0;
    let mut last_positive = None;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        acc += w;
        last_positive = Some(i);
        if pick < acc {
            return Some(i);
        }
    }
    // Float rounding can leave `pick` a hair above the final sum.
    last_positive
}

/// Draw, validate, and reject until a candidate passes or `max_checks`
/// validations have been spent.
///
/// `pool` and `weights` are parallel. Rejected candidates are removed by
/// swap-with-last; the accepted candidate is moved out and returned. On
/// failure the pool holds only candidates that were never validated.
pub fn try_choose<T, R, F>(
    pool: &mut Vec<T>,
    weights: &mut Vec<f32>,
    max_checks: usize,
    rng: &mut R,
    mut validate: F,
) -> SampleOutcome<T>
where
    R: Rng + ?Sized,
    F: FnMut(&T) -> Validation,
{
    let mut outcome = SampleOutcome {
        chosen: None,
        validations: 0,
        errors: 0,
    };
    let len = pool.len().min(weights.len());
    pool.truncate(len);
    weights.truncate(len);
    if len == 0 {
        return outcome;
    }

    let budget = max_checks.clamp(1, len);
    while outcome.validations < budget {
        let Some(idx) = pick_weighted_index(weights, rng) else {
            break;
        };
        outcome.validations += 1;
        let verdict = validate(&pool[idx]);
        weights.swap_remove(idx);
        let candidate = pool.swap_remove(idx);
        match verdict {
            Validation::Valid => {
                outcome.chosen = Some(candidate);
                return outcome;
            }
            Validation::Invalid => {}
            Validation::Error(_) => outcome.errors += 1,
        }
    }
    outcome
}

const MAX_RETAINED_LISTS: usize = 128;

/// Free list of scratch vectors reused across selections.
///
/// Lists are handed out empty and cleared on return; at most 128 are kept.
#[derive(Debug)]
pub struct ListPool<T> {
    free: Mutex<Vec<Vec<T>>>,
}

impl<T> Default for ListPool<T> {
    fn default() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }
}

impl<T> ListPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Vec<T> {
        self.with_free(|free| free.pop()).unwrap_or_default()
    }

    pub fn put(&self, mut list: Vec<T>) {
        list.clear();
        self.with_free(|free| {
            if free.len() < MAX_RETAINED_LISTS {
                free.push(list);
            }
        });
    }

    /// Lists currently parked in the pool.
    pub fn retained(&self) -> usize {
        self.with_free(|free| free.len())
    }

    fn with_free<U>(&self, f: impl FnOnce(&mut Vec<Vec<T>>) -> U) -> U {
        // A panic while holding the lock cannot leave a half-written list
        // behind, so a poisoned pool is still usable.
        let mut guard = match self.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_pool_chooses_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool: Vec<u32> = Vec::new();
        let mut weights = Vec::new();
        let out = try_choose(&mut pool, &mut weights, 5, &mut rng, |_| Validation::Valid);
        assert_eq!(out.chosen, None);
        assert_eq!(out.validations, 0);
    }

    #[test]
    fn third_draw_accepted_after_exactly_three_validations() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = vec!["a", "b", "c"];
        let mut weights = vec![1.0, 1.0, 1.0];
        let mut seen = Vec::new();
        let out = try_choose(&mut pool, &mut weights, 3, &mut rng, |c| {
            seen.push(*c);
            if seen.len() < 3 {
                Validation::Invalid
            } else {
                Validation::Valid
            }
        });
        assert_eq!(out.validations, 3);
        assert_eq!(out.chosen, Some(seen[2]));
        // Every candidate drawn exactly once.
        seen.sort_unstable();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn budget_bounds_validations() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool: Vec<u32> = (0..50).collect();
        let mut weights = vec![1.0; 50];
        let mut calls = 0;
        let out = try_choose(&mut pool, &mut weights, 12, &mut rng, |_| {
            calls += 1;
            Validation::Invalid
        });
        assert_eq!(out.chosen, None);
        assert_eq!(out.validations, 12);
        assert_eq!(calls, 12);
        // Only the twelve tried candidates were removed.
        assert_eq!(pool.len(), 38);
        assert_eq!(weights.len(), 38);
    }

    #[test]
    fn zero_budget_still_checks_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = vec![1, 2];
        let mut weights = vec![1.0, 1.0];
        let out = try_choose(&mut pool, &mut weights, 0, &mut rng, |_| Validation::Invalid);
        assert_eq!(out.validations, 1);
    }

    #[test]
    fn errors_count_as_rejections() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut pool = vec![1, 2];
        let mut weights = vec![1.0, 1.0];
        let out = try_choose(&mut pool, &mut weights, 10, &mut rng, |c| {
            if *c == 1 {
                Validation::Error("lookup failed".into())
            } else {
                Validation::Invalid
            }
        });
        assert_eq!(out.chosen, None);
        assert_eq!(out.validations, 2);
        assert_eq!(out.errors, 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn zero_weight_candidates_never_drawn() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let idx = pick_weighted_index(&[0.0, 2.0, -1.0, 0.0], &mut rng);
            assert_eq!(idx, Some(1));
        }
        assert_eq!(pick_weighted_index(&[0.0, -3.0], &mut rng), None);
        assert_eq!(pick_weighted_index(&[], &mut rng), None);
    }

    #[test]
    fn heavier_weights_drawn_more_often() {
        let mut rng = StdRng::seed_from_u64(42);
        let weights = [1.0, 9.0];
        let mut heavy = 0;
        for _ in 0..10_000 {
            if pick_weighted_index(&weights, &mut rng) == Some(1) {
                heavy += 1;
            }
        }
        assert!((8_500..9_500).contains(&heavy), "heavy = {heavy}");
    }

    #[test]
    fn list_pool_reuses_and_clears() {
        let pool: ListPool<u32> = ListPool::new();
        let mut list = pool.get();
        list.extend([1, 2, 3]);
        let cap = list.capacity();
        pool.put(list);
        assert_eq!(pool.retained(), 1);

        let again = pool.get();
        assert!(again.is_empty());
        assert_eq!(again.capacity(), cap);
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn list_pool_retains_at_most_128() {
        let pool: ListPool<u8> = ListPool::new();
        for _ in 0..200 {
            pool.put(Vec::with_capacity(4));
        }
        assert_eq!(pool.retained(), MAX_RETAINED_LISTS);
    }
}
