//! Weighted random selection.
//!
//! Candidates carry an integer `probability_weighting`; selection samples the
//! cumulative weight distribution (roulette wheel). ForceIf-aware selection
//! first restricts the pool to the candidates with the highest ForceIf weight.
//!
//! # References
//!
//! Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine
//! Learning*, roulette wheel selection.

use rand::Rng;

/// An item with a relative selection weight.
pub trait Weighted {
    /// Relative selection weight. Zero-weight items are only chosen when
    /// every item in the pool has zero weight.
    fn probability_weighting(&self) -> u32;
}

/// An item that may carry a ForceIf score for the current NPC.
pub trait Prioritized: Weighted {
    fn force_if_weight(&self) -> u32;
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn probability_weighting(&self) -> u32 {
        (**self).probability_weighting()
    }
}

impl<T: Prioritized + ?Sized> Prioritized for &T {
    fn force_if_weight(&self) -> u32 {
        (**self).force_if_weight()
    }
}

/// Picks an index with probability proportional to its weight.
///
/// Falls back to a uniform draw when all weights are zero. Returns `None`
/// only for an empty slice.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use u_variants::selection::{select_by_probability, Weighted};
///
/// struct Item(u32);
/// impl Weighted for Item {
///     fn probability_weighting(&self) -> u32 { self.0 }
/// }
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let items = [Item(0), Item(5)];
/// assert_eq!(select_by_probability(&items, &mut rng), Some(1));
/// ```
pub fn select_by_probability<T: Weighted, R: Rng>(items: &[T], rng: &mut R) -> Option<usize> {
    let indices: Vec<usize> = (0..items.len()).collect();
    roulette(items, &indices, rng)
}

/// Picks among the items sharing the maximal ForceIf weight, if that
/// maximum is positive; otherwise among all items. Weighted either way.
pub fn select_force_if<T: Prioritized, R: Rng>(items: &[T], rng: &mut R) -> Option<usize> {
    let max = max_force_if(items);
    if max == 0 {
        return select_by_probability(items, rng);
    }
    let indices: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.force_if_weight() == max)
        .map(|(i, _)| i)
        .collect();
    roulette(items, &indices, rng)
}

/// Highest ForceIf weight in `items` (0 when empty).
pub fn max_force_if<T: Prioritized>(items: &[T]) -> u32 {
    items.iter().map(Prioritized::force_if_weight).max().unwrap_or(0)
}

/// Roulette wheel over the subset `indices` of `items`.
fn roulette<T: Weighted, R: Rng>(items: &[T], indices: &[usize], rng: &mut R) -> Option<usize> {
    if indices.is_empty() {
        return None;
    }
    if indices.len() == 1 {
        return Some(indices[0]);
    }

    let total: u64 = indices
        .iter()
        .map(|&i| u64::from(items[i].probability_weighting()))
        .sum();
    if total == 0 {
        return Some(indices[rng.random_range(0..indices.len())]);
    }

    let mut roll = rng.random_range(0..total);
    for &i in indices {
        let w = u64::from(items[i].probability_weighting());
        if roll < w {
            return Some(i);
        }
        roll -= w;
    }
    indices.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Debug, Clone)]
    struct Item {
        weight: u32,
        force_if: u32,
    }

    impl Weighted for Item {
        fn probability_weighting(&self) -> u32 {
            self.weight
        }
    }

    impl Prioritized for Item {
        fn force_if_weight(&self) -> u32 {
            self.force_if
        }
    }

    fn item(weight: u32, force_if: u32) -> Item {
        Item { weight, force_if }
    }

    #[test]
    fn test_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let items: Vec<Item> = Vec::new();
        assert_eq!(select_by_probability(&items, &mut rng), None);
        assert_eq!(select_force_if(&items, &mut rng), None);
    }

    #[test]
    fn test_zero_weight_never_chosen_among_positive() {
        let mut rng = StdRng::seed_from_u64(42);
        let items = vec![item(1, 0), item(0, 0), item(3, 0)];
        let mut counts = [0usize; 3];
        for _ in 0..4000 {
            counts[select_by_probability(&items, &mut rng).unwrap()] += 1;
        }
        assert_eq!(counts[1], 0);
        // Expected ratio 1:3.
        assert!(counts[2] > counts[0] * 2, "counts: {:?}", counts);
    }

    #[test]
    fn test_all_zero_weights_uniform() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = vec![item(0, 0), item(0, 0)];
        let mut seen = [false; 2];
        for _ in 0..200 {
            seen[select_by_probability(&items, &mut rng).unwrap()] = true;
        }
        assert!(seen[0] && seen[1]);
    }

    #[test]
    fn test_force_if_dominates_weight() {
        let mut rng = StdRng::seed_from_u64(9);
        let items = vec![item(10, 0), item(2, 1), item(10, 0)];
        for _ in 0..500 {
            assert_eq!(select_force_if(&items, &mut rng), Some(1));
        }
    }

    #[test]
    fn test_force_if_ties_share_draws() {
        let mut rng = StdRng::seed_from_u64(11);
        let items = vec![item(1, 2), item(1, 1), item(1, 2)];
        let mut seen = [0usize; 3];
        for _ in 0..400 {
            seen[select_force_if(&items, &mut rng).unwrap()] += 1;
        }
        assert_eq!(seen[1], 0);
        assert!(seen[0] > 0 && seen[2] > 0);
    }

    #[test]
    fn test_max_force_if() {
        assert_eq!(max_force_if::<Item>(&[]), 0);
        assert_eq!(max_force_if(&[item(1, 3), item(1, 5)]), 5);
    }
}
