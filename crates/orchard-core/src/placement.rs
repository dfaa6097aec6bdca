//! Scatter placement of fruit on perennial plants.
//!
//! Each fruit gets a `(top, left)` position in percent of its plot's plant
//! image, drawn from a per-plant [`ScatterRange`]. Candidates closer than
//! the minimum distance to a fruit already placed on the same plot are
//! rejected and resampled, up to a fixed attempt budget. When the budget
//! runs out the last candidate is kept anyway: a crowded plant shows
//! overlapping fruit rather than failing.
//!
//! Positions are assigned once per fruit id and kept until the fruit or its
//! plot disappears from the snapshot. The registry is keyed by plot; a plot
//! entry exists exactly while at least one of its fruits is placed.

use std::collections::{BTreeMap, BTreeSet};

use orchard_types::{FruitId, PlotId};
use rand::Rng;

use crate::config::{PlacementConfig, ScatterRange};

/// A position in percent of the parent surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Offset from the top edge.
    pub top: f64,
    /// Offset from the left edge.
    pub left: f64,
}

impl Position {
    /// Euclidean distance to another position.
    pub fn distance(self, other: Self) -> f64 {
        (self.top - other.top).hypot(self.left - other.left)
    }
}

/// Outcome of a placement request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Assigned position.
    pub position: Position,
    /// Candidates sampled; zero when the fruit was already placed.
    pub attempts: u32,
    /// Whether the position is closer than the minimum distance to another
    /// fruit on the same plot.
    pub overlapping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlacementRecord {
    fruit: FruitId,
    position: Position,
}

/// Registry of assigned fruit positions, keyed by plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementAllocator {
    min_distance: f64,
    max_attempts: u32,
    registry: BTreeMap<PlotId, Vec<PlacementRecord>>,
}

impl PlacementAllocator {
    /// Empty registry with explicit parameters. `max_attempts` is raised to
    /// at least one.
    pub fn new(min_distance: f64, max_attempts: u32) -> Self {
        Self {
            min_distance,
            max_attempts: max_attempts.max(1),
            registry: BTreeMap::new(),
        }
    }

    /// Empty registry configured from the `placement` section.
    pub fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.min_distance, config.max_attempts)
    }

    /// Minimum separation enforced between fruits of one plot.
    pub const fn min_distance(&self) -> f64 {
        self.min_distance
    }

    /// Attempt budget per placement.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Position already assigned to a fruit.
    pub fn position_of(&self, parent: PlotId, fruit: FruitId) -> Option<Position> {
        self.registry
            .get(&parent)?
            .iter()
            .find(|record| record.fruit == fruit)
            .map(|record| record.position)
    }

    /// Positions assigned on a plot, in assignment order.
    pub fn positions(&self, parent: PlotId) -> Vec<(FruitId, Position)> {
        self.registry
            .get(&parent)
            .map(|records| {
                records
                    .iter()
                    .map(|record| (record.fruit, record.position))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Plots with at least one placed fruit.
    pub fn parents(&self) -> impl Iterator<Item = PlotId> + '_ {
        self.registry.keys().copied()
    }

    /// Whether no fruit is placed anywhere.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Place a fruit, or return its existing position.
    pub fn place<R: Rng + ?Sized>(
        &mut self,
        parent: PlotId,
        fruit: FruitId,
        range: ScatterRange,
        rng: &mut R,
    ) -> Placement {
        if let Some(position) = self.position_of(parent, fruit) {
            return Placement {
                position,
                attempts: 0,
                overlapping: self.crowds(parent, fruit, position),
            };
        }

        let mut candidate = sample(range, rng);
        let mut attempts: u32 = 1;
        while attempts < self.max_attempts && self.crowds(parent, fruit, candidate) {
            candidate = sample(range, rng);
            attempts = attempts.saturating_add(1);
        }
        let overlapping = self.crowds(parent, fruit, candidate);
        if overlapping {
            tracing::debug!(
                plot_id = %parent,
                fruit_id = %fruit,
                attempts,
                "placement budget exhausted, accepting overlap"
            );
        }

        self.registry.entry(parent).or_default().push(PlacementRecord {
            fruit,
            position: candidate,
        });
        Placement {
            position: candidate,
            attempts,
            overlapping,
        }
    }

    /// Forget one fruit's position. Returns whether it was placed.
    pub fn release(&mut self, parent: PlotId, fruit: FruitId) -> bool {
        let Some(records) = self.registry.get_mut(&parent) else {
            return false;
        };
        let before = records.len();
        records.retain(|record| record.fruit != fruit);
        let removed = records.len() != before;
        if records.is_empty() {
            self.registry.remove(&parent);
        }
        removed
    }

    /// Forget every position on a plot. Returns how many were dropped.
    pub fn purge(&mut self, parent: PlotId) -> usize {
        self.registry.remove(&parent).map_or(0, |records| records.len())
    }

    /// Forget positions of fruits on `parent` that are not in `live`.
    /// Returns the fruits dropped.
    pub fn retain_fruits(&mut self, parent: PlotId, live: &BTreeSet<FruitId>) -> Vec<FruitId> {
        let stale: Vec<FruitId> = self
            .registry
            .get(&parent)
            .map(|records| {
                records
                    .iter()
                    .map(|record| record.fruit)
                    .filter(|fruit| !live.contains(fruit))
                    .collect()
            })
            .unwrap_or_default();
        for fruit in &stale {
            self.release(parent, *fruit);
        }
        stale
    }

    /// Forget every plot not in `live`. Returns the plots dropped.
    pub fn retain_parents(&mut self, live: &BTreeSet<PlotId>) -> Vec<PlotId> {
        let stale: Vec<PlotId> = self
            .registry
            .keys()
            .filter(|parent| !live.contains(parent))
            .copied()
            .collect();
        for parent in &stale {
            self.registry.remove(parent);
        }
        stale
    }

    /// Whether `candidate` is too close to any other fruit on `parent`.
    fn crowds(&self, parent: PlotId, fruit: FruitId, candidate: Position) -> bool {
        self.registry.get(&parent).is_some_and(|records| {
            records.iter().any(|record| {
                record.fruit != fruit && record.position.distance(candidate) < self.min_distance
            })
        })
    }
}

fn sample<R: Rng + ?Sized>(range: ScatterRange, rng: &mut R) -> Position {
    Position {
        top: rng.random::<f64>().mul_add(range.top_span, range.top_min),
        left: rng.random::<f64>().mul_add(range.left_span, range.left_min),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const RANGE: ScatterRange = ScatterRange::new(20.0, 40.0, 15.0, 70.0);

    #[test]
    fn placement_is_stable_per_fruit() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut allocator = PlacementAllocator::new(15.0, 50);
        let first = allocator.place(PlotId(1), FruitId(10), RANGE, &mut rng);
        let again = allocator.place(PlotId(1), FruitId(10), RANGE, &mut rng);
        assert_eq!(first.position, again.position);
        assert_eq!(again.attempts, 0);
        assert_eq!(allocator.positions(PlotId(1)).len(), 1);
    }

    #[test]
    fn positions_stay_inside_range() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut allocator = PlacementAllocator::new(15.0, 50);
        for id in 0..20 {
            let placed = allocator.place(PlotId(1), FruitId(id), RANGE, &mut rng);
            assert!((20.0..=60.0).contains(&placed.position.top));
            assert!((15.0..=85.0).contains(&placed.position.left));
        }
    }

    #[test]
    fn separated_unless_budget_exhausted() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut allocator = PlacementAllocator::new(15.0, 50);
        for id in 0..12 {
            let placed = allocator.place(PlotId(1), FruitId(id), RANGE, &mut rng);
            assert!(placed.attempts >= 1 && placed.attempts <= 50);
            if placed.attempts < 50 {
                assert!(!placed.overlapping);
            }
        }
    }

    #[test]
    fn crowded_plot_accepts_overlap() {
        // A point-sized range forces every candidate onto the same spot.
        let point = ScatterRange::new(30.0, 0.0, 30.0, 0.0);
        let mut rng = StdRng::seed_from_u64(4);
        let mut allocator = PlacementAllocator::new(15.0, 5);
        allocator.place(PlotId(1), FruitId(1), point, &mut rng);
        let second = allocator.place(PlotId(1), FruitId(2), point, &mut rng);
        assert_eq!(second.attempts, 5);
        assert!(second.overlapping);
        assert_eq!(allocator.positions(PlotId(1)).len(), 2);
    }

    #[test]
    fn plots_do_not_constrain_each_other() {
        let point = ScatterRange::new(30.0, 0.0, 30.0, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let mut allocator = PlacementAllocator::new(15.0, 5);
        allocator.place(PlotId(1), FruitId(1), point, &mut rng);
        let other = allocator.place(PlotId(2), FruitId(2), point, &mut rng);
        assert_eq!(other.attempts, 1);
        assert!(!other.overlapping);
    }

    #[test]
    fn releasing_last_fruit_drops_plot_entry() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut allocator = PlacementAllocator::new(15.0, 50);
        allocator.place(PlotId(1), FruitId(1), RANGE, &mut rng);
        allocator.place(PlotId(1), FruitId(2), RANGE, &mut rng);
        assert!(allocator.release(PlotId(1), FruitId(1)));
        assert!(!allocator.release(PlotId(1), FruitId(1)));
        assert_eq!(allocator.parents().count(), 1);
        assert!(allocator.release(PlotId(1), FruitId(2)));
        assert!(allocator.is_empty());
    }

    #[test]
    fn retain_drops_stale_fruits_and_plots() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut allocator = PlacementAllocator::new(15.0, 50);
        allocator.place(PlotId(1), FruitId(1), RANGE, &mut rng);
        allocator.place(PlotId(1), FruitId(2), RANGE, &mut rng);
        allocator.place(PlotId(2), FruitId(3), RANGE, &mut rng);

        let dropped = allocator.retain_fruits(PlotId(1), &BTreeSet::from([FruitId(2)]));
        assert_eq!(dropped, vec![FruitId(1)]);

        let gone = allocator.retain_parents(&BTreeSet::from([PlotId(1)]));
        assert_eq!(gone, vec![PlotId(2)]);
        assert_eq!(allocator.purge(PlotId(1)), 1);
        assert!(allocator.is_empty());
    }
}
