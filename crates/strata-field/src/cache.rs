//! Quadtree-shaped memoization of field samples.
//!
//! Each cache node covers a square of the grid and stores the samples that
//! are aligned to its own vertex spacing. Requests that are not aligned are
//! routed to a lazily created child with half the spacing, so every grid
//! point resolves to exactly one slot. Nodes count accesses; a refresh drops
//! every child subtree that was not touched since the previous refresh.

use std::rc::Rc;

use glam::IVec2;

use crate::grid::GridLayout;
use crate::sample::{FieldSample, FieldSampler};

/// Something that turns grid points into shared field samples.
pub trait SampleSource {
    /// Sample the field at a grid point.
    fn sample(&mut self, grid: IVec2) -> Rc<FieldSample>;

    /// The grid this source samples on.
    fn layout(&self) -> &GridLayout;
}

/// Counters describing the cache contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Live cache nodes, root included.
    pub nodes: usize,
    /// Samples currently memoized.
    pub samples: usize,
    /// Requests answered from memory since creation.
    pub hits: u64,
    /// Requests that called the sampler since creation.
    pub misses: u64,
}

struct CacheNode {
    origin: IVec2,
    level: u32,
    samples: Vec<Option<Rc<FieldSample>>>,
    children: [Option<Box<CacheNode>>; 4],
    accesses: u32,
}

impl CacheNode {
    fn new(origin: IVec2, level: u32, vertices_per_side: usize) -> Self {
        Self {
            origin,
            level,
            samples: vec![None; vertices_per_side * vertices_per_side],
            children: [None, None, None, None],
            accesses: 0,
        }
    }

    /// Drop untouched child subtrees, recurse into the rest, reset counters.
    fn refresh(&mut self) {
        for slot in &mut self.children {
            if slot.as_ref().is_some_and(|child| child.accesses == 0) {
                *slot = None;
            } else if let Some(child) = slot {
                child.refresh();
            }
        }
        self.accesses = 0;
    }

    fn count(&self, stats: &mut CacheStats) {
        stats.nodes += 1;
        stats.samples += self.samples.iter().filter(|s| s.is_some()).count();
        for child in self.children.iter().flatten() {
            child.count(stats);
        }
    }
}

fn make_sample<S: FieldSampler>(sampler: &S, layout: &GridLayout, grid: IVec2) -> FieldSample {
    let world_pos = layout.grid_to_world(grid);
    let value = sampler.sample(world_pos.x, world_pos.y);
    FieldSample {
        height: value.height,
        color: value.color,
        world_pos,
    }
}

/// Memoizing sample source.
///
/// Between two refreshes, sampling the same grid point always returns the
/// same `Rc`. Root-level samples are kept for the cache's whole lifetime.
pub struct FieldCache<S> {
    sampler: S,
    layout: GridLayout,
    root: CacheNode,
    hits: u64,
    misses: u64,
}

impl<S: FieldSampler> FieldCache<S> {
    /// Create an empty cache over `sampler`.
    pub fn new(sampler: S, layout: GridLayout) -> Self {
        Self {
            root: CacheNode::new(IVec2::ZERO, 0, layout.vertices_per_side()),
            sampler,
            layout,
            hits: 0,
            misses: 0,
        }
    }

    /// The wrapped sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Drop every subtree with no accesses since the previous refresh.
    ///
    /// Must only be called between frames.
    pub fn refresh(&mut self) {
        let before = self.stats();
        self.root.refresh();
        let after = self.stats();
        tracing::debug!(
            nodes_before = before.nodes,
            nodes_after = after.nodes,
            samples_after = after.samples,
            "field cache refreshed"
        );
    }

    /// Current cache counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits,
            misses: self.misses,
            ..CacheStats::default()
        };
        self.root.count(&mut stats);
        stats
    }
}

impl<S: FieldSampler> SampleSource for FieldCache<S> {
    fn sample(&mut self, grid: IVec2) -> Rc<FieldSample> {
        let Self {
            sampler,
            layout,
            root,
            hits,
            misses,
        } = self;

        if !layout.contains(grid) {
            tracing::debug!(x = grid.x, y = grid.y, "sample outside terrain, not cached");
            *misses += 1;
            return Rc::new(make_sample(sampler, layout, grid));
        }

        let n = layout.vertices_per_side() as i32;
        let mut node = root;
        loop {
            node.accesses += 1;
            let spacing = layout.spacing(node.level);
            let rel = grid - node.origin;

            if rel.x % spacing == 0 && rel.y % spacing == 0 {
                let index = ((rel.y / spacing) * n + rel.x / spacing) as usize;
                let slot = &mut node.samples[index];
                if let Some(sample) = slot {
                    *hits += 1;
                    return Rc::clone(sample);
                }
                *misses += 1;
                let sample = Rc::new(make_sample(sampler, layout, grid));
                *slot = Some(Rc::clone(&sample));
                return sample;
            }

            // Half-open routing: the shared midline belongs to the upper child.
            let half = layout.node_size(node.level) / 2;
            let dx = i32::from(rel.x >= half);
            let dy = i32::from(rel.y >= half);
            let child_origin = node.origin + IVec2::new(dx, dy) * half;
            let child_level = node.level + 1;
            node = &mut **node.children[(dx + 2 * dy) as usize].get_or_insert_with(|| {
                Box::new(CacheNode::new(child_origin, child_level, n as usize))
            });
        }
    }

    fn layout(&self) -> &GridLayout {
        &self.layout
    }
}

/// Non-memoizing sample source, used when the cache is disabled.
pub struct DirectSource<S> {
    sampler: S,
    layout: GridLayout,
}

impl<S: FieldSampler> DirectSource<S> {
    /// Wrap a sampler.
    pub fn new(sampler: S, layout: GridLayout) -> Self {
        Self { sampler, layout }
    }

    /// The wrapped sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }
}

impl<S: FieldSampler> SampleSource for DirectSource<S> {
    fn sample(&mut self, grid: IVec2) -> Rc<FieldSample> {
        Rc::new(make_sample(&self.sampler, &self.layout, grid))
    }

    fn layout(&self) -> &GridLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::FieldValue;
    use std::cell::Cell;

    fn layout() -> GridLayout {
        GridLayout::new(3, 4, 64.0)
    }

    fn ramp(x: f32, y: f32) -> FieldValue {
        FieldValue::with_height(x * 0.5 + y)
    }

    /// Two requests for the same point return the same allocation.
    #[test]
    fn test_same_point_is_identical() {
        let mut cache = FieldCache::new(ramp, layout());
        for g in [IVec2::new(0, 0), IVec2::new(3, 7), IVec2::new(32, 32), IVec2::new(16, 5)] {
            let a = cache.sample(g);
            let b = cache.sample(g);
            assert!(Rc::ptr_eq(&a, &b), "point {g} resolved twice");
        }
    }

    /// The sampler runs once per distinct point.
    #[test]
    fn test_sampler_called_once_per_point() {
        let calls = Cell::new(0);
        let sampler = |x: f32, y: f32| {
            calls.set(calls.get() + 1);
            ramp(x, y)
        };
        let mut cache = FieldCache::new(sampler, layout());
        for _ in 0..3 {
            cache.sample(IVec2::new(5, 9));
            cache.sample(IVec2::new(8, 8));
        }
        assert_eq!(calls.get(), 2);
        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 4);
    }

    /// Points on a shared midline resolve to one slot from either side.
    #[test]
    fn test_midline_point_has_single_slot() {
        let mut cache = FieldCache::new(ramp, layout());
        // x = 16 is the root midline; y = 3 is only aligned at the deepest level.
        let a = cache.sample(IVec2::new(16, 3));
        let b = cache.sample(IVec2::new(16, 3));
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.world_pos, layout().grid_to_world(IVec2::new(16, 3)));
    }

    /// Untouched subtrees are dropped; a later request recreates an equal sample.
    #[test]
    fn test_refresh_evicts_untouched_subtree() {
        let mut cache = FieldCache::new(ramp, layout());
        let deep = IVec2::new(3, 5);
        let first = cache.sample(deep);
        assert!(cache.stats().nodes > 1);

        cache.refresh(); // touched this epoch, survives
        assert!(cache.stats().nodes > 1);
        cache.refresh(); // untouched since the previous refresh
        assert_eq!(cache.stats().nodes, 1);

        let second = cache.sample(deep);
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    /// A subtree that keeps being used survives refreshes.
    #[test]
    fn test_refresh_keeps_active_subtree() {
        let mut cache = FieldCache::new(ramp, layout());
        let deep = IVec2::new(31, 1);
        let first = cache.sample(deep);
        for _ in 0..3 {
            cache.refresh();
            let again = cache.sample(deep);
            assert!(Rc::ptr_eq(&first, &again));
        }
    }

    /// Root-level samples are never evicted.
    #[test]
    fn test_root_samples_retained() {
        let mut cache = FieldCache::new(ramp, layout());
        let corner = cache.sample(IVec2::new(8, 24));
        cache.refresh();
        cache.refresh();
        cache.refresh();
        assert!(Rc::ptr_eq(&corner, &cache.sample(IVec2::new(8, 24))));
        assert_eq!(cache.stats().nodes, 1);
    }

    /// Points outside the terrain are answered but not memoized.
    #[test]
    fn test_outside_point_not_cached() {
        let mut cache = FieldCache::new(ramp, layout());
        let a = cache.sample(IVec2::new(-4, 0));
        let b = cache.sample(IVec2::new(-4, 0));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
        assert_eq!(cache.stats().samples, 0);
    }

    /// The direct source never shares samples.
    #[test]
    fn test_direct_source_is_uncached() {
        let mut source = DirectSource::new(ramp, layout());
        let a = source.sample(IVec2::new(2, 2));
        let b = source.sample(IVec2::new(2, 2));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(a.height, b.height);
    }
}
