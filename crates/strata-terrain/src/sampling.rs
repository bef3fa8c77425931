use std::rc::Rc;

use glam::IVec2;
use strata_field::{CacheStats, DirectSource, FieldCache, FieldSample, FieldSampler, GridLayout, SampleSource};

/// The sample source a terrain uses, chosen by the `use_cache` setting.
pub enum Sampling<S> {
    Cached(FieldCache<S>),
    Direct(DirectSource<S>),
}

impl<S: FieldSampler> Sampling<S> {
    /// Build the source for a sampler.
    pub fn new(sampler: S, layout: GridLayout, use_cache: bool) -> Self {
        if use_cache {
            Sampling::Cached(FieldCache::new(sampler, layout))
        } else {
            Sampling::Direct(DirectSource::new(sampler, layout))
        }
    }

    /// The wrapped sampler.
    pub fn sampler(&self) -> &S {
        match self {
            Sampling::Cached(cache) => cache.sampler(),
            Sampling::Direct(direct) => direct.sampler(),
        }
    }

    /// Evict untouched cache subtrees. No-op without a cache.
    pub fn refresh(&mut self) {
        if let Sampling::Cached(cache) = self {
            cache.refresh();
        }
    }

    /// Cache counters, if caching.
    pub fn stats(&self) -> Option<CacheStats> {
        match self {
            Sampling::Cached(cache) => Some(cache.stats()),
            Sampling::Direct(_) => None,
        }
    }
}

impl<S: FieldSampler> SampleSource for Sampling<S> {
    fn sample(&mut self, grid: IVec2) -> Rc<FieldSample> {
        match self {
            Sampling::Cached(cache) => cache.sample(grid),
            Sampling::Direct(direct) => direct.sample(grid),
        }
    }

    fn layout(&self) -> &GridLayout {
        match self {
            Sampling::Cached(cache) => cache.layout(),
            Sampling::Direct(direct) => direct.layout(),
        }
    }
}
