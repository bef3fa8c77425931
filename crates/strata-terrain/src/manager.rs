use std::time::Instant;

use glam::{Vec2, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use strata_config::TerrainSettings;
use strata_field::{CacheStats, FieldSampler, GridLayout};
use strata_lod::{CameraView, LodPolicy, NodeFootprint, NodeId, PatchLifecycle, QuadTree};
use strata_mesh::{Patch, PatchKey};

use crate::sampling::Sampling;
use crate::seams;
use crate::sink::{ColliderSink, MeshSink};
use crate::stats::TerrainStats;

/// Creates empty patches for new leaves and parks retired ones until the
/// end of the frame.
struct PatchFactory {
    span: i32,
    vertices_per_side: usize,
    area_weighted: bool,
    graveyard: Vec<Patch>,
}

impl PatchLifecycle<Patch> for PatchFactory {
    fn create(&mut self, footprint: NodeFootprint) -> Patch {
        let key = PatchKey {
            level: footprint.level,
            origin: footprint.position,
        };
        Patch::new(key, footprint.size / self.span, self.vertices_per_side, self.area_weighted)
    }

    fn retire(&mut self, patch: Patch) {
        self.graveyard.push(patch);
    }
}

/// Owns the quadtree, the field source and all patches of one terrain.
///
/// Single-threaded and frame-stepped: call [`update`](Self::update) once per
/// frame, then [`render`](Self::render).
pub struct TerrainManager<S: FieldSampler> {
    settings: TerrainSettings,
    layout: GridLayout,
    policy: LodPolicy,
    tree: QuadTree<Patch>,
    source: Sampling<S>,
    factory: PatchFactory,
    colliders: FxHashSet<PatchKey>,
    stats: TerrainStats,
}

impl<S: FieldSampler> TerrainManager<S> {
    /// Build a terrain over `sampler`. Nothing is sampled until the first update.
    pub fn new(settings: TerrainSettings, sampler: S) -> Self {
        let layout = GridLayout::from_settings(&settings);
        tracing::info!(
            width = settings.width,
            max_level = settings.max_level,
            vertices_per_side = settings.vertices_per_side,
            extent = layout.extent(),
            world_extent = layout.world_extent(),
            cache = settings.use_cache,
            "terrain created"
        );
        let source = Sampling::new(sampler, layout, settings.use_cache);
        Self {
            policy: LodPolicy::from_settings(&settings),
            tree: QuadTree::new(layout, settings.min_height, settings.max_height),
            factory: PatchFactory {
                span: settings.patch_span(),
                vertices_per_side: settings.vertices_per_side,
                area_weighted: settings.area_weighted_normals,
                graveyard: Vec::new(),
            },
            colliders: FxHashSet::default(),
            stats: TerrainStats {
                cache: source.stats(),
                ..TerrainStats::default()
            },
            source,
            layout,
            settings,
        }
    }

    /// Run one frame: visibility, rebuilds, seam normals, deferred destruction.
    ///
    /// `focus` lists additional points (dynamic objects) that refine the
    /// terrain around themselves within the object max distance.
    pub fn update<C>(&mut self, camera: &C, focus: &[Vec3], colliders: &mut dyn ColliderSink) -> &TerrainStats
    where
        C: CameraView + ?Sized,
    {
        self.stats.begin_frame();

        // Pass 1: visibility and subdivision. Retired patches stay alive.
        let start = Instant::now();
        let report = self
            .tree
            .update_visibility(camera, focus, &self.policy, &mut self.factory);
        self.stats.culled_nodes = report.culled;
        self.stats.patches_created = report.patches_created;
        self.stats.timings.visibility = start.elapsed();

        // Pass 2: joint levels and rebuilds.
        let start = Instant::now();
        let drift = self.rebuild_pass(colliders);
        self.stats.timings.rebuild = start.elapsed();

        // Pass 3: seam normals, only when some patch or mesh changed.
        let start = Instant::now();
        if report.changed() || self.stats.rebuilds > 0 || !drift.is_empty() {
            self.seam_pass(&drift);
        }
        self.stats.timings.seams = start.elapsed();

        // Pass 4: destroy what pass 1 retired.
        let start = Instant::now();
        self.destroy_retired(colliders);
        self.stats.timings.destruction = start.elapsed();

        let refresh = self.settings.cache_refresh_frames;
        if refresh > 0 && self.stats.frame % u64::from(refresh) == 0 {
            self.source.refresh();
        }

        self.stats.active_nodes = self.tree.node_count();
        self.stats.active_patches = self.tree.leaves().count();
        self.stats.cache = self.source.stats();
        if self.stats.structure_changed() {
            tracing::debug!(
                frame = self.stats.frame,
                patches = self.stats.active_patches,
                created = self.stats.patches_created,
                destroyed = self.stats.patches_destroyed,
                rebuilds = self.stats.rebuilds,
                seam_vertices = self.stats.seam_vertices,
                "terrain updated"
            );
        }
        &self.stats
    }

    fn rebuild_pass(&mut self, colliders: &mut dyn ColliderSink) -> FxHashMap<NodeId, [bool; 4]> {
        let plans: Vec<_> = self
            .tree
            .leaf_ids()
            .into_iter()
            .filter_map(|id| seams::plan_joints(&self.tree, id).map(|plan| (id, plan)))
            .collect();

        let mut drift = FxHashMap::default();
        for (id, plan) in plans {
            if plan.has_drift() {
                self.stats.drift_warnings += plan.drift.iter().filter(|&&d| d).count();
                drift.insert(id, plan.drift);
            }

            let Some(patch) = self.tree.patch_mut(id) else {
                continue;
            };
            if !patch.update(plan.joints, &mut self.source) {
                continue;
            }
            self.stats.rebuilds += 1;
            self.stats.total_rebuilds += 1;

            let key = patch.key();
            let (min, max) = patch.height_range();
            let collider = (key.level >= self.settings.min_physics_level)
                .then(|| patch.collider_mesh())
                .flatten();

            self.tree.report_heights(id, min, max);
            if let Some(mesh) = collider {
                colliders.insert_collider(key, mesh);
                self.colliders.insert(key);
                self.stats.collider_updates += 1;
            }
        }
        drift
    }

    fn seam_pass(&mut self, drift: &FxHashMap<NodeId, [bool; 4]>) {
        let plan = seams::plan_seam_normals(&self.tree, drift);
        for (id, index, normal) in plan.updates {
            if let Some(patch) = self.tree.patch_mut(id) {
                patch.set_normal(index, normal);
            }
        }
        self.stats.seam_vertices = plan.shared;
        self.stats.estimated_normals = plan.estimated;
    }

    fn destroy_retired(&mut self, colliders: &mut dyn ColliderSink) {
        let retired = std::mem::take(&mut self.factory.graveyard);
        self.stats.patches_destroyed = retired.len();
        if retired.is_empty() {
            return;
        }
        let live: FxHashSet<PatchKey> = self
            .tree
            .leaves()
            .filter_map(|(_, node)| node.patch().map(Patch::key))
            .collect();
        for patch in retired {
            let key = patch.key();
            if !live.contains(&key) && self.colliders.remove(&key) {
                colliders.remove_collider(key);
                self.stats.collider_updates += 1;
            }
        }
    }

    /// Hand every built patch mesh to the renderer. Returns the number submitted.
    pub fn render(&mut self, sink: &mut dyn MeshSink) -> usize {
        let start = Instant::now();
        let mut submitted = 0;
        for (_, node) in self.tree.leaves() {
            if let Some(patch) = node.patch()
                && let Some(mesh) = patch.mesh()
            {
                sink.submit(patch.key(), mesh);
                submitted += 1;
            }
        }
        self.stats.submitted = submitted;
        self.stats.timings.render = start.elapsed();
        submitted
    }

    /// Validated settings.
    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Grid layout.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// The quadtree, for queries.
    pub fn tree(&self) -> &QuadTree<Patch> {
        &self.tree
    }

    /// All active patches.
    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.tree.leaves().filter_map(|(_, node)| node.patch())
    }

    /// The active patch covering a horizontal world position.
    pub fn patch_at(&self, world: Vec2) -> Option<&Patch> {
        let grid = self.layout.world_to_grid(world);
        self.tree.find_leaf(grid).and_then(|id| self.tree.patch(id))
    }

    /// Stats of the last frame.
    pub fn stats(&self) -> &TerrainStats {
        &self.stats
    }

    /// Current field cache counters, if the cache is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.source.stats()
    }

    /// The field sampler.
    pub fn sampler(&self) -> &S {
        self.source.sampler()
    }
}
