//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Built top-down with the surface area heuristic: bucketed for large node
//! ranges, exhaustive over all sorted splits for small ones. The build tree
//! lives in an arena addressed by [`NodeId`] and is flattened depth-first into
//! a linear array, so a node's first child always follows it directly and only
//! the second child's index is stored.

use std::time::Instant;

use lumen_math::{dir_is_neg, Bounds3, Ray, Vec3};

use crate::error::{RenderError, RenderResult};
use crate::primitive::{ClosestHit, GeometricPrimitive, Primitive};

/// Number of centroid buckets evaluated per bucketed SAH split.
pub const BUCKETS: usize = 16;

/// Ranges smaller than this use the exhaustive SAH split.
pub const SAH_APPLY_COUNT: usize = 32;

/// Size of the fixed traversal stack; bounds the tree depth.
pub const MAX_TODO: usize = 64;

/// Centroid extents below this cannot be split and become a leaf.
const DEGENERATE_EXTENT: f32 = 1e-5;

/// Leaf primitive counts must fit the 16-bit field of a linear node.
const MAX_LEAF_PRIMITIVES: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhOptions {
    /// Cost of one box test relative to one primitive test.
    pub intersect_cost_ratio: f32,
}

impl Default for BvhOptions {
    fn default() -> Self {
        Self {
            intersect_cost_ratio: 0.125,
        }
    }
}

/// Handle into the build arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

#[derive(Debug, Clone, Copy)]
enum BuildNode {
    Leaf {
        bounds: Bounds3,
        first: usize,
        count: usize,
    },
    Interior {
        bounds: Bounds3,
        axis: u8,
        children: [NodeId; 2],
    },
}

#[derive(Debug, Clone, Copy)]
struct PrimitiveInfo {
    index: usize,
    bounds: Bounds3,
    centroid: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: usize,
    bounds: Bounds3,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Bounds3::EMPTY,
        }
    }
}

struct Builder {
    options: BvhOptions,
    infos: Vec<PrimitiveInfo>,
    arena: Vec<BuildNode>,
    /// Original primitive indices in leaf order.
    ordered: Vec<usize>,
}

impl Builder {
    fn push(&mut self, node: BuildNode) -> NodeId {
        let id = NodeId(self.arena.len() as u32);
        self.arena.push(node);
        id
    }

    fn range_bounds(&self, start: usize, end: usize) -> Bounds3 {
        self.infos[start..end]
            .iter()
            .fold(Bounds3::EMPTY, |b, info| b.union(&info.bounds))
    }

    fn interior(&mut self, bounds: Bounds3, axis: usize, left: NodeId, right: NodeId) -> NodeId {
        self.push(BuildNode::Interior {
            bounds,
            axis: axis as u8,
            children: [left, right],
        })
    }

    fn leaf(&mut self, start: usize, end: usize) -> NodeId {
        let bounds = self.range_bounds(start, end);
        if end - start > MAX_LEAF_PRIMITIVES {
            // Too many for one leaf; split where they already lie
            let mid = start + (end - start) / 2;
            let left = self.leaf(start, mid);
            let right = self.leaf(mid, end);
            return self.interior(bounds, 0, left, right);
        }

        let first = self.ordered.len();
        self.ordered
            .extend(self.infos[start..end].iter().map(|info| info.index));
        self.push(BuildNode::Leaf {
            bounds,
            first,
            count: end - start,
        })
    }

    fn sah_build(&mut self, start: usize, end: usize) -> NodeId {
        let n = end - start;
        if n == 1 {
            return self.leaf(start, end);
        }
        if n < SAH_APPLY_COUNT {
            return self.exhaustive_build(start, end);
        }

        let centroid_bounds = self.infos[start..end]
            .iter()
            .fold(Bounds3::EMPTY, |b, info| b.union_point(info.centroid));
        let axis = centroid_bounds.max_extent();
        let min = centroid_bounds.min[axis];
        let extent = centroid_bounds.max[axis] - min;
        if extent < DEGENERATE_EXTENT {
            log::debug!("{} primitives share a centroid, making a leaf", n);
            return self.leaf(start, end);
        }

        let bucket_of = |c: Vec3| ((BUCKETS as f32 * (c[axis] - min) / extent) as usize).min(BUCKETS - 1);

        let mut buckets = [Bucket::default(); BUCKETS];
        for info in &self.infos[start..end] {
            let bucket = &mut buckets[bucket_of(info.centroid)];
            bucket.count += 1;
            bucket.bounds = bucket.bounds.union(&info.bounds);
        }

        // right[i] bounds buckets i + 1 ..
        let mut right = [Bounds3::EMPTY; BUCKETS];
        for i in (0..BUCKETS - 1).rev() {
            right[i] = right[i + 1].union(&buckets[i + 1].bounds);
        }
        let bounds = right[0].union(&buckets[0].bounds);
        let total_area = bounds.surface_area();

        let mut min_cost = n as f32;
        let mut split = None;
        let mut left = Bounds3::EMPTY;
        let mut left_count = 0;
        for i in 0..BUCKETS - 1 {
            left = left.union(&buckets[i].bounds);
            left_count += buckets[i].count;
            let cost = self.options.intersect_cost_ratio
                + (left_count as f32 * left.surface_area()
                    + (n - left_count) as f32 * right[i].surface_area())
                    / total_area;
            if cost < min_cost {
                min_cost = cost;
                split = Some(i);
            }
        }

        let Some(split) = split else {
            return self.exhaustive_build(start, end);
        };

        let mid = start + partition(&mut self.infos[start..end], |info| bucket_of(info.centroid) <= split);
        if mid == start || mid == end {
            return self.exhaustive_build(start, end);
        }

        let left = self.sah_build(start, mid);
        let right = self.sah_build(mid, end);
        self.interior(bounds, axis, left, right)
    }

    /// Evaluate every split between consecutive centroids on all three axes.
    fn exhaustive_build(&mut self, start: usize, end: usize) -> NodeId {
        let n = end - start;
        if n == 1 {
            return self.leaf(start, end);
        }

        let bounds = self.range_bounds(start, end);
        let total_area = bounds.surface_area();

        let mut min_cost = n as f32;
        let mut best = None;
        // right[i] bounds primitives i + 1 .. of the current sort
        let mut right = vec![Bounds3::EMPTY; n];

        for axis in 0..3 {
            self.infos[start..end].sort_by(|a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

            right[n - 1] = Bounds3::EMPTY;
            for i in (0..n - 1).rev() {
                right[i] = right[i + 1].union(&self.infos[start + i + 1].bounds);
            }

            let mut left = Bounds3::EMPTY;
            for i in 0..n - 1 {
                left = left.union(&self.infos[start + i].bounds);
                let left_count = i + 1;
                let cost = self.options.intersect_cost_ratio
                    + (left_count as f32 * left.surface_area()
                        + (n - left_count) as f32 * right[i].surface_area())
                        / total_area;
                if cost < min_cost {
                    min_cost = cost;
                    best = Some((axis, left_count));
                }
            }
        }

        let Some((axis, left_count)) = best else {
            return self.leaf(start, end);
        };

        self.infos[start..end].sort_by(|a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
        let mid = start + left_count;
        let left = self.exhaustive_build(start, mid);
        let right = self.exhaustive_build(mid, end);
        self.interior(bounds, axis, left, right)
    }
}

/// Move elements matching `pred` to the front. Returns how many matched.
fn partition<T>(slice: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let mut first = 0;
    for i in 0..slice.len() {
        if pred(&slice[i]) {
            slice.swap(first, i);
            first += 1;
        }
    }
    first
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeContent {
    Interior { second_child: u32, axis: u16 },
    Leaf { first_primitive: u32, primitive_count: u16 },
}

/// Flattened BVH node.
#[derive(Debug, Clone, Copy)]
pub struct LinearBvhNode {
    pub bounds: Bounds3,
    pub content: NodeContent,
}

#[derive(Debug, Default, Clone, Copy)]
struct FlattenStats {
    leaves: usize,
    max_depth: usize,
}

/// Flattened SAH BVH over geometric primitives.
pub struct Bvh {
    primitives: Vec<GeometricPrimitive>,
    nodes: Vec<LinearBvhNode>,
    leaf_count: usize,
    depth: usize,
}

impl Bvh {
    pub fn build(primitives: Vec<GeometricPrimitive>) -> RenderResult<Self> {
        Self::build_with_options(primitives, BvhOptions::default())
    }

    pub fn build_with_options(
        primitives: Vec<GeometricPrimitive>,
        options: BvhOptions,
    ) -> RenderResult<Self> {
        if primitives.is_empty() {
            return Err(RenderError::EmptyPrimitives);
        }
        let start_time = Instant::now();

        let infos = primitives
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let bounds = p.world_bound();
                PrimitiveInfo {
                    index,
                    bounds,
                    centroid: bounds.centroid(),
                }
            })
            .collect();

        let mut builder = Builder {
            options,
            infos,
            arena: Vec::with_capacity(2 * primitives.len()),
            ordered: Vec::with_capacity(primitives.len()),
        };
        let root = builder.sah_build(0, primitives.len());

        // Reorder primitives to match leaf ranges
        let mut rank = vec![0; primitives.len()];
        for (position, &index) in builder.ordered.iter().enumerate() {
            rank[index] = position;
        }
        let mut ranked: Vec<(usize, GeometricPrimitive)> = primitives
            .into_iter()
            .enumerate()
            .map(|(i, p)| (rank[i], p))
            .collect();
        ranked.sort_unstable_by_key(|(r, _)| *r);
        let primitives: Vec<GeometricPrimitive> = ranked.into_iter().map(|(_, p)| p).collect();

        let (nodes, stats) = flatten_arena(&builder.arena, root)?;

        log::info!(
            "BVH built over {} primitives: {} nodes, {} leaves, depth {} in {:.2?}",
            primitives.len(),
            nodes.len(),
            stats.leaves,
            stats.max_depth,
            start_time.elapsed()
        );

        Ok(Self {
            primitives,
            nodes,
            leaf_count: stats.leaves,
            depth: stats.max_depth,
        })
    }

    pub fn nodes(&self) -> &[LinearBvhNode] {
        &self.nodes
    }

    pub fn primitives(&self) -> &[GeometricPrimitive] {
        &self.primitives
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Flatten the tree under `root`, rejecting trees too deep for the fixed
/// traversal stack.
fn flatten_arena(
    arena: &[BuildNode],
    root: NodeId,
) -> RenderResult<(Vec<LinearBvhNode>, FlattenStats)> {
    let mut nodes = Vec::with_capacity(arena.len());
    let mut stats = FlattenStats::default();
    flatten(arena, root, 0, &mut nodes, &mut stats);

    debug_assert_eq!(nodes.len(), 2 * stats.leaves - 1);

    // A path of depth d keeps at most d + 1 entries on the traversal stack
    if stats.max_depth >= MAX_TODO {
        return Err(RenderError::BvhTooDeep {
            depth: stats.max_depth,
            limit: MAX_TODO - 1,
        });
    }
    Ok((nodes, stats))
}

/// Emit `id` and its subtree depth-first, first child first. Returns the
/// index `id` was written to.
fn flatten(
    arena: &[BuildNode],
    id: NodeId,
    depth: usize,
    nodes: &mut Vec<LinearBvhNode>,
    stats: &mut FlattenStats,
) -> usize {
    let index = nodes.len();
    stats.max_depth = stats.max_depth.max(depth);

    match arena[id.0 as usize] {
        BuildNode::Leaf {
            bounds,
            first,
            count,
        } => {
            stats.leaves += 1;
            nodes.push(LinearBvhNode {
                bounds,
                content: NodeContent::Leaf {
                    first_primitive: first as u32,
                    primitive_count: count as u16,
                },
            });
        }
        BuildNode::Interior {
            bounds,
            axis,
            children: [left, right],
        } => {
            nodes.push(LinearBvhNode {
                bounds,
                content: NodeContent::Interior {
                    second_child: 0,
                    axis: axis as u16,
                },
            });
            flatten(arena, left, depth + 1, nodes, stats);
            let second = flatten(arena, right, depth + 1, nodes, stats);
            nodes[index].content = NodeContent::Interior {
                second_child: second as u32,
                axis: axis as u16,
            };
        }
    }

    index
}

impl Primitive for Bvh {
    fn world_bound(&self) -> Bounds3 {
        self.nodes[0].bounds
    }

    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut ClosestHit<'a>) -> bool {
        let inv_dir = ray.inv_direction();
        let dir_is_neg = dir_is_neg(inv_dir);

        let mut found = false;
        let mut to_visit = [0usize; MAX_TODO];
        let mut to_visit_len = 0;
        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            if node.bounds.intersect_p(ray, hit.t_max(), inv_dir, dir_is_neg) {
                match node.content {
                    NodeContent::Leaf {
                        first_primitive,
                        primitive_count,
                    } => {
                        let first = first_primitive as usize;
                        for primitive in &self.primitives[first..first + primitive_count as usize] {
                            if primitive.intersect(ray, hit) {
                                found = true;
                            }
                        }
                    }
                    NodeContent::Interior { second_child, axis } => {
                        // Visit the near child first, park the far one
                        if dir_is_neg[axis as usize] == 1 {
                            to_visit[to_visit_len] = current + 1;
                            current = second_child as usize;
                        } else {
                            to_visit[to_visit_len] = second_child as usize;
                            current += 1;
                        }
                        to_visit_len += 1;
                        continue;
                    }
                }
            }

            if to_visit_len == 0 {
                break;
            }
            to_visit_len -= 1;
            current = to_visit[to_visit_len];
        }
        found
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        let inv_dir = ray.inv_direction();
        let dir_is_neg = dir_is_neg(inv_dir);

        let mut to_visit = [0usize; MAX_TODO];
        let mut to_visit_len = 0;
        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            if node.bounds.intersect_p(ray, ray.t_max, inv_dir, dir_is_neg) {
                match node.content {
                    NodeContent::Leaf {
                        first_primitive,
                        primitive_count,
                    } => {
                        let first = first_primitive as usize;
                        if self.primitives[first..first + primitive_count as usize]
                            .iter()
                            .any(|p| p.intersect_p(ray))
                        {
                            return true;
                        }
                    }
                    NodeContent::Interior { second_child, axis } => {
                        if dir_is_neg[axis as usize] == 1 {
                            to_visit[to_visit_len] = current + 1;
                            current = second_child as usize;
                        } else {
                            to_visit[to_visit_len] = second_child as usize;
                            current += 1;
                        }
                        to_visit_len += 1;
                        continue;
                    }
                }
            }

            if to_visit_len == 0 {
                return false;
            }
            to_visit_len -= 1;
            current = to_visit[to_visit_len];
        }
    }
}
