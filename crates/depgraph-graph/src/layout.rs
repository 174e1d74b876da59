//! Layered (Sugiyama-style) layout for dependency graphs.
//!
//! Phases: cycle removal, longest-path ranking, virtual nodes for long edges,
//! barycenter crossing reduction, then coordinate assignment per direction.
//!
//! Cycles are never rejected. A depth-first walk in node insertion order marks
//! each edge whose target is still on the walk stack and reverses it for
//! ranking only, so `A -> B -> A` with `A` registered first ranks `A` at 0 and
//! `B` at 1. Self-loops carry no rank information and are ignored.

use crate::config::LayoutConfig;
use crate::graph::{GraphModel, NodeIndex, Vec2};
use depgraph_core::LayoutDirection;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

pub trait Layouter {
    fn execute(&self, model: &GraphModel) -> LayoutResult;
}

/// Center-anchored placement for every registered node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    pub centers: HashMap<NodeIndex, Vec2>,
    pub sizes: HashMap<NodeIndex, Vec2>,
    pub ranks: HashMap<NodeIndex, usize>,
}

impl LayoutResult {
    pub fn center(&self, idx: NodeIndex) -> Option<Vec2> {
        self.centers.get(&idx).copied()
    }

    pub fn rank(&self, idx: NodeIndex) -> Option<usize> {
        self.ranks.get(&idx).copied()
    }
}

/// Converts a center anchor into the top-left corner of a box of `size`.
pub fn to_top_left(center: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(center.x - size.x / 2.0, center.y - size.y / 2.0)
}

pub struct LayeredLayouter {
    pub direction: LayoutDirection,
    /// Used for nodes the surface has not measured yet.
    pub default_node_size: Vec2,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub ordering_sweeps: usize,
}

struct OrientedEdges {
    edges: Vec<(usize, usize)>,
    reversed: usize,
}

/// Working graph for ordering: real nodes first, then virtual nodes.
struct LayerGraph {
    sizes: Vec<Vec2>,
    ranks: Vec<usize>,
    /// Neighbours one rank above.
    upper: Vec<Vec<usize>>,
    /// Neighbours one rank below.
    lower: Vec<Vec<usize>>,
    real_count: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

impl Default for LayeredLayouter {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl LayeredLayouter {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            direction: config.direction,
            default_node_size: Vec2::new(config.default_node_width, config.default_node_height),
            node_spacing: config.node_spacing,
            rank_spacing: config.rank_spacing,
            ordering_sweeps: config.ordering_sweeps,
        }
    }

    pub fn with_direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = direction;
        self
    }

    fn node_size(&self, model: &GraphModel, idx: NodeIndex) -> Vec2 {
        model.graph[idx]
            .size
            .filter(|size| {
                size.x.is_finite() && size.y.is_finite() && size.x >= 0.0 && size.y >= 0.0
            })
            .unwrap_or(self.default_node_size)
    }

    fn unique_edges(model: &GraphModel) -> Vec<(usize, usize)> {
        let mut seen = HashSet::new();
        let mut edges = Vec::with_capacity(model.edge_count());
        for edge_idx in model.graph.edge_indices() {
            let Some((source, target)) = model.graph.edge_endpoints(edge_idx) else {
                continue;
            };
            if source == target {
                continue;
            }
            if seen.insert((source.0, target.0)) {
                edges.push((source.0, target.0));
            }
        }
        edges
    }

    fn remove_cycles(node_count: usize, edges: &[(usize, usize)]) -> OrientedEdges {
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for (pos, &(source, _)) in edges.iter().enumerate() {
            outgoing[source].push(pos);
        }

        let mut state = vec![Visit::New; node_count];
        let mut reverse = vec![false; edges.len()];

        for start in 0..node_count {
            if state[start] != Visit::New {
                continue;
            }
            state[start] = Visit::Active;
            let mut stack = vec![(start, 0usize)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if let Some(&edge_pos) = outgoing[node].get(frame.1) {
                    frame.1 += 1;
                    let target = edges[edge_pos].1;
                    match state[target] {
                        Visit::Active => reverse[edge_pos] = true,
                        Visit::New => {
                            state[target] = Visit::Active;
                            stack.push((target, 0));
                        }
                        Visit::Done => {}
                    }
                } else {
                    state[node] = Visit::Done;
                    stack.pop();
                }
            }
        }

        let mut seen = HashSet::new();
        let mut oriented = Vec::with_capacity(edges.len());
        for (pos, &(source, target)) in edges.iter().enumerate() {
            let edge = if reverse[pos] {
                (target, source)
            } else {
                (source, target)
            };
            if seen.insert(edge) {
                oriented.push(edge);
            }
        }

        OrientedEdges {
            edges: oriented,
            reversed: reverse.iter().filter(|&&r| r).count(),
        }
    }

    /// Longest-path ranking over an acyclic edge set.
    fn assign_ranks(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
        let mut indegree = vec![0usize; node_count];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for &(source, target) in edges {
            indegree[target] += 1;
            outgoing[source].push(target);
        }

        let mut ranks = vec![0usize; node_count];
        let mut queue: VecDeque<usize> = (0..node_count).filter(|&n| indegree[n] == 0).collect();
        let mut processed = 0;

        while let Some(node) = queue.pop_front() {
            processed += 1;
            for &next in &outgoing[node] {
                ranks[next] = ranks[next].max(ranks[node] + 1);
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if processed < node_count {
            tracing::warn!(
                "Ranking left {} nodes unprocessed; cycle removal missed an edge",
                node_count - processed
            );
        }

        ranks
    }

    fn build_layer_graph(
        &self,
        model: &GraphModel,
        edges: &[(usize, usize)],
        ranks: Vec<usize>,
    ) -> LayerGraph {
        let real_count = ranks.len();
        let mut sizes: Vec<Vec2> = model
            .graph
            .node_indices()
            .map(|idx| self.node_size(model, idx))
            .collect();
        let mut ranks = ranks;
        let mut upper: Vec<Vec<usize>> = vec![Vec::new(); real_count];
        let mut lower: Vec<Vec<usize>> = vec![Vec::new(); real_count];

        for &(source, target) in edges {
            let (from, to) = (ranks[source], ranks[target]);
            let mut previous = source;
            for rank in (from + 1)..to {
                let virtual_idx = sizes.len();
                sizes.push(Vec2::default());
                ranks.push(rank);
                upper.push(vec![previous]);
                lower.push(Vec::new());
                lower[previous].push(virtual_idx);
                previous = virtual_idx;
            }
            lower[previous].push(target);
            upper[target].push(previous);
        }

        LayerGraph {
            sizes,
            ranks,
            upper,
            lower,
            real_count,
        }
    }

    fn build_layers(graph: &LayerGraph) -> Vec<Vec<usize>> {
        let depth = graph.ranks.iter().max().map_or(0, |max| max + 1);
        let mut layers = vec![Vec::new(); depth];
        for (node, &rank) in graph.ranks.iter().enumerate() {
            layers[rank].push(node);
        }
        layers
    }

    fn refresh_positions(layer: &[usize], positions: &mut [usize]) {
        for (slot, &node) in layer.iter().enumerate() {
            positions[node] = slot;
        }
    }

    fn order_layer_by_barycenter(
        layer: &mut [usize],
        positions: &[usize],
        neighbours: &[Vec<usize>],
    ) {
        let mut keyed: Vec<(f32, usize, usize)> = layer
            .iter()
            .map(|&node| {
                let adjacent = &neighbours[node];
                let barycenter = if adjacent.is_empty() {
                    positions[node] as f32
                } else {
                    adjacent.iter().map(|&n| positions[n] as f32).sum::<f32>()
                        / adjacent.len() as f32
                };
                (barycenter, positions[node], node)
            })
            .collect();

        keyed.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        for (slot, (_, _, node)) in keyed.into_iter().enumerate() {
            layer[slot] = node;
        }
    }

    fn count_crossings(layers: &[Vec<usize>], positions: &[usize], lower: &[Vec<usize>]) -> usize {
        let mut total = 0;
        for layer in layers {
            let segments: Vec<(usize, usize)> = layer
                .iter()
                .flat_map(|&node| {
                    lower[node]
                        .iter()
                        .map(move |&below| (positions[node], positions[below]))
                })
                .collect();

            for (i, &(a_top, a_bottom)) in segments.iter().enumerate() {
                for &(b_top, b_bottom) in &segments[i + 1..] {
                    if (a_top < b_top && a_bottom > b_bottom) || (a_top > b_top && a_bottom < b_bottom)
                    {
                        total += 1;
                    }
                }
            }
        }
        total
    }

    fn minimise_crossings(&self, graph: &LayerGraph, layers: &mut Vec<Vec<usize>>) {
        let mut positions = vec![0usize; graph.sizes.len()];
        for layer in layers.iter() {
            Self::refresh_positions(layer, &mut positions);
        }

        let mut best = layers.clone();
        let mut best_crossings = Self::count_crossings(layers, &positions, &graph.lower);

        for _ in 0..self.ordering_sweeps {
            if best_crossings == 0 {
                break;
            }

            for rank in 1..layers.len() {
                Self::order_layer_by_barycenter(&mut layers[rank], &positions, &graph.upper);
                Self::refresh_positions(&layers[rank], &mut positions);
            }
            for rank in (0..layers.len().saturating_sub(1)).rev() {
                Self::order_layer_by_barycenter(&mut layers[rank], &positions, &graph.lower);
                Self::refresh_positions(&layers[rank], &mut positions);
            }

            let crossings = Self::count_crossings(layers, &positions, &graph.lower);
            if crossings < best_crossings {
                best = layers.clone();
                best_crossings = crossings;
            }
        }

        *layers = best;
    }

    fn assign_coordinates(&self, graph: &LayerGraph, layers: &[Vec<usize>]) -> Vec<Vec2> {
        let horizontal = self.direction.is_horizontal();
        let cross_extent = |size: Vec2| if horizontal { size.y } else { size.x };
        let rank_extent = |size: Vec2| if horizontal { size.x } else { size.y };

        let mut centers = vec![Vec2::default(); graph.sizes.len()];
        let mut rank_center = 0.0f32;
        let mut previous_half: Option<f32> = None;

        for layer in layers {
            let thickness = layer
                .iter()
                .map(|&node| rank_extent(graph.sizes[node]))
                .fold(0.0f32, f32::max);
            let half = thickness / 2.0;
            rank_center = match previous_half {
                Some(previous) => rank_center + previous + self.rank_spacing + half,
                None => half,
            };
            previous_half = Some(half);

            let rank_coord = if self.direction.is_reversed() {
                -rank_center
            } else {
                rank_center
            };

            let total = layer
                .iter()
                .map(|&node| cross_extent(graph.sizes[node]))
                .sum::<f32>()
                + layer.len().saturating_sub(1) as f32 * self.node_spacing;
            let mut offset = -total / 2.0;

            for &node in layer {
                let extent = cross_extent(graph.sizes[node]);
                let cross = offset + extent / 2.0;
                centers[node] = if horizontal {
                    Vec2::new(rank_coord, cross)
                } else {
                    Vec2::new(cross, rank_coord)
                };
                offset += extent + self.node_spacing;
            }
        }

        centers
    }
}

impl Layouter for LayeredLayouter {
    fn execute(&self, model: &GraphModel) -> LayoutResult {
        let node_count = model.node_count();
        if node_count == 0 {
            return LayoutResult::default();
        }

        let edges = Self::unique_edges(model);
        let oriented = Self::remove_cycles(node_count, &edges);
        if oriented.reversed > 0 {
            tracing::debug!(
                reversed = oriented.reversed,
                "reversed cycle-closing edges for ranking"
            );
        }

        let ranks = Self::assign_ranks(node_count, &oriented.edges);
        let layer_graph = self.build_layer_graph(model, &oriented.edges, ranks);
        let mut layers = Self::build_layers(&layer_graph);
        self.minimise_crossings(&layer_graph, &mut layers);
        let centers = self.assign_coordinates(&layer_graph, &layers);

        let mut result = LayoutResult::default();
        for idx in model.graph.node_indices() {
            result.centers.insert(idx, centers[idx.0]);
            result.sizes.insert(idx, layer_graph.sizes[idx.0]);
            result.ranks.insert(idx, layer_graph.ranks[idx.0]);
        }

        tracing::debug!(
            nodes = layer_graph.real_count,
            virtual_nodes = layer_graph.sizes.len() - layer_graph.real_count,
            ranks = layers.len(),
            direction = ?self.direction,
            "layered layout complete"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depgraph_core::{NodeId, ResourceType, Size};
    use proptest::prelude::*;

    fn node(id: &str) -> NodeId {
        NodeId::new(ResourceType::App, id)
    }

    fn model_with(nodes: &[&str], edges: &[(&str, &str)]) -> GraphModel {
        let mut model = GraphModel::new();
        for id in nodes {
            model.add_node(node(id), None);
        }
        for (source, target) in edges {
            model.add_edge(&node(source), &node(target));
        }
        model
    }

    fn rank_of(model: &GraphModel, result: &LayoutResult, id: &str) -> usize {
        let idx = model.index_of(&node(id)).unwrap();
        result.rank(idx).unwrap()
    }

    fn center_of(model: &GraphModel, result: &LayoutResult, id: &str) -> Vec2 {
        let idx = model.index_of(&node(id)).unwrap();
        result.center(idx).unwrap()
    }

    #[test]
    fn test_chain_ranks_follow_edges() {
        let model = model_with(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let result = LayeredLayouter::default().execute(&model);

        assert_eq!(rank_of(&model, &result, "a"), 0);
        assert_eq!(rank_of(&model, &result, "b"), 1);
        assert_eq!(rank_of(&model, &result, "c"), 2);
    }

    #[test]
    fn test_rank_is_longest_path() {
        let model = model_with(&["a", "b", "c"], &[("a", "c"), ("a", "b"), ("b", "c")]);
        let result = LayeredLayouter::default().execute(&model);

        assert_eq!(rank_of(&model, &result, "c"), 2);
        assert_eq!(result.centers.len(), 3, "virtual nodes are never returned");
    }

    #[test]
    fn test_isolated_nodes_rank_zero() {
        let model = model_with(&["a", "b", "lonely"], &[("a", "b")]);
        let result = LayeredLayouter::default().execute(&model);

        assert_eq!(rank_of(&model, &result, "lonely"), 0);
        assert_eq!(result.centers.len(), 3);
    }

    #[test]
    fn test_two_node_cycle_breaks_at_first_registered() {
        let model = model_with(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let result = LayeredLayouter::default().execute(&model);

        assert_eq!(rank_of(&model, &result, "a"), 0);
        assert_eq!(rank_of(&model, &result, "b"), 1);
    }

    #[test]
    fn test_three_node_cycle_is_layered() {
        let model = model_with(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let result = LayeredLayouter::default().execute(&model);

        assert_eq!(rank_of(&model, &result, "a"), 0);
        assert_eq!(rank_of(&model, &result, "b"), 1);
        assert_eq!(rank_of(&model, &result, "c"), 2);
    }

    #[test]
    fn test_self_loop_does_not_affect_rank() {
        let model = model_with(&["a"], &[("a", "a")]);
        let result = LayeredLayouter::default().execute(&model);

        assert_eq!(rank_of(&model, &result, "a"), 0);
    }

    #[test]
    fn test_unmeasured_nodes_use_default_size() {
        let mut model = model_with(&["a", "b"], &[]);
        model.set_size(&node("b"), Size::new(400.0, 90.0));
        let result = LayeredLayouter::default().execute(&model);

        let a = model.index_of(&node("a")).unwrap();
        let b = model.index_of(&node("b")).unwrap();
        assert_eq!(result.sizes[&a], Vec2::new(250.0, 50.0));
        assert_eq!(result.sizes[&b], Vec2::new(400.0, 90.0));
    }

    #[test]
    fn test_direction_changes_primary_axis() {
        let model = model_with(&["a", "b"], &[("a", "b")]);

        for direction in LayoutDirection::ALL {
            let result = LayeredLayouter::default()
                .with_direction(direction)
                .execute(&model);
            let a = center_of(&model, &result, "a");
            let b = center_of(&model, &result, "b");

            match direction {
                LayoutDirection::TopBottom => assert!(b.y > a.y),
                LayoutDirection::BottomTop => assert!(b.y < a.y),
                LayoutDirection::LeftRight => assert!(b.x > a.x),
                LayoutDirection::RightLeft => assert!(b.x < a.x),
            }
        }
    }

    #[test]
    fn test_ranks_do_not_overlap_along_primary_axis() {
        let model = model_with(&["a", "b"], &[("a", "b")]);
        let result = LayeredLayouter::default().execute(&model);

        let a = center_of(&model, &result, "a");
        let b = center_of(&model, &result, "b");
        // Two default-height boxes plus the rank gap.
        assert!((b.y - a.y - (50.0 + 80.0)).abs() < 0.001);
    }

    #[test]
    fn test_nodes_in_one_rank_do_not_overlap() {
        let model = model_with(&["root", "x", "y", "z"], &[("root", "x"), ("root", "y"), ("root", "z")]);
        let result = LayeredLayouter::default().execute(&model);

        let mut xs: Vec<f32> = ["x", "y", "z"]
            .iter()
            .map(|id| center_of(&model, &result, id).x)
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= 250.0 + 40.0 - 0.001);
        }
    }

    #[test]
    fn test_barycenter_removes_simple_crossing() {
        let model = model_with(&["a", "b", "c", "d"], &[("a", "d"), ("b", "c")]);
        let result = LayeredLayouter::default().execute(&model);

        let a = center_of(&model, &result, "a");
        let b = center_of(&model, &result, "b");
        let c = center_of(&model, &result, "c");
        let d = center_of(&model, &result, "d");
        assert!(a.x < b.x);
        assert!(d.x < c.x, "d should move under a to avoid the crossing");
    }

    #[test]
    fn test_empty_model_returns_empty_result() {
        let result = LayeredLayouter::default().execute(&GraphModel::new());
        assert!(result.centers.is_empty());
    }

    #[test]
    fn test_to_top_left() {
        let corner = to_top_left(Vec2::new(100.0, 60.0), Vec2::new(250.0, 50.0));
        assert_eq!(corner, Vec2::new(-25.0, 35.0));
    }

    fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (1usize..10).prop_flat_map(|n| {
            (
                Just(n),
                proptest::collection::vec((0..n, 0..n), 0..20),
            )
        })
    }

    fn build(n: usize, edges: &[(usize, usize)]) -> GraphModel {
        let mut model = GraphModel::new();
        for i in 0..n {
            model.add_node(node(&i.to_string()), None);
        }
        for &(s, t) in edges {
            model.add_edge(&node(&s.to_string()), &node(&t.to_string()));
        }
        model
    }

    proptest! {
        #[test]
        fn prop_every_node_gets_a_finite_position((n, edges) in graph_strategy()) {
            let model = build(n, &edges);
            for direction in LayoutDirection::ALL {
                let result = LayeredLayouter::default().with_direction(direction).execute(&model);
                prop_assert_eq!(result.centers.len(), n);
                for idx in model.graph.node_indices() {
                    let center = result.center(idx).expect("every node is placed");
                    prop_assert!(center.x.is_finite() && center.y.is_finite());
                }
            }
        }

        #[test]
        fn prop_layout_is_deterministic((n, edges) in graph_strategy()) {
            let first = LayeredLayouter::default().execute(&build(n, &edges));
            let second = LayeredLayouter::default().execute(&build(n, &edges));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_acyclic_edges_point_down_the_ranks((n, edges) in graph_strategy()) {
            let forward: Vec<(usize, usize)> = edges
                .into_iter()
                .filter(|(s, t)| s < t)
                .collect();
            let model = build(n, &forward);
            let result = LayeredLayouter::default().execute(&model);
            for (s, t) in forward {
                let rs = result.rank(NodeIndex(s)).unwrap();
                let rt = result.rank(NodeIndex(t)).unwrap();
                prop_assert!(rt > rs, "edge {} -> {} has ranks {} -> {}", s, t, rs, rt);
            }
        }
    }
}
