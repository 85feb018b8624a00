use crate::grid::EdgeGrid;
use gr_common::db::core::Net;
use gr_common::db::indices::{EdgeId, NetId};
use gr_common::geom::bounds::Bounds;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

// Span is the distinct edge count of the current route; an unrouted net
// falls back to its pin bounding box half-perimeter.
pub fn refresh_sort_keys(grid: &EdgeGrid, nets: &mut [Net]) {
    for net in nets.iter_mut() {
        if !net.is_routed() {
            net.total_edge_weight = 0;
            net.span = Bounds::of_points(&net.pins)
                .map_or(0, |b| (b.width() + b.height()) as i64);
            continue;
        }
        let mut distinct: HashSet<EdgeId> = HashSet::new();
        for seg in &net.route {
            distinct.extend(seg.edges.iter().copied());
        }
        net.span = distinct.len() as i64;
        net.total_edge_weight = distinct.iter().map(|&id| grid.weight(id) as i64).sum();
    }
}

// Heaviest historical weight first, shorter span breaking ties, net id
// last so the order is total.
pub fn reorder_nets(nets: &mut [Net]) {
    nets.sort_by_key(|n| (Reverse(n.total_edge_weight), n.span, n.id));
}

// Nets conflicting on over-capacity edges form a dominance graph: each
// conflict points from the smaller-span net to the larger-span net (equal
// spans don't link). Chain depth is the longest dominance path above a
// net, so chain-top nets (depth 1) reroute first and the chain unwinds
// downward. Conflicting nets all move behind the clean ones.
pub fn reorder_by_chains(grid: &EdgeGrid, nets: &mut [Net]) {
    let mut members: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    let mut hot: PriorityQueue<EdgeId, i64> = PriorityQueue::new();
    let mut spans: Vec<usize> = Vec::with_capacity(nets.len());

    for (i, net) in nets.iter().enumerate() {
        let mut seen: HashSet<EdgeId> = HashSet::new();
        for seg in &net.route {
            for &id in &seg.edges {
                if !seen.insert(id) {
                    continue;
                }
                if grid.is_over_capacity(id) {
                    members.entry(id).or_default().push(i);
                    hot.push(id, grid.util(id) as i64 * 1_000_000 / (grid.cap(id) as i64 + 1));
                }
            }
        }
        spans.push(seen.len());
    }

    let mut adj: Vec<HashSet<usize>> = vec![HashSet::new(); nets.len()];
    for group in members.values() {
        for (pos, &a) in group.iter().enumerate() {
            for &b in &group[pos + 1..] {
                if spans[a] < spans[b] {
                    adj[a].insert(b);
                } else if spans[b] < spans[a] {
                    adj[b].insert(a);
                }
            }
        }
    }
    let adj: Vec<Vec<usize>> = adj
        .into_iter()
        .map(|set| {
            let mut v: Vec<usize> = set.into_iter().collect();
            v.sort_unstable();
            v
        })
        .collect();

    // Walk chains starting from the most overloaded edges.
    let mut depth: Vec<Option<usize>> = vec![None; nets.len()];
    while let Some((id, _)) = hot.pop() {
        for &root in &members[&id] {
            chain_depth(&adj, root, &mut depth);
        }
    }

    let order: HashMap<NetId, usize> = nets
        .iter()
        .enumerate()
        .filter_map(|(i, net)| depth[i].map(|d| (net.id, d)))
        .collect();
    nets.sort_by_key(|n| match order.get(&n.id) {
        Some(&d) => (1, d),
        None => (0, 0),
    });
}

const UNSEEN: u8 = 0;
const OPEN: u8 = 1;
const DONE: u8 = 2;

// A neighbor already on the stack marks a cycle and contributes nothing to
// the depth.
fn chain_depth(adj: &[Vec<usize>], root: usize, depth: &mut [Option<usize>]) {
    if depth[root].is_some() {
        return;
    }
    let mut state = vec![UNSEEN; adj.len()];
    for (i, d) in depth.iter().enumerate() {
        if d.is_some() {
            state[i] = DONE;
        }
    }

    let mut cursor = vec![0usize; adj.len()];
    let mut stack = vec![root];
    state[root] = OPEN;
    while let Some(&v) = stack.last() {
        if let Some(&w) = adj[v].get(cursor[v]) {
            cursor[v] += 1;
            if state[w] == UNSEEN {
                state[w] = OPEN;
                stack.push(w);
            }
        } else {
            let below = adj[v]
                .iter()
                .filter_map(|&w| depth[w])
                .max()
                .unwrap_or(0);
            depth[v] = Some(below + 1);
            state[v] = DONE;
            stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::place_net;
    use gr_common::db::core::Segment;
    use gr_common::geom::point::Point;

    fn net_on_edges(id: usize, ids: &[usize]) -> Net {
        let mut net = Net::new(NetId::new(id), vec![Point::new(0, 0), Point::new(1, 0)]);
        let mut seg = Segment::new(Point::new(0, 0), Point::new(1, 0));
        seg.edges = ids.iter().map(|&i| EdgeId::new(i)).collect();
        net.route.push(seg);
        net
    }

    #[test]
    fn sort_keys_count_distinct_edges_once() {
        let mut grid = EdgeGrid::new(4, 4, 0, Vec::new());
        let mut nets = vec![net_on_edges(0, &[2, 2, 5])];
        place_net(&mut grid, &nets[0]);
        grid.update_edge_weights();

        refresh_sort_keys(&grid, &mut nets);
        assert_eq!(nets[0].span, 2);
        // Capacity 0 everywhere, so each placed edge has overflow 1 and
        // weight 1 after one update.
        assert_eq!(nets[0].total_edge_weight, 2);
    }

    #[test]
    fn reorder_is_weight_then_span_then_id() {
        let mut nets = vec![
            net_on_edges(0, &[1]),
            net_on_edges(1, &[1]),
            net_on_edges(2, &[1]),
        ];
        nets[0].total_edge_weight = 3;
        nets[0].span = 9;
        nets[1].total_edge_weight = 7;
        nets[2].total_edge_weight = 3;
        nets[2].span = 2;

        reorder_nets(&mut nets);
        let ids: Vec<usize> = nets.iter().map(|n| n.id.index()).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn reorder_on_ties_is_stable_by_id() {
        let mut nets = vec![net_on_edges(2, &[1]), net_on_edges(0, &[1])];
        reorder_nets(&mut nets);
        let ids: Vec<usize> = nets.iter().map(|n| n.id.index()).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn chain_depth_follows_span_dominance() {
        let mut grid = EdgeGrid::new(4, 4, 1, Vec::new());
        let small = net_on_edges(0, &[0, 1]);
        let large = net_on_edges(1, &[1, 2, 5]);
        place_net(&mut grid, &small);
        place_net(&mut grid, &large);
        assert!(grid.is_over_capacity(EdgeId::new(1)));

        let mut nets = vec![small, large];
        reorder_by_chains(&grid, &mut nets);
        // The larger-span net tops the dominance chain (depth 1) and goes
        // first; the smaller net feeding into it follows at depth 2.
        let ids: Vec<usize> = nets.iter().map(|n| n.id.index()).collect();
        assert_eq!(ids, vec![1, 0]);
    }

    #[test]
    fn chain_reorder_moves_conflicting_nets_last() {
        let mut grid = EdgeGrid::new(4, 4, 1, Vec::new());
        let clean = net_on_edges(0, &[9]);
        let a = net_on_edges(1, &[0, 1]);
        let b = net_on_edges(2, &[1, 2]);
        place_net(&mut grid, &clean);
        place_net(&mut grid, &a);
        place_net(&mut grid, &b);
        assert!(grid.is_over_capacity(EdgeId::new(1)));

        let mut nets = vec![clean, a, b];
        reorder_by_chains(&grid, &mut nets);
        assert_eq!(nets[0].id.index(), 0, "clean net should stay in front");
        let tail: HashSet<usize> = nets[1..].iter().map(|n| n.id.index()).collect();
        assert_eq!(tail, HashSet::from([1, 2]));
    }
}
