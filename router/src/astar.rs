use crate::grid::EdgeGrid;
use gr_common::db::core::Segment;
use gr_common::db::indices::EdgeId;
use gr_common::error::{CodecError, RouteError};
use gr_common::geom::point::Point;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

// Edge costs are fractional; heap keys are fixed-point so Ord is exact.
const SCALE: f64 = 100.0;

#[derive(Clone, Copy, PartialEq, Eq)]
struct State {
    f: i64,
    g: i64,
    seq: u32,
    point: Point,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f, deeper g first on ties, then insertion order so
        // every search is reproducible.
        other
            .f
            .cmp(&self.f)
            .then_with(|| self.g.cmp(&other.g))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Implementations only read the grid, so segment searches can run
// concurrently.
pub trait EdgeCost: Sync {
    fn edge_cost(&self, grid: &EdgeGrid, id: EdgeId) -> f64;
}

// 1 + penalty * util / (cap + 1)
pub struct StandardCost {
    pub penalty: i32,
}

impl EdgeCost for StandardCost {
    fn edge_cost(&self, grid: &EdgeGrid, id: EdgeId) -> f64 {
        1.0 + self.penalty as f64 * grid.util(id) as f64 / (grid.cap(id) as f64 + 1.0)
    }
}

// Sigmoid blend of history weight and utilization; both schedule
// parameters sharpen with the iteration count and saturate after 100.
pub struct AdaptiveCost {
    pub iteration: u32,
}

impl EdgeCost for AdaptiveCost {
    fn edge_cost(&self, grid: &EdgeGrid, id: EdgeId) -> f64 {
        let h = (0.5 + self.iteration as f64 / 100.0).min(1.0);
        let k = (0.01 + self.iteration as f64 / 100.0).min(1.0);
        let cap = grid.cap(id).max(1) as f64;
        let load = (grid.util(id) + grid.weight(id)) as f64;
        1.0 + h / (1.0 + (-k * load / cap).exp()) - h
    }
}

// On success the segment holds a connected walk, goal-to-start edge order,
// consumed as a multiset by placement.
pub fn route_segment<C: EdgeCost>(
    seg: &mut Segment,
    grid: &EdgeGrid,
    cost: &C,
) -> Result<(), RouteError> {
    debug_assert!(seg.edges.is_empty());
    let path = search(grid, seg.p1, seg.p2, |id| Some(cost.edge_cost(grid, id)))?
        .ok_or(RouteError::Unroutable {
            p1: seg.p1,
            p2: seg.p2,
        })?;
    seg.edges = path;
    Ok(())
}

// Excludes edges whose utilization reaches cap + level, growing the level
// exponentially until a path exists and then bisecting down to the minimum
// violation level. The aggression seed carries the typical level across
// calls.
pub struct BisectRouter {
    aggression: i32,
    start_hi: i32,
}

impl BisectRouter {
    pub fn new(start_hi: i32) -> Self {
        Self {
            aggression: 0,
            start_hi: start_hi.max(1),
        }
    }

    pub fn route(&mut self, seg: &mut Segment, grid: &EdgeGrid) -> Result<(), RouteError> {
        debug_assert!(seg.edges.is_empty());

        // Beyond this level no edge is excluded at all, so a failure there
        // means the grid itself is disconnected.
        let relax_limit = grid.max_util() + 1;

        let mut hi = self.start_hi.max(self.aggression).max(1).min(relax_limit);
        let mut best;
        loop {
            match self.attempt(seg, grid, hi)? {
                Some(path) => {
                    best = path;
                    break;
                }
                None if hi >= relax_limit => {
                    return Err(RouteError::Unroutable {
                        p1: seg.p1,
                        p2: seg.p2,
                    });
                }
                None => hi = (hi * 2).min(relax_limit),
            }
        }

        // Bisect between the highest failing and lowest succeeding level;
        // -1 stands in for "no failing level observed yet".
        let mut lo = -1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            match self.attempt(seg, grid, mid)? {
                Some(path) => {
                    best = path;
                    hi = mid;
                }
                None => lo = mid,
            }
        }

        seg.edges = best;
        self.aggression = (self.aggression + hi) / 2;
        Ok(())
    }

    pub fn aggression(&self) -> i32 {
        self.aggression
    }

    fn attempt(
        &self,
        seg: &Segment,
        grid: &EdgeGrid,
        level: i32,
    ) -> Result<Option<Vec<EdgeId>>, CodecError> {
        search(grid, seg.p1, seg.p2, |id| {
            if grid.util(id) >= grid.cap(id) + level {
                None
            } else {
                Some(1.0)
            }
        })
    }
}

// `edge_cost` returns None to exclude an edge. Returns None when the open
// set drains without reaching the goal.
fn search<F>(
    grid: &EdgeGrid,
    p1: Point,
    p2: Point,
    mut edge_cost: F,
) -> Result<Option<Vec<EdgeId>>, CodecError>
where
    F: FnMut(EdgeId) -> Option<f64>,
{
    if p1 == p2 {
        return Ok(Some(Vec::new()));
    }

    let mut heap = BinaryHeap::new();
    let mut g_score: HashMap<Point, i64> = HashMap::new();
    let mut closed: HashSet<Point> = HashSet::new();
    let mut prev: HashMap<Point, Point> = HashMap::new();
    let mut seq = 0u32;

    g_score.insert(p1, 0);
    heap.push(State {
        f: heuristic(p1, p2),
        g: 0,
        seq,
        point: p1,
    });

    while let Some(State { g, point, .. }) = heap.pop() {
        if g > g_score[&point] {
            continue; // stale entry
        }
        if point == p2 {
            return Ok(Some(reconstruct(grid, &prev, p1, p2)?));
        }
        if !closed.insert(point) {
            continue;
        }

        let current = g;
        for n in neighbors(grid, point) {
            if closed.contains(&n) {
                continue;
            }
            let id = grid.edge_between(point, n)?;
            let Some(step) = edge_cost(id) else {
                continue;
            };

            let tentative = current + (step * SCALE) as i64;
            if g_score.get(&n).is_none_or(|&cur| tentative < cur) {
                g_score.insert(n, tentative);
                prev.insert(n, point);
                seq += 1;
                heap.push(State {
                    f: tentative + heuristic(n, p2),
                    g: tentative,
                    seq,
                    point: n,
                });
            }
        }
    }

    Ok(None)
}

#[inline]
fn heuristic(p: Point, goal: Point) -> i64 {
    p.l1_dist(goal) as i64 * SCALE as i64
}

fn neighbors(grid: &EdgeGrid, p: Point) -> impl Iterator<Item = Point> {
    let (gx, gy) = (grid.gx(), grid.gy());
    [(-1, 0), (1, 0), (0, -1), (0, 1)]
        .into_iter()
        .map(move |(dx, dy)| Point::new(p.x + dx, p.y + dy))
        .filter(move |q| q.x >= 0 && q.x < gx && q.y >= 0 && q.y < gy)
}

fn reconstruct(
    grid: &EdgeGrid,
    prev: &HashMap<Point, Point>,
    p1: Point,
    p2: Point,
) -> Result<Vec<EdgeId>, CodecError> {
    let mut edges = Vec::new();
    let mut p = p2;
    while p != p1 {
        let q = prev[&p];
        edges.push(grid.edge_between(p, q)?);
        p = q;
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(gx: i32, gy: i32, cap: i32) -> EdgeGrid {
        EdgeGrid::new(gx, gy, cap, Vec::new())
    }

    fn seg(x1: i32, y1: i32, x2: i32, y2: i32) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    // The edge list is emitted goal-to-start.
    fn assert_valid_walk(g: &EdgeGrid, s: &Segment) {
        let mut at = s.p2;
        for &id in &s.edges {
            let (a, b) = g.codec().edge(id);
            at = if at == a {
                b
            } else {
                assert_eq!(at, b, "walk broken at edge {id:?}");
                a
            };
        }
        assert_eq!(at, s.p1, "walk does not end at the segment start");
    }

    fn path_cost<C: EdgeCost>(g: &EdgeGrid, cost: &C, edges: &[EdgeId]) -> f64 {
        edges.iter().map(|&id| cost.edge_cost(g, id)).sum()
    }

    #[test]
    fn three_by_three_l_path() {
        let g = grid(3, 3, 1);
        let mut s = seg(0, 0, 2, 2);
        let cost = StandardCost { penalty: 20 };
        route_segment(&mut s, &g, &cost).unwrap();

        assert_eq!(s.edges.len(), 4);
        assert_valid_walk(&g, &s);
        // No utilization anywhere, so the penalty term contributes nothing.
        let total = path_cost(&g, &cost, &s.edges);
        assert!((total - 4.0).abs() < 1e-9, "cost was {total}");
    }

    #[test]
    fn uniform_cost_paths_are_shortest() {
        let g = grid(5, 5, 3);
        let cost = StandardCost { penalty: 5 };
        for (a, b) in [
            (Point::new(0, 0), Point::new(4, 4)),
            (Point::new(4, 0), Point::new(0, 3)),
            (Point::new(2, 2), Point::new(2, 2)),
            (Point::new(1, 4), Point::new(1, 0)),
        ] {
            let mut s = Segment::new(a, b);
            route_segment(&mut s, &g, &cost).unwrap();
            assert_eq!(s.edges.len() as i32, a.l1_dist(b));
            assert_valid_walk(&g, &s);
        }
    }

    #[test]
    fn search_is_deterministic() {
        let g = grid(6, 6, 2);
        let cost = StandardCost { penalty: 7 };
        let mut a = seg(0, 5, 5, 0);
        let mut b = seg(0, 5, 5, 0);
        route_segment(&mut a, &g, &cost).unwrap();
        route_segment(&mut b, &g, &cost).unwrap();
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn standard_cost_routes_around_saturated_edges() {
        // 3x2 grid, capacity 1. The first net takes the straight bottom
        // row; the second must detour over the top once the penalty term
        // dominates the two extra hops.
        let mut g = grid(3, 2, 1);
        let cost = StandardCost { penalty: 20 };

        let mut first = seg(0, 0, 2, 0);
        route_segment(&mut first, &g, &cost).unwrap();
        assert_eq!(first.edges.len(), 2);
        for &id in &first.edges {
            g.inc_util(id);
        }

        let mut second = seg(0, 0, 2, 0);
        route_segment(&mut second, &g, &cost).unwrap();
        assert_valid_walk(&g, &second);
        assert_eq!(second.edges.len(), 4);
        for id in &second.edges {
            assert!(!first.edges.contains(id), "second net reused {id:?}");
        }
    }

    #[test]
    fn bisect_router_finds_zero_violation_level_when_free() {
        let g = grid(3, 1, 1);
        let mut router = BisectRouter::new(10);
        let mut s = seg(0, 0, 2, 0);
        router.route(&mut s, &g).unwrap();
        assert_eq!(s.edges.len(), 2);
        assert_eq!(router.aggression(), 0);
    }

    #[test]
    fn bisect_router_relaxes_on_saturated_corridor() {
        // Single-row grid: every edge already at capacity, so the only
        // path needs exactly one level of tolerated violation.
        let mut g = grid(3, 1, 1);
        for i in 0..g.codec().num_edges() {
            g.inc_util(EdgeId::new(i));
        }

        let mut router = BisectRouter::new(1);
        let mut s = seg(0, 0, 2, 0);
        router.route(&mut s, &g).unwrap();
        assert_eq!(s.edges.len(), 2);
        assert_valid_walk(&g, &s);
    }

    #[test]
    fn adaptive_cost_routes_valid_walks() {
        let mut g = grid(4, 4, 1);
        for i in 0..4 {
            g.inc_util(EdgeId::new(i));
            g.inc_util(EdgeId::new(i));
        }
        g.update_edge_weights();

        let cost = AdaptiveCost { iteration: 3 };
        let mut s = seg(0, 0, 3, 3);
        route_segment(&mut s, &g, &cost).unwrap();
        assert_valid_walk(&g, &s);
        assert!(s.edges.len() >= 6);
    }

    #[test]
    fn zero_length_segment_routes_to_empty_edge_list() {
        let g = grid(4, 4, 2);
        let mut s = seg(1, 1, 1, 1);
        route_segment(&mut s, &g, &StandardCost { penalty: 1 }).unwrap();
        assert!(s.edges.is_empty());
    }
}
