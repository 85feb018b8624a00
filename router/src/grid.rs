use gr_common::db::core::{Net, RoutingInstance};
use gr_common::db::indices::EdgeId;
use gr_common::geom::edge::EdgeCodec;
use gr_common::geom::point::Point;

#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeInfo {
    pub overflow_count: i32,
    pub weight: i32,
}

// Routing workers hold `&EdgeGrid` and only read; all utilization mutation
// goes through the crate-private increment/decrement, which the controller
// runs single-threaded.
pub struct EdgeGrid {
    codec: EdgeCodec,
    default_cap: i32,

    // Sparse, growable, keyed by dense edge ID: reads past the stored length
    // return the default capacity / zero utilization.
    caps: Vec<i32>,
    utils: Vec<i32>,
    infos: Vec<EdgeInfo>,
}

impl EdgeGrid {
    pub fn new(gx: i32, gy: i32, default_cap: i32, caps: Vec<i32>) -> Self {
        Self {
            codec: EdgeCodec::new(gx, gy),
            default_cap,
            caps,
            utils: Vec::new(),
            infos: Vec::new(),
        }
    }

    pub fn from_instance(inst: &RoutingInstance) -> Self {
        Self::new(
            inst.gx,
            inst.gy,
            inst.default_capacity,
            inst.edge_caps.clone(),
        )
    }

    pub fn codec(&self) -> &EdgeCodec {
        &self.codec
    }

    pub fn gx(&self) -> i32 {
        self.codec.gx()
    }

    pub fn gy(&self) -> i32 {
        self.codec.gy()
    }

    pub fn cap(&self, id: EdgeId) -> i32 {
        self.caps.get(id.index()).copied().unwrap_or(self.default_cap)
    }

    pub fn util(&self, id: EdgeId) -> i32 {
        self.utils.get(id.index()).copied().unwrap_or(0)
    }

    pub fn weight(&self, id: EdgeId) -> i32 {
        self.infos.get(id.index()).map(|i| i.weight).unwrap_or(0)
    }

    pub fn overflow(&self, id: EdgeId) -> i32 {
        self.util(id) - self.cap(id)
    }

    pub fn is_over_capacity(&self, id: EdgeId) -> bool {
        self.util(id) > self.cap(id)
    }

    pub fn max_util(&self) -> i32 {
        self.utils.iter().copied().max().unwrap_or(0)
    }

    pub(crate) fn inc_util(&mut self, id: EdgeId) {
        *slot(&mut self.utils, id.index(), 0) += 1;
    }

    pub(crate) fn dec_util(&mut self, id: EdgeId) {
        *slot(&mut self.utils, id.index(), 0) -= 1;
    }

    // Once per rip-up iteration: over-capacity edges accrue history
    // (weight = overflow * overflow_count, count escalating each
    // observation); everything else resets to zero weight.
    pub fn update_edge_weights(&mut self) {
        if self.infos.len() < self.utils.len() {
            self.infos.resize(self.utils.len(), EdgeInfo::default());
        }

        for i in 0..self.infos.len() {
            let overflow = self.overflow(EdgeId::new(i));
            let info = &mut self.infos[i];
            if overflow > 0 {
                info.overflow_count += 1;
                info.weight = overflow * info.overflow_count;
            } else {
                info.weight = 0;
            }
        }
    }

    pub fn count_violations(&self) -> usize {
        (0..self.utils.len())
            .filter(|&i| self.is_over_capacity(EdgeId::new(i)))
            .count()
    }

    pub fn net_has_violation(&self, net: &Net) -> bool {
        net.route
            .iter()
            .flat_map(|s| s.edges.iter())
            .any(|&id| self.is_over_capacity(id))
    }

    pub fn overflow_snapshot(&self) -> Vec<i32> {
        (0..self.utils.len())
            .map(|i| self.overflow(EdgeId::new(i)))
            .collect()
    }

    pub fn edge_between(&self, p1: Point, p2: Point) -> Result<EdgeId, gr_common::error::CodecError> {
        self.codec.edge_id(p1, p2)
    }
}

fn slot(vec: &mut Vec<i32>, idx: usize, default: i32) -> &mut i32 {
    if idx >= vec.len() {
        vec.resize(idx + 1, default);
    }
    &mut vec[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_2x2(cap: i32) -> EdgeGrid {
        EdgeGrid::new(2, 2, cap, Vec::new())
    }

    #[test]
    fn untouched_edges_read_defaults() {
        let g = grid_2x2(3);
        let id = EdgeId::new(2);
        assert_eq!(g.cap(id), 3);
        assert_eq!(g.util(id), 0);
        assert_eq!(g.weight(id), 0);
        assert!(!g.is_over_capacity(id));
    }

    #[test]
    fn weights_escalate_on_repeated_overflow() {
        let mut g = grid_2x2(1);
        let id = EdgeId::new(0);
        g.inc_util(id);
        g.inc_util(id);
        g.inc_util(id); // util 3, cap 1 -> overflow 2

        g.update_edge_weights();
        assert_eq!(g.weight(id), 2); // 2 * 1

        g.update_edge_weights();
        assert_eq!(g.weight(id), 4); // 2 * 2

        // Back under capacity, the weight resets but the count persists.
        g.dec_util(id);
        g.dec_util(id);
        g.update_edge_weights();
        assert_eq!(g.weight(id), 0);

        g.inc_util(id);
        g.inc_util(id);
        g.update_edge_weights();
        assert_eq!(g.weight(id), 6); // 2 * 3
    }

    #[test]
    fn violation_count_tracks_overflowing_edges() {
        let mut g = grid_2x2(1);
        g.inc_util(EdgeId::new(0));
        g.inc_util(EdgeId::new(1));
        assert_eq!(g.count_violations(), 0);

        g.inc_util(EdgeId::new(0));
        assert_eq!(g.count_violations(), 1);
        assert_eq!(g.overflow(EdgeId::new(0)), 1);
    }
}
