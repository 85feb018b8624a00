use crate::grid::EdgeGrid;
use gr_common::db::core::Net;
use gr_common::db::indices::EdgeId;
use std::collections::HashSet;

// Each distinct edge counts once per net no matter how many segments cross
// it, so ripping is the exact inverse.
pub fn place_net(grid: &mut EdgeGrid, net: &Net) {
    let mut seen: HashSet<EdgeId> = HashSet::new();
    for seg in &net.route {
        for &id in &seg.edges {
            if seen.insert(id) {
                grid.inc_util(id);
            }
        }
    }
}

pub fn rip_net(grid: &mut EdgeGrid, net: &mut Net) {
    let mut seen: HashSet<EdgeId> = HashSet::new();
    for seg in &net.route {
        for &id in &seg.edges {
            if seen.insert(id) {
                grid.dec_util(id);
            }
        }
    }
    net.route.clear();
}
