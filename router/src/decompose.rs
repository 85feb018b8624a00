use crate::partition;
use gr_common::db::core::{Net, Segment};
use gr_common::geom::point::Point;
use rayon::prelude::*;

// The route must be empty; callers rip before re-decomposing.
pub fn decompose_net(net: &mut Net, use_mst: bool) {
    debug_assert!(net.route.is_empty());
    if use_mst {
        decompose_mst(net);
    } else {
        decompose_simple(net);
    }
}

// Each net only touches its own pins and route, so chunks parallelize.
pub fn decompose_nets(nets: &mut [Net], use_mst: bool) {
    if nets.is_empty() {
        return;
    }
    nets.par_chunks_mut(partition::chunk_len(nets.len()))
        .for_each(|chunk| {
            for net in chunk {
                decompose_net(net, use_mst);
            }
        });
}

fn decompose_simple(net: &mut Net) {
    if net.pins.is_empty() {
        return;
    }
    for pair in net.pins.windows(2) {
        net.route.push(Segment::new(pair[0], pair[1]));
    }
}

// Prim over L1 distance. Ties resolve to the first pin found in scan
// order, so the result is deterministic for a given pin order.
fn decompose_mst(net: &mut Net) {
    if net.pins.len() < 2 {
        return;
    }

    let p0 = net.pins[0];
    // (pin, nearest tree node, distance to it); shrinks as pins attach.
    let mut pending: Vec<(Point, Point, i32)> = net.pins[1..]
        .iter()
        .map(|&p| (p, p0, p0.l1_dist(p)))
        .collect();

    while !pending.is_empty() {
        let mut best = 0;
        for (k, cand) in pending.iter().enumerate() {
            if cand.2 < pending[best].2 {
                best = k;
            }
        }

        let (p, attach, _) = pending.remove(best);
        net.route.push(Segment::new(p, attach));

        for cand in &mut pending {
            let d = p.l1_dist(cand.0);
            if d < cand.2 {
                cand.1 = p;
                cand.2 = d;
            }
        }
    }
}
