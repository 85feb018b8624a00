use crate::db::indices::{EdgeId, NetId};
use crate::error::InstanceError;
use crate::geom::edge::EdgeCodec;
use crate::geom::point::Point;

// Once routed, `edges` holds a connected walk of unit edges between p1
// and p2 (goal-to-start order; consumed as an unordered multiset).
#[derive(Clone, Debug, Default)]
pub struct Segment {
    pub p1: Point,
    pub p2: Point,
    pub edges: Vec<EdgeId>,
}

impl Segment {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self {
            p1,
            p2,
            edges: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Net {
    pub id: NetId,
    pub pins: Vec<Point>,
    pub route: Vec<Segment>,

    // Sort keys refreshed once per rip-up iteration by the reordering pass.
    pub total_edge_weight: i64,
    pub span: i64,
}

impl Net {
    pub fn new(id: NetId, pins: Vec<Point>) -> Self {
        Self {
            id,
            pins,
            route: Vec::new(),
            total_edge_weight: 0,
            span: 0,
        }
    }

    pub fn is_routed(&self) -> bool {
        !self.route.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct RoutingInstance {
    pub gx: i32,
    pub gy: i32,
    pub default_capacity: i32,
    pub nets: Vec<Net>,

    // Sparse: edges beyond the stored length carry the default capacity.
    pub edge_caps: Vec<i32>,
}

impl RoutingInstance {
    pub fn new(gx: i32, gy: i32, default_capacity: i32) -> Self {
        Self {
            gx,
            gy,
            default_capacity,
            nets: Vec::new(),
            edge_caps: Vec::new(),
        }
    }

    pub fn codec(&self) -> EdgeCodec {
        EdgeCodec::new(self.gx, self.gy)
    }

    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    pub fn edge_cap(&self, id: EdgeId) -> i32 {
        self.edge_caps
            .get(id.index())
            .copied()
            .unwrap_or(self.default_capacity)
    }

    pub fn set_edge_cap(&mut self, id: EdgeId, capacity: i32) {
        let idx = id.index();
        if idx >= self.edge_caps.len() {
            self.edge_caps.resize(idx + 1, self.default_capacity);
        }
        self.edge_caps[idx] = capacity;
    }

    // Net ids must be dense and in declaration order (the solver and the
    // writer index nets directly), and pins must lie on the grid.
    pub fn validate(&self) -> Result<(), InstanceError> {
        if self.gx <= 0 || self.gy <= 0 {
            return Err(InstanceError::BadGrid {
                gx: self.gx,
                gy: self.gy,
            });
        }

        for (i, net) in self.nets.iter().enumerate() {
            if net.id.index() != i {
                return Err(InstanceError::NonDenseNetIds {
                    expected: i,
                    found: net.id.0,
                });
            }
            for &pin in &net.pins {
                if pin.x < 0 || pin.x >= self.gx || pin.y < 0 || pin.y >= self.gy {
                    return Err(InstanceError::PinOutOfBounds {
                        net: net.id.0,
                        pin,
                        gx: self.gx,
                        gy: self.gy,
                    });
                }
            }
        }
        Ok(())
    }
}
