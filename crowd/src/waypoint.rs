use common::shapes::{Circle, GridPos};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_WAYPOINT_ID: AtomicU64 = AtomicU64::new(0);

/// Circular target area. Shared between every agent that visits it.
#[derive(Debug, PartialEq)]
pub struct Waypoint {
    id: u64,
    area: Circle,
}

impl Waypoint {
    /// Ids increase across the whole process, whichever model builds the waypoint.
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Waypoint {
            id: NEXT_WAYPOINT_ID.fetch_add(1, Ordering::Relaxed),
            area: Circle::new(x, y, radius),
        }
    }

    pub fn shared(x: f64, y: f64, radius: f64) -> Arc<Self> {
        Arc::new(Self::new(x, y, radius))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn x(&self) -> f64 {
        self.area.x
    }

    pub fn y(&self) -> f64 {
        self.area.y
    }

    pub fn radius(&self) -> f64 {
        self.area.radius
    }

    pub fn area(&self) -> Circle {
        self.area
    }

    /// An agent standing on `pos` has reached this waypoint.
    pub fn is_reached_from(&self, pos: GridPos) -> bool {
        self.area.contains_cell(pos)
    }
}

impl Default for Waypoint {
    fn default() -> Self {
        let area = Circle::default();
        Self::new(area.x, area.y, area.radius)
    }
}
