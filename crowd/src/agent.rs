use crate::waypoint::Waypoint;
use common::shapes::GridPos;
use common::vector::Vector;
use regions::RegionId;
use std::collections::VecDeque;
use std::sync::Arc;

/// A walker on the grid with an itinerary of waypoints it visits in a loop.
#[derive(Debug, Clone)]
pub struct Agent {
    id: u32,
    position: GridPos,
    desired: GridPos,
    region: RegionId,
    waypoints: VecDeque<Arc<Waypoint>>,
    destination: Option<Arc<Waypoint>>,
}

impl Agent {
    pub fn new(x: i32, y: i32) -> Self {
        let position = GridPos::new(x, y);
        Agent {
            id: 0,
            position,
            desired: position,
            region: RegionId::NorthWest,
            waypoints: VecDeque::new(),
            destination: None,
        }
    }

    /// Places the agent on the cell nearest to `(x, y)`.
    pub fn from_f64(x: f64, y: f64) -> Self {
        let pos = GridPos::from_f64(x, y);
        Self::new(pos.x, pos.y)
    }

    /// Appends a waypoint to the itinerary.
    pub fn add_waypoint(&mut self, waypoint: Arc<Waypoint>) {
        self.waypoints.push_back(waypoint);
    }

    pub fn with_waypoints<I>(mut self, waypoints: I) -> Self
    where
        I: IntoIterator<Item = Arc<Waypoint>>,
    {
        self.waypoints.extend(waypoints);
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn position(&self) -> GridPos {
        self.position
    }

    pub fn desired_x(&self) -> i32 {
        self.desired.x
    }

    pub fn desired_y(&self) -> i32 {
        self.desired.y
    }

    pub fn desired(&self) -> GridPos {
        self.desired
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn destination(&self) -> Option<&Arc<Waypoint>> {
        self.destination.as_ref()
    }

    /// Waypoints still queued behind the current destination.
    pub fn queued_waypoints(&self) -> impl Iterator<Item = &Arc<Waypoint>> {
        self.waypoints.iter()
    }

    pub(crate) fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub(crate) fn set_position(&mut self, position: GridPos) {
        self.position = position;
    }

    pub(crate) fn set_desired(&mut self, desired: GridPos) {
        self.desired = desired;
    }

    pub(crate) fn set_region(&mut self, region: RegionId) {
        self.region = region;
    }

    /// Picks the destination for this tick. When the current one is reached, or
    /// there is none yet, the front of the queue becomes the destination and the
    /// old one goes to the back so the itinerary repeats forever.
    pub fn advance_destination(&mut self) -> Option<&Arc<Waypoint>> {
        let reached = self
            .destination
            .as_ref()
            .map_or(true, |wp| wp.is_reached_from(self.position));
        if reached {
            if let Some(next) = self.waypoints.pop_front() {
                if let Some(previous) = self.destination.replace(next) {
                    self.waypoints.push_back(previous);
                }
            }
        }
        self.destination.as_ref()
    }

    /// Sets the desired position one unit step toward the destination, rounded
    /// to the nearest cell. Without any destination the desired position is
    /// left as it was.
    pub fn compute_next_desired_position(&mut self) {
        let target = match self.advance_destination() {
            Some(wp) => (wp.x(), wp.y()),
            None => return,
        };
        self.desired = step_towards(self.position, target);
    }

    /// Commits the desired position without any collision check.
    pub(crate) fn commit_desired(&mut self) {
        self.position = self.desired;
    }
}

/// Cell reached by one unit step from `from` toward `target`. Standing on the
/// target yields `from`.
pub fn step_towards(from: GridPos, target: (f64, f64)) -> GridPos {
    let step = Vector::planar(target.0 - from.x as f64, target.1 - from.y as f64).normalized();
    GridPos::from_f64(from.x as f64 + step.x, from.y as f64 + step.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_and_diagonal_steps() {
        let from = GridPos::new(5, 5);
        assert_eq!(step_towards(from, (20.0, 5.0)), GridPos::new(6, 5));
        assert_eq!(step_towards(from, (5.0, -3.0)), GridPos::new(5, 4));
        assert_eq!(step_towards(from, (10.0, 10.0)), GridPos::new(6, 6));
        assert_eq!(step_towards(from, (5.0, 5.0)), from);
    }

    #[test]
    fn no_waypoints_keeps_desired() {
        let mut agent = Agent::new(3, 4);
        agent.compute_next_desired_position();
        assert_eq!(agent.desired(), GridPos::new(3, 4));
        assert!(agent.destination().is_none());
    }
}
