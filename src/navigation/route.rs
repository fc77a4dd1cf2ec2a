//! Waypoint following for planned paths

use crate::core::types::Vec2;
use crate::navigation::pathfinding::Path;

/// What the follower should do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteStep {
    MoveTo(Vec2),
    Arrived,
}

/// A planned path being walked by one agent
///
/// Never edited in place: a new destination replaces the whole route.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    destination: Vec2,
    waypoints: Vec<Vec2>,
    next: usize,
}

impl ActiveRoute {
    pub fn new(destination: Vec2, path: Path) -> Self {
        Self {
            destination,
            waypoints: path.waypoints,
            next: 0,
        }
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }

    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.next).copied()
    }

    pub fn remaining(&self) -> usize {
        self.waypoints.len().saturating_sub(self.next)
    }

    /// Skip every waypoint already within `reach`, then report the next one
    pub fn advance(&mut self, position: Vec2, reach: f32) -> RouteStep {
        while let Some(wp) = self.current_waypoint() {
            if position.distance(&wp) > reach {
                return RouteStep::MoveTo(wp);
            }
            self.next += 1;
        }
        RouteStep::Arrived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(points: &[(f32, f32)]) -> ActiveRoute {
        let waypoints: Vec<Vec2> = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
        let destination = waypoints.last().copied().unwrap_or_default();
        ActiveRoute::new(
            destination,
            Path { cells: Vec::new(), waypoints, cost: 0.0 },
        )
    }

    #[test]
    fn test_advance_moves_to_first_unreached() {
        let mut r = route(&[(48.0, 16.0), (80.0, 16.0), (112.0, 16.0)]);
        assert_eq!(r.advance(Vec2::new(16.0, 16.0), 16.0), RouteStep::MoveTo(Vec2::new(48.0, 16.0)));
        assert_eq!(r.remaining(), 3);

        assert_eq!(r.advance(Vec2::new(45.0, 16.0), 16.0), RouteStep::MoveTo(Vec2::new(80.0, 16.0)));
        assert_eq!(r.remaining(), 2);
    }

    #[test]
    fn test_advance_skips_several_and_arrives() {
        let mut r = route(&[(10.0, 0.0), (20.0, 0.0)]);
        assert_eq!(r.advance(Vec2::new(15.0, 0.0), 16.0), RouteStep::Arrived);
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.current_waypoint(), None);
    }

    #[test]
    fn test_empty_route_is_arrived() {
        let mut r = route(&[]);
        assert_eq!(r.advance(Vec2::new(0.0, 0.0), 16.0), RouteStep::Arrived);
    }
}
