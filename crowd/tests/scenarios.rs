use common::shapes::{GridPos, GridRect};
use crowd::{Agent, Config, Model, Strategy, Waypoint};
use std::collections::HashSet;

fn small_grid() -> Config {
    Config {
        threads: 2,
        grid: GridRect::sized(10, 10),
        ..Config::default()
    }
}

/// Four agents start in the corners of a 10x10 grid and all head for one
/// waypoint in the middle.
fn four_corners(strategy: Strategy) -> Model {
    let center = Waypoint::shared(5.0, 5.0, 1.0);
    let agents = [(0, 0), (9, 0), (0, 9), (9, 9)]
        .into_iter()
        .map(|(x, y)| Agent::new(x, y).with_waypoints([center.clone()]))
        .collect();
    Model::setup_with_config(agents, vec![center], strategy, small_grid()).unwrap()
}

fn cells(model: &Model) -> Vec<GridPos> {
    model.agents().iter().map(Agent::position).collect()
}

#[test]
fn test_four_corners_gather_without_colliding() {
    for strategy in [Strategy::SequentialCollision, Strategy::RegionCollision] {
        let mut model = four_corners(strategy);
        for tick in 0..20 {
            model.tick();
            let positions = cells(&model);
            let distinct: HashSet<_> = positions.iter().collect();
            assert_eq!(distinct.len(), 4, "{} tick {}: {:?}", strategy, tick, positions);
            if tick >= 4 {
                for pos in &positions {
                    assert!(
                        pos.manhattan(GridPos::new(5, 5)) <= 1,
                        "{} tick {}: {:?}",
                        strategy,
                        tick,
                        positions
                    );
                }
            }
        }
    }
}

#[test]
fn test_four_corners_first_steps() {
    let mut model = four_corners(Strategy::SequentialCollision);
    model.tick();
    assert_eq!(
        cells(&model),
        vec![
            GridPos::new(1, 1),
            GridPos::new(8, 1),
            GridPos::new(1, 8),
            GridPos::new(8, 8)
        ]
    );
    model.tick();
    model.tick();
    model.tick();
    assert_eq!(
        cells(&model),
        vec![
            GridPos::new(4, 4),
            GridPos::new(6, 4),
            GridPos::new(4, 6),
            GridPos::new(5, 5)
        ]
    );
}

#[test]
fn test_four_corners_stack_up_without_collisions() {
    let mut model = four_corners(Strategy::Sequential);
    for _ in 0..20 {
        model.tick();
    }
    // Without collision handling nothing stops two agents sharing a cell.
    let distinct: HashSet<_> = cells(&model).into_iter().collect();
    assert!(distinct.len() < 4);
}

#[test]
fn test_parallel_collision_keeps_corners_apart() {
    let mut model = four_corners(Strategy::SequentialCollisionParallel);
    for _ in 0..20 {
        model.tick();
        let distinct: HashSet<_> = cells(&model).into_iter().collect();
        assert_eq!(distinct.len(), 4);
    }
}
