use collisions::*;
use common::shapes::{GridPos, GridRect};
use regions::OccupancyTable;

fn p(x: i32, y: i32) -> GridPos {
    GridPos::new(x, y)
}

fn table_with(occupants: &[(u32, GridPos)]) -> OccupancyTable {
    let mut table = OccupancyTable::new(GridRect::sized(20, 20)).unwrap();
    table.populate(occupants.iter().copied()).unwrap();
    table
}

#[test]
fn test_straight_east_step_alternatives() {
    assert_eq!(
        prioritized_alternatives(p(5, 5), p(6, 5)),
        [p(6, 5), p(6, 6), p(6, 4)]
    );
}

#[test]
fn test_straight_north_step_alternatives() {
    assert_eq!(
        prioritized_alternatives(p(5, 5), p(5, 4)),
        [p(5, 4), p(4, 4), p(6, 4)]
    );
}

#[test]
fn test_diagonal_step_alternatives() {
    assert_eq!(
        prioritized_alternatives(p(5, 5), p(6, 6)),
        [p(6, 6), p(6, 5), p(5, 6)]
    );
    assert_eq!(
        prioritized_alternatives(p(5, 5), p(4, 6)),
        [p(4, 6), p(4, 5), p(5, 6)]
    );
}

#[test]
fn test_no_step_alternatives_are_all_the_current_cell() {
    assert_eq!(
        prioritized_alternatives(p(3, 3), p(3, 3)),
        [p(3, 3), p(3, 3), p(3, 3)]
    );
}

#[test]
fn test_first_free_respects_priority() {
    let candidates = prioritized_alternatives(p(5, 5), p(6, 5));
    let taken = [p(5, 5), p(6, 5)];
    assert_eq!(first_free(&candidates, &taken[..]), Some(p(6, 6)));

    let taken = [p(5, 5), p(6, 5), p(6, 6)];
    assert_eq!(first_free(&candidates, &taken[..]), Some(p(6, 4)));

    let taken = [p(6, 5), p(6, 6), p(6, 4)];
    assert_eq!(first_free(&candidates, &taken[..]), None);
}

#[test]
fn test_neighbor_cells_lookup() {
    let mut cells = NeighborCells::new();
    assert!(cells.is_empty());
    cells.extend([p(1, 1), p(2, 2)]);
    cells.push(p(3, 3));
    assert_eq!(cells.len(), 3);
    assert!(cells.is_taken(p(2, 2)));
    assert!(!cells.is_taken(p(2, 3)));
    cells.clear();
    assert!(!cells.is_taken(p(2, 2)));
}

#[test]
fn test_position_counts_track_stacked_agents() {
    let mut counts = PositionCounts::from_positions([p(1, 1), p(1, 1), p(2, 2)]);
    assert_eq!(counts.count(p(1, 1)), 2);
    assert_eq!(counts.distinct(), 2);

    counts.relocate(p(1, 1), p(4, 4));
    assert!(counts.is_taken(p(1, 1)));
    assert!(counts.is_taken(p(4, 4)));

    counts.relocate(p(1, 1), p(5, 5));
    assert!(!counts.is_taken(p(1, 1)));
    assert_eq!(counts.distinct(), 3);

    counts.remove(p(9, 9));
    assert_eq!(counts.distinct(), 3);
}

#[test]
fn test_claim_move_takes_desired_cell() {
    let table = table_with(&[(0, p(5, 5))]);
    let candidates = prioritized_alternatives(p(5, 5), p(6, 5));
    let outcome = claim_move(&table, 0, p(5, 5), &candidates, &NeighborCells::new());
    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            to: p(6, 5),
            release_conflict: None
        }
    );
    assert_eq!(table.occupant(p(6, 5)), Some(0));
    assert!(table.is_free(p(5, 5)));
}

#[test]
fn test_claim_move_tries_rotated_cells_before_blocking() {
    let table = table_with(&[(0, p(5, 5)), (1, p(6, 5))]);
    let candidates = prioritized_alternatives(p(5, 5), p(6, 5));
    let outcome = claim_move(&table, 0, p(5, 5), &candidates, &NeighborCells::new());
    assert_eq!(outcome.destination(), Some(p(6, 6)));

    let table = table_with(&[(0, p(5, 5)), (1, p(6, 5)), (2, p(6, 6))]);
    let outcome = claim_move(&table, 0, p(5, 5), &candidates, &NeighborCells::new());
    assert_eq!(outcome.destination(), Some(p(6, 4)));

    let table = table_with(&[(0, p(5, 5)), (1, p(6, 5)), (2, p(6, 6)), (3, p(6, 4))]);
    let outcome = claim_move(&table, 0, p(5, 5), &candidates, &NeighborCells::new());
    assert_eq!(outcome, MoveOutcome::Blocked);
    assert_eq!(table.occupant(p(5, 5)), Some(0));
}

#[test]
fn test_claim_move_skips_cells_seen_by_neighbor_gather() {
    let table = table_with(&[(0, p(5, 5))]);
    let candidates = prioritized_alternatives(p(5, 5), p(6, 5));
    let mut neighbors = NeighborCells::new();
    neighbors.push(p(6, 5));
    let outcome = claim_move(&table, 0, p(5, 5), &candidates, &neighbors);
    assert_eq!(outcome.destination(), Some(p(6, 6)));
}

#[test]
fn test_claim_move_reports_release_conflict() {
    // Agent 0 stands on a cell the table attributes to agent 9.
    let table = table_with(&[(9, p(5, 5))]);
    let candidates = prioritized_alternatives(p(5, 5), p(6, 5));
    let outcome = claim_move(&table, 0, p(5, 5), &candidates, &NeighborCells::new());
    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            to: p(6, 5),
            release_conflict: Some(9)
        }
    );
    assert_eq!(table.occupant(p(5, 5)), Some(9));
    assert_eq!(table.occupant(p(6, 5)), Some(0));
}

#[test]
fn test_claim_move_never_leaves_the_grid() {
    let table = table_with(&[(0, p(19, 5))]);
    let candidates = prioritized_alternatives(p(19, 5), p(20, 5));
    let outcome = claim_move(&table, 0, p(19, 5), &candidates, &NeighborCells::new());
    assert_eq!(outcome, MoveOutcome::Blocked);
}

#[test]
fn test_table_as_taken_cells() {
    let table = table_with(&[(4, p(2, 2))]);
    assert!(table.is_taken(p(2, 2)));
    assert!(!table.is_taken(p(2, 3)));
}
