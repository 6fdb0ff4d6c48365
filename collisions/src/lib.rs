use common::shapes::GridPos;
use fxhash::FxHashMap;
use regions::OccupancyTable;
use smallvec::SmallVec;

/// Something that can answer "is this cell held by a neighbor".
pub trait TakenCells {
    fn is_taken(&self, pos: GridPos) -> bool;
}

impl TakenCells for [GridPos] {
    fn is_taken(&self, pos: GridPos) -> bool {
        self.contains(&pos)
    }
}

/// Positions of the neighbors gathered for one agent. Small in practice.
#[derive(Debug, Clone, Default)]
pub struct NeighborCells {
    cells: SmallVec<[GridPos; 16]>,
}

impl NeighborCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn push(&mut self, pos: GridPos) {
        self.cells.push(pos);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl TakenCells for NeighborCells {
    fn is_taken(&self, pos: GridPos) -> bool {
        self.cells.contains(&pos)
    }
}

impl Extend<GridPos> for NeighborCells {
    fn extend<T: IntoIterator<Item = GridPos>>(&mut self, iter: T) {
        self.cells.extend(iter);
    }
}

/// Multiset of every agent position, kept current as agents move. Answers the
/// same question as scanning all agents' positions.
#[derive(Debug, Clone, Default)]
pub struct PositionCounts {
    counts: FxHashMap<GridPos, u32>,
}

impl PositionCounts {
    pub fn from_positions<I: IntoIterator<Item = GridPos>>(positions: I) -> Self {
        let mut counts = Self::default();
        for pos in positions {
            counts.add(pos);
        }
        counts
    }

    pub fn add(&mut self, pos: GridPos) {
        *self.counts.entry(pos).or_insert(0) += 1;
    }

    pub fn remove(&mut self, pos: GridPos) {
        if let Some(count) = self.counts.get_mut(&pos) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&pos);
            }
        }
    }

    pub fn relocate(&mut self, from: GridPos, to: GridPos) {
        if from != to {
            self.remove(from);
            self.add(to);
        }
    }

    pub fn count(&self, pos: GridPos) -> u32 {
        self.counts.get(&pos).copied().unwrap_or(0)
    }

    /// Number of distinct occupied cells.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }
}

impl TakenCells for PositionCounts {
    fn is_taken(&self, pos: GridPos) -> bool {
        self.counts.contains_key(&pos)
    }
}

/// The table itself as the neighbor query: a cell is taken when anyone holds it.
impl TakenCells for OccupancyTable {
    fn is_taken(&self, pos: GridPos) -> bool {
        self.occupant(pos).is_some()
    }
}

/// Up to three cells that bring an agent closer to `desired`, best first:
/// the desired cell; for a straight step the two cells beside it (the step
/// rotated by 90 degrees); for a diagonal step its horizontal-only and
/// vertical-only parts. The order is fixed and is the tie-break between agents.
pub fn prioritized_alternatives(current: GridPos, desired: GridPos) -> [GridPos; 3] {
    let diff_x = desired.x - current.x;
    let diff_y = desired.y - current.y;
    if diff_x == 0 || diff_y == 0 {
        [
            desired,
            GridPos::new(desired.x + diff_y, desired.y + diff_x),
            GridPos::new(desired.x - diff_y, desired.y - diff_x),
        ]
    } else {
        [
            desired,
            GridPos::new(desired.x, current.y),
            GridPos::new(current.x, desired.y),
        ]
    }
}

/// First candidate no neighbor stands on.
pub fn first_free<T>(candidates: &[GridPos], taken: &T) -> Option<GridPos>
where
    T: TakenCells + ?Sized,
{
    candidates.iter().copied().find(|c| !taken.is_taken(*c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The agent claimed `to`. `release_conflict` holds what its old cell
    /// unexpectedly contained when the release failed.
    Moved {
        to: GridPos,
        release_conflict: Option<u32>,
    },
    /// Every candidate was taken; the agent stays put this tick.
    Blocked,
}

impl MoveOutcome {
    pub fn destination(&self) -> Option<GridPos> {
        match self {
            MoveOutcome::Moved { to, .. } => Some(*to),
            MoveOutcome::Blocked => None,
        }
    }
}

/// Walks `candidates` in order and moves agent `id` from `current` into the
/// first one that no neighbor holds and that can be claimed in the table. The
/// old cell is released only after the claim succeeded.
pub fn claim_move<T>(
    table: &OccupancyTable,
    id: u32,
    current: GridPos,
    candidates: &[GridPos],
    taken: &T,
) -> MoveOutcome
where
    T: TakenCells + ?Sized,
{
    for &candidate in candidates {
        if candidate == current || taken.is_taken(candidate) {
            continue;
        }
        if !table.try_claim(candidate, id) {
            continue;
        }
        let release_conflict = table.release(current, id).err();
        return MoveOutcome::Moved {
            to: candidate,
            release_conflict,
        };
    }
    MoveOutcome::Blocked
}
