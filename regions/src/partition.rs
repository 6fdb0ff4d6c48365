use crate::config::RegionConfig;
use common::shapes::GridPos;
use std::fmt;

/// One of the four fixed quadrants. Numbered 1..=4 row by row, north (small `y`) first.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    NorthWest = 1,
    NorthEast = 2,
    SouthWest = 3,
    SouthEast = 4,
}

impl RegionId {
    pub const ALL: [RegionId; 4] = [
        RegionId::NorthWest,
        RegionId::NorthEast,
        RegionId::SouthWest,
        RegionId::SouthEast,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Zero based slot for region-indexed arrays.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn from_number(number: u8) -> Option<RegionId> {
        match number {
            1 => Some(RegionId::NorthWest),
            2 => Some(RegionId::NorthEast),
            3 => Some(RegionId::SouthWest),
            4 => Some(RegionId::SouthEast),
            _ => None,
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {}", self.number())
    }
}

/// Quadrant decomposition of the plane. Membership is rebuilt from scratch by the
/// owner between ticks and read-only while a tick runs.
#[derive(Debug, Clone)]
pub struct RegionPartition {
    config: RegionConfig,
    members: [Vec<u32>; 4],
}

impl RegionPartition {
    pub fn new(config: RegionConfig) -> Self {
        Self {
            config,
            members: Default::default(),
        }
    }

    pub fn config(&self) -> RegionConfig {
        self.config
    }

    #[inline(always)]
    pub fn region_for(&self, pos: GridPos) -> RegionId {
        match (pos.x < self.config.split_x, pos.y < self.config.split_y) {
            (true, true) => RegionId::NorthWest,
            (false, true) => RegionId::NorthEast,
            (true, false) => RegionId::SouthWest,
            (false, false) => RegionId::SouthEast,
        }
    }

    pub fn clear(&mut self) {
        for region in self.members.iter_mut() {
            region.clear();
        }
    }

    /// Adds `id` to the quadrant containing `pos` and returns that quadrant.
    pub fn insert(&mut self, id: u32, pos: GridPos) -> RegionId {
        let region = self.region_for(pos);
        self.members[region.index()].push(id);
        region
    }

    /// Discards the previous membership and assigns every `(id, pos)` again.
    pub fn rebuild<I>(&mut self, agents: I)
    where
        I: IntoIterator<Item = (u32, GridPos)>,
    {
        self.clear();
        for (id, pos) in agents {
            self.insert(id, pos);
        }
    }

    pub fn members(&self, region: RegionId) -> &[u32] {
        &self.members[region.index()]
    }

    pub fn sizes(&self) -> [usize; 4] {
        [
            self.members[0].len(),
            self.members[1].len(),
            self.members[2].len(),
            self.members[3].len(),
        ]
    }

    pub fn len(&self) -> usize {
        self.members.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when ids `0..count` each appear in exactly one quadrant and nothing else does.
    pub fn covers_exactly(&self, count: usize) -> bool {
        if self.len() != count {
            return false;
        }
        let mut seen = vec![false; count];
        for &id in self.members.iter().flatten() {
            match seen.get_mut(id as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}
