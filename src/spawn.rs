use std::collections::BTreeSet;
use std::collections::HashMap;

use nalgebra::Vector3;

use crate::dynamics::Transform;

// ---------------------------------------------
// GRID LAYOUT
// ---------------------------------------------
/// Staggered two-column starting grid, facing +Z.
pub const GRID_COLUMN_OFFSET: f32 = 3.0; // |x| of each column
pub const GRID_ROW_SPACING: f32 = 8.0;   // metres between rows
pub const GRID_STAGGER: f32 = 4.0;       // right column sits half a row back
pub const GRID_DROP_HEIGHT: f32 = 0.6;   // chassis centre above the ground

pub fn grid_slot_transform(slot: usize) -> Transform {
    let row = (slot / 2) as f32;
    let right = slot % 2 == 1;
    let x = if right { -GRID_COLUMN_OFFSET } else { GRID_COLUMN_OFFSET }; // +X is left
    let z = -row * GRID_ROW_SPACING - if right { GRID_STAGGER } else { 0.0 };
    Transform::new(Vector3::new(x, GRID_DROP_HEIGHT, z), 0.0)
}

// ---------------------------------------------
// SPAWN RESULT RETURNED TO STATE + NET
// ---------------------------------------------
#[derive(Debug, Clone)]
pub struct PlayerSpawnInfo {
    pub player_id: String,
    pub slot: usize,
    pub transform: Transform,
}

// ---------------------------------------------
// SPAWN MANAGER
// ---------------------------------------------
#[derive(Debug, Default)]
pub struct SpawnManager {
    /// Which grid slot each connected player holds
    pub slots: HashMap<String, usize>,
    taken: BTreeSet<usize>,
}

impl SpawnManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest free slot; the grid grows backwards without bound.
    fn first_free_slot(&self) -> usize {
        (0..).find(|s| !self.taken.contains(s)).unwrap_or(self.taken.len())
    }

    // ---------------------------------------------------------
    // Full allocation pipeline called from net.rs
    // ---------------------------------------------------------
    pub fn allocate_spawn(&mut self, player_id: String) -> PlayerSpawnInfo {
        if let Some(&slot) = self.slots.get(&player_id) {
            return PlayerSpawnInfo { player_id, slot, transform: grid_slot_transform(slot) };
        }

        let slot = self.first_free_slot();
        self.taken.insert(slot);
        self.slots.insert(player_id.clone(), slot);

        PlayerSpawnInfo {
            player_id,
            slot,
            transform: grid_slot_transform(slot),
        }
    }

    pub fn release(&mut self, player_id: &str) {
        if let Some(slot) = self.slots.remove(player_id) {
            self.taken.remove(&slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_fill_in_order_and_are_reused() {
        let mut m = SpawnManager::new();
        assert_eq!(m.allocate_spawn("a".into()).slot, 0);
        assert_eq!(m.allocate_spawn("b".into()).slot, 1);
        assert_eq!(m.allocate_spawn("c".into()).slot, 2);

        m.release("b");
        assert_eq!(m.allocate_spawn("d".into()).slot, 1);
        assert_eq!(m.allocate_spawn("e".into()).slot, 3);
    }

    #[test]
    fn same_player_keeps_slot() {
        let mut m = SpawnManager::new();
        m.allocate_spawn("a".into());
        assert_eq!(m.allocate_spawn("a".into()).slot, 0);
        assert_eq!(m.slots.len(), 1);
    }

    #[test]
    fn grid_is_staggered_and_distinct() {
        let a = grid_slot_transform(0).position;
        let b = grid_slot_transform(1).position;
        let c = grid_slot_transform(2).position;
        assert!(a.x > 0.0 && b.x < 0.0);
        assert!(b.z < a.z && c.z < b.z);
        assert!((a - c).norm() >= GRID_ROW_SPACING - 1e-4);
    }
}
