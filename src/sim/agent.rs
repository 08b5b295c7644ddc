use glam::Vec3;

use crate::sim::school::SchoolId;
use crate::view::MAX_VIEWS;

/// Stable agent identifier — monotonic, never reused. Neighbor sums are
/// ordered by this so trajectories are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub u32);

/// Behavioral mode. Transitions happen only in the behavior system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AgentMode {
    Cruising,
    /// Chasing a prey agent's position (ephemeral target).
    Predator,
    /// Fleeing directly away from a nearby predator.
    Prey,
    /// Slow drift — hovering in place.
    Idle,
}

/// One simulated fish.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub school: SchoolId,
    pub position: Vec3,
    /// Previous tick's position — used for render interpolation.
    pub prev_position: Vec3,
    pub velocity: Vec3,
    pub mode: AgentMode,
    /// Seconds until the next mode re-evaluation.
    pub mode_timer: f32,
    /// Chase/flee point while in Predator/Prey mode.
    pub mode_target: Option<Vec3>,
    /// Eased speed cap — blends toward the mode's value to avoid popping.
    pub current_speed: f32,
    /// Eased target weight, same easing.
    pub current_target_weight: f32,
    /// Per-view visibility, derived each tick by the culler.
    pub view_mask: [bool; MAX_VIEWS],
    /// False when distance-culled; overrides the view mask entirely.
    pub enabled: bool,
    /// Marked for destruction; reaped at the end of the tick.
    pub doomed: bool,
}

/// Plain arena for agents: `Vec` slots plus a free list. Slot indices feed
/// the spatial hash; `AgentId`s stay unique for the life of the process.
pub struct AgentArena {
    slots: Vec<Option<Agent>>,
    free: Vec<u32>,
    next_id: u32,
    live: usize,
}

impl AgentArena {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            slots: Vec::with_capacity(cap),
            free: Vec::new(),
            next_id: 0,
            live: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocate a fresh id without inserting; lets callers build the agent
    /// with its id embedded.
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an agent, reusing a free slot when one exists.
    pub fn insert(&mut self, agent: Agent) -> u32 {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(agent);
            slot
        } else {
            self.slots.push(Some(agent));
            (self.slots.len() - 1) as u32
        }
    }

    pub fn remove(&mut self, slot: u32) -> Option<Agent> {
        let taken = self.slots.get_mut(slot as usize)?.take();
        if taken.is_some() {
            self.free.push(slot);
            self.live -= 1;
        }
        taken
    }

    pub fn get(&self, slot: u32) -> Option<&Agent> {
        self.slots.get(slot as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: u32) -> Option<&mut Agent> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }

    /// Iterate live agents in slot order with their slot indices.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Agent)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|a| (i as u32, a)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut Agent)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|a| (i as u32, a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_agent(arena: &mut AgentArena) -> Agent {
        let id = arena.next_id();
        Agent {
            id,
            school: SchoolId(0),
            position: Vec3::ZERO,
            prev_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mode: AgentMode::Cruising,
            mode_timer: 1.0,
            mode_target: None,
            current_speed: 2.0,
            current_target_weight: 0.5,
            view_mask: [false; MAX_VIEWS],
            enabled: true,
            doomed: false,
        }
    }

    #[test]
    fn slots_are_reused_but_ids_are_not() {
        let mut arena = AgentArena::with_capacity(4);
        let a = test_agent(&mut arena);
        let first_id = a.id;
        let slot = arena.insert(a);

        arena.remove(slot);
        assert_eq!(arena.len(), 0);

        let b = test_agent(&mut arena);
        let second_id = b.id;
        let reused = arena.insert(b);

        assert_eq!(slot, reused);
        assert_ne!(first_id, second_id);
    }

    #[test]
    fn double_remove_is_harmless() {
        let mut arena = AgentArena::with_capacity(4);
        let a = test_agent(&mut arena);
        let slot = arena.insert(a);
        assert!(arena.remove(slot).is_some());
        assert!(arena.remove(slot).is_none());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn iteration_is_slot_ordered() {
        let mut arena = AgentArena::with_capacity(4);
        for _ in 0..3 {
            let a = test_agent(&mut arena);
            arena.insert(a);
        }
        let slots: Vec<u32> = arena.iter().map(|(s, _)| s).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }
}
