use crate::types::MatchEvent;

/// Per-ghost life counter. It only reports outcomes and pushes notifications; the caller
/// decides what a death or a respawn means for the ghost's behavior.
#[derive(Clone, Debug)]
pub struct GhostLives {
    ghost_id: usize,
    current: u32,
    max: u32,
}

impl GhostLives {
    pub fn new(ghost_id: usize, lives: u32) -> Self {
        Self {
            ghost_id,
            current: lives,
            max: lives,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn initialize(&mut self, lives: u32, events: &mut Vec<MatchEvent>) {
        self.max = lives;
        self.current = lives;
        self.push_changed(events);
    }

    /// Returns true while the ghost can still respawn after losing a life.
    pub fn on_eaten(&mut self, events: &mut Vec<MatchEvent>) -> bool {
        if self.current == 0 {
            return false;
        }

        self.current -= 1;
        self.push_changed(events);

        if self.current > 0 {
            return true;
        }
        events.push(MatchEvent::GhostDied {
            ghost_id: self.ghost_id,
        });
        false
    }

    /// Signals a respawn when lives remain; the caller then re-enables Home.
    pub fn trigger_respawn(&self, events: &mut Vec<MatchEvent>) -> bool {
        if !self.is_alive() {
            return false;
        }
        events.push(MatchEvent::GhostRespawning {
            ghost_id: self.ghost_id,
        });
        true
    }

    pub fn reset_lives(&mut self, events: &mut Vec<MatchEvent>) {
        self.current = self.max;
        self.push_changed(events);
    }

    fn push_changed(&self, events: &mut Vec<MatchEvent>) {
        events.push(MatchEvent::GhostLivesChanged {
            ghost_id: self.ghost_id,
            lives: self.current,
            max_lives: self.max,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deaths(events: &[MatchEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, MatchEvent::GhostDied { .. }))
            .count()
    }

    #[test]
    fn last_life_returns_false_and_fires_death_once() {
        let mut lives = GhostLives::new(0, 1);
        let mut events = Vec::new();

        assert!(!lives.on_eaten(&mut events));
        assert_eq!(lives.current(), 0);
        assert_eq!(deaths(&events), 1);

        assert!(!lives.on_eaten(&mut events));
        assert_eq!(deaths(&events), 1);
    }

    #[test]
    fn spare_lives_return_true_and_decrement_by_one() {
        let mut lives = GhostLives::new(3, 3);
        let mut events = Vec::new();

        assert!(lives.on_eaten(&mut events));
        assert_eq!(lives.current(), 2);
        assert_eq!(deaths(&events), 0);
        assert_eq!(
            events,
            vec![MatchEvent::GhostLivesChanged {
                ghost_id: 3,
                lives: 2,
                max_lives: 3,
            }]
        );
    }

    #[test]
    fn life_change_is_observed_before_respawn() {
        let mut lives = GhostLives::new(1, 2);
        let mut events = Vec::new();

        assert!(lives.on_eaten(&mut events));
        assert!(lives.trigger_respawn(&mut events));
        assert!(matches!(events[0], MatchEvent::GhostLivesChanged { .. }));
        assert!(matches!(events[1], MatchEvent::GhostRespawning { .. }));
    }

    #[test]
    fn dead_ghost_cannot_respawn_until_reset() {
        let mut lives = GhostLives::new(0, 1);
        let mut events = Vec::new();
        lives.on_eaten(&mut events);
        assert!(!lives.trigger_respawn(&mut events));

        lives.reset_lives(&mut events);
        assert!(lives.is_alive());
        assert_eq!(lives.current(), lives.max());
        assert!(lives.trigger_respawn(&mut events));
    }
}
