//! Client-side world: player registry, ball, local identity and click state

use std::collections::HashMap;

use super::entity::{Ball, Interpolate, Player};
use crate::ws::protocol::PlayerId;

/// Where the local player was last sent by a click
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickTarget {
    pub x: f64,
    pub y: f64,
}

/// Everything the client knows about the game
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub players: HashMap<PlayerId, Player>,
    pub ball: Ball,
    /// Assigned by `Init`; `None` until then
    pub local_id: Option<PlayerId>,
    pub pending_target: Option<ClickTarget>,
    /// The pending click landed on the ball, so arriving there must not kick it
    pub click_on_ball: bool,
    /// Unix millis of the last local kick
    pub last_kick_at: Option<u64>,
}

impl World {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            ball: Ball::at_origin(),
            local_id: None,
            pending_target: None,
            click_on_ball: false,
            last_kick_at: None,
        }
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_id.and_then(|id| self.players.get(&id))
    }

    pub fn local_player_mut(&mut self) -> Option<&mut Player> {
        let id = self.local_id?;
        self.players.get_mut(&id)
    }

    pub fn is_local(&self, id: PlayerId) -> bool {
        self.local_id == Some(id)
    }

    /// Advance every visual position one render frame towards its logical one
    pub fn interpolate_all(&mut self) {
        for player in self.players.values_mut() {
            player.interpolate();
        }
        self.ball.interpolate();
    }

    /// Drop everything tied to the relay connection.
    ///
    /// The relay hands out a fresh id on reconnect, so the old identity and
    /// every peer are stale.
    pub fn reset_connection(&mut self) {
        self.players.clear();
        self.local_id = None;
        self.pending_target = None;
        self.click_on_ball = false;
        self.last_kick_at = None;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::VisualState;

    #[test]
    fn starts_uninitialized() {
        let world = World::new();
        assert!(world.players.is_empty());
        assert!(world.local_player().is_none());
        assert!(world.pending_target.is_none());
        assert_eq!(world.ball, Ball::at_origin());
    }

    #[test]
    fn interpolation_touches_only_visual_state() {
        let mut world = World::new();
        let mut peer = Player::new(200.0, 200.0, 120.0, 0.0);
        peer.visual = VisualState { x: 100.0, y: 200.0 };
        world.players.insert(3, peer);
        world.ball.logical.x = 500.0;

        let before = world.clone();
        world.interpolate_all();

        assert_eq!(world.players[&3].logical, before.players[&3].logical);
        assert_eq!(world.ball.logical, before.ball.logical);
        assert!((world.players[&3].visual.x - 120.0).abs() < 1e-9);
        assert!((world.ball.visual.x - 420.0).abs() < 1e-9);
    }

    #[test]
    fn reset_connection_forgets_identity_and_peers() {
        let mut world = World::new();
        world.local_id = Some(1);
        world.players.insert(1, Player::spawn());
        world.players.insert(2, Player::spawn());
        world.pending_target = Some(ClickTarget { x: 1.0, y: 1.0 });
        world.click_on_ball = true;
        world.last_kick_at = Some(99);

        world.reset_connection();

        assert!(world.players.is_empty());
        assert_eq!(world.local_id, None);
        assert_eq!(world.pending_target, None);
        assert!(!world.click_on_ball);
        assert_eq!(world.last_kick_at, None);
    }
}
