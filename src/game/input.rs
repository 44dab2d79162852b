//! Pointer input: turns a click into a movement intent

use tracing::debug;

use super::physics::{direction, BALL_RADIUS, PLAYER_SPEED};
use super::world::{ClickTarget, World};
use crate::ws::protocol::{ClientMsg, PlayerId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("No local identity yet, ignoring pointer input")]
    NoLocalIdentity,

    #[error("Local player {0} is not in the world")]
    MissingLocalPlayer(PlayerId),
}

pub struct InputTranslator;

impl InputTranslator {
    /// Point the local player at `(x, y)` and build the `Move` announcing it.
    ///
    /// A click on the player's own position stops it.
    pub fn on_pointer_down(world: &mut World, x: f64, y: f64) -> Result<ClientMsg, InputError> {
        let local_id = world.local_id.ok_or(InputError::NoLocalIdentity)?;

        let ball = world.ball.logical;
        let click_on_ball = (x - ball.x).hypot(y - ball.y) < BALL_RADIUS;

        let player = world
            .players
            .get_mut(&local_id)
            .ok_or(InputError::MissingLocalPlayer(local_id))?;
        let p = &mut player.logical;

        let (vel_x, vel_y) = direction(p.x, p.y, x, y)
            .map(|(ux, uy)| (ux * PLAYER_SPEED, uy * PLAYER_SPEED))
            .unwrap_or((0.0, 0.0));
        p.vel_x = vel_x;
        p.vel_y = vel_y;

        let msg = ClientMsg::Move {
            x: p.x,
            y: p.y,
            vel_x,
            vel_y,
        };

        world.pending_target = Some(ClickTarget { x, y });
        world.click_on_ball = click_on_ball;

        debug!(x, y, click_on_ball, "Pointer down");
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::Player;

    fn world_with_local(x: f64, y: f64) -> World {
        let mut world = World::new();
        world.local_id = Some(1);
        world.players.insert(1, Player::new(x, y, 0.0, 0.0));
        world
    }

    #[test]
    fn click_sets_velocity_towards_target() {
        let mut world = world_with_local(100.0, 100.0);

        let msg = InputTranslator::on_pointer_down(&mut world, 400.0, 500.0).unwrap();

        // 3-4-5 triangle
        let ClientMsg::Move { x, y, vel_x, vel_y } = msg else {
            panic!("expected Move, got {msg:?}");
        };
        assert_eq!((x, y), (100.0, 100.0));
        assert!((vel_x - 72.0).abs() < 1e-9);
        assert!((vel_y - 96.0).abs() < 1e-9);

        let local = world.players[&1].logical;
        assert_eq!((local.vel_x, local.vel_y), (vel_x, vel_y));
        assert_eq!(world.pending_target, Some(ClickTarget { x: 400.0, y: 500.0 }));
        assert!(!world.click_on_ball);
    }

    #[test]
    fn click_on_ball_is_flagged() {
        let mut world = world_with_local(100.0, 100.0);

        InputTranslator::on_pointer_down(&mut world, 410.0, 300.0).unwrap();
        assert!(world.click_on_ball);

        InputTranslator::on_pointer_down(&mut world, 415.0, 300.0).unwrap();
        assert!(!world.click_on_ball);
    }

    #[test]
    fn click_on_self_stops() {
        let mut world = world_with_local(200.0, 200.0);
        world.players.get_mut(&1).unwrap().logical.vel_x = 50.0;

        let msg = InputTranslator::on_pointer_down(&mut world, 200.0, 200.0).unwrap();

        assert_eq!(msg, ClientMsg::Move { x: 200.0, y: 200.0, vel_x: 0.0, vel_y: 0.0 });
        assert!(world.players[&1].logical.is_at_rest());
        assert_eq!(world.pending_target, Some(ClickTarget { x: 200.0, y: 200.0 }));
    }

    #[test]
    fn click_before_init_is_rejected() {
        let mut world = World::new();
        let before = world.clone();

        assert_eq!(
            InputTranslator::on_pointer_down(&mut world, 10.0, 10.0),
            Err(InputError::NoLocalIdentity)
        );
        assert_eq!(world, before);
    }

    #[test]
    fn missing_local_player_is_rejected() {
        let mut world = World::new();
        world.local_id = Some(4);

        assert_eq!(
            InputTranslator::on_pointer_down(&mut world, 10.0, 10.0),
            Err(InputError::MissingLocalPlayer(4))
        );
        assert!(world.pending_target.is_none());
    }
}
