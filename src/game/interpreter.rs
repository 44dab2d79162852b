//! Applies validated relay messages to the world

use tracing::{debug, info};

use super::entity::{Ball, Player, SPAWN_POSITION};
use super::physics::{direction, KICK_POWER};
use super::world::World;
use crate::ws::protocol::{PlayerId, ServerMsg};

/// Routes canonical messages into world mutations
pub struct MessageInterpreter;

impl MessageInterpreter {
    pub fn handle(world: &mut World, msg: ServerMsg) {
        match msg {
            ServerMsg::Init { id } => Self::handle_init(world, id),
            ServerMsg::Joined { id } => Self::handle_joined(world, id),
            ServerMsg::Left { id } => Self::handle_left(world, id),
            ServerMsg::PlayerMove {
                id,
                x,
                y,
                vel_x,
                vel_y,
            } => Self::handle_player_move(world, id, x, y, vel_x, vel_y),
            ServerMsg::Kick {
                x, y, dir_x, dir_y, ..
            } => Self::handle_kick(world, x, y, dir_x, dir_y),
        }
    }

    /// (Re)initialize as `id`: fresh local player at spawn, ball back at the origin
    fn handle_init(world: &mut World, id: PlayerId) {
        world.local_id = Some(id);
        world.players.insert(id, Player::spawn());
        world.ball = Ball::at_origin();

        info!(player_id = id, "Initialized as local player");
    }

    fn handle_joined(world: &mut World, id: PlayerId) {
        if world.players.contains_key(&id) {
            debug!(player_id = id, "Joined for known player, ignoring");
            return;
        }

        world.players.insert(id, Player::spawn());
        info!(player_id = id, player_count = world.players.len(), "Player joined");
    }

    fn handle_left(world: &mut World, id: PlayerId) {
        if world.players.remove(&id).is_some() {
            info!(player_id = id, player_count = world.players.len(), "Player left");
        }
    }

    /// Peer movement. The local player is never corrected from the wire.
    fn handle_player_move(
        world: &mut World,
        id: PlayerId,
        x: Option<f64>,
        y: Option<f64>,
        vel_x: Option<f64>,
        vel_y: Option<f64>,
    ) {
        if world.is_local(id) {
            return;
        }

        match world.players.get_mut(&id) {
            Some(player) => {
                let p = &mut player.logical;
                p.x = x.unwrap_or(p.x);
                p.y = y.unwrap_or(p.y);
                p.vel_x = vel_x.unwrap_or(p.vel_x);
                p.vel_y = vel_y.unwrap_or(p.vel_y);
            }
            None => {
                let (spawn_x, spawn_y) = SPAWN_POSITION;
                let player = Player::new(
                    x.unwrap_or(spawn_x),
                    y.unwrap_or(spawn_y),
                    vel_x.unwrap_or(0.0),
                    vel_y.unwrap_or(0.0),
                );
                world.players.insert(id, player);
                debug!(player_id = id, "Created player from PlayerMove");
            }
        }
    }

    /// Any kick moves the shared ball, our own echo included
    fn handle_kick(
        world: &mut World,
        x: Option<f64>,
        y: Option<f64>,
        dir_x: Option<f64>,
        dir_y: Option<f64>,
    ) {
        let ball = &mut world.ball.logical;
        ball.x = x.unwrap_or(ball.x);
        ball.y = y.unwrap_or(ball.y);

        let (dx, dy) = (dir_x.unwrap_or(0.0), dir_y.unwrap_or(0.0));
        if let Some((ux, uy)) = direction(0.0, 0.0, dx, dy) {
            ball.vx = ux * KICK_POWER;
            ball.vy = uy * KICK_POWER;
        }

        debug!(x = ball.x, y = ball.y, vx = ball.vx, vy = ball.vy, "Ball kicked");
    }
}
