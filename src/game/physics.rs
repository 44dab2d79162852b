//! Player movement, ball physics and kick detection

use super::entity::{BallLogical, PlayerLogical};
use super::world::{ClickTarget, World};
use crate::util::time::REFERENCE_RATE;
use crate::ws::protocol::{ClientMsg, PlayerId};

/// Playable rectangle, origin at top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

pub const ARENA: Arena = Arena {
    width: 800.0,
    height: 600.0,
};

pub const AVATAR_RADIUS: f64 = 20.0;
pub const BALL_RADIUS: f64 = 15.0;
/// Player speed in pixels per second
pub const PLAYER_SPEED: f64 = 120.0;
/// Ball speed after a kick, pixels per reference frame
pub const KICK_POWER: f64 = 4.0;
/// Ball velocity retained per reference frame
pub const BALL_FRICTION: f64 = 0.96;
/// Velocity retained (and reversed) on a wall bounce
pub const RESTITUTION: f64 = 0.5;
/// Distance at which the local player counts as arrived
pub const ARRIVAL_THRESHOLD: f64 = 2.0;
pub const KICK_COOLDOWN_MS: u64 = 500;

impl Arena {
    /// Clamp `(x, y)` into the arena inset by `radius`; reports which axes were clamped
    pub fn clamp(&self, x: f64, y: f64, radius: f64) -> ((f64, f64), (bool, bool)) {
        let (x, hit_x) = clamp_axis(x, radius, self.width - radius);
        let (y, hit_y) = clamp_axis(y, radius, self.height - radius);
        ((x, y), (hit_x, hit_y))
    }
}

fn clamp_axis(value: f64, min: f64, max: f64) -> (f64, bool) {
    if value < min {
        (min, true)
    } else if value > max {
        (max, true)
    } else {
        (value, false)
    }
}

/// Unit vector from `(from_x, from_y)` towards `(to_x, to_y)`, `None` if they coincide
pub fn direction(from_x: f64, from_y: f64, to_x: f64, to_y: f64) -> Option<(f64, f64)> {
    let dx = to_x - from_x;
    let dy = to_y - from_y;
    let norm = dx.hypot(dy);
    (norm > 0.0).then(|| (dx / norm, dy / norm))
}

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (bx - ax).hypot(by - ay)
}

/// Fixed-step movement engine
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsSystem {
    /// Also integrate peers from their last known velocity
    pub peer_dead_reckoning: bool,
}

impl PhysicsSystem {
    pub fn new(peer_dead_reckoning: bool) -> Self {
        Self { peer_dead_reckoning }
    }

    /// Advance the world by one fixed step of `dt` seconds.
    ///
    /// `now_ms` stamps the kick cooldown. Returns the messages the step wants
    /// sent to the relay, in order.
    pub fn tick(&self, world: &mut World, dt: f64, now_ms: u64) -> Vec<ClientMsg> {
        let mut outbound = Vec::new();

        if let Some(local_id) = world.local_id {
            Self::step_local(world, local_id, dt, now_ms, &mut outbound);
        }

        if self.peer_dead_reckoning {
            let local_id = world.local_id;
            for (id, player) in world.players.iter_mut() {
                if local_id != Some(*id) {
                    Self::integrate_player(&mut player.logical, dt);
                    Self::clamp_player(&mut player.logical);
                }
            }
        }

        Self::step_ball(&mut world.ball.logical, dt);

        outbound
    }

    fn step_local(
        world: &mut World,
        local_id: PlayerId,
        dt: f64,
        now_ms: u64,
        outbound: &mut Vec<ClientMsg>,
    ) {
        let World {
            players,
            ball,
            pending_target,
            click_on_ball,
            last_kick_at,
            ..
        } = world;

        let Some(player) = players.get_mut(&local_id) else {
            return;
        };
        let p = &mut player.logical;

        // Arrival
        if let Some(target) = *pending_target {
            if distance(p.x, p.y, target.x, target.y) < ARRIVAL_THRESHOLD {
                p.vel_x = 0.0;
                p.vel_y = 0.0;
                outbound.push(ClientMsg::Move {
                    x: p.x,
                    y: p.y,
                    vel_x: 0.0,
                    vel_y: 0.0,
                });
                *pending_target = None;
            }
        }

        Self::integrate_player(p, dt);
        Self::clamp_player(p);

        // Kick
        let Some(target) = *pending_target else {
            return;
        };
        if *click_on_ball || !Self::cooldown_elapsed(*last_kick_at, now_ms) {
            return;
        }
        if let Some(kick) = Self::try_kick(p, &mut ball.logical, target) {
            outbound.push(kick);
            *pending_target = None;
            *click_on_ball = false;
            *last_kick_at = Some(now_ms);
        }
    }

    /// Kick the ball towards `target` if the player is touching it
    fn try_kick(player: &PlayerLogical, ball: &mut BallLogical, target: ClickTarget) -> Option<ClientMsg> {
        if distance(player.x, player.y, ball.x, ball.y) >= BALL_RADIUS + AVATAR_RADIUS {
            return None;
        }

        let (dir_x, dir_y) = direction(player.x, player.y, target.x, target.y)?;
        ball.vx = dir_x * KICK_POWER;
        ball.vy = dir_y * KICK_POWER;

        Some(ClientMsg::Kick {
            x: ball.x,
            y: ball.y,
            dir_x,
            dir_y,
        })
    }

    pub fn cooldown_elapsed(last_kick_at: Option<u64>, now_ms: u64) -> bool {
        last_kick_at.map_or(true, |last| now_ms.saturating_sub(last) >= KICK_COOLDOWN_MS)
    }

    pub fn integrate_player(p: &mut PlayerLogical, dt: f64) {
        p.x += p.vel_x * dt;
        p.y += p.vel_y * dt;
    }

    /// Keep a player inside the arena; an edge stops motion on that axis
    pub fn clamp_player(p: &mut PlayerLogical) {
        let ((x, y), (hit_x, hit_y)) = ARENA.clamp(p.x, p.y, AVATAR_RADIUS);
        p.x = x;
        p.y = y;
        if hit_x {
            p.vel_x = 0.0;
        }
        if hit_y {
            p.vel_y = 0.0;
        }
    }

    /// Per-step friction multiplier; the same total decay per second at any tick rate
    pub fn friction_decay(dt: f64) -> f64 {
        BALL_FRICTION.powf(dt * REFERENCE_RATE)
    }

    /// Integrate, decay and bounce the ball
    pub fn step_ball(ball: &mut BallLogical, dt: f64) {
        let frames = dt * REFERENCE_RATE;
        ball.x += ball.vx * frames;
        ball.y += ball.vy * frames;

        let decay = Self::friction_decay(dt);
        ball.vx *= decay;
        ball.vy *= decay;

        let ((x, y), (hit_x, hit_y)) = ARENA.clamp(ball.x, ball.y, BALL_RADIUS);
        ball.x = x;
        ball.y = y;
        if hit_x {
            ball.vx = -ball.vx * RESTITUTION;
        }
        if hit_y {
            ball.vy = -ball.vy * RESTITUTION;
        }
    }
}
