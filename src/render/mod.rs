//! Render collaborator: a read-only view of the world per display frame

use serde::Serialize;
use tracing::trace;

use crate::game::World;
use crate::ws::protocol::PlayerId;

/// One player as it should appear on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerSprite {
    pub id: PlayerId,
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub local: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BallSprite {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

/// Everything a renderer may draw for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    pub frame: u64,
    pub local_id: Option<PlayerId>,
    /// Sorted by id
    pub players: Vec<PlayerSprite>,
    pub ball: BallSprite,
    pub codec: &'static str,
}

impl FrameView {
    pub fn capture(world: &World, frame: u64, codec: &'static str) -> Self {
        let mut players: Vec<PlayerSprite> = world
            .players
            .iter()
            .map(|(&id, p)| PlayerSprite {
                id,
                x: p.visual.x,
                y: p.visual.y,
                vel_x: p.logical.vel_x,
                vel_y: p.logical.vel_y,
                local: world.is_local(id),
            })
            .collect();
        players.sort_by_key(|p| p.id);

        Self {
            frame,
            local_id: world.local_id,
            players,
            ball: BallSprite {
                x: world.ball.visual.x,
                y: world.ball.visual.y,
                vx: world.ball.logical.vx,
                vy: world.ball.logical.vy,
            },
            codec,
        }
    }
}

pub trait Renderer: Send {
    fn draw(&mut self, view: &FrameView);
}

/// Headless renderer: logs the debug HUD at trace level once every `every` frames
#[derive(Debug)]
pub struct TraceRenderer {
    every: u64,
    drawn: u64,
}

impl TraceRenderer {
    pub fn new(fps: u32) -> Self {
        Self {
            every: u64::from(fps.max(1)),
            drawn: 0,
        }
    }

    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    fn should_log(&self, frame: u64) -> bool {
        frame % self.every == 0
    }
}

impl Renderer for TraceRenderer {
    fn draw(&mut self, view: &FrameView) {
        self.drawn += 1;
        if !self.should_log(view.frame) {
            return;
        }

        match serde_json::to_string(view) {
            Ok(hud) => trace!(frame = view.frame, players = view.players.len(), %hud, "HUD"),
            Err(e) => trace!(error = %e, "Failed to serialize HUD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;

    #[test]
    fn capture_uses_visual_positions_sorted_by_id() {
        let mut world = World::new();
        world.local_id = Some(2);
        let mut far = Player::new(500.0, 500.0, 120.0, 0.0);
        far.visual.x = 450.0;
        world.players.insert(9, far);
        world.players.insert(2, Player::spawn());
        world.ball.visual.x = 390.0;
        world.ball.logical.vx = 1.5;

        let view = FrameView::capture(&world, 60, "native");

        assert_eq!(view.players.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 9]);
        assert!(view.players[0].local);
        assert!(!view.players[1].local);
        assert_eq!((view.players[1].x, view.players[1].vel_x), (450.0, 120.0));
        assert_eq!(view.ball, BallSprite { x: 390.0, y: 300.0, vx: 1.5, vy: 0.0 });
        assert_eq!(view.codec, "native");
    }

    #[test]
    fn hud_serializes_to_json() {
        let view = FrameView::capture(&World::new(), 0, "fallback");
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["codec"], "fallback");
        assert!(json["local_id"].is_null());
    }

    #[test]
    fn trace_renderer_counts_every_frame() {
        let mut renderer = TraceRenderer::new(30);
        let world = World::new();
        for frame in 1..=61 {
            renderer.draw(&FrameView::capture(&world, frame, "native"));
        }
        assert_eq!(renderer.drawn(), 61);
        assert!(renderer.should_log(60));
        assert!(!renderer.should_log(61));
    }
}
