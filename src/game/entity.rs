//! Player and ball entities: logical (simulated) and visual (displayed) state

/// Where new players appear
pub const SPAWN_POSITION: (f64, f64) = (100.0, 100.0);
/// Where the ball sits after (re)initialization
pub const BALL_ORIGIN: (f64, f64) = (400.0, 300.0);

/// Fraction of the logical/visual gap closed per render frame
pub const SMOOTHING_FACTOR: f64 = 0.2;
/// Faster convergence for a player that has stopped, so it does not drift
pub const REST_SMOOTHING_FACTOR: f64 = 0.5;

/// Display-only position. Never read by physics, never sent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisualState {
    pub x: f64,
    pub y: f64,
}

impl VisualState {
    /// Move a fraction of the way towards `(x, y)`
    pub fn approach(&mut self, x: f64, y: f64, factor: f64) {
        self.x += (x - self.x) * factor;
        self.y += (y - self.y) * factor;
    }
}

/// Simulated player state; velocity in pixels per second
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerLogical {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
}

impl PlayerLogical {
    pub fn is_at_rest(&self) -> bool {
        self.vel_x == 0.0 && self.vel_y == 0.0
    }
}

/// Simulated ball state; velocity in pixels per reference frame (1/60 s)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BallLogical {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub logical: PlayerLogical,
    pub visual: VisualState,
}

impl Player {
    /// A player whose visual position starts on its logical position
    pub fn new(x: f64, y: f64, vel_x: f64, vel_y: f64) -> Self {
        Self {
            logical: PlayerLogical { x, y, vel_x, vel_y },
            visual: VisualState { x, y },
        }
    }

    /// A stationary player at the spawn point
    pub fn spawn() -> Self {
        let (x, y) = SPAWN_POSITION;
        Self::new(x, y, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub logical: BallLogical,
    pub visual: VisualState,
}

impl Ball {
    /// A stationary ball at the origin
    pub fn at_origin() -> Self {
        let (x, y) = BALL_ORIGIN;
        Self {
            logical: BallLogical { x, y, vx: 0.0, vy: 0.0 },
            visual: VisualState { x, y },
        }
    }
}

impl Default for Ball {
    fn default() -> Self {
        Self::at_origin()
    }
}

/// Entities whose visual state trails their logical state
pub trait Interpolate {
    fn logical_position(&self) -> (f64, f64);

    fn smoothing_factor(&self) -> f64 {
        SMOOTHING_FACTOR
    }

    fn visual_mut(&mut self) -> &mut VisualState;

    /// One render frame of exponential smoothing
    fn interpolate(&mut self) {
        let (x, y) = self.logical_position();
        let factor = self.smoothing_factor();
        self.visual_mut().approach(x, y, factor);
    }
}

impl Interpolate for Player {
    fn logical_position(&self) -> (f64, f64) {
        (self.logical.x, self.logical.y)
    }

    fn smoothing_factor(&self) -> f64 {
        if self.logical.is_at_rest() {
            REST_SMOOTHING_FACTOR
        } else {
            SMOOTHING_FACTOR
        }
    }

    fn visual_mut(&mut self) -> &mut VisualState {
        &mut self.visual
    }
}

impl Interpolate for Ball {
    fn logical_position(&self) -> (f64, f64) {
        (self.logical.x, self.logical.y)
    }

    fn visual_mut(&mut self) -> &mut VisualState {
        &mut self.visual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_player_uses_base_factor() {
        let mut player = Player::new(100.0, 0.0, 120.0, 0.0);
        player.visual = VisualState { x: 0.0, y: 0.0 };
        player.interpolate();

        assert!((player.visual.x - 20.0).abs() < 1e-9);
        assert_eq!(player.logical, PlayerLogical { x: 100.0, y: 0.0, vel_x: 120.0, vel_y: 0.0 });
    }

    #[test]
    fn resting_player_converges_faster() {
        let mut player = Player::new(100.0, 50.0, 0.0, 0.0);
        player.visual = VisualState { x: 0.0, y: 0.0 };
        player.interpolate();

        assert!((player.visual.x - 50.0).abs() < 1e-9);
        assert!((player.visual.y - 25.0).abs() < 1e-9);
    }

    #[test]
    fn a_single_moving_axis_keeps_base_factor() {
        let mut player = Player::new(10.0, 0.0, 0.0, -1.0);
        player.visual = VisualState::default();
        assert_eq!(player.smoothing_factor(), SMOOTHING_FACTOR);
    }

    #[test]
    fn ball_always_uses_base_factor() {
        let mut ball = Ball::at_origin();
        ball.visual = VisualState { x: 300.0, y: 300.0 };
        ball.interpolate();

        assert!((ball.visual.x - 320.0).abs() < 1e-9);
        assert_eq!(ball.visual.y, 300.0);
        assert_eq!((ball.logical.x, ball.logical.y), BALL_ORIGIN);
    }

    #[test]
    fn visual_converges_without_overshoot() {
        let mut ball = Ball::at_origin();
        ball.visual = VisualState { x: 0.0, y: 0.0 };
        for _ in 0..200 {
            ball.interpolate();
            assert!(ball.visual.x <= ball.logical.x);
        }
        assert!((ball.visual.x - ball.logical.x).abs() < 1e-6);
    }
}
