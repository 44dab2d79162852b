//! Ball Game Client - real-time multiplayer ball game client
//!
//! Connects to a relay over WebSocket, speaks MessagePack frames, runs the
//! local player's physics at a fixed 30 Hz and smooths everything on screen
//! at the render rate.

pub mod app;
pub mod config;
pub mod game;
pub mod render;
pub mod util;
pub mod ws;
