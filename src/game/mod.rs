//! Client-side game simulation

pub mod clock;
pub mod entity;
pub mod input;
pub mod interpreter;
pub mod physics;
pub mod world;

pub use clock::FixedClock;
pub use entity::{Ball, Interpolate, Player};
pub use input::{InputError, InputTranslator};
pub use interpreter::MessageInterpreter;
pub use physics::PhysicsSystem;
pub use world::{ClickTarget, World};
