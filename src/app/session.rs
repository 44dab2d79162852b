//! Per-connection client session: owns the world and wires the components together

use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::game::{InputTranslator, MessageInterpreter, PhysicsSystem, World};
use crate::render::{FrameView, Renderer};
use crate::util::hex_dump::hex_dump;
use crate::util::time::Clock;
use crate::ws::codec::{CodecAdapter, FrameError};
use crate::ws::protocol::ClientMsg;

/// Bytes of a frame included in debug logs
const DUMP_BYTES: usize = 32;

/// The client context. The event loop only ever talks to this.
pub struct Session {
    id: Uuid,
    world: World,
    codec: CodecAdapter,
    physics: PhysicsSystem,
    renderer: Box<dyn Renderer>,
    clock: Box<dyn Clock>,
    frames: u64,
}

impl Session {
    pub fn new(
        codec: CodecAdapter,
        physics: PhysicsSystem,
        renderer: Box<dyn Renderer>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            world: World::new(),
            codec,
            physics,
            renderer,
            clock,
            frames: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn codec(&self) -> &CodecAdapter {
        &self.codec
    }

    /// Render frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Handle one inbound binary frame. Bad frames are dropped and logged;
    /// the error is returned for callers that want it.
    pub fn on_frame(&mut self, frame: &[u8]) -> Result<(), FrameError> {
        debug!(len = frame.len(), bytes = %dump(frame), "Inbound frame");

        match self.codec.decode_inbound(frame) {
            Ok(msg) => {
                debug!(tag = msg.tag(), "Handling message");
                MessageInterpreter::handle(&mut self.world, msg);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, bytes = %dump(frame), "Dropping inbound frame");
                Err(e)
            }
        }
    }

    /// Run one simulation step; returns encoded frames to send, in order
    pub fn on_tick(&mut self, dt: f64) -> Vec<Bytes> {
        let now = self.clock.now_millis();
        let outbound = self.physics.tick(&mut self.world, dt, now);
        outbound.iter().filter_map(|msg| self.encode(msg)).collect()
    }

    /// Advance interpolation one display frame and draw it
    pub fn on_render(&mut self) {
        self.world.interpolate_all();
        self.frames += 1;
        let view = FrameView::capture(&self.world, self.frames, self.codec.backend_name());
        self.renderer.draw(&view);
    }

    /// Pointer down in game coordinates; returns the `Move` frame to send
    pub fn on_pointer_down(&mut self, x: f64, y: f64) -> Option<Bytes> {
        match InputTranslator::on_pointer_down(&mut self.world, x, y) {
            Ok(msg) => self.encode(&msg),
            Err(e) => {
                warn!(error = %e, x, y, "Ignoring pointer input");
                None
            }
        }
    }

    /// Connection lost; everything tied to it is stale
    pub fn on_disconnect(&mut self) {
        self.world.reset_connection();
        debug!(session_id = %self.id, "Session state reset after disconnect");
    }

    fn encode(&self, msg: &ClientMsg) -> Option<Bytes> {
        match self.codec.encode(msg) {
            Ok(frame) => {
                debug!(tag = msg.tag(), bytes = %dump(&frame), "Outbound frame");
                Some(frame)
            }
            Err(e) => {
                warn!(error = %e, tag = msg.tag(), "Failed to encode outbound message");
                None
            }
        }
    }
}

fn dump(frame: &[u8]) -> String {
    hex_dump(frame, DUMP_BYTES)
}
