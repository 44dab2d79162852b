//! Event loop: connection lifecycle, clocks, inbound frames and pointer input

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Sink, SinkExt, StreamExt};
use tokio::io::AsyncBufRead;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use super::pointer::PointerInput;
use super::session::Session;
use crate::config::Config;
use crate::game::FixedClock;
use crate::ws::transport::{connect, Backoff, RelayStream};

/// Why a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    Shutdown,
    Closed,
}

/// Run the client until `shutdown` resolves or reconnecting is given up.
///
/// Pointer input is read from stdin.
pub async fn run<F>(config: &Config, session: &mut Session, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let input = PointerInput::stdin();
    run_with_input(config, session, input, shutdown).await
}

pub async fn run_with_input<R, F>(
    config: &Config,
    session: &mut Session,
    mut input: PointerInput<R>,
    shutdown: F,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut backoff = Backoff::new(config.reconnect);

    loop {
        let connected = tokio::select! {
            _ = &mut shutdown => return Ok(()),
            result = connect(&config.server_url) => result,
        };

        match connected {
            Ok(stream) => {
                backoff.reset();
                let end = drive_connection(config, session, stream, &mut input, shutdown.as_mut()).await;
                session.on_disconnect();
                if end == ConnectionEnd::Shutdown {
                    return Ok(());
                }
            }
            Err(e) => {
                warn!(error = %e, attempt = backoff.failures() + 1, "Connection attempt failed");
            }
        }

        let delay = backoff.next_delay()?;
        info!(delay_ms = delay.as_millis() as u64, "Reconnecting after delay");

        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Multiplex one live connection until it closes or shutdown is requested
async fn drive_connection<R, F>(
    config: &Config,
    session: &mut Session,
    stream: RelayStream,
    input: &mut PointerInput<R>,
    mut shutdown: Pin<&mut F>,
) -> ConnectionEnd
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let (mut sink, mut inbound) = stream.split();
    let mut sim_clock = FixedClock::simulation();
    let mut render_clock = FixedClock::render(config.render_fps);

    info!(session_id = %session.id(), backend = session.codec().backend_name(), "Session connected");

    let end = loop {
        tokio::select! {
            _ = &mut shutdown => break ConnectionEnd::Shutdown,

            msg = inbound.next() => match msg {
                Some(Ok(Message::Binary(data))) => {
                    // Errors are logged by the session; the frame is dropped
                    let _ = session.on_frame(&data);
                }
                Some(Ok(Message::Text(text))) => {
                    warn!(len = text.len(), "Ignoring text frame, relay speaks binary only");
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Relay closed the connection");
                    break ConnectionEnd::Closed;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    break ConnectionEnd::Closed;
                }
                None => {
                    info!("Relay stream ended");
                    break ConnectionEnd::Closed;
                }
            },

            _ = sim_clock.tick() => {
                let frames = session.on_tick(sim_clock.dt());
                if let Err(e) = send_all(&mut sink, frames).await {
                    warn!(error = %e, "Failed to send tick output");
                    break ConnectionEnd::Closed;
                }
            }

            _ = render_clock.tick() => session.on_render(),

            point = input.next_point(), if !input.is_closed() => {
                let Some((x, y)) = point else { continue };
                let Some(frame) = session.on_pointer_down(x, y) else { continue };
                if let Err(e) = send_all(&mut sink, [frame]).await {
                    warn!(error = %e, "Failed to send pointer move");
                    break ConnectionEnd::Closed;
                }
            }
        }
    };

    if end == ConnectionEnd::Shutdown {
        if let Err(e) = sink.send(Message::Close(None)).await {
            debug!(error = %e, "Close frame not delivered");
        }
    }

    info!(
        session_id = %session.id(),
        ticks = sim_clock.ticks(),
        frames = session.frames(),
        "Session disconnected"
    );
    end
}

async fn send_all<S>(sink: &mut S, frames: impl IntoIterator<Item = Bytes>) -> Result<(), tungstenite::Error>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    for frame in frames {
        sink.send(Message::Binary(frame.to_vec())).await?;
    }
    Ok(())
}
