//! Per-connection handler: the bridge between a WebSocket and the
//! coordinator.
//!
//! Each accepted connection gets one handler invocation. It registers an
//! outbound event channel with the coordinator, spawns a writer task that
//! encodes queued [`ServerEvent`]s onto the socket, and then reads frames
//! until the socket closes, translating each decoded [`ClientEvent`] into a
//! coordinator command.

use skewer_coordinator::{CoordinatorCommand, CoordinatorHandle};
use skewer_protocol::{ClientEvent, Codec, JsonCodec, ServerEvent};
use skewer_transport::{Connection, ConnectionId};
use tokio::sync::mpsc;

/// Drives one connection to completion. Returns when the socket closes or
/// errors; the coordinator is always told about the disconnect.
pub async fn drive_connection<C>(connection: C, coordinator: CoordinatorHandle)
where
    C: Connection,
{
    let id = connection.id();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let direct = tx.clone();
    if coordinator.connect(id, tx).await.is_err() {
        tracing::warn!(%id, "coordinator gone; dropping connection");
        return;
    }

    let writer = connection.clone();
    let write_task = tokio::spawn(async move {
        let codec = JsonCodec;
        while let Some(event) = rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::error!(%error, "failed to encode outbound event");
                    continue;
                }
            };
            if writer.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    let codec = JsonCodec;
    loop {
        match connection.recv().await {
            Ok(Some(frame)) => match codec.decode::<ClientEvent>(&frame) {
                Ok(event) => {
                    if coordinator.send(command_for(id, event)).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    tracing::debug!(%id, %error, "malformed client event");
                    let _ = direct.send(ServerEvent::ProtocolError {
                        message: format!("malformed event: {error}"),
                    });
                }
            },
            Ok(None) => break,
            Err(error) => {
                tracing::debug!(%id, %error, "connection read failed");
                break;
            }
        }
    }

    let _ = coordinator.disconnect(id).await;
    write_task.abort();
    tracing::debug!(%id, "connection handler finished");
}

fn command_for(connection: ConnectionId, event: ClientEvent) -> CoordinatorCommand {
    match event {
        ClientEvent::RequestMatch => CoordinatorCommand::RequestMatch { connection },
        ClientEvent::JoinSession { session_id, token } => CoordinatorCommand::Join {
            connection,
            session_id,
            token,
        },
        ClientEvent::SubmitMove(mv) => CoordinatorCommand::SubmitMove { connection, mv },
    }
}
