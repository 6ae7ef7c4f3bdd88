//! Background heartbeat loop for an active session.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::location::{Position, PositionStream};

use super::session::Shared;

/// Report on every heartbeat and on every move of at least
/// `min_move_meters`. A reported move restarts the heartbeat period.
pub(crate) async fn run_reporter(
    shared: Arc<Shared>,
    generation: u64,
    cancel: CancellationToken,
    positions: Option<PositionStream>,
    mut last_reported: Position,
) {
    let period = shared.config.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut positions: PositionStream = positions.unwrap_or_else(|| stream::pending().boxed());

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = heartbeat.tick() => {
                let position = shared.last_position().unwrap_or(last_reported);
                shared.report(generation, position).await;
                last_reported = position;
            }
            next = positions.next() => match next {
                Some(position) => {
                    shared.set_last_position(position);
                    if position.distance_m(&last_reported) >= shared.config.min_move_meters {
                        shared.report(generation, position).await;
                        last_reported = position;
                        heartbeat.reset();
                    }
                }
                None => {
                    debug!("Position watch ended, reporting on heartbeat only");
                    positions = stream::pending().boxed();
                }
            }
        }
    }

    debug!(user_id = %shared.identity.user_id, "Presence reporter exited");
}
