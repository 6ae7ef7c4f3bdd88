//! Live peer feed: registry snapshots in, `PeerView`s out.

use std::sync::Arc;

use bazaar_common::PresenceError;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::peers::PeerView;

use super::session::Shared;

pub(crate) type UpdateFn = Box<dyn FnMut(PeerView) + Send>;
pub(crate) type ErrorFn = Box<dyn FnMut(PresenceError) + Send>;

/// Handle for a running peer subscription. Unsubscribes on drop.
pub struct PeerSubscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeerSubscription {
    /// Stop receiving updates. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// False once unsubscribed or once the feed has ended (for example
    /// after a subscription error).
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PeerSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

pub(crate) fn spawn_peer_feed(
    shared: Arc<Shared>,
    mut on_update: UpdateFn,
    mut on_error: Option<ErrorFn>,
) -> PeerSubscription {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let handle = tokio::spawn(async move {
        let user_id = shared.identity.user_id.clone();
        let mut fail = move |e: PresenceError| match on_error.as_mut() {
            Some(callback) => callback(e),
            None => warn!(user_id = %user_id, error = %e, "Presence feed error, peer view will go stale"),
        };

        let subscribed = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = shared.store.subscribe() => result,
        };
        let mut feed = match subscribed {
            Ok(feed) => feed,
            Err(e) => {
                fail(e);
                return;
            }
        };
        debug!(user_id = %shared.identity.user_id, "Subscribed to presence feed");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                next = feed.next() => match next {
                    Some(Ok(records)) => {
                        let view = shared.peer_view(&records);
                        debug!(records = records.len(), online = view.len(), "Peer view updated");
                        on_update(view);
                    }
                    Some(Err(e)) => {
                        fail(e);
                        break;
                    }
                    None => {
                        debug!("Presence feed closed");
                        break;
                    }
                }
            }
        }
    });

    PeerSubscription {
        cancel,
        handle: Some(handle),
    }
}
