//! Routes decoded inbound events to the aggregator or the trigger signal.

use crate::{aggregator::StreamAggregator, observer::SessionObserver, protocol::InboundEvent};
use tracing::{debug, warn};

/// Routes `event` exactly once.
///
/// Token and end events update `aggregator` and publish the new response.
/// Triggers are forwarded to the observer. Malformed frames are logged and
/// otherwise ignored.
pub fn dispatch(
    event: InboundEvent,
    aggregator: &mut StreamAggregator,
    observer: &mut dyn SessionObserver,
) {
    match event {
        InboundEvent::StreamToken(token) => {
            aggregator.on_token(&token);
            observer.response_changed(aggregator.response(), aggregator.is_complete());
        }
        InboundEvent::StreamEnd => {
            aggregator.on_end();
            debug!(chars = aggregator.response().len(), "Response stream complete.");
            observer.response_changed(aggregator.response(), aggregator.is_complete());
        }
        InboundEvent::Trigger => {
            debug!("Trigger signal received.");
            observer.triggered();
        }
        InboundEvent::Malformed(reason) => {
            warn!(%reason, "Discarding malformed frame.");
        }
    }
}
