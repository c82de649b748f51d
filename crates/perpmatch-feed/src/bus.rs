//! The event bus: connections, subscriptions, fan-out, liveness.
//!
//! One bus instance is created by the composing layer and handed by
//! reference to whoever publishes or feeds it inbound messages. Fan-out is
//! synchronous: `publish` walks every live subscription and writes matching
//! events out before returning. Per-connection failures terminate that
//! connection and never propagate to the others.

use std::collections::BTreeMap;

use perpmatch_types::{
    ConnectionId, FeedConfig, OrderRecord, PerpmatchError, Result, TradeHistoryRecord,
};
use serde::Serialize;

use crate::channel::Channel;
use crate::event::FeedEvent;
use crate::message::{ErrorMessage, InboundMessage, UpdateMessage};
use crate::sink::ConnectionSink;
use crate::subscription::{SubscriptionFilter, SubscriptionRecord};

/// Supplies the snapshot pages pushed to fresh subscriptions.
///
/// The engine implements this over its stores; the bus only decides *when*
/// to backfill, never *what* the data is.
pub trait BackfillSource {
    /// First page of resting orders visible to `filter`.
    fn resting_orders(&self, filter: &SubscriptionFilter, limit: usize) -> Vec<OrderRecord>;

    /// Most recent page of settled trades visible to `filter`.
    fn recent_trades(&self, filter: &SubscriptionFilter, limit: usize) -> Vec<TradeHistoryRecord>;
}

/// A backfill source with nothing to serve. Fresh subscriptions still get
/// their one (empty) backfill message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackfill;

impl BackfillSource for NoBackfill {
    fn resting_orders(&self, _filter: &SubscriptionFilter, _limit: usize) -> Vec<OrderRecord> {
        Vec::new()
    }

    fn recent_trades(
        &self,
        _filter: &SubscriptionFilter,
        _limit: usize,
    ) -> Vec<TradeHistoryRecord> {
        Vec::new()
    }
}

struct Connection {
    sink: Box<dyn ConnectionSink>,
    /// Cleared on every heartbeat ping, restored by the pong. A connection
    /// still cleared at the next tick is reaped.
    alive: bool,
    /// Keyed by the client-chosen request id; re-subscribing under the same
    /// id replaces the previous subscription.
    subscriptions: BTreeMap<String, SubscriptionRecord>,
}

/// Connection and subscription registry with synchronous fan-out.
pub struct EventBus {
    config: FeedConfig,
    connections: BTreeMap<ConnectionId, Connection>,
}

impl EventBus {
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            connections: BTreeMap::new(),
        }
    }

    /// Register a new connection and return its id.
    pub fn connect(&mut self, sink: Box<dyn ConnectionSink>) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(
            id,
            Connection {
                sink,
                alive: true,
                subscriptions: BTreeMap::new(),
            },
        );
        tracing::debug!(connection = %id, "Connection opened");
        id
    }

    /// Client-initiated teardown: closes the sink and drops every
    /// subscription the connection held.
    pub fn disconnect(&mut self, id: ConnectionId) {
        if let Some(mut conn) = self.connections.remove(&id) {
            conn.sink.close();
            tracing::debug!(connection = %id, "Connection closed");
        }
    }

    #[must_use]
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.connections
            .values()
            .map(|conn| conn.subscriptions.len())
            .sum()
    }

    /// Process one inbound frame from `id`.
    ///
    /// A frame that fails to decode gets an error notice and terminates the
    /// connection; other connections are untouched. A subscribe on the
    /// Orders or TradeHistory channel is answered with exactly one backfill
    /// message, possibly empty, before any live update reaches it.
    ///
    /// # Errors
    /// `MalformedMessage` for undecodable frames, `Transport` when the
    /// connection is unknown or its sink fails.
    pub fn handle_message(
        &mut self,
        id: ConnectionId,
        text: &str,
        backfill: &dyn BackfillSource,
    ) -> Result<()> {
        if !self.connections.contains_key(&id) {
            return Err(PerpmatchError::Transport {
                reason: format!("unknown connection {id}"),
            });
        }
        let message = match InboundMessage::decode(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(connection = %id, error = %err, "Malformed inbound frame, terminating connection");
                self.send_error(id, &err);
                self.terminate(id);
                return Err(err);
            }
        };
        match message {
            InboundMessage::Subscribe {
                request_id,
                channel,
                payload,
            } => self.subscribe(id, request_id, channel, payload, backfill),
            InboundMessage::Unsubscribe { request_id } => {
                self.unsubscribe(id, &request_id);
                Ok(())
            }
        }
    }

    /// Fan one pass's events out to every matching subscription.
    ///
    /// All events in `events` that match the same subscription are
    /// coalesced into a single update message for its request id. A
    /// connection whose sink fails mid-pass is terminated; the pass
    /// continues for everyone else.
    pub fn publish(&mut self, events: &[FeedEvent]) {
        if events.is_empty() {
            return;
        }
        let ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for id in ids {
            let Some(conn) = self.connections.get_mut(&id) else {
                continue;
            };
            let mut outbound = Vec::new();
            for (request_id, sub) in &conn.subscriptions {
                let mut payload = Vec::new();
                for event in events {
                    if event.channel() == sub.channel && event.matches(&sub.filter) {
                        match event.payload() {
                            Ok(value) => payload.push(value),
                            Err(err) => {
                                tracing::warn!(error = %err, "Dropping unserializable event");
                            }
                        }
                    }
                }
                if !payload.is_empty() {
                    outbound.push(UpdateMessage::new(sub.channel, payload, request_id.clone()));
                }
            }

            let mut sink_failed = false;
            for message in outbound {
                match serde_json::to_string(&message) {
                    Ok(text) => {
                        if let Err(err) = conn.sink.send(&text) {
                            tracing::warn!(connection = %id, error = %err, "Send failed during fan-out, terminating connection");
                            sink_failed = true;
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Dropping unserializable update message");
                    }
                }
            }
            if sink_failed {
                self.terminate(id);
            }
        }
    }

    /// One liveness pass: reap every connection that missed the previous
    /// ping, then ping the survivors. A connection whose ping cannot be
    /// written is reaped immediately.
    pub fn heartbeat_tick(&mut self) {
        let missed: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, conn)| !conn.alive)
            .map(|(id, _)| *id)
            .collect();
        for id in missed {
            tracing::warn!(connection = %id, "Heartbeat missed, terminating connection");
            self.terminate(id);
        }

        let ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for id in ids {
            let Some(conn) = self.connections.get_mut(&id) else {
                continue;
            };
            conn.alive = false;
            if conn.sink.ping().is_err() {
                tracing::warn!(connection = %id, "Ping failed, terminating connection");
                self.terminate(id);
            }
        }
    }

    /// Mark `id` as having answered the latest ping.
    pub fn record_pong(&mut self, id: ConnectionId) {
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.alive = true;
        }
    }

    fn subscribe(
        &mut self,
        id: ConnectionId,
        request_id: String,
        channel: Channel,
        filter: SubscriptionFilter,
        backfill: &dyn BackfillSource,
    ) -> Result<()> {
        let backfill_payload = self.backfill_payload(channel, &filter, backfill)?;
        let record = SubscriptionRecord {
            request_id: request_id.clone(),
            channel,
            filter,
            connection: id,
        };
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.subscriptions.insert(request_id.clone(), record);
        }
        tracing::debug!(connection = %id, request_id = %request_id, channel = %channel, "Subscribed");
        if let Some(payload) = backfill_payload {
            self.send_to(id, &UpdateMessage::new(channel, payload, request_id))?;
        }
        Ok(())
    }

    fn unsubscribe(&mut self, id: ConnectionId, request_id: &str) {
        if let Some(conn) = self.connections.get_mut(&id) {
            // idempotent: unknown request ids are a no-op
            if conn.subscriptions.remove(request_id).is_some() {
                tracing::debug!(connection = %id, request_id = %request_id, "Unsubscribed");
            }
        }
    }

    fn backfill_payload(
        &self,
        channel: Channel,
        filter: &SubscriptionFilter,
        backfill: &dyn BackfillSource,
    ) -> Result<Option<Vec<serde_json::Value>>> {
        let limit = self.config.backfill_page_size;
        let values: std::result::Result<Vec<serde_json::Value>, serde_json::Error> = match channel
        {
            Channel::Orders => backfill
                .resting_orders(filter, limit)
                .iter()
                .map(serde_json::to_value)
                .collect(),
            Channel::TradeHistory => backfill
                .recent_trades(filter, limit)
                .iter()
                .map(serde_json::to_value)
                .collect(),
            Channel::AccountState => return Ok(None),
        };
        values
            .map(Some)
            .map_err(|err| PerpmatchError::Serialization(err.to_string()))
    }

    fn send_to(&mut self, id: ConnectionId, message: &impl Serialize) -> Result<()> {
        let text = serde_json::to_string(message)
            .map_err(|err| PerpmatchError::Serialization(err.to_string()))?;
        let Some(conn) = self.connections.get_mut(&id) else {
            return Err(PerpmatchError::Transport {
                reason: format!("unknown connection {id}"),
            });
        };
        if let Err(err) = conn.sink.send(&text) {
            tracing::warn!(connection = %id, error = %err, "Send failed, terminating connection");
            self.terminate(id);
            return Err(err);
        }
        Ok(())
    }

    fn send_error(&mut self, id: ConnectionId, err: &PerpmatchError) {
        if let Ok(text) = serde_json::to_string(&ErrorMessage::new(err.to_string())) {
            if let Some(conn) = self.connections.get_mut(&id) {
                // best effort; the connection is going away anyway
                let _ = conn.sink.send(&text);
            }
        }
    }

    fn terminate(&mut self, id: ConnectionId) {
        if let Some(mut conn) = self.connections.remove(&id) {
            conn.sink.close();
        }
    }
}
