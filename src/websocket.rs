/// WebSocket server publishing table snapshots
use actix::prelude::*;
use actix_web_actors::ws;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::messages::{ClientMessage, ServerMessage};
use crate::record::DetailRow;
use crate::session::TableSession;
use crate::store::RowEntry;

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state for all WebSocket connections
pub struct AppState {
    pub session: Arc<Mutex<TableSession>>,
    pub subscribers: Arc<Mutex<Vec<Addr<TableWebSocket>>>>,
}

impl AppState {
    pub fn new(session: TableSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Lock the session. A panic in another handler leaves the session in a
    /// consistent state between passes, so a poisoned lock is recovered.
    pub fn session(&self) -> MutexGuard<'_, TableSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe a WebSocket connection to snapshot updates
    pub fn subscribe(&self, addr: Addr<TableWebSocket>) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.push(addr);
    }

    /// Broadcast a message to all live subscribers
    pub fn broadcast(&self, msg: ServerMessage) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|addr| addr.connected());
        for addr in subscribers.iter() {
            addr.do_send(BroadcastMessage(msg.clone()));
        }
    }

    /// Run the pending pass if due and publish its snapshot. Returns whether
    /// a pass ran.
    pub fn run_due(&self, now: Instant) -> bool {
        let message = {
            let mut session = self.session();
            if session.poll(now).is_some() {
                Some(ServerMessage::snapshot(&session))
            } else {
                None
            }
        };
        self.publish_message(message)
    }

    /// Run the pending pass now, due or not, and publish its snapshot
    pub fn flush_pending(&self) -> bool {
        let message = {
            let mut session = self.session();
            if session.flush().is_some() {
                Some(ServerMessage::snapshot(&session))
            } else {
                None
            }
        };
        self.publish_message(message)
    }

    /// Due time of the pending pass
    pub fn next_due(&self) -> Option<Instant> {
        self.session().next_due()
    }

    fn publish_message(&self, message: Option<ServerMessage>) -> bool {
        match message {
            Some(message) => {
                self.broadcast(message);
                true
            }
            None => false,
        }
    }

    /// Publish the current snapshot
    pub fn publish(&self) {
        let message = ServerMessage::snapshot(&self.session());
        self.broadcast(message);
    }
}

/// Message to broadcast to clients
#[derive(Message)]
#[rtype(result = "()")]
struct BroadcastMessage(ServerMessage);

/// WebSocket connection actor
pub struct TableWebSocket {
    hb: Instant,
    state: actix_web::web::Data<AppState>,
    /// Receives broadcasts; otherwise results are sent back directly
    subscribed: bool,
}

impl TableWebSocket {
    pub fn new(state: actix_web::web::Data<AppState>) -> Self {
        Self {
            hb: Instant::now(),
            state,
            subscribed: false,
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                log::info!("WebSocket client heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send(&self, ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(text) => ctx.text(text),
            Err(e) => log::error!("failed to encode server message: {}", e),
        }
    }

    /// Wake up when the pending pass is due. Later input from any client
    /// pushes the due time back, in which case the wake-up is re-armed; once
    /// nothing is pending the requester gets the resulting snapshot.
    fn schedule_pass(&self, due: Instant, ctx: &mut ws::WebsocketContext<Self>) {
        let delay = due.saturating_duration_since(Instant::now());
        ctx.run_later(delay, |act, ctx| {
            act.state.run_due(Instant::now());
            match act.state.next_due() {
                Some(due) => act.schedule_pass(due, ctx),
                None if !act.subscribed => {
                    let response = ServerMessage::snapshot(&act.state.session());
                    act.send(ctx, &response);
                }
                None => {}
            }
        });
    }

    fn handle_client_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::Subscribe => {
                if !self.subscribed {
                    self.state.subscribe(ctx.address());
                    self.subscribed = true;
                }
                self.send(ctx, &ServerMessage::Subscribed);
            }

            ClientMessage::Query => {
                let response = ServerMessage::snapshot(&self.state.session());
                self.send(ctx, &response);
            }

            ClientMessage::Stats => {
                let stats = self.state.session().stats();
                self.send(ctx, &ServerMessage::Stats { stats });
            }

            ClientMessage::SetFilter { filter } => {
                let due = self.state.session().submit_filter(filter, Instant::now());
                self.schedule_pass(due, ctx);
            }

            ClientMessage::Search { text } => {
                let due = self.state.session().submit_search(text, Instant::now());
                self.schedule_pass(due, ctx);
            }

            ClientMessage::SortBy { column } => {
                let result = self.state.session().click_sort(&column);
                match result {
                    Ok(_) => self.state.publish(),
                    Err(e) => self.send(ctx, &ServerMessage::error(e.to_string())),
                }
            }

            ClientMessage::LoadRows { rows } => {
                let entries = rows
                    .into_iter()
                    .map(|row| RowEntry::new(row, DetailRow::default()))
                    .collect();
                self.reload(Ok(entries), ctx);
            }

            ClientMessage::LoadMarkup { html } => {
                let entries = crate::markup::parse_rows(&html);
                self.reload(entries, ctx);
            }

            ClientMessage::SetField { id, field, value } => {
                let result = {
                    let mut session = self.state.session();
                    match value {
                        Some(value) => session.set_field(&id, &field, &value),
                        None => session.cycle_field(&id, &field),
                    }
                };
                match result {
                    Ok(true) => self.state.publish(),
                    Ok(false) => self.send(ctx, &ServerMessage::error(format!("row '{}' not found", id))),
                    Err(e) => self.send(ctx, &ServerMessage::error(e.to_string())),
                }
            }
        }
    }

    fn reload(&mut self, entries: crate::error::Result<Vec<RowEntry>>, ctx: &mut ws::WebsocketContext<Self>) {
        let applied = {
            let mut session = self.state.session();
            let ticket = session.begin_reload();
            session.finish_reload(ticket, entries)
        };
        if applied {
            self.state.publish();
        } else {
            let message = self
                .state
                .session()
                .last_error()
                .map(str::to_string)
                .unwrap_or_else(|| Error::Fetch("reload superseded".to_string()).to_string());
            self.send(ctx, &ServerMessage::error(message));
        }
    }
}

impl Actor for TableWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);
    }

    /// Timers die with the connection, so a pass this client was waiting on
    /// runs now instead of staying pending
    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        if self.state.flush_pending() {
            log::debug!("flushed pending pass of a closing connection");
        }
        Running::Stop
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for TableWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    self.handle_client_message(client_msg, ctx);
                }
                Err(e) => {
                    self.send(ctx, &ServerMessage::error(format!("Invalid message format: {}", e)));
                }
            },
            Ok(ws::Message::Binary(_)) => {
                log::warn!("Unexpected binary message");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

impl Handler<BroadcastMessage> for TableWebSocket {
    type Result = ();

    fn handle(&mut self, msg: BroadcastMessage, ctx: &mut Self::Context) {
        self.send(ctx, &msg.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::field::{Field, Mark};
    use crate::filter::FilterState;
    use crate::record::PaperRow;

    fn app_state() -> AppState {
        let rows = vec![
            PaperRow::new("1").with_mark(Field::IsOfftopic, Mark::Yes),
            PaperRow::new("2"),
        ];
        let entries = rows
            .into_iter()
            .map(|row| RowEntry::new(row, DetailRow::default()))
            .collect();
        let config = ViewConfig {
            initial_sort: None,
            ..Default::default()
        };
        AppState::new(TableSession::with_entries(config, entries).unwrap())
    }

    fn hide_offtopic() -> FilterState {
        FilterState {
            hide_offtopic: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_due_waits_for_due_time() {
        let state = app_state();
        let t0 = Instant::now();
        let due = state.session().submit_filter(hide_offtopic(), t0);

        assert!(!state.run_due(t0));
        assert_eq!(state.next_due(), Some(due));
        assert!(state.run_due(due));
        assert!(state.next_due().is_none());
        assert_eq!(state.session().snapshot().visible, 1);
        assert!(!state.run_due(due));
    }

    #[test]
    fn test_abandoned_pass_is_flushed() {
        let state = app_state();
        state.session().submit_filter(hide_offtopic(), Instant::now());
        assert_eq!(state.session().snapshot().visible, 2);

        // what a closing connection does with its pending pass
        assert!(state.flush_pending());
        assert!(state.next_due().is_none());
        assert_eq!(state.session().snapshot().visible, 1);
        assert!(!state.flush_pending());
    }
}
