//! Market update hub connection.
//!
//! Owns the one persistent WebSocket a client instance holds against the
//! notification service. The service routes pushed `onMarketUpdate`
//! events by the client identity sent on the handshake, so the identity
//! must stay stable across reconnects. Transport drops are retried with
//! exponential backoff and are invisible to callers; REST
//! subscribe/unsubscribe failures are surfaced instead.

use crate::api::types::MarketUpdate;
use crate::api::MarketsApi;
use crate::config::HubConfig;
use crate::ws::WsError;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

const RECONNECT_BASE: Duration = Duration::from_secs(2);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);
const PING_INTERVAL: Duration = Duration::from_secs(15);

const USER_ID_HEADER: &str = "X-UserId";
const MARKET_UPDATE_EVENT: &str = "onMarketUpdate";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Events pushed by the notification service.
#[derive(Debug, Clone)]
pub enum HubEvent {
    MarketUpdate(MarketUpdate),
}

/// Handle for removing a registered listener.
pub type ListenerId = u64;

type UpdateListener = Arc<dyn Fn(&MarketUpdate) + Send + Sync>;

/// The subscription client. One persistent connection per instance;
/// `subscribe`/`unsubscribe`/`start`/`stop` may be called concurrently.
pub struct HubClient {
    api: Arc<MarketsApi>,
    ws_url: Option<String>,
    resubscribe_on_reconnect: bool,
    shared: Arc<HubShared>,
    conn: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

struct HubShared {
    state: Mutex<HubState>,
    listeners: Mutex<Vec<(ListenerId, UpdateListener)>>,
    next_listener_id: AtomicU64,
    /// Symbols to replay after a reconnect.
    symbols: Mutex<HashSet<String>>,
}

impl HubShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(HubState::Disconnected),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            symbols: Mutex::new(HashSet::new()),
        }
    }

    fn state(&self) -> HubState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: HubState) {
        *self.state.lock().unwrap() = state;
    }

    /// Invoke every listener, in registration order, outside the registry
    /// lock so a listener may register or remove listeners itself.
    fn dispatch(&self, update: &MarketUpdate) {
        let listeners: Vec<UpdateListener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        debug!(
            symbol = %update.symbol,
            listeners = listeners.len(),
            "dispatching market update"
        );
        for listener in listeners {
            listener(update);
        }
    }

    fn handle_frame(&self, text: &str) -> Result<(), WsError> {
        if let Some(HubEvent::MarketUpdate(update)) = parse_event(text)? {
            self.dispatch(&update);
        }
        Ok(())
    }
}

impl HubClient {
    pub fn new(api: Arc<MarketsApi>, config: &HubConfig) -> Self {
        Self {
            api,
            ws_url: config.ws_url.clone(),
            resubscribe_on_reconnect: config.resubscribe_on_reconnect,
            shared: Arc::new(HubShared::new()),
            conn: tokio::sync::Mutex::new(None),
        }
    }

    /// The identity the server routes pushes by. Same as the REST client's
    /// `X-UserId`.
    pub fn client_id(&self) -> &str {
        self.api.client_id()
    }

    pub fn state(&self) -> HubState {
        self.shared.state()
    }

    /// Symbols currently registered for reconnect replay.
    pub fn subscriptions(&self) -> Vec<String> {
        self.shared.symbols.lock().unwrap().iter().cloned().collect()
    }

    /// Establish the persistent connection. Idempotent: if a connection
    /// task is already live (connected or auto-reconnecting) this returns
    /// immediately, and concurrent callers are serialized so only one
    /// connection is ever established.
    pub async fn start(&self) -> Result<(), WsError> {
        let mut conn = self.conn.lock().await;
        if let Some(task) = conn.as_ref() {
            if !task.is_finished() {
                return Ok(());
            }
        }

        self.shared.set_state(HubState::Connecting);
        let ws_url = self.websocket_url()?;
        let stream = match connect(&ws_url, self.api.client_id()).await {
            Ok(stream) => stream,
            Err(e) => {
                self.shared.set_state(HubState::Disconnected);
                return Err(e);
            }
        };

        info!(url = %ws_url, client_id = %self.api.client_id(), "hub connected");
        self.shared.set_state(HubState::Connected);
        *conn = Some(tokio::spawn(run_hub_connection(
            stream,
            ws_url,
            self.api.clone(),
            self.shared.clone(),
            self.resubscribe_on_reconnect,
        )));
        Ok(())
    }

    /// Release the connection. Idempotent.
    pub async fn stop(&self) {
        let mut conn = self.conn.lock().await;
        if let Some(task) = conn.take() {
            task.abort();
            info!("hub connection stopped");
        }
        self.shared.set_state(HubState::Disconnected);
    }

    /// Register this client for pushed updates of a symbol. Ensures the
    /// connection is up first. The server deduplicates repeated
    /// subscriptions for the same identity.
    pub async fn subscribe(&self, symbol: &str) -> Result<(), WsError> {
        self.start().await?;
        self.api.subscribe(symbol).await?;
        self.shared
            .symbols
            .lock()
            .unwrap()
            .insert(symbol.to_string());
        Ok(())
    }

    /// Stop new pushes for a symbol. Events already in flight may still be
    /// delivered.
    pub async fn unsubscribe(&self, symbol: &str) -> Result<(), WsError> {
        self.api.unsubscribe(symbol).await?;
        self.shared.symbols.lock().unwrap().remove(symbol);
        Ok(())
    }

    /// Register a listener for `onMarketUpdate` events. Listeners run on
    /// the delivery task in registration order, once per inbound event;
    /// a blocking listener stalls delivery of subsequent events.
    pub fn on_market_update(
        &self,
        listener: impl Fn(&MarketUpdate) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.shared.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .listeners
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.shared.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    fn websocket_url(&self) -> Result<String, WsError> {
        match &self.ws_url {
            Some(url) => Ok(url.clone()),
            None => derive_ws_url(self.api.base_url()),
        }
    }
}

/// The notification service upgrades WebSocket connections on the same
/// path as the REST API, so the push URL is the base URL with the scheme
/// swapped.
fn derive_ws_url(base: &str) -> Result<String, WsError> {
    let mut url = url::Url::parse(base)?;
    match url.scheme() {
        "https" => {
            let _ = url.set_scheme("wss");
        }
        "http" => {
            let _ = url.set_scheme("ws");
        }
        _ => {}
    }
    Ok(url.to_string())
}

async fn connect(ws_url: &str, client_id: &str) -> Result<WsStream, WsError> {
    let mut request = ws_url.into_client_request()?;
    let value: HeaderValue = client_id
        .parse()
        .map_err(|_| WsError::Header(USER_ID_HEADER))?;
    request.headers_mut().insert(USER_ID_HEADER, value);
    let (stream, _response) = connect_async(request).await?;
    Ok(stream)
}

async fn run_hub_connection(
    first: WsStream,
    ws_url: String,
    api: Arc<MarketsApi>,
    shared: Arc<HubShared>,
    resubscribe: bool,
) {
    let mut stream = Some(first);
    let mut backoff = RECONNECT_BASE;

    loop {
        let ws = match stream.take() {
            Some(ws) => ws,
            None => {
                shared.set_state(HubState::Reconnecting);
                info!(delay = ?backoff, "reconnecting to hub");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_RECONNECT_DELAY);

                match connect(&ws_url, api.client_id()).await {
                    Ok(ws) => {
                        shared.set_state(HubState::Connected);
                        backoff = RECONNECT_BASE;
                        info!("hub reconnected");
                        if resubscribe {
                            replay_subscriptions(&api, &shared).await;
                        }
                        ws
                    }
                    Err(e) => {
                        warn!(error = %e, "hub reconnect failed");
                        continue;
                    }
                }
            }
        };

        match stream_events(ws, &shared).await {
            Ok(()) => info!("hub connection closed"),
            Err(e) => error!(error = %e, "hub connection error"),
        }
    }
}

/// Re-register every tracked symbol after a resumed connection. Failures
/// are logged, not fatal; the next explicit subscribe call surfaces them.
async fn replay_subscriptions(api: &MarketsApi, shared: &HubShared) {
    let symbols: Vec<String> = shared.symbols.lock().unwrap().iter().cloned().collect();
    for symbol in symbols {
        if let Err(e) = api.subscribe(&symbol).await {
            warn!(symbol = %symbol, error = %e, "failed to replay subscription");
        }
    }
}

async fn stream_events(ws: WsStream, shared: &HubShared) -> Result<(), WsError> {
    let (write, mut read) = ws.split();

    // Keepalive ping task owns the write half for this connection.
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let mut ping_interval = interval(PING_INTERVAL);
    let ping_handle = tokio::spawn({
        let mut write = write;
        async move {
            loop {
                tokio::select! {
                    _ = ping_interval.tick() => {
                        if let Err(e) = write.send(Message::Ping(Vec::new())).await {
                            warn!(error = %e, "failed to send hub ping");
                            break;
                        }
                    }
                    _ = stop_rx.recv() => break,
                }
            }
        }
    });

    let result = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Err(e) = shared.handle_frame(&text) {
                    warn!(error = %e, "failed to process hub message");
                }
            }
            Some(Ok(Message::Pong(_))) => debug!("hub pong received"),
            Some(Ok(Message::Close(frame))) => {
                info!(frame = ?frame, "hub received close frame");
                break Ok(());
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => break Err(WsError::Connection(e)),
            None => break Ok(()),
        }
    };

    let _ = stop_tx.send(()).await;
    let _ = ping_handle.await;
    result
}

/// Parse one inbound frame. Unknown events are dropped after a debug log;
/// malformed JSON is an error the read loop reports.
fn parse_event(text: &str) -> Result<Option<HubEvent>, WsError> {
    let value: Value = serde_json::from_str(text)?;
    let event = value.get("event").and_then(|v| v.as_str()).unwrap_or("");

    match event {
        MARKET_UPDATE_EVENT => {
            let data = value.get("data").cloned().unwrap_or(Value::Null);
            let update: MarketUpdate = serde_json::from_value(data)?;
            Ok(Some(HubEvent::MarketUpdate(update)))
        }
        other => {
            debug!(event = other, "unhandled hub event");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_client() -> HubClient {
        let api = Arc::new(MarketsApi::new(
            "http://localhost:7071/api/localterra",
            None,
        ));
        HubClient::new(api, &HubConfig::default())
    }

    fn update_frame(symbol: &str, price: &str) -> String {
        json!({
            "event": "onMarketUpdate",
            "data": {
                "symbol": symbol,
                "last_price": price,
                "status": "closed",
                "update_date": "2021-09-01T12:00:00Z"
            }
        })
        .to_string()
    }

    #[test]
    fn parses_market_update_event() {
        let event = parse_event(&update_frame("btcusd", "10.10")).unwrap();
        match event {
            Some(HubEvent::MarketUpdate(update)) => {
                assert_eq!(update.symbol, "btcusd");
                assert_eq!(update.last_price.as_deref(), Some("10.10"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn drops_unknown_events() {
        let frame = json!({"event": "onHeartbeat", "data": {}}).to_string();
        assert!(parse_event(&frame).unwrap().is_none());
    }

    #[test]
    fn malformed_frame_is_an_error() {
        assert!(parse_event("not json").is_err());
    }

    #[test]
    fn listeners_fire_in_registration_order_exactly_once() {
        let hub = test_client();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let calls = calls.clone();
            hub.on_market_update(move |update| {
                calls
                    .lock()
                    .unwrap()
                    .push((tag, update.last_price.clone()));
            });
        }

        hub.shared.handle_frame(&update_frame("btcusd", "10.10")).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, "first");
        assert_eq!(calls[1].0, "second");
        assert_eq!(calls[2].0, "third");
        assert!(calls.iter().all(|(_, price)| price.as_deref() == Some("10.10")));
    }

    #[test]
    fn removed_listener_receives_nothing() {
        let hub = test_client();
        let calls = Arc::new(Mutex::new(0u32));

        let calls_in_listener = calls.clone();
        let id = hub.on_market_update(move |_| {
            *calls_in_listener.lock().unwrap() += 1;
        });

        hub.shared.handle_frame(&update_frame("btcusd", "1.00")).unwrap();
        assert!(hub.remove_listener(id));
        hub.shared.handle_frame(&update_frame("btcusd", "2.00")).unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        // Second removal is a no-op.
        assert!(!hub.remove_listener(id));
    }

    #[test]
    fn derives_ws_url_from_rest_base() {
        assert_eq!(
            derive_ws_url("https://api.updownmarkets.io/mainnet").unwrap(),
            "wss://api.updownmarkets.io/mainnet"
        );
        assert_eq!(
            derive_ws_url("http://localhost:7071/api/localterra").unwrap(),
            "ws://localhost:7071/api/localterra"
        );
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let hub = test_client();
        assert_eq!(hub.state(), HubState::Disconnected);
        hub.stop().await;
        hub.stop().await;
        assert_eq!(hub.state(), HubState::Disconnected);
    }

    #[test]
    fn subscription_bookkeeping() {
        let hub = test_client();
        hub.shared.symbols.lock().unwrap().insert("btcusd".to_string());
        hub.shared.symbols.lock().unwrap().insert("btcusd".to_string());
        assert_eq!(hub.subscriptions(), vec!["btcusd".to_string()]);
    }
}
