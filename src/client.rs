//! Client facade and runtime loop.
//!
//! [`GbxClient`] manages the connection lifecycle:
//! 1. Open TCP (with configurable retries)
//! 2. Verify the `GBXRemote 2` banner under the handshake deadline
//! 3. Spawn the receive loop on the read half
//! 4. Route frames to pending calls or callback subscribers
//!
//! `call` is safe to invoke from any number of tasks at once: each call
//! holds the write mutex only for the duration of one frame write, and
//! responses are correlated by handle rather than arrival order.
//!
//! # Example
//!
//! ```ignore
//! use gbxremote::{GbxClient, Value};
//!
//! #[tokio::main]
//! async fn main() -> gbxremote::Result<()> {
//!     let client = GbxClient::new();
//!     client.subscribe_callback(|call| async move {
//!         println!("callback: {}", call.name);
//!         Ok(())
//!     });
//!     client.connect("127.0.0.1", 5000).await?;
//!     let methods = client.call("system.listMethods", vec![]).await?;
//!     println!("{methods:?}");
//!     client.disconnect().await
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::codec::{MethodCall, MethodResponse, Value};
use crate::error::{GbxError, Result};
use crate::handle::HandleAllocator;
use crate::pending::PendingCalls;
use crate::protocol::{read_banner, read_frame, write_frame, DEFAULT_MAX_BODY_SIZE, PROTOCOL_NAME};

/// Connection lifecycle states. Only `Connected` accepts new calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No connection.
    Disconnected,
    /// TCP establishment in progress.
    Connecting,
    /// Banner exchange in progress.
    Handshaking,
    /// Fully established; calls are accepted.
    Connected,
    /// Teardown in progress.
    Disconnecting,
}

/// Client configuration with documented defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum accepted frame body size. Default: 4 MiB.
    pub max_body_size: u32,
    /// Deadline for the banner handshake. Default: 1 second.
    pub handshake_timeout: Duration,
    /// Additional TCP connect attempts after the first failure.
    /// Default: 0.
    pub connect_retries: u32,
    /// Pause between connect attempts. Default: 1 second.
    pub retry_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            handshake_timeout: Duration::from_secs(1),
            connect_retries: 0,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

type BoxFut<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
type CallbackHandler = Arc<dyn Fn(Arc<MethodCall>) -> BoxFut<Result<()>> + Send + Sync>;
type LifecycleHandler = Arc<dyn Fn() -> BoxFut<()> + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    callbacks: StdMutex<Vec<CallbackHandler>>,
    connected: StdMutex<Vec<LifecycleHandler>>,
    disconnected: StdMutex<Vec<LifecycleHandler>>,
}

/// Asynchronous GBXRemote 2 client.
///
/// Cheaply cloneable; clones share the same connection.
#[derive(Clone)]
pub struct GbxClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    state: StdMutex<State>,
    handles: HandleAllocator,
    pending: PendingCalls,
    writer: AsyncMutex<Option<OwnedWriteHalf>>,
    shutdown: StdMutex<Option<oneshot::Sender<()>>>,
    reader_task: StdMutex<Option<JoinHandle<()>>>,
    subscribers: Subscribers,
}

impl GbxClient {
    /// Create a disconnected client with default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a disconnected client with the given configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                state: StdMutex::new(State::Disconnected),
                handles: HandleAllocator::new(),
                pending: PendingCalls::new(),
                writer: AsyncMutex::new(None),
                shutdown: StdMutex::new(None),
                reader_task: StdMutex::new(None),
                subscribers: Subscribers::default(),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        *self.inner.state.lock().unwrap()
    }

    /// Whether the client currently accepts calls.
    pub fn is_connected(&self) -> bool {
        self.state() == State::Connected
    }

    /// Register a handler for server-initiated callbacks.
    ///
    /// Handlers run on a detached task in registration order, with the
    /// decoded call shared by reference. A failing handler is logged
    /// and never disturbs the connection.
    pub fn subscribe_callback<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<MethodCall>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: CallbackHandler =
            Arc::new(move |call| -> BoxFut<Result<()>> { Box::pin(handler(call)) });
        self.inner.subscribers.callbacks.lock().unwrap().push(handler);
    }

    /// Register a handler fired once per successful `connect`.
    pub fn subscribe_connected<F, Fut>(&self, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: LifecycleHandler = Arc::new(move || -> BoxFut<()> { Box::pin(handler()) });
        self.inner.subscribers.connected.lock().unwrap().push(handler);
    }

    /// Register a handler fired exactly once per connection teardown.
    pub fn subscribe_disconnected<F, Fut>(&self, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: LifecycleHandler = Arc::new(move || -> BoxFut<()> { Box::pin(handler()) });
        self.inner
            .subscribers
            .disconnected
            .lock()
            .unwrap()
            .push(handler);
    }

    /// Connect to a GBXRemote server and start the receive loop.
    ///
    /// TCP establishment is retried `connect_retries` times with
    /// `retry_backoff` in between. The banner handshake runs under
    /// `handshake_timeout`; on a banner mismatch the socket is closed
    /// before [`GbxError::InvalidProtocol`] is returned. Fires the
    /// `connected` event on success.
    pub async fn connect(&self, host: &str, port: u16) -> Result<()> {
        {
            let mut state = self.inner.state.lock().unwrap();
            if *state != State::Disconnected {
                return Err(GbxError::AlreadyConnected);
            }
            *state = State::Connecting;
        }

        let stream = match self.connect_tcp(host, port).await {
            Ok(stream) => stream,
            Err(e) => {
                self.set_state(State::Disconnected);
                return Err(e);
            }
        };
        let _ = stream.set_nodelay(true);

        self.set_state(State::Handshaking);
        let (mut read_half, write_half) = stream.into_split();

        let banner =
            match tokio::time::timeout(self.inner.config.handshake_timeout, read_banner(&mut read_half))
                .await
            {
                Ok(Ok(banner)) => banner,
                Ok(Err(e)) => {
                    self.set_state(State::Disconnected);
                    return Err(e);
                }
                Err(_) => {
                    self.set_state(State::Disconnected);
                    return Err(GbxError::Timeout);
                }
            };

        if banner != PROTOCOL_NAME {
            // Both halves drop here, closing the socket before the
            // error is surfaced.
            self.set_state(State::Disconnected);
            return Err(GbxError::InvalidProtocol(banner));
        }

        *self.inner.writer.lock().await = Some(write_half);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *self.inner.shutdown.lock().unwrap() = Some(shutdown_tx);

        self.set_state(State::Connected);
        tracing::debug!(host, port, "connected");

        let inner = self.inner.clone();
        let task = tokio::spawn(receive_loop(inner, read_half, shutdown_rx));
        *self.inner.reader_task.lock().unwrap() = Some(task);

        self.inner.fire_lifecycle(&self.inner.subscribers.connected);
        Ok(())
    }

    async fn connect_tcp(&self, host: &str, port: u16) -> Result<TcpStream> {
        let mut attempt = 0u32;
        loop {
            match TcpStream::connect((host, port)).await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < self.inner.config.connect_retries => {
                    attempt += 1;
                    tracing::warn!(host, port, attempt, error = %e, "connect failed, retrying");
                    tokio::time::sleep(self.inner.config.retry_backoff).await;
                }
                Err(e) => return Err(GbxError::Io(e)),
            }
        }
    }

    /// Disconnect and await receive-loop exit.
    ///
    /// Idempotent: a second `disconnect`, or a `disconnect` while not
    /// connected, is a no-op.
    pub async fn disconnect(&self) -> Result<()> {
        let shutdown = self.inner.shutdown.lock().unwrap().take();
        let task = self.inner.reader_task.lock().unwrap().take();

        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }
        if let Some(task) = task {
            // Teardown (pending fan-out, disconnected event) runs in
            // the loop task before it exits.
            let _ = task.await;
        }
        Ok(())
    }

    /// Invoke a remote method and await its result.
    ///
    /// A well-formed fault response surfaces as [`GbxError::Fault`];
    /// the connection stays up. No built-in timeout: wrap the future in
    /// `tokio::time::timeout` if a deadline is needed. Dropping the
    /// returned future cancels the call and releases its handle.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        if !self.is_connected() {
            return Err(GbxError::NotConnected);
        }

        let body = MethodCall::new(method, params).to_xml();

        // Register only once the writer is confirmed present, so a call
        // racing teardown is rejected before it ever owns a slot. Slots
        // registered here are always drained: teardown takes the writer
        // first, then fails the pending table.
        let pending = {
            let mut writer = self.inner.writer.lock().await;
            let Some(writer) = writer.as_mut() else {
                return Err(GbxError::NotConnected);
            };

            // The allocator wraps long before 2^31 calls are in flight,
            // so a collision only means the counter lapped a very old
            // pending entry; allocate again.
            let pending = loop {
                let handle = self.inner.handles.next();
                match self.inner.pending.register(handle) {
                    Ok(pending) => break pending,
                    Err(GbxError::DuplicateHandle(handle)) => {
                        tracing::debug!(
                            handle = format_args!("{handle:#010x}"),
                            "handle collision, re-allocating"
                        );
                    }
                    Err(e) => return Err(e),
                }
            };

            write_frame(writer, pending.handle(), body.as_bytes()).await?;
            pending
        };

        let payload = pending.wait().await?;
        match MethodResponse::from_xml(&payload)? {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault { code, message } => Err(GbxError::Fault { code, message }),
        }
    }

    fn set_state(&self, state: State) {
        *self.inner.state.lock().unwrap() = state;
    }
}

impl Default for GbxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientInner {
    /// Dispatch a decoded callback to subscribers on a detached task,
    /// in registration order. The receive loop never awaits handlers.
    fn dispatch_callback(&self, call: MethodCall) {
        let handlers: Vec<CallbackHandler> = self.subscribers.callbacks.lock().unwrap().clone();
        if handlers.is_empty() {
            tracing::debug!(method = %call.name, "callback without subscribers dropped");
            return;
        }
        let call = Arc::new(call);
        tokio::spawn(async move {
            for handler in handlers {
                if let Err(e) = handler(call.clone()).await {
                    tracing::error!(method = %call.name, error = %e, "callback handler failed");
                }
            }
        });
    }

    fn fire_lifecycle(&self, list: &StdMutex<Vec<LifecycleHandler>>) {
        let handlers: Vec<LifecycleHandler> = list.lock().unwrap().clone();
        if handlers.is_empty() {
            return;
        }
        tokio::spawn(async move {
            for handler in handlers {
                handler().await;
            }
        });
    }

    /// Connection teardown; runs exactly once per connection, in the
    /// receive-loop task.
    async fn teardown(&self, error: Option<GbxError>) {
        {
            let mut state = self.state.lock().unwrap();
            if matches!(*state, State::Disconnected | State::Disconnecting) {
                return;
            }
            *state = State::Disconnecting;
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            use tokio::io::AsyncWriteExt;
            let _ = writer.shutdown().await;
        }

        let error = error.unwrap_or(GbxError::Closed);
        self.pending.fail_all(|| error.replicate());

        *self.state.lock().unwrap() = State::Disconnected;
        tracing::debug!("disconnected");
        self.fire_lifecycle(&self.subscribers.disconnected);
    }
}

/// The receive loop: owns the read half, routes every frame to exactly
/// one pending slot or to the callback dispatcher, and triggers the
/// disconnect path on exit.
async fn receive_loop(
    inner: Arc<ClientInner>,
    mut reader: OwnedReadHalf,
    mut shutdown: oneshot::Receiver<()>,
) {
    let exit_error = loop {
        tokio::select! {
            _ = &mut shutdown => break None,
            frame = read_frame(&mut reader, inner.config.max_body_size) => match frame {
                Ok(frame) => {
                    if frame.is_callback() {
                        // Callbacks are decoded here; response bodies are
                        // parsed on the caller's side so the loop never
                        // stalls on large payloads it did not ask for.
                        match MethodCall::from_xml(&frame.body) {
                            Ok(call) => inner.dispatch_callback(call),
                            Err(e) => tracing::warn!(
                                handle = format_args!("{:#010x}", frame.handle),
                                error = %e,
                                "undecodable callback dropped"
                            ),
                        }
                    } else {
                        inner.pending.complete(frame.handle, frame.body);
                    }
                }
                Err(e) => break Some(e),
            }
        }
    };

    match &exit_error {
        None => tracing::debug!("receive loop stopped by disconnect"),
        Some(GbxError::Closed) => tracing::debug!("server closed the connection"),
        Some(e) => tracing::warn!(error = %e, "receive loop terminated"),
    }

    inner.teardown(exit_error).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_body_size, 4 * 1024 * 1024);
        assert_eq!(config.handshake_timeout, Duration::from_secs(1));
        assert_eq!(config.connect_retries, 0);
        assert_eq!(config.retry_backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = GbxClient::new();
        assert_eq!(client.state(), State::Disconnected);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_call_while_disconnected() {
        let client = GbxClient::new();
        let err = client.call("system.listMethods", vec![]).await.unwrap_err();
        assert!(matches!(err, GbxError::NotConnected));
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_noop() {
        let client = GbxClient::new();
        client.disconnect().await.unwrap();
        client.disconnect().await.unwrap();
        assert_eq!(client.state(), State::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_refused_without_retries() {
        let client = GbxClient::new();
        // Port 1 on localhost is reliably closed.
        let err = client.connect("127.0.0.1", 1).await.unwrap_err();
        assert!(matches!(err, GbxError::Io(_)));
        assert_eq!(client.state(), State::Disconnected);
    }

    #[test]
    fn test_subscribers_keep_registration_order() {
        let client = GbxClient::new();
        client.subscribe_callback(|_| async { Ok(()) });
        client.subscribe_callback(|_| async { Ok(()) });
        client.subscribe_connected(|| async {});
        assert_eq!(
            client.inner.subscribers.callbacks.lock().unwrap().len(),
            2
        );
        assert_eq!(client.inner.subscribers.connected.lock().unwrap().len(), 1);
    }
}
