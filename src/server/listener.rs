use crate::framework::core::{BridgeConfig, BridgeError, ConfigError, ServerError};
use crate::framework::correlation::CorrelationTable;
use crate::framework::runtime::ScriptRuntime;
use crate::server::dispatcher::Dispatcher;
use crate::server::intake::Responder;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Back-off after a failed accept, e.g. when out of file descriptors
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

struct RunningServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// HTTP listener that bridges requests to the UI runtime.
///
/// `create` and `destroy` are both idempotent. The listener can be started
/// again after it has been destroyed; request ids keep counting up.
pub struct Listener {
    config: Arc<BridgeConfig>,
    table: Arc<CorrelationTable>,
    dispatcher: Arc<Dispatcher>,
    state: Mutex<Option<RunningServer>>,
}

impl Listener {
    pub fn new(config: BridgeConfig, runtime: Arc<dyn ScriptRuntime>) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let table = Arc::new(CorrelationTable::new());
        let dispatcher = Arc::new(Dispatcher::new(table.clone(), runtime, config.clone()));

        Ok(Self {
            config,
            table,
            dispatcher,
            state: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Handle for delivering responses; shares this listener's table
    pub fn responder(&self) -> Responder {
        Responder::new(self.table.clone())
    }

    /// Number of requests currently waiting on the UI runtime
    pub fn pending_requests(&self) -> usize {
        self.table.len()
    }

    /// Start listening if not already running and return the bound address
    pub async fn create(&self) -> Result<String, BridgeError> {
        let mut state = self.state.lock().await;
        if let Some(running) = state.as_ref() {
            return Ok(running.addr.to_string());
        }

        let bind_addr = self.config.bind_addr()?;
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| ServerError::BindError(format!("{}: {}", bind_addr, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(serve(listener, self.dispatcher.clone(), shutdown_rx));

        log::info!("🚀 Loopback listener running on http://{}", addr);
        *state = Some(RunningServer {
            addr,
            shutdown,
            task,
        });
        Ok(addr.to_string())
    }

    /// Stop accepting connections and wait for in-flight requests to finish
    pub async fn destroy(&self) {
        // Release the lock before draining so status queries stay responsive.
        let Some(running) = self.state.lock().await.take() else {
            return;
        };

        let _ = running.shutdown.send(true);
        if let Err(e) = running.task.await {
            log::error!("❌ {}", ServerError::TaskFailed(e.to_string()));
        }
        log::info!("🛑 Loopback listener on {} stopped", running.addr);
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().await.as_ref().map(|running| running.addr)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(running) = self.state.get_mut().take() {
            let _ = running.shutdown.send(true);
        }
    }
}

async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        log::error!("❌ Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };

                let dispatcher = dispatcher.clone();
                let io = TokioIo::new(stream);
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let dispatcher = dispatcher.clone();
                    async move { Ok::<_, Infallible>(dispatcher.dispatch(req).await) }
                });

                let connection = graceful.watch(http1::Builder::new().serve_connection(io, service));
                tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        log::error!("❌ Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
            // Also fires when the listener handle is dropped.
            _ = shutdown.changed() => break,
        }
    }

    drop(listener);
    graceful.shutdown().await;
}
