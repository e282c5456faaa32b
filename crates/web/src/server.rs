//! Listener, accept loop and lifecycle.
//!
//! ```no_run
//! use bare_web::{Router, Server, ServerConfig, make_static_handler};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let router = Router::builder().mount("", make_static_handler("./public")).build();
//! let server = Server::builder().config(ServerConfig::default()).router(router).build()?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bare_http::handler::Handler;
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::select;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::pool::{self, Accepted, WorkerPool};
use crate::router::Router;

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,

    #[error("invalid server config: {reason}")]
    InvalidConfig { reason: String },
}

impl ServerBuildError {
    pub fn invalid_config<S: ToString>(reason: S) -> Self {
        Self::InvalidConfig { reason: reason.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("can't resolve {address}: {source}")]
    Resolve { address: String, source: io::Error },

    #[error("{address} resolved to no socket address")]
    NoAddress { address: String },

    #[error("can't listen on {address}: {source}")]
    Bind { address: SocketAddr, source: io::Error },
}

pub struct ServerBuilder {
    config: ServerConfig,
    handler: Option<Arc<dyn Handler>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { config: ServerConfig::default(), handler: None }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.config.worker_count = worker_count;
        self
    }

    pub fn router(self, router: Router) -> Self {
        self.handler(router)
    }

    /// Serves every connection with `handler` instead of a [`Router`].
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let handler = self.handler.ok_or(ServerBuildError::MissingRouter)?;
        self.config.validate()?;
        Ok(Server { config: self.config, handler })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder").field("config", &self.config).field("has_handler", &self.handler.is_some()).finish()
    }
}

/// A configured server, not yet listening.
pub struct Server {
    config: ServerConfig,
    handler: Arc<dyn Handler>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds `host:port` with address reuse and a backlog equal to the queue capacity.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let resolved = match tokio::net::lookup_host(address.as_str()).await {
            Ok(mut addrs) => addrs.next(),
            Err(source) => return Err(ServerError::Resolve { address: address.clone(), source }),
        };
        let socket_addr = resolved.ok_or(ServerError::NoAddress { address })?;

        let listener = listen(socket_addr, self.config.queue_capacity())
            .map_err(|source| ServerError::Bind { address: socket_addr, source })?;

        Ok(BoundServer { listener, config: self.config, handler: self.handler })
    }

    /// Binds and serves until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.run().await;
        Ok(())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server").field("config", &self.config).finish_non_exhaustive()
    }
}

fn listen(addr: SocketAddr, backlog: usize) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let backlog = u32::try_from(backlog).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    socket.listen(backlog)
}

/// A server whose listener is open.
pub struct BoundServer {
    listener: TcpListener,
    config: ServerConfig,
    handler: Arc<dyn Handler>,
}

impl BoundServer {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(cause = %e, "can't listen for ctrl-c, serving until the process is killed");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Serves until `shutdown` completes, then stops accepting and winds
    /// the workers down.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self { listener, config, handler } = self;
        let capacity = config.queue_capacity();

        let (sender, receiver) = pool::bounded(capacity);
        let pool = WorkerPool::spawn(config.worker_count, receiver, handler, config.poll_interval());

        match listener.local_addr() {
            Ok(addr) => info!(address = %addr, workers = config.worker_count, capacity, "start listening"),
            Err(e) => warn!(cause = %e, "listening on an unknown address"),
        }

        tokio::pin!(shutdown);
        loop {
            let accepted = select! {
                biased;
                () = &mut shutdown => break,
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => Accepted { stream, remote_addr },
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            debug!(remote_addr = %accepted.remote_addr, free_slots = sender.remaining_capacity(), "accepted connection");

            select! {
                biased;
                () = &mut shutdown => break,
                result = sender.push(accepted) => {
                    if let Err(rejected) = result {
                        error!(remote_addr = %rejected.remote_addr, "every worker is gone, dropping connection");
                        break;
                    }
                }
            }
        }

        info!("shutdown requested, stop accepting");
        drop(listener);
        drop(sender);

        let abandoned = pool.shutdown(config.shutdown_timeout()).await;
        if abandoned > 0 {
            warn!(abandoned, "some workers did not finish in time");
        }
        info!("server stopped");
    }
}

impl std::fmt::Debug for BoundServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundServer").field("listener", &self.listener).field("config", &self.config).finish_non_exhaustive()
    }
}
