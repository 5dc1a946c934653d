//! TCP accept loop feeding the router.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::{Request, Response};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use tokio::net::TcpListener;

use crate::router::Router;

/// Serves the router over plain TCP, one task per connection.
///
/// Connections speak HTTP/1.1 or HTTP/2, whichever the client opens with.
pub struct Server {
    addr: SocketAddr,
    router: Arc<Router>,
}

impl Server {
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self {
            addr,
            router: Arc::new(router),
        }
    }

    /// Binds `addr` and serves until the accept loop fails or the task is
    /// aborted.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener).await
    }

    /// Serves on a listener the caller already bound, e.g. to port 0 in tests.
    ///
    /// A failed connection is logged at debug level and does not stop the
    /// loop; only an `accept` error returns.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), std::io::Error> {
        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        loop {
            let (stream, peer) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = Arc::clone(&self.router);

            tokio::task::spawn(async move {
                let builder = ConnectionBuilder::new(TokioExecutor::new());
                let service =
                    hyper::service::service_fn(move |req| handle_request(req, router.clone()));
                if let Err(err) = builder.serve_connection(io, service).await {
                    tracing::debug!("Connection from {} closed with error: {}", peer, err);
                }
            });
        }
    }
}

/// `Router::respond` turns every failure into an error response, so the
/// service itself cannot fail.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(router.respond(req).await.map(Full::new))
}
