use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use std::{future::Future, io, net::SocketAddr, sync::Arc};

use crate::http::codec::ConnectionCodec;
use crate::http::{Request, Response};
use futures_util::{SinkExt, StreamExt};
use http::header::USER_AGENT;
use http::{header::CONNECTION, HeaderValue};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::OwnedSemaphorePermit;
use tokio::{net::TcpStream, sync::Semaphore};
use tokio_util::codec::Decoder;

type Handler<A, F> = fn(Request, A) -> F;

pub struct Server<A, F> {
    state: A,
    handler: Handler<A, F>,
    semaphore: Arc<Semaphore>,
    permits: usize,
    timeout: Duration,
}

impl<S, F> Server<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    pub fn new(state: S, handler: Handler<S, F>, permits: usize, timeout: Duration) -> Self {
        Self {
            state,
            handler,
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
            timeout,
        }
    }

    pub async fn bind<A: ToSocketAddrs>(self, addr: A) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!(target: "listener", ?addr, "server is running");

        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        let server = Arc::new(self);
        let active = Arc::new(AtomicUsize::new(0));

        let mut now = Instant::now();
        let mut connections = 0usize;

        loop {
            let (socket, addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(err) => {
                    tracing::warn!(target: "listener", %err, "failed to accept connection");
                    continue;
                }
            };
            let permit = server.acquire_permit().await;

            connections += 1;
            if now.elapsed() > Duration::from_secs(1) {
                tracing::debug!(
                    target: "listener",
                    "{connections}/s with {} tasks running",
                    active.load(Ordering::Relaxed)
                );
                now = Instant::now();
                connections = 0;
            }

            let server = Arc::clone(&server);
            let active = Arc::clone(&active);
            tokio::spawn(async move {
                active.fetch_add(1, Ordering::Relaxed);
                let timeout = server.timeout;
                if tokio::time::timeout(timeout, server.handle_request(socket, addr, permit))
                    .await
                    .is_err()
                {
                    tracing::warn!(%addr, ?timeout, "connection timed out");
                }
                active.fetch_sub(1, Ordering::Relaxed);
            });
        }
    }

    #[tracing::instrument(skip(self, socket, permit))]
    async fn handle_request(
        self: Arc<Self>,
        socket: TcpStream,
        addr: SocketAddr,
        permit: OwnedSemaphorePermit,
    ) {
        let mut codec = ConnectionCodec::default().framed(socket);
        let req = match codec.next().await.transpose() {
            Ok(Some(req)) => {
                tracing::debug!(?req, "received request");
                req
            }
            Ok(None) => {
                tracing::debug!("connection ended before request");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to read request");
                return;
            }
        };

        let user = req.headers().get(USER_AGENT).unwrap_or_else(|| {
            static UNKNOWN_AGENT: HeaderValue = HeaderValue::from_static("Unknown");
            &UNKNOWN_AGENT
        });

        let path = req.uri().to_string();
        tracing::info!(
            target: "requests",
            method = %req.method(),
            %path,
            ?user,
            r#""{} {path}" by {user:?}"#, req.method()
        );

        let now = Instant::now();
        let mut resp = (self.handler)(req, self.state.clone()).await;
        tracing::debug!(status = %resp.status(), "handled in {:?}, sending response", now.elapsed());

        const CLOSE: HeaderValue = HeaderValue::from_static("close");
        resp.headers_mut().append(CONNECTION, CLOSE);

        drop(permit);

        if let Err(err) = codec.send(resp).await {
            tracing::warn!(%err, "failed to send response");
        }
    }

    async fn acquire_permit(&self) -> OwnedSemaphorePermit {
        loop {
            if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
                break permit;
            }

            let mut factor = 1;
            loop {
                const BACKOFF: Duration = Duration::from_millis(50);
                tokio::time::sleep(factor * BACKOFF).await;
                factor = (factor * 2).min(16);
                let available_permits = self.semaphore.available_permits();
                if available_permits >= (self.permits / 100).max(1) {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::http::IntoResponse;

    use super::*;

    async fn echo_path(request: Request, prefix: &'static str) -> Response {
        (StatusCode::OK, format!("{prefix}{}", request.uri().path())).into_response()
    }

    #[tokio::test]
    async fn serves_one_request_per_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::new("path=", echo_path, 4, Duration::from_secs(5));
        tokio::spawn(server.serve(listener));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /contacts HTTP/1.1\r\nHost: test\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("connection: close\r\n"));
        assert!(response.ends_with("path=/contacts"));
    }
}
