//! HTTP transport.
//!
//! - `POST <path>`: GraphQL requests
//! - `OPTIONS <path>`: CORS preflight
//! - `GET /health`: health check

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, ORIGIN};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use timeql_runtime::{BoundSchema, Executor, Request as GraphQLRequest, RequestError};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

/// The GraphQL HTTP server.
#[derive(Debug, Clone)]
pub struct Server {
    config: Arc<ServerConfig>,
    executor: Executor,
}

impl Server {
    /// Creates a server for a bound schema.
    pub fn new(config: ServerConfig, bound: impl Into<Arc<BoundSchema>>) -> Self {
        Self {
            config: Arc::new(config),
            executor: Executor::new(bound),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, _) = bind(&self.config).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves connections from `listener` until `shutdown` completes.
    ///
    /// Each connection runs on its own task. Once `shutdown` completes no
    /// further connections are accepted.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> ServerResult<()> {
        let local = listener.local_addr().map_err(ServerError::connection)?;
        info!("Listening on http://{}{}", local, self.config.path);

        tokio::pin!(shutdown);
        loop {
            let (stream, peer) = tokio::select! {
                () = &mut shutdown => {
                    info!("Shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        error!("Failed to accept connection: {err}");
                        continue;
                    }
                },
            };

            let server = self.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { Ok::<_, Infallible>(server.handle(req).await) }
                });
                if let Err(err) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    if !err.is_incomplete_message() {
                        error!(%peer, "Connection error: {err:?}");
                    }
                }
            });
        }
    }

    async fn handle(&self, req: Request<Incoming>) -> Response<BoxBody> {
        let (parts, body) = req.into_parts();
        let origin = parts.headers.get(ORIGIN).cloned();
        let path = parts.uri.path();
        debug!(method = %parts.method, path, "request");

        let mut response = match (&parts.method, path) {
            (&Method::POST, p) if p == self.config.path => match Limited::new(
                body,
                self.config.max_body_size,
            )
            .collect()
            .await
            {
                Ok(collected) => self.graphql(&collected.to_bytes()).await,
                Err(err) if err.is::<LengthLimitError>() => json_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &timeql_runtime::Response::from(RequestError::BodyTooLarge(
                        self.config.max_body_size,
                    ))
                    .to_json(),
                ),
                Err(err) => json_response(
                    StatusCode::BAD_REQUEST,
                    &timeql_runtime::Response::from(RequestError::InvalidBody(err.to_string()))
                        .to_json(),
                ),
            },
            (&Method::OPTIONS, p) if p == self.config.path => {
                let mut response = empty(StatusCode::NO_CONTENT);
                self.config
                    .cors
                    .apply_preflight(response.headers_mut(), origin.as_ref());
                return response;
            }
            (_, p) if p == self.config.path => {
                let mut response = json_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    &serde_json::json!({"errors": [{"message": "Method not allowed"}]}),
                );
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
                response
            }
            (&Method::GET, "/health") => {
                json_response(StatusCode::OK, &serde_json::json!({"status": "healthy"}))
            }
            _ => json_response(
                StatusCode::NOT_FOUND,
                &serde_json::json!({"error": "Not Found"}),
            ),
        };

        self.config
            .cors
            .apply(response.headers_mut(), origin.as_ref());
        response
    }

    async fn graphql(&self, body: &[u8]) -> Response<BoxBody> {
        let request = match GraphQLRequest::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                debug!("Rejected request body: {err}");
                return json_response(
                    StatusCode::BAD_REQUEST,
                    &timeql_runtime::Response::from(err).to_json(),
                );
            }
        };
        let response = self.executor.execute(request).await;
        json_response(StatusCode::OK, &response.to_json())
    }
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<BoxBody> {
    let mut response = Response::new(full(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn empty(status: StatusCode) -> Response<BoxBody> {
    let mut response = Response::new(full(Bytes::new()));
    *response.status_mut() = status;
    response
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}

/// Binds `config` and returns the listener with its local address.
pub async fn bind(config: &ServerConfig) -> ServerResult<(TcpListener, SocketAddr)> {
    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|err| ServerError::bind(&address, err))?;
    let local = listener.local_addr().map_err(ServerError::connection)?;
    Ok((listener, local))
}
