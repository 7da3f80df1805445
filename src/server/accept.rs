use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tokio::task::{self, JoinError, JoinSet};
use tokio::time;

use super::server::ServerConfig;
use super::shutdown::wait_for_ctrl_c;
use crate::app::{App, Hooks};
use crate::error::{BoxError, Error};
use crate::request::Request;
use crate::response::Response;

type TaskResult = Result<(), BoxError>;

pub(super) async fn accept<S: Hooks>(
    listener: TcpListener,
    app: Arc<App<S>>,
    config: ServerConfig,
) -> ExitCode {
    // Bounds the number of connections served concurrently.
    let semaphore = Arc::new(Semaphore::new(config.max_connections));

    // Inflight connections. Drained before the server exits.
    let mut connections: JoinSet<TaskResult> = JoinSet::new();

    let mut shutdown_rx = {
        let (tx, rx) = watch::channel(None);
        tokio::spawn(wait_for_ctrl_c(tx));
        rx
    };

    let exit_code = 'accept: loop {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(acquired) => acquired,
            Err(_) => break ExitCode::FAILURE,
        };

        let (stream, remote_addr) = {
            let mut will_join_next = !connections.is_empty();
            let accepted = loop {
                tokio::select! {
                    biased;

                    joined = connections.join_next(), if will_join_next => {
                        if let Some(result) = joined {
                            handle_joined(&result);
                        }

                        will_join_next = false;
                        continue;
                    }

                    result = listener.accept() => {
                        break result;
                    }

                    Ok(()) = shutdown_rx.changed() => {
                        break 'accept match *shutdown_rx.borrow_and_update() {
                            Some(false) => ExitCode::SUCCESS,
                            Some(true) | None => ExitCode::FAILURE,
                        }
                    }
                };
            };

            match accepted {
                Ok(accepted) => accepted,
                Err(error) => {
                    drop(permit);
                    tracing::warn!("unable to accept connection: {}", error);
                    continue;
                }
            }
        };

        connections.spawn({
            let app = Arc::clone(&app);
            let mut shutdown_rx = shutdown_rx.clone();
            let max_body_size = config.max_body_size;

            async move {
                let service = service_fn(move |request| {
                    serve_request(Arc::clone(&app), request, remote_addr, max_body_size)
                });

                let connection = http1::Builder::new()
                    .timer(TokioTimer::new())
                    .serve_connection(TokioIo::new(stream), service);

                tokio::pin!(connection);

                let result = tokio::select! {
                    served = &mut connection => served.map_err(|e| e.into()),
                    _ = shutdown_rx.changed() => {
                        connection.as_mut().graceful_shutdown();
                        connection.await.map_err(|e| e.into())
                    }
                };

                drop(permit);
                result
            }
        });

        if let Some(result) = connections.try_join_next() {
            handle_joined(&result);
        }
    };

    tracing::info!("draining {} inflight connections", connections.len());

    let drained = time::timeout(config.shutdown_timeout, async {
        while let Some(result) = connections.join_next().await {
            handle_joined(&result);
        }
    });

    if drained.await.is_ok() {
        exit_code
    } else {
        tracing::warn!("shutdown timed out with inflight connections");
        ExitCode::FAILURE
    }
}

/// Reads the body of `request`, runs it through the application on the
/// blocking pool, and converts the response for hyper.
///
async fn serve_request<S: Hooks>(
    app: Arc<App<S>>,
    request: http::Request<Incoming>,
    remote_addr: SocketAddr,
    max_body_size: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = request.into_parts();

    let body = match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            let status = if error.is::<LengthLimitError>() {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };

            tracing::debug!("unable to read request body: {}", error);
            return Ok(into_hyper(Error::status(status).into_response()));
        }
    };

    let request = Request::from_http(http::Request::from_parts(parts, body), Some(remote_addr));

    let response = task::spawn_blocking(move || match app.call(request) {
        Ok(response) => response,
        Err(error) => propagated(&app, &error),
    })
    .await;

    Ok(into_hyper(response.unwrap_or_else(|error| {
        tracing::error!("request task failed: {}", error);
        Error::internal_server_error().into_response()
    })))
}

/// Answers an error that propagated out of the application. The error text
/// is only included in debug mode.
///
fn propagated<S>(app: &App<S>, error: &Error) -> Response {
    tracing::error!("error propagated to the server: {}", error);

    if app.settings().debug {
        Error::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
    } else {
        Error::internal_server_error().into_response()
    }
}

fn into_hyper(response: Response) -> http::Response<Full<Bytes>> {
    response.into_http().map(Full::new)
}

fn handle_joined(result: &Result<TaskResult, JoinError>) {
    match result {
        Ok(Err(error)) => {
            if let Some(e) = error.downcast_ref::<hyper::Error>() {
                let is_disconnect = e.is_canceled()
                    || e.is_incomplete_message()
                    || e.source().is_some_and(|source| {
                        source
                            .downcast_ref::<std::io::Error>()
                            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotConnected)
                    });

                if is_disconnect {
                    tracing::trace!("client disconnected: {}", e);
                } else {
                    tracing::warn!("connection error: {}", e);
                }
            } else {
                tracing::warn!("connection error: {}", error);
            }
        }
        Err(error) if error.is_panic() => {
            tracing::error!("connection task panicked: {}", error);
        }
        Ok(Ok(())) | Err(_) => {}
    }
}
