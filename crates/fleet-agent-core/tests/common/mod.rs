// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared test doubles: a recording mock worker and a scripted mock HTTP
//! server for the registration endpoint.

use async_trait::async_trait;
use fleet_agent_core::{Worker, WorkerError};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Worker double that records every lifecycle call and can be scripted to
/// fail at connect or start.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockWorker {
    pub connects: AtomicU32,
    pub starts: AtomicU32,
    pub stops: AtomicU32,
    pub disconnects: AtomicU32,
    pub fail_connect: bool,
    pub fail_start: bool,
    /// When set, `start` blocks until `stop` is called.
    pub block_until_stopped: bool,
    pub exit_status: i32,
    stop_token: CancellationToken,
}

#[allow(dead_code)]
impl MockWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn blocking(exit_status: i32) -> Self {
        Self {
            block_until_stopped: true,
            exit_status,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Worker for MockWorker {
    async fn connect(&self) -> Result<(), WorkerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(WorkerError::Other("connect refused".to_string()));
        }
        Ok(())
    }

    async fn start(&self) -> Result<(), WorkerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(WorkerError::Other("run loop crashed".to_string()));
        }
        if self.block_until_stopped {
            self.stop_token.cancelled().await;
        }
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stop_token.cancel();
    }

    async fn disconnect(&self) -> Result<(), WorkerError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exit_status(&self) -> i32 {
        self.exit_status
    }
}

/// A request captured by [`MockRegistry`].
#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Mock registration server with a scripted response per call.
///
/// The n-th request receives the n-th scripted `(status, body)` pair; once
/// the script runs out the last entry repeats.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockRegistry {
    pub addr: SocketAddr,
    pub received_requests: Arc<Mutex<Vec<ReceivedRequest>>>,
}

#[allow(dead_code)]
impl MockRegistry {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        assert!(!responses.is_empty(), "script at least one response");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock registry");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let received_requests = Arc::new(Mutex::new(Vec::new()));
        let requests_clone = received_requests.clone();
        let responses = Arc::new(responses);
        let hits = Arc::new(AtomicU32::new(0));

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };

                let io = TokioIo::new(stream);
                let requests = requests_clone.clone();
                let responses = responses.clone();
                let hits = hits.clone();

                tokio::spawn(async move {
                    let service = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let requests = requests.clone();
                        let responses = responses.clone();
                        let hits = hits.clone();
                        async move {
                            let method = req.method().to_string();
                            let path = req.uri().path().to_string();
                            let headers: Vec<(String, String)> = req
                                .headers()
                                .iter()
                                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                                .collect();
                            let body = req
                                .into_body()
                                .collect()
                                .await
                                .map(|collected| collected.to_bytes().to_vec())
                                .unwrap_or_default();

                            requests.lock().unwrap().push(ReceivedRequest {
                                method,
                                path,
                                headers,
                                body,
                            });

                            let call = hits.fetch_add(1, Ordering::SeqCst) as usize;
                            let (status, body) =
                                responses[call.min(responses.len() - 1)].clone();

                            Ok::<_, hyper::Error>(
                                Response::builder()
                                    .status(status)
                                    .header("Content-Type", "application/json")
                                    .body(Full::new(Bytes::from(body)))
                                    .unwrap(),
                            )
                        }
                    });

                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        Self {
            addr,
            received_requests,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.received_requests.lock().unwrap().len()
    }
}
