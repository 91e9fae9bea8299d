// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Async driver that polls a context to completion over a [`Transport`].
//!
//! ## Round Structure
//! 1. `advance` the root context (children are advanced with it)
//! 2. collect every payload waiting for the network
//! 3. ship them concurrently, bounded by a semaphore and a per-call timeout
//! 4. feed each answer (or transport failure) back into its slot
//!
//! Transport failures fail only the slot they belong to, so one bad call in a
//! batch does not sink the others.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Semaphore;

use crate::client::Client;
use crate::config::DriverOptions;
use crate::errors::{DriverError, ErrorKind, RequestError};
use crate::observability::messages::driver::{RequestFinished, RoundStarted, TransportFailed};
use crate::observability::messages::StructuredLog;
use crate::request::{ExecState, OutgoingRequest, RequestContext, ResponseStatus};
use crate::traits::Transport;

type Delivery = (OutgoingRequest, Result<Vec<u8>, DriverError>);

pub struct RequestDriver {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    max_rounds: usize,
    max_concurrency: usize,
}

impl RequestDriver {
    pub fn new(transport: Arc<dyn Transport>, options: &DriverOptions) -> Self {
        Self {
            transport,
            timeout: options.timeout(),
            max_rounds: options.max_rounds(),
            max_concurrency: options.max_concurrency(),
        }
    }

    pub fn for_client(transport: Arc<dyn Transport>, client: &Client) -> Self {
        Self::new(transport, client.driver_options())
    }

    /// Create a context for `raw` on `client` and run it to completion.
    pub async fn send(&self, client: &Arc<Client>, raw: &str) -> Result<Value, DriverError> {
        let mut ctx = RequestContext::new(client, raw)?;
        self.execute(&mut ctx).await
    }

    /// Poll `ctx` until it succeeds or fails. Returns the final response document.
    pub async fn execute(&self, ctx: &mut RequestContext) -> Result<Value, DriverError> {
        let started = Instant::now();
        let result = self.run_rounds(ctx).await;
        let (rounds, outcome) = match result {
            Ok((rounds, value)) => (rounds, Ok(value)),
            Err((rounds, err)) => (rounds, Err(err)),
        };
        RequestFinished {
            request_id: ctx.id(),
            rounds,
            success: outcome.is_ok(),
            duration: started.elapsed(),
        }
        .log();
        outcome
    }

    async fn run_rounds(
        &self,
        ctx: &mut RequestContext,
    ) -> Result<(usize, Value), (usize, DriverError)> {
        for round in 1..=self.max_rounds {
            match ctx.advance() {
                ExecState::Success | ExecState::Error => return finished(ctx, round),
                ExecState::Waiting => {}
            }

            let outgoing = ctx.take_outgoing();
            if outgoing.is_empty() {
                return Err((round, DriverError::Stalled));
            }
            RoundStarted {
                request_id: ctx.id(),
                round,
                outgoing: outgoing.len(),
            }
            .log();

            let deliveries = self.ship(outgoing).await.map_err(|e| (round, e))?;
            for (request, result) in deliveries {
                let (status, data) = match result {
                    Ok(bytes) => (ResponseStatus::Ok, bytes),
                    Err(err) => {
                        let reason = err.to_string();
                        TransportFailed {
                            method: &request.method,
                            reason: &reason,
                        }
                        .log();
                        (ResponseStatus::Error(ErrorKind::RemoteError), reason.into_bytes())
                    }
                };
                ctx.add_response_at(&request.path, request.index, status, &data)
                    .map_err(|e| (round, DriverError::from(e)))?;
            }
        }

        match ctx.advance() {
            ExecState::Waiting => Err((self.max_rounds, DriverError::RoundsExceeded(self.max_rounds))),
            _ => finished(ctx, self.max_rounds),
        }
    }

    async fn ship(&self, outgoing: Vec<OutgoingRequest>) -> Result<Vec<Delivery>, DriverError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = Vec::with_capacity(outgoing.len());

        for request in outgoing {
            let transport = self.transport.clone();
            let semaphore_clone = semaphore.clone();
            let timeout = self.timeout;

            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore_clone.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let err = DriverError::Transport {
                            method: request.method.clone(),
                            reason: format!("failed to acquire send permit: {}", e),
                        };
                        return (request, Err(err));
                    }
                };
                let result = match tokio::time::timeout(timeout, transport.fetch(&request)).await {
                    Ok(Ok(bytes)) => Ok(bytes),
                    Ok(Err(e)) => Err(DriverError::Transport {
                        method: request.method.clone(),
                        reason: e.to_string(),
                    }),
                    Err(_) => Err(DriverError::Timeout(timeout)),
                };
                (request, result)
            }));
        }

        let mut deliveries = Vec::with_capacity(tasks.len());
        for task in tasks {
            let delivery = task.await.map_err(|join_error| DriverError::Transport {
                method: String::new(),
                reason: format!("task join error: {}", join_error),
            })?;
            deliveries.push(delivery);
        }
        Ok(deliveries)
    }
}

fn finished(ctx: &RequestContext, round: usize) -> Result<(usize, Value), (usize, DriverError)> {
    if let Some(err) = ctx.error() {
        return Err((round, DriverError::from(err)));
    }
    ctx.response_value()
        .map(|value| (round, value))
        .ok_or_else(|| {
            (
                round,
                DriverError::from(RequestError::new(ErrorKind::Unknown, "context finished without a response")),
            )
        })
}
