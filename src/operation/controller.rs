// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! The operation controller: the single entry point that turns a
//! [`CommandBuilder`] into a submitted PDU and a caller-facing result.
//!
//! Grounded on `original_source/kinetic_controller.c`'s
//! `KineticController_ExecuteOperation`, which is the same shape: fill in
//! the header fields owned by the session, hand the framed command to the
//! bus, and translate whatever comes back into a status the caller
//! understands. The C original exposes this twice — a blocking call built
//! on a mutex/condvar, and a callback-driven one built on the same core,
//! sharing everything up to the point the bus hands back a result. This
//! controller keeps that split: `execute`/`execute_with_timeout` await the
//! rendezvous inline, while `execute_with_completion` hands the rendezvous
//! to a detached task and returns as soon as the write itself has settled,
//! invoking the caller's completion once the reply (or failure) arrives.

use std::{sync::Arc, time::Duration};

use tracing::instrument;

use crate::{
    error::BuildError,
    operation::{
        builder::{BuiltCommand, CommandBuilder},
        session::{Session, SessionState},
    },
    status::Status,
    transport::{SubmitOutcome, Transport, correlator::CorrelatedReply},
    wire::{MAX_PROTO, MAX_VALUE},
};

/// The result of one `execute` call: either the builder's parsed
/// response, or a status explaining why there wasn't one.
pub type OperationResult<R> = Result<R, Status>;

fn validate_built(built: &BuiltCommand) -> Result<(), BuildError> {
    use prost::Message as _;

    if built.value.len() > MAX_VALUE {
        return Err(BuildError::ValueTooLarge(built.value.len()));
    }
    let command_len = built.command.encoded_len();
    if command_len > MAX_PROTO {
        return Err(BuildError::CommandTooLarge(command_len));
    }
    Ok(())
}

fn handle_reply<B: CommandBuilder>(builder: &B, reply: CorrelatedReply) -> OperationResult<B::Response> {
    let status = reply
        .command
        .status_code()
        .map(Status::from)
        .unwrap_or(Status::Invalid);
    if !status.is_success() {
        return Err(status);
    }
    Ok(builder.parse_response(&reply.command, reply.value))
}

/// Drives command execution against a session and its transport. Cheap to
/// share: holds only `Arc`s.
pub struct OperationController {
    session: Arc<Session>,
    transport: Arc<Transport>,
    default_timeout: Duration,
}

impl OperationController {
    pub fn new(session: Arc<Session>, transport: Arc<Transport>, default_timeout: Duration) -> Self {
        OperationController {
            session,
            transport,
            default_timeout,
        }
    }

    /// Executes one command and waits for its reply (or failure). Blocks
    /// on the handshake first: the spec requires `connectionReady` before
    /// any operation is submitted.
    #[instrument(skip(self, builder), fields(message_type))]
    pub async fn execute<B: CommandBuilder>(&self, builder: &B) -> OperationResult<B::Response> {
        self.execute_with_timeout(builder, self.default_timeout).await
    }

    pub async fn execute_with_timeout<B: CommandBuilder>(
        &self,
        builder: &B,
        timeout: Duration,
    ) -> OperationResult<B::Response> {
        let outcome = self.submit_built(builder, timeout).await?;
        match outcome {
            SubmitOutcome::Pending(rx) => {
                let result = rx
                    .await
                    .unwrap_or(Err(crate::status::TransportOutcome::UnregisteredSocket));
                match result {
                    Ok(reply) => handle_reply(builder, reply),
                    Err(outcome) => Err(outcome.to_status()),
                }
            },
            SubmitOutcome::Failed(outcome) => Err(outcome.to_status()),
        }
    }

    /// Submits `builder` and returns as soon as the write has settled,
    /// without waiting for the reply. The reply (or transport failure) is
    /// delivered later, exactly once, by `completion` running on a
    /// detached task — the callback-driven half of the C original's
    /// `KineticController_ExecuteOperation`, which this crate otherwise
    /// collapses into the blocking `execute_with_timeout`.
    ///
    /// The returned `Status` only describes submission: `Success` means
    /// the command made it onto the wire and `completion` will eventually
    /// run; anything else means submission itself failed and `completion`
    /// has already run, synchronously, with that same status.
    pub async fn execute_with_completion<B, F>(&self, builder: B, completion: F) -> Status
    where
        B: CommandBuilder + 'static,
        F: FnOnce(OperationResult<B::Response>) + Send + 'static,
    {
        let timeout = self.default_timeout;
        let outcome = match self.submit_built(&builder, timeout).await {
            Ok(outcome) => outcome,
            Err(status) => {
                completion(Err(status));
                return status;
            },
        };

        match outcome {
            SubmitOutcome::Pending(rx) => {
                tokio::spawn(async move {
                    let result = rx
                        .await
                        .unwrap_or(Err(crate::status::TransportOutcome::UnregisteredSocket));
                    let resolved = match result {
                        Ok(reply) => handle_reply(&builder, reply),
                        Err(outcome) => Err(outcome.to_status()),
                    };
                    completion(resolved);
                });
                Status::Success
            },
            SubmitOutcome::Failed(outcome) => {
                let status = outcome.to_status();
                completion(Err(status));
                status
            },
        }
    }

    /// Waits for the handshake, fills in the header fields the session
    /// owns, validates the built command against the wire's size limits,
    /// and hands it to the transport. Shared by both execution modes so
    /// neither duplicates the other's bookkeeping.
    async fn submit_built<B: CommandBuilder>(
        &self,
        builder: &B,
        timeout: Duration,
    ) -> Result<SubmitOutcome, Status> {
        self.session.wait_ready().await;
        let state = self.session.state();
        if state != SessionState::Active {
            return Err(BuildError::SessionNotReady(format!("{state:?}")).into());
        }

        let built = builder.build();
        validate_built(&built)?;
        let mut command = built.command;
        let sequence = self.session.next_sequence();
        {
            let header = command.header.get_or_insert_with(Default::default);
            header.cluster_version = self.session.cluster_version();
            header.connection_id = self.session.connection_id();
            header.sequence = sequence as i64;
            header.timeout = timeout.as_millis() as i64;
        }

        let deadline = std::time::Instant::now() + timeout;
        Ok(self
            .transport
            .submit(sequence, command, built.value, deadline, timeout)
            .await)
    }
}
