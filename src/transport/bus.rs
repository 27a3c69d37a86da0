// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Owns the TCP socket: a background read loop that frames, authenticates,
//! and routes incoming PDUs, and a `submit` entry point that frames,
//! signs, and writes an outgoing one.
//!
//! Mirrors the split the teacher draws between its connection-owning
//! session actor and the `client::Client` that queues work onto it
//! (`client/client.rs`), collapsed here into a single `Transport` since
//! Kinetic has only one PDU stream per connection, not per-LUN fan-out.

use std::{sync::Arc, time::Duration};

use bytes::{Bytes, BytesMut};
use prost::Message as _;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    status::TransportOutcome,
    transport::{
        clock::Clock,
        correlator::{Correlator, CorrelatorResult},
    },
    wire::{
        auth,
        framer::{self, HEADER_LEN},
        proto::{Command, HmacAuth, Message, command, message},
    },
};

use crate::operation::session::Session;

/// A PDU read off the wire, already split into its authenticated command
/// and its value payload, but not yet matched against a waiter.
struct InboundFrame {
    message: Message,
    command: Command,
    value: Bytes,
}

/// Owns the write half and fans writes out one at a time; the read half
/// is moved into the background read-loop task at construction.
pub struct Transport {
    writer: Mutex<OwnedWriteHalf>,
    correlator: Arc<Correlator>,
    session: Arc<Session>,
    read_loop: JoinHandle<()>,
    sweeper: JoinHandle<()>,
    cancel: CancellationToken,
}

/// How often the background sweeper checks for deadlines that have
/// passed. Short enough that `OPERATION_TIMED_OUT` feels prompt, long
/// enough not to spin.
const SWEEP_INTERVAL: Duration = Duration::from_millis(25);

impl Transport {
    pub fn new(
        stream: TcpStream,
        session: Arc<Session>,
        correlator: Arc<Correlator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        stream.set_nodelay(true).ok();
        let (read_half, write_half) = stream.into_split();
        let cancel = CancellationToken::new();

        let read_loop = tokio::spawn(Self::read_loop(
            read_half,
            session.clone(),
            correlator.clone(),
            cancel.clone(),
        ));
        let sweeper = tokio::spawn(Self::sweep_loop(correlator.clone(), clock, cancel.clone()));

        Transport {
            writer: Mutex::new(write_half),
            correlator,
            session,
            read_loop,
            sweeper,
            cancel,
        }
    }

    /// Frames, signs, and writes `command`/`value`, registering a waiter
    /// for `sequence` before the write so a reply racing the write can
    /// never be missed.
    ///
    /// Per `spec.md` §4.3, `submit` itself only covers the synchronous
    /// half of the contract: it returns as soon as the write has gone out
    /// (`SubmitOutcome::Pending`, carrying the receiver the caller — or
    /// whoever the caller hands it off to — later awaits for the actual
    /// reply) or as soon as the write has failed outright
    /// (`SubmitOutcome::Failed`, with the waiter already deregistered). It
    /// never awaits the reply itself; that's §4.5's job, on whatever task
    /// ends up owning the receiver.
    pub async fn submit(
        &self,
        sequence: u64,
        command: Command,
        value: Bytes,
        deadline: std::time::Instant,
        write_timeout: Duration,
    ) -> SubmitOutcome {
        let rx = self.correlator.register(sequence, deadline);

        let command_bytes = command.encode_to_vec();
        let digest = auth::sign(self.session.identity.key.as_bytes(), &command_bytes);
        let envelope = Message {
            auth_type: message::AuthType::Hmacauth as i32,
            hmac_auth: Some(HmacAuth {
                hmac: digest,
                identity: self.session.identity.id,
            }),
            pin_auth: None,
            command_bytes,
        };
        let envelope_bytes = envelope.encode_to_vec();

        let frame = match framer::encode(&envelope_bytes, &value) {
            Ok(frame) => frame,
            Err(_) => {
                self.correlator.fail(sequence, TransportOutcome::TxFailure);
                return SubmitOutcome::Failed(TransportOutcome::TxFailure);
            },
        };

        let write_result = {
            let mut writer = self.writer.lock().await;
            tokio::time::timeout(write_timeout, writer.write_all(&frame)).await
        };

        match write_result {
            Ok(Ok(())) => SubmitOutcome::Pending(rx),
            Ok(Err(e)) => {
                warn!(error = %e, "write failed, poisoning session");
                self.session.mark_failed();
                self.correlator.fail(sequence, TransportOutcome::TxFailure);
                SubmitOutcome::Failed(TransportOutcome::TxFailure)
            },
            Err(_elapsed) => {
                self.session.mark_failed();
                self.correlator.fail(sequence, TransportOutcome::TxTimeout);
                SubmitOutcome::Failed(TransportOutcome::TxTimeout)
            },
        }
    }

    /// Reads one frame's worth of bytes, or `None` on clean EOF.
    async fn read_one(read_half: &mut OwnedReadHalf) -> std::io::Result<Option<InboundFrame>> {
        let mut header_buf = [0u8; HEADER_LEN];
        match read_half.read_exact(&mut header_buf).await {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
        let header = match framer::decode_header(&header_buf) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "malformed frame header, closing connection");
                return Ok(None);
            },
        };
        let mut body = BytesMut::zeroed(header.protobuf_len as usize + header.value_len as usize);
        read_half.read_exact(&mut body).await?;
        let protobuf = body.split_to(header.protobuf_len as usize).freeze();
        let value = body.freeze();

        let message = match Message::decode(protobuf.as_ref()) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "envelope failed to decode");
                return Ok(Some(InboundFrame {
                    message: Message::default(),
                    command: Command::default(),
                    value,
                }));
            },
        };
        let command = match Command::decode(message.command_bytes.as_slice()) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "command submessage failed to decode");
                Command::default()
            },
        };
        Ok(Some(InboundFrame {
            message,
            command,
            value,
        }))
    }

    async fn read_loop(
        mut read_half: OwnedReadHalf,
        session: Arc<Session>,
        correlator: Arc<Correlator>,
        cancel: CancellationToken,
    ) {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = Self::read_one(&mut read_half) => frame,
            };
            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("connection closed by peer");
                    session.mark_failed();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "read failed, poisoning session");
                    session.mark_failed();
                    break;
                },
            };

            let auth_type = message::AuthType::try_from(frame.message.auth_type)
                .unwrap_or(message::AuthType::InvalidAuthType);

            if auth_type.is_unsolicited_status() {
                if let Some(connection_id) = frame.command.connection_id() {
                    session.mark_ready(connection_id);
                } else {
                    // spec.md §4.5 HandleUnexpectedResponse: unsolicited
                    // status with no connectionID means the peer is
                    // terminating the connection.
                    error!("unsolicited status PDU carried no connectionID; peer is terminating");
                }
                continue;
            }

            let Some(sequence) = frame.command.ack_sequence() else {
                // spec.md §4.5 HandleUnexpectedResponse "anything else":
                // log at error level and drop the frame.
                error!("reply carried no ack_sequence, dropping");
                continue;
            };
            let sequence = sequence as u64;
            let mut command = frame.command;

            if auth_type == message::AuthType::Hmacauth {
                let declared = frame
                    .message
                    .hmac_auth
                    .as_ref()
                    .map(|h| h.hmac.as_slice())
                    .unwrap_or(&[]);
                if !auth::verify(
                    session.identity.key.as_bytes(),
                    &frame.message.command_bytes,
                    declared,
                ) {
                    warn!(
                        sequence,
                        declared_hmac = %hex::encode(declared),
                        "HMAC verification failed on reply"
                    );
                    // The reply is still delivered to its waiter, but with
                    // the server-claimed status overridden: an attacker
                    // (or a bit flip) that forges SUCCESS must not read as
                    // success once the digest doesn't check out.
                    let status = command.status.get_or_insert_with(Default::default);
                    status.code = Some(command::StatusCode::DataError as i32);
                }
            }

            if !correlator.match_reply(sequence, command, frame.value) {
                // spec.md §4.5 HandleUnexpectedResponse "anything else":
                // no waiter registered under this sequence, most likely a
                // reply that arrived after its operation already timed
                // out. Logged and dropped, never surfaced to a caller.
                error!(sequence, "reply matched no pending operation, dropping");
            }
        }
        // The read loop only ever exits because the peer closed the
        // socket or a read failed; either way nothing still pending will
        // ever get a reply.
        correlator.drain(TransportOutcome::UnregisteredSocket);
    }

    async fn sweep_loop(correlator: Arc<Correlator>, clock: Arc<dyn Clock>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(SWEEP_INTERVAL) => {
                    correlator.expire_due(clock.now());
                },
            }
        }
    }

    /// Stops the read loop and sweeper and fails every outstanding
    /// waiter. Idempotent, and takes `&self` rather than consuming the
    /// transport so a `Connection` sharing it between an
    /// `OperationController` and itself can still call it: every holder
    /// sees the same poisoned, drained state afterwards. The socket itself
    /// closes once every `Arc<Transport>` (and its writer half) drops.
    pub async fn shutdown(&self) {
        self.session.mark_failed();
        self.cancel.cancel();
        self.read_loop.abort();
        self.sweeper.abort();
        self.correlator.drain(TransportOutcome::UnregisteredSocket);
    }
}

/// What `Transport::submit` hands back once the write itself has settled.
///
/// `Pending` carries the same receiver `Correlator::register` would have
/// handed a blocking caller; the difference from the old (blocking)
/// contract is that `submit` returns *before* anything is awaited on it,
/// so the caller chooses whether to await it inline (`execute_with_timeout`)
/// or move it onto a detached task and return immediately
/// (`execute_with_completion`).
pub enum SubmitOutcome {
    Pending(oneshot::Receiver<CorrelatorResult>),
    Failed(TransportOutcome),
}
