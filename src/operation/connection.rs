// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! The top-level `Session/Connection State` component (`spec.md` §2.6,
//! §4.6): opens the TCP socket, performs the handshake read that the rest
//! of the crate treats as an unsolicited inbound frame, and hands callers
//! a ready-to-use `Connection` bound to a `Session`, a `Transport`, and an
//! `OperationController`.
//!
//! Grounded on `Masorubka1-iscsi-client-rs/src/client/client.rs`'s
//! `ClientConnection::connect` (resolve the address, `TcpStream::connect`,
//! `set_nodelay`, spawn the read loop) and on
//! `examples/original_source/src/lib/kinetic_connection.c` /
//! `kinetic_session.c`'s two-step `KineticSession_Create` +
//! `KineticConnection_Connect`, collapsed here into a single
//! `Connection::connect` the way the teacher collapses dial+spawn into one
//! call.

use std::{sync::Arc, time::Duration};

use prost::Message as _;
use tokio::{
    io::AsyncReadExt,
    net::TcpStream,
    time::timeout,
};
use tracing::info;

use crate::{
    cfg::config::Config,
    error::ConnectError,
    operation::{
        builder::CommandBuilder,
        controller::{OperationController, OperationResult},
        noop::{NoopBuilder, NoopResponse},
        session::{Session, SessionState},
    },
    transport::{Correlator, SystemClock, Transport},
    wire::{
        framer::{self, HEADER_LEN},
        proto::{Command, Message, message},
    },
};

/// How long `disconnect` gives a best-effort farewell NOOP before giving
/// up and draining anyway. Kept short: `disconnect` must not hang a caller
/// on an already-troubled peer.
const DISCONNECT_NOOP_TIMEOUT: Duration = Duration::from_millis(250);

/// A live connection to one drive: the `Session` state, its `Transport`,
/// and an `OperationController` bound to both. This is the handle
/// application code actually holds; `Session` by itself is just the state
/// the other components share.
pub struct Connection {
    session: Arc<Session>,
    transport: Arc<Transport>,
    controller: OperationController,
}

impl Connection {
    /// Opens a TCP connection to `cfg.transport.target_address`, reads and
    /// validates the server's unsolicited handshake PDU, and returns a
    /// `Connection` whose session is already `Active`.
    ///
    /// `spec.md` §4.6 calls for waiting on `connectionReady` up to a
    /// timeout and returning `CONNECTION_ERROR` on failure; since the
    /// handshake read is the only thing `connectionReady` is waiting on,
    /// that's realized here as `cfg.runtime.timeout_connection` bounding
    /// the dial and the handshake read together.
    pub async fn connect(cfg: &Config) -> Result<Arc<Connection>, ConnectError> {
        let addr = &cfg.transport.target_address;
        let mut stream = match timeout(
            cfg.runtime.timeout_connection,
            TcpStream::connect(addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ConnectError::Io(addr.clone(), e)),
            Err(_elapsed) => return Err(ConnectError::HandshakeTimeout),
        };
        stream
            .set_nodelay(true)
            .map_err(|e| ConnectError::Io(addr.clone(), e))?;

        let connection_id = match timeout(
            cfg.runtime.timeout_connection,
            Self::read_handshake(&mut stream),
        )
        .await
        {
            Ok(result) => result?,
            Err(_elapsed) => return Err(ConnectError::HandshakeTimeout),
        };

        let session = Arc::new(Session::new(cfg.identity.clone(), cfg.cluster_version));
        session.mark_ready(connection_id);

        let correlator = Arc::new(Correlator::new());
        let transport = Arc::new(Transport::new(
            stream,
            session.clone(),
            correlator,
            Arc::new(SystemClock),
        ));
        let controller = OperationController::new(
            session.clone(),
            transport.clone(),
            cfg.runtime.timeout_operation,
        );

        info!(connection_id, %addr, "kinetic connection established");
        Ok(Arc::new(Connection {
            session,
            transport,
            controller,
        }))
    }

    /// Reads exactly one PDU and validates it is the server's unsolicited
    /// status message carrying a `connectionID`. Performed on the raw
    /// stream before the `Transport`'s read loop takes over, so a
    /// malformed or missing handshake fails `connect` itself rather than
    /// silently leaving `connectionReady` unset forever.
    async fn read_handshake(stream: &mut TcpStream) -> Result<i64, ConnectError> {
        let mut header_buf = [0u8; HEADER_LEN];
        stream
            .read_exact(&mut header_buf)
            .await
            .map_err(|e| ConnectError::Io("handshake header".to_string(), e))?;
        let header = framer::decode_header(&header_buf)?;

        let body_len = header.protobuf_len as usize + header.value_len as usize;
        let mut body = vec![0u8; body_len];
        stream
            .read_exact(&mut body)
            .await
            .map_err(|e| ConnectError::Io("handshake body".to_string(), e))?;
        let protobuf = &body[..header.protobuf_len as usize];

        let envelope = Message::decode(protobuf).map_err(ConnectError::HandshakeDecode)?;
        let auth_type = message::AuthType::try_from(envelope.auth_type)
            .unwrap_or(message::AuthType::InvalidAuthType);
        if !auth_type.is_unsolicited_status() {
            return Err(ConnectError::NotUnsolicitedStatus);
        }

        let command =
            Command::decode(envelope.command_bytes.as_slice()).map_err(ConnectError::HandshakeDecode)?;
        command.connection_id().ok_or(ConnectError::MissingConnectionId)
    }

    /// The session state this connection is bound to.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Allocates the next sequence number for an outgoing command.
    /// Delegates to `Session::next_sequence`; exposed here too since
    /// `spec.md` §4.6 names it on the public Session/Connection contract.
    pub fn next_sequence(&self) -> u64 {
        self.session.next_sequence()
    }

    /// Executes one command against this connection and waits for its
    /// reply (or failure).
    pub async fn execute<B: CommandBuilder>(&self, builder: &B) -> OperationResult<B::Response> {
        self.controller.execute(builder).await
    }

    /// Issues a bodyless `NOOP` and waits for the reply, the connectivity
    /// probe / keepalive worked example named in `spec.md` §6 and
    /// `operation/noop.rs`.
    pub async fn send_noop(&self) -> OperationResult<NoopResponse> {
        self.controller.execute(&NoopBuilder).await
    }

    /// Submits `builder` and returns once the write has settled, invoking
    /// `completion` later, exactly once, with the reply or failure —
    /// `OperationController::execute_with_completion` exposed on the
    /// connection handle the same way `execute`/`send_noop` are.
    pub async fn execute_with_completion<B, F>(&self, builder: B, completion: F) -> crate::status::Status
    where
        B: CommandBuilder + 'static,
        F: FnOnce(OperationResult<B::Response>) + Send + 'static,
    {
        self.controller.execute_with_completion(builder, completion).await
    }

    /// Gracefully disconnects: a best-effort farewell NOOP (skipped if the
    /// session is already poisoned), then `Transport::shutdown`. Idempotent
    /// — calling it twice, or on an already-failed session, just drains an
    /// already-empty correlator.
    pub async fn disconnect(&self) {
        if self.session.state() == SessionState::Active {
            let _ = self
                .controller
                .execute_with_timeout(&NoopBuilder, DISCONNECT_NOOP_TIMEOUT)
                .await;
        }
        self.transport.shutdown().await;
    }
}
