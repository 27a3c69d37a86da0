// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! A minimal, scriptable stand-in for a Kinetic drive: enough of the wire
//! protocol to drive the client through handshake and reply delivery
//! without a real device.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use kinetic_client_rs::{
    cfg::config::Identity,
    operation::{
        builder::{BuiltCommand, CommandBuilder},
        controller::OperationController,
        session::Session,
    },
    transport::{Correlator, SystemClock, Transport},
    wire::{
        auth, framer,
        proto::{Command, HmacAuth, Message, command, message},
    },
};
use prost::Message as _;
use tokio::net::{TcpListener, TcpStream};

pub const TEST_KEY: &[u8] = b"asdfasdf";
pub const TEST_IDENTITY: i64 = 1;

pub async fn bind_loopback() -> (TcpListener, std::net::SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    (listener, addr)
}

/// Frames an unsolicited status PDU carrying `connection_id`, the first
/// thing every fake server sends once a client connects.
pub fn encode_unsolicited_status(connection_id: i64) -> Bytes {
    let command = Command {
        header: Some(command::Header {
            connection_id: Some(connection_id),
            ..Default::default()
        }),
        ..Default::default()
    };
    let envelope = Message {
        auth_type: message::AuthType::Unsolicitedstatus as i32,
        hmac_auth: None,
        pin_auth: None,
        command_bytes: command.encode_to_vec(),
    };
    let envelope_bytes = envelope.encode_to_vec();
    framer::encode(&envelope_bytes, &[]).expect("encode handshake frame")
}

/// Frames a reply to `ack_sequence` carrying `status` and `value`, signed
/// with `TEST_KEY` unless `corrupt_hmac` asks for a tampered digest.
pub fn encode_reply(
    ack_sequence: i64,
    status: command::StatusCode,
    value: &[u8],
    corrupt_hmac: bool,
) -> Bytes {
    let command = Command {
        header: Some(command::Header {
            ack_sequence: Some(ack_sequence),
            ..Default::default()
        }),
        status: Some(command::Status {
            code: Some(status as i32),
            status_message: String::new(),
        }),
        ..Default::default()
    };
    let command_bytes = command.encode_to_vec();
    let mut digest = auth::sign(TEST_KEY, &command_bytes);
    if corrupt_hmac {
        digest[0] ^= 0xFF;
    }
    let envelope = Message {
        auth_type: message::AuthType::Hmacauth as i32,
        hmac_auth: Some(HmacAuth {
            hmac: digest,
            identity: TEST_IDENTITY,
        }),
        pin_auth: None,
        command_bytes,
    };
    let envelope_bytes = envelope.encode_to_vec();
    framer::encode(&envelope_bytes, value).expect("encode reply frame")
}

/// Connects a client `Transport`/`Session`/`OperationController` triple to
/// `addr`. Does not wait for the handshake; callers that need
/// `connectionReady` call `session.wait_ready()` themselves.
pub async fn connect_client(
    addr: std::net::SocketAddr,
) -> (Arc<Session>, Arc<Transport>, OperationController) {
    let stream = TcpStream::connect(addr).await.expect("connect");
    let identity = Identity {
        id: TEST_IDENTITY,
        key: String::from_utf8(TEST_KEY.to_vec()).expect("TEST_KEY is valid utf8"),
    };
    let session = Arc::new(Session::new(identity, 0));
    let correlator = Arc::new(Correlator::new());
    let transport = Arc::new(Transport::new(
        stream,
        session.clone(),
        correlator,
        Arc::new(SystemClock),
    ));
    let controller =
        OperationController::new(session.clone(), transport.clone(), Duration::from_secs(5));
    (session, transport, controller)
}

/// A command builder whose response is simply the reply's value payload,
/// so tests can assert on the bytes a real `Get`-shaped builder would have
/// copied into the caller's buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueEchoBuilder;

impl CommandBuilder for ValueEchoBuilder {
    type Response = Bytes;

    fn build(&self) -> BuiltCommand {
        BuiltCommand {
            command: Command {
                header: Some(command::Header {
                    message_type: command::MessageType::Get as i32,
                    ..Default::default()
                }),
                ..Default::default()
            },
            value: Bytes::new(),
        }
    }

    fn parse_response(&self, _reply_command: &Command, reply_value: Bytes) -> Self::Response {
        reply_value
    }
}
