// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Exercises `Connection::connect`/`disconnect` end to end: scenario 1
//! from `spec.md` §8 (handshake), plus the `CONNECTION_ERROR`-on-timeout
//! and post-`disconnect` invariants from §4.6/§8.

use std::time::Duration;

use anyhow::Result;
use kinetic_client_rs::{
    cfg::config::{Config, Identity, RuntimeConfig, TlsMode, TransportConfig},
    error::ConnectError,
    operation::Connection,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::integration_tests::common::{
    TEST_IDENTITY, TEST_KEY, bind_loopback, encode_unsolicited_status,
};

fn test_config(addr: std::net::SocketAddr) -> Config {
    Config {
        identity: Identity {
            id: TEST_IDENTITY,
            key: String::from_utf8(TEST_KEY.to_vec()).expect("TEST_KEY is valid utf8"),
        },
        cluster_version: 0,
        transport: TransportConfig {
            target_address: addr.to_string(),
            tls: TlsMode::Plain,
        },
        runtime: RuntimeConfig {
            timeout_connection: Duration::from_secs(2),
            timeout_operation: Duration::from_secs(2),
        },
    }
}

#[tokio::test]
async fn connect_performs_the_handshake_and_returns_an_active_connection() -> Result<()> {
    let (listener, addr) = bind_loopback().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        socket
            .write_all(&encode_unsolicited_status(0x42))
            .await
            .expect("write handshake");
        tokio::time::sleep(Duration::from_millis(200)).await;
    });

    let cfg = test_config(addr);
    let connection = Connection::connect(&cfg).await?;
    assert_eq!(connection.session().connection_id(), Some(0x42));

    server.abort();
    Ok(())
}

#[tokio::test]
async fn connect_times_out_when_no_handshake_arrives() {
    let (listener, addr) = bind_loopback().await;
    let server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut cfg = test_config(addr);
    cfg.runtime.timeout_connection = Duration::from_millis(50);
    let result = Connection::connect(&cfg).await;
    assert!(matches!(result, Err(ConnectError::HandshakeTimeout)));

    server.abort();
}

#[tokio::test]
async fn disconnect_is_idempotent_and_blocks_further_submissions() -> Result<()> {
    let (listener, addr) = bind_loopback().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        socket
            .write_all(&encode_unsolicited_status(1))
            .await
            .expect("write handshake");
        // Never answers the farewell NOOP or anything else; just stays
        // open until the client tears the connection down.
        let mut buf = [0u8; 1];
        let _ = socket.read(&mut buf).await;
    });

    let cfg = test_config(addr);
    let connection = Connection::connect(&cfg).await?;

    connection.disconnect().await;
    connection.disconnect().await; // idempotent: no panic, no hang

    let result = connection.send_noop().await;
    assert!(result.is_err());

    server.abort();
    Ok(())
}
