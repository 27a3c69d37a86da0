// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Scenario 3: `execute_with_completion` returns as soon as the write has
//! gone out, and only invokes its completion once the reply actually
//! arrives — proven here by holding the fake server's reply back until
//! well after the call has already returned.

use std::time::Duration;

use anyhow::Result;
use kinetic_client_rs::{status::Status, wire::proto::command::StatusCode};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    time::Instant,
};

use crate::integration_tests::common::{
    ValueEchoBuilder, bind_loopback, connect_client, encode_reply, encode_unsolicited_status,
};

const SERVER_REPLY_DELAY: Duration = Duration::from_millis(200);

#[tokio::test]
async fn execute_with_completion_returns_before_the_reply_and_completes_later() -> Result<()> {
    let (listener, addr) = bind_loopback().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        socket
            .write_all(&encode_unsolicited_status(1))
            .await
            .expect("write handshake");

        let mut header = [0u8; kinetic_client_rs::wire::framer::HEADER_LEN];
        socket.read_exact(&mut header).await.expect("read header");
        let parsed = kinetic_client_rs::wire::framer::decode_header(&header).expect("header");
        let mut body = vec![0u8; (parsed.protobuf_len + parsed.value_len) as usize];
        socket.read_exact(&mut body).await.expect("read body");

        // Hold the reply back: if `execute_with_completion` were secretly
        // awaiting the round trip, the call below would not return until
        // after this sleep elapses.
        tokio::time::sleep(SERVER_REPLY_DELAY).await;

        let reply = encode_reply(1, StatusCode::Success, b"put-ack", false);
        socket.write_all(&reply).await.expect("write reply");
    });

    let (session, _transport, controller) = connect_client(addr).await;
    session.wait_ready().await;

    let (cb_tx, cb_rx) = tokio::sync::oneshot::channel();
    let submitted_at = Instant::now();
    let submit_status = controller
        .execute_with_completion(ValueEchoBuilder, move |result| {
            let _ = cb_tx.send(result);
        })
        .await;
    let submit_elapsed = submitted_at.elapsed();

    assert_eq!(submit_status, Status::Success);
    assert!(
        submit_elapsed < SERVER_REPLY_DELAY,
        "execute_with_completion blocked on the round trip: returned after {submit_elapsed:?}, \
         but the reply was held back for {SERVER_REPLY_DELAY:?}",
    );

    let completed = tokio::time::timeout(Duration::from_secs(2), cb_rx).await??;
    assert_eq!(
        completed.expect("reply delivered").as_ref(),
        b"put-ack".as_slice()
    );

    server.abort();
    Ok(())
}
