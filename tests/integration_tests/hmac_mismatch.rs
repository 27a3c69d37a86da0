// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Scenario 4: a corrupted HMAC on a reply surfaces as `DATA_ERROR`
//! without tearing down the session — the next operation on the same
//! connection still succeeds.

use anyhow::Result;
use kinetic_client_rs::{status::Status, wire::proto::command::StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::integration_tests::common::{
    ValueEchoBuilder, bind_loopback, connect_client, encode_reply, encode_unsolicited_status,
};

async fn read_one_request(socket: &mut tokio::net::TcpStream) {
    let mut header = [0u8; kinetic_client_rs::wire::framer::HEADER_LEN];
    socket.read_exact(&mut header).await.expect("read header");
    let parsed = kinetic_client_rs::wire::framer::decode_header(&header).expect("header");
    let mut body = vec![0u8; (parsed.protobuf_len + parsed.value_len) as usize];
    socket.read_exact(&mut body).await.expect("read body");
}

#[tokio::test]
async fn tampered_hmac_yields_data_error_and_the_session_survives() -> Result<()> {
    let (listener, addr) = bind_loopback().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        socket
            .write_all(&encode_unsolicited_status(1))
            .await
            .expect("write handshake");

        read_one_request(&mut socket).await;
        let corrupted = encode_reply(1, StatusCode::Success, b"value-one", true);
        socket.write_all(&corrupted).await.expect("write corrupted reply");

        read_one_request(&mut socket).await;
        let good = encode_reply(2, StatusCode::Success, b"value-two", false);
        socket.write_all(&good).await.expect("write good reply");

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    });

    let (session, _transport, controller) = connect_client(addr).await;
    session.wait_ready().await;

    let first = controller.execute(&ValueEchoBuilder).await;
    assert_eq!(first.unwrap_err(), Status::DataError);

    let second = controller.execute(&ValueEchoBuilder).await;
    assert_eq!(second.expect("ok").to_vec(), b"value-two".to_vec());

    server.abort();
    Ok(())
}
