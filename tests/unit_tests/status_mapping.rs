// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Every `StatusCode` the wire protocol defines must map to exactly one
//! `Status` variant; the in-module test in `src/status.rs` only spot
//! checks a few, this enumerates all of them.

use kinetic_client_rs::{status::Status, wire::proto::command::StatusCode};

#[test]
fn every_protocol_status_code_maps_without_panicking() {
    let all = [
        StatusCode::InvalidStatusCode,
        StatusCode::NotAttempted,
        StatusCode::Success,
        StatusCode::HmacFailure,
        StatusCode::NotAuthorized,
        StatusCode::VersionFailure,
        StatusCode::InternalError,
        StatusCode::HeaderRequired,
        StatusCode::NotFound,
        StatusCode::VersionMismatch,
        StatusCode::ServiceBusy,
        StatusCode::Expired,
        StatusCode::DataError,
        StatusCode::PermDataError,
        StatusCode::RemoteConnectionError,
        StatusCode::NoSpace,
        StatusCode::NoSuchHmacAlgorithm,
        StatusCode::InvalidRequest,
        StatusCode::NestedOperationErrors,
        StatusCode::DeviceLocked,
        StatusCode::DeviceAlreadyUnlocked,
        StatusCode::ConnectionTerminated,
        StatusCode::InvalidBatch,
    ];
    for code in all {
        let status = Status::from(code);
        if code == StatusCode::Success {
            assert!(status.is_success());
        } else {
            assert!(!status.is_success());
        }
    }
}
