// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! The closed status taxonomy every operation completes with, and the
//! internal transport-outcome enum that feeds it.
//!
//! Grounded on `spec.md` §3/§4.3 and on the original C controller's
//! `bus_to_kinetic_status`/`bus_error_string` (`kinetic_controller.c`).

use crate::wire::proto::command::StatusCode as ProtoStatusCode;

/// Outcome of a single delivery attempt as seen by the [`Transport`]
/// (`crate::transport::bus::Transport`), before it has been translated to a
/// caller-facing [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOutcome {
    Success,
    TxTimeout,
    TxFailure,
    RxTimeout,
    RxFailure,
    BadResponse,
    UnregisteredSocket,
    RxTimeoutInternal,
    Undefined,
}

impl TransportOutcome {
    /// Maps a transport outcome to the public status taxonomy, per
    /// `spec.md` §4.3's table.
    pub fn to_status(self) -> Status {
        match self {
            TransportOutcome::Success => Status::Success,
            TransportOutcome::TxTimeout => Status::SocketTimeout,
            TransportOutcome::TxFailure => Status::SocketError,
            TransportOutcome::RxTimeout => Status::OperationTimedOut,
            TransportOutcome::RxFailure => Status::SocketError,
            TransportOutcome::BadResponse => Status::SocketError,
            TransportOutcome::UnregisteredSocket => Status::SocketError,
            TransportOutcome::RxTimeoutInternal => Status::OperationTimedOut,
            TransportOutcome::Undefined => {
                debug_assert!(false, "bus_to_kinetic_status: UNMATCHED outcome");
                Status::Invalid
            },
        }
    }
}

/// The closed, caller-facing status enumeration. Every completed operation
/// carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    SocketError,
    SocketTimeout,
    OperationTimedOut,
    Invalid,
    DataError,

    NotAttempted,
    HmacFailure,
    NotAuthorized,
    VersionFailure,
    InternalError,
    HeaderRequired,
    NotFound,
    VersionMismatch,
    ServiceBusy,
    Expired,
    PermDataError,
    RemoteConnectionError,
    NoSpace,
    NoSuchHmacAlgorithm,
    InvalidRequest,
    NestedOperationErrors,
    DeviceLocked,
    DeviceAlreadyUnlocked,
    ConnectionTerminated,
    InvalidBatch,
}

impl Status {
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl From<ProtoStatusCode> for Status {
    fn from(code: ProtoStatusCode) -> Self {
        match code {
            ProtoStatusCode::InvalidStatusCode => Status::Invalid,
            ProtoStatusCode::NotAttempted => Status::NotAttempted,
            ProtoStatusCode::Success => Status::Success,
            ProtoStatusCode::HmacFailure => Status::HmacFailure,
            ProtoStatusCode::NotAuthorized => Status::NotAuthorized,
            ProtoStatusCode::VersionFailure => Status::VersionFailure,
            ProtoStatusCode::InternalError => Status::InternalError,
            ProtoStatusCode::HeaderRequired => Status::HeaderRequired,
            ProtoStatusCode::NotFound => Status::NotFound,
            ProtoStatusCode::VersionMismatch => Status::VersionMismatch,
            ProtoStatusCode::ServiceBusy => Status::ServiceBusy,
            ProtoStatusCode::Expired => Status::Expired,
            ProtoStatusCode::DataError => Status::DataError,
            ProtoStatusCode::PermDataError => Status::PermDataError,
            ProtoStatusCode::RemoteConnectionError => Status::RemoteConnectionError,
            ProtoStatusCode::NoSpace => Status::NoSpace,
            ProtoStatusCode::NoSuchHmacAlgorithm => Status::NoSuchHmacAlgorithm,
            ProtoStatusCode::InvalidRequest => Status::InvalidRequest,
            ProtoStatusCode::NestedOperationErrors => Status::NestedOperationErrors,
            ProtoStatusCode::DeviceLocked => Status::DeviceLocked,
            ProtoStatusCode::DeviceAlreadyUnlocked => Status::DeviceAlreadyUnlocked,
            ProtoStatusCode::ConnectionTerminated => Status::ConnectionTerminated,
            ProtoStatusCode::InvalidBatch => Status::InvalidBatch,
        }
    }
}
