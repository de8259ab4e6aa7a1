// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cosmos side of the link: the destination account and the gateway chain.

pub mod address;
pub mod amino;
pub mod gateway;

pub use amino::{CosmosKeySigner, StdSignDoc};
pub use gateway::{GatewayError, GatewayExecuteMsg, GatewayTransport, TxResult};
