// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM source chain integration.
//!
//! This module provides functionality for:
//! - Loading source account keys and personal-sign signing
//! - The table of source chains the destination verifier knows
//! - Sending the bridge transaction and reading its receipt

pub mod bridge;
pub mod signing;
pub mod types;

pub use bridge::{AlloyBridgeTransport, BridgeReceipt, BridgeTransport};
pub use signing::EvmKeySigner;
pub use types::*;
