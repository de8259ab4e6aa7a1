// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Source chain types and constants.

/// EVM source chain known to the destination verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChain {
    /// Chain name as it appears in the packet's `sourceChainConfig`
    pub name: &'static str,
    /// Wormhole chain id used to key attestations
    pub wormhole_chain_id: u16,
}

pub const ETHEREUM: SourceChain = SourceChain {
    name: "ethereum",
    wormhole_chain_id: 2,
};

pub const BSC: SourceChain = SourceChain {
    name: "bsc",
    wormhole_chain_id: 4,
};

pub const POLYGON: SourceChain = SourceChain {
    name: "polygon",
    wormhole_chain_id: 5,
};

pub const AVALANCHE: SourceChain = SourceChain {
    name: "avalanche",
    wormhole_chain_id: 6,
};

pub const ARBITRUM: SourceChain = SourceChain {
    name: "arbitrum",
    wormhole_chain_id: 23,
};

pub const OPTIMISM: SourceChain = SourceChain {
    name: "optimism",
    wormhole_chain_id: 24,
};

pub const BASE: SourceChain = SourceChain {
    name: "base",
    wormhole_chain_id: 30,
};

/// All source chains a packet may name.
pub static KNOWN_SOURCE_CHAINS: [SourceChain; 7] =
    [ETHEREUM, BSC, POLYGON, AVALANCHE, ARBITRUM, OPTIMISM, BASE];

/// Look up a source chain by name (case-insensitive).
pub fn source_chain(name: &str) -> Option<&'static SourceChain> {
    let name = name.trim();
    KNOWN_SOURCE_CHAINS
        .iter()
        .find(|chain| chain.name.eq_ignore_ascii_case(name))
}
