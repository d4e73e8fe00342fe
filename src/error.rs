/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! error types
//!

use thiserror::Error;

/// the global error type for Biscuit
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Token {
    #[error("internal error")]
    InternalError,
    #[error("error deserializing or verifying the token: {0}")]
    Format(#[from] Format),
    #[error("the authority block must have the index 0, got {0}")]
    InvalidAuthorityIndex(u32),
    #[error("the block index does not match its position in the token: {0}")]
    InvalidBlockIndex(#[from] InvalidBlockIndex),
    #[error("multiple blocks declare the same symbols")]
    SymbolTableOverlap,
    #[error("the symbol table misses the \"authority\" or \"ambient\" symbol")]
    MissingSymbols,
    #[error("tried to convert a symbol that is not in the table: {0}")]
    UnknownSymbol(u64),
    #[error("this fact was already declared: {0}")]
    DuplicateFact(String),
    #[error("no block contains a fact named \"{0}\"")]
    FactNotFound(String),
    #[error("datalog parsing error")]
    ParseError,
    #[error("verification failed: {0}")]
    FailedLogic(#[from] Logic),
    #[error("the evaluation budget was exceeded: {0}")]
    RunLimit(#[from] RunLimit),
}

/// a block was parsed at a position that does not match its declared index
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("expected index {expected}, got {found}")]
pub struct InvalidBlockIndex {
    pub expected: u32,
    pub found: u32,
}

/// errors related to the serialization format
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Format {
    #[error("failed verifying the signature: {0}")]
    Signature(#[from] Signature),
    #[error("failed deserializing the wire format: {0}")]
    DeserializationError(String),
    #[error("failed serializing the wire format: {0}")]
    SerializationError(String),
    #[error("failed deserializing a block: {0}")]
    BlockDeserializationError(String),
    #[error("failed serializing a block: {0}")]
    BlockSerializationError(String),
    #[error("the token does not carry one public key per block")]
    InvalidKeyCount,
    #[error("invalid key size: {0}")]
    InvalidKeySize(usize),
    #[error("could not decode a group element or scalar")]
    InvalidKey,
    #[error("the root public key is not the one that signed this token")]
    UnknownPublicKey,
}

/// signature aggregation errors
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    #[error("the signature elements do not have matching lengths")]
    InvalidFormat,
    #[error("the signature did not match")]
    InvalidSignature,
}

/// errors in the datalog evaluation of caveats
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Logic {
    #[error("an authority fact does not start with #authority: {0}")]
    InvalidAuthorityFact(String),
    #[error("a block cannot provide an authority or ambient fact: block {0}, fact {1}")]
    InvalidBlockFact(u32, String),
    #[error("the following caveats failed: {}", .0.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", "))]
    FailedCaveats(Vec<FailedCaveat>),
}

/// a caveat that failed, with its position in the token
#[derive(Error, Clone, Debug, PartialEq)]
pub enum FailedCaveat {
    #[error("{0}")]
    Block(FailedBlockCaveat),
    #[error("{0}")]
    Verifier(FailedVerifierCaveat),
}

#[derive(Error, Clone, Debug, PartialEq)]
#[error("Block({block_id}, {caveat_id}): {rule}")]
pub struct FailedBlockCaveat {
    pub block_id: u32,
    pub caveat_id: u32,
    /// pretty printed caveat rule
    pub rule: String,
}

#[derive(Error, Clone, Debug, PartialEq)]
#[error("Verifier({caveat_id}): {rule}")]
pub struct FailedVerifierCaveat {
    pub caveat_id: u32,
    /// pretty printed caveat rule
    pub rule: String,
}

/// the engine exceeded one of its evaluation budgets
///
/// budgets are deterministic: the same world and limits always fail
/// the same way, there is no timeout involved
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RunLimit {
    #[error("too many facts generated")]
    TooManyFacts,
    #[error("too many iterations")]
    TooManyIterations,
}
