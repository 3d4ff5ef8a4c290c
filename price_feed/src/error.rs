//! Error types shared by the feed library, server and client.
//!
//! The `FeedError` enum unifies the failure cases for I/O, wire encoding, seed
//! validation and quote sources, so every crate in the workspace can propagate a
//! single error type.
use std::io;

use thiserror::Error;

/// Unified error type for the price feed workspace.
#[derive(Error, Debug)]
pub enum FeedError {
    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// A line of a seed file could not be parsed; contains the line number and reason.
    #[error("Parse seed file error at line {line}: {reason}")]
    ParseSeedFile {
        /// 1-based line number in the seed file.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The same symbol was seeded twice (compared case-insensitively).
    #[error("Duplicate symbol in seed: {0}")]
    DuplicateSymbol(String),

    /// An empty seed list or an empty symbol was supplied.
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// A price that is not finite and strictly positive.
    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice {
        /// Symbol the price was reported for.
        symbol: String,
        /// Offending value.
        price: f64,
    },

    /// The quote source failed to produce a batch.
    #[error("Quote source error: {0}")]
    Source(String),

    /// The quote source produced a batch that does not cover every seeded symbol.
    #[error("Incomplete batch: missing {0}")]
    IncompleteBatch(String),

    /// Failure while decoding with `bincode` (invalid or truncated payloads, etc.).
    #[error("Bincode serialization/deserialization error: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),

    /// Failure while encoding with `bincode`.
    #[error("Bincode serialization/deserialization error: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// A worker thread could not be spawned.
    #[error("Thread spawn failed: {0}")]
    Spawn(String),
}

impl<T> From<crossbeam_channel::SendError<T>> for FeedError {
    fn from(err: crossbeam_channel::SendError<T>) -> Self {
        FeedError::ChannelSend(err.to_string())
    }
}

impl From<crossbeam_channel::RecvError> for FeedError {
    fn from(err: crossbeam_channel::RecvError) -> Self {
        FeedError::ChannelRecv(err.to_string())
    }
}
