//! Definitions of errors that can occur while deploying and upgrading proxies

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the proxy scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// No artifact matches the requested contract name
    ArtifactNotFound(String),
    /// Error parsing a compilation artifact
    ArtifactParsing(String),
    /// The given address does not hold an ERC-1967 proxy
    ProxyNotFound(String),
    /// Error submitting a transaction or waiting for its confirmation
    Network(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error reading the deployments file
    ReadDeployments(String),
    /// Error writing the deployments file
    WriteDeployments(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ArtifactNotFound(s) => write!(f, "artifact not found: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ProxyNotFound(s) => write!(f, "proxy not found: {}", s),
            ScriptError::Network(s) => write!(f, "network error: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
        }
    }
}

impl Error for ScriptError {}
