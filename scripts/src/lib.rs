//! Scripts for deploying contracts behind upgradeable proxies, and upgrading them.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod calldata;
pub mod cli;
pub mod client;
mod commands;
pub mod config;
pub mod constants;
pub mod deployments;
pub mod errors;
pub mod orchestrator;
pub mod proxy;
mod solidity;
pub mod types;
