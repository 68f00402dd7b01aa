//! # tc-types
//!
//! Model and wire types for waku traffic-control fault injection.
//!
//! This crate provides the types shared by the controller, the sidecar and the CLI:
//! - [`Impairment`] - A declarative network condition (latency, loss, bandwidth, clear)
//! - [`Rate`] - A validated `tc` rate such as `1mbit`
//! - [`Target`] - The node and interface an impairment is applied to
//! - [`ApplyRequest`], [`CommandName`] - The sidecar's `POST /tc/apply` contract
//! - [`ImpairmentError`] - Validation errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod impairment;
mod rate;
mod target;
mod wire;

pub use error::ImpairmentError;
pub use impairment::{Impairment, MAX_PERCENT};
pub use rate::Rate;
pub use target::{Target, DEFAULT_INTERFACE};
pub use wire::{
    ApplyRequest, ApplyResponse, BandwidthValue, CommandName, HealthResponse, LatencyValue,
    LossValue, StatsResponse,
};
