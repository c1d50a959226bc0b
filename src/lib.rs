//! Tapedeck - in-memory HTTP interaction tapes for record/replay testing
//!
//! A [`Tape`] holds recorded request/response pairs. A proxy layer asks it
//! whether it can answer a live request ([`Tape::seek`]), to answer it
//! ([`Tape::play`]), or to remember a real exchange ([`Tape::record`]).
//! Transport, persistence and CLI concerns live outside this crate.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions
)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod match_rules;
pub mod message;
pub mod tape;

pub use config::TapeConfig;
pub use error::{Result, TapeError};
pub use match_rules::{MatchRule, MatchRuleSet, MatchRules, RequestMatcher};
pub use message::{
    BasicRequest, BasicResponse, Headers, Interaction, Message, RecordedRequest,
    RecordedResponse, Request, Response, ResponseBody,
};
pub use tape::{Tape, TapeMode};
