//! HTTP surface over the consistency engine.
//!
//! A thin layer: handlers parse ids and JSON bodies, call one engine
//! operation, and serialize its result. All ledger invariants live below
//! this crate.

pub mod app;
