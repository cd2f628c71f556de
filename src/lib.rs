//! Core library for the `stampede` CLI.
//!
//! This crate provides the building blocks used by the binary: the scenario
//! configuration model, the setup and iteration bodies, the virtual-user
//! engine (scheduling, metrics aggregation, threshold evaluation), and the
//! terminal output helpers. The primary user-facing interface is the
//! `stampede` command-line application.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod scenario;
pub mod ui;
pub mod utils;
