//! Command Handlers Module
//!
//! This module contains handlers for the default copy operation and the
//! CLI subcommands.

pub mod copy;
pub mod dump;
