#![feature(io_error_more)]
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

//! dodot: a pack-based dotfiles deployment manager.

pub mod actions;
pub mod checksum;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod error;
pub mod exec;
pub mod fsys;
pub mod handlers;
pub mod logging;
pub mod packs;
pub mod paths;
pub mod pipeline;
pub mod rules;
pub mod status;
