#![doc = "sv-worker-core: the page-building pipeline behind sv-worker."]

//! This crate holds all decision logic of the worker: reading metadata out of
//! filenames, deciding which files to inline, grouping and ordering assets
//! into a page, keeping the settings document in sync, and the sweep that
//! drives all of it for every user.
//!
//! Network access happens only through the traits in [`contract`]; concrete
//! clients live in the `sv-worker` crate.
//!
//! # Usage
//! Build a [`sweep::Coordinator`] from a [`config::WorkerConfig`] and a set of
//! [`sweep::Services`], then call `run_forever` or `run_sweep`.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod contract;
pub mod error;
pub mod link;
pub mod metadata;
pub mod metrics;
pub mod page;
pub mod render;
pub mod settings;
pub mod sweep;
pub mod transform;
