//! Fixed-function rendering pipeline for DX8-class hardware.
//!
//! This crate models the render-state side of a D3D9-era fixed-function
//! renderer: a shadowed state engine with snapshot/commit semantics
//! ([`state`]), translation of engine materials onto texture stage setups
//! ([`material`]), locked vertex/index buffers with ranged indexed drawing
//! ([`mesh`]), and adapter capability clamping ([`adapter`], [`caps`]).
//! Everything drives a backend through the narrow [`device::NativeDevice`]
//! trait; [`trace::RecordingDevice`] is a log-only implementation used
//! heavily by the tests.
//!
//! The [`Context`] object owns the optional device and the pipeline layers.
//! All state mutation works without a device; device work is skipped until
//! one is attached.

pub mod adapter;
pub mod caps;
pub mod context;
pub mod device;
pub mod error;
pub mod material;
pub mod mesh;
pub mod state;
pub mod trace;

pub use fixedpipe_math as math;

pub use context::Context;
pub use error::Error;
