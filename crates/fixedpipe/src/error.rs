//! Crate-level error type aggregating the per-layer errors.

use thiserror::Error;

use crate::caps::CapsError;
use crate::device::DeviceError;
use crate::mesh::MeshError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Caps(#[from] CapsError),
}
