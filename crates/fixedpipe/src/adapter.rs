//! Adapter enumeration and display mode validation.
//!
//! [`AdapterBackend`] abstracts over however the platform reports adapters;
//! [`DeviceManager`] sits on top, clamps each adapter's capabilities through
//! [`HardwareCaps::from_raw`] and restricts display mode enumeration to the
//! adapter's desktop format.

use tracing::{debug, warn};

use crate::caps::{HardwareCaps, RawCaps, DX_SUPPORT_LEVEL};

/// Display surface formats the mode list can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceFormat {
    X8R8G8B8,
    A8R8G8B8,
    R5G6B5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub format: SurfaceFormat,
}

/// Raw identity of an adapter as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterIdentifier {
    pub driver_name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub subsystem_id: u32,
    pub revision: u32,
    pub driver_version: u64,
}

/// Adapter identity plus the DX level this hardware class reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub driver_name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub subsystem_id: u32,
    pub revision: u32,
    pub driver_version: u64,
    pub dx_support_level: u32,
    pub max_dx_support_level: u32,
}

/// Platform source of adapters, caps and display modes.
pub trait AdapterBackend {
    fn adapter_count(&self) -> usize;

    fn adapter_identifier(&self, adapter: usize) -> Option<AdapterIdentifier>;

    fn raw_caps(&self, adapter: usize) -> Option<RawCaps>;

    /// The format the desktop currently runs in; mode enumeration is
    /// restricted to it.
    fn desktop_format(&self, adapter: usize) -> Option<SurfaceFormat>;

    fn mode_count(&self, adapter: usize, format: SurfaceFormat) -> usize;

    fn mode(&self, adapter: usize, format: SurfaceFormat, index: usize) -> Option<DisplayMode>;

    fn supports_mode(&self, adapter: usize, mode: &DisplayMode) -> bool;

    /// Reported dedicated video memory. Backends without a real number keep
    /// the 256 MiB default.
    fn video_memory_bytes(&self, _adapter: usize) -> usize {
        256 << 20
    }
}

/// Adapter-facing front of the pipeline: clamped caps per adapter plus
/// desktop-format mode listing.
pub struct DeviceManager {
    backend: Box<dyn AdapterBackend>,
    caps: Vec<Option<HardwareCaps>>,
}

impl DeviceManager {
    pub fn new(backend: Box<dyn AdapterBackend>) -> Self {
        let mut caps = Vec::with_capacity(backend.adapter_count());
        for adapter in 0..backend.adapter_count() {
            match backend.raw_caps(adapter) {
                Some(raw) => {
                    debug!(adapter, "clamping adapter caps to fixed-function feature set");
                    caps.push(Some(HardwareCaps::from_raw(&raw)));
                }
                None => {
                    warn!(adapter, "adapter reported no capabilities");
                    caps.push(None);
                }
            }
        }
        DeviceManager { backend, caps }
    }

    pub fn adapter_count(&self) -> usize {
        self.caps.len()
    }

    pub fn adapter_info(&self, adapter: usize) -> Option<AdapterInfo> {
        let identity = self.backend.adapter_identifier(adapter)?;
        Some(AdapterInfo {
            driver_name: identity.driver_name,
            vendor_id: identity.vendor_id,
            device_id: identity.device_id,
            subsystem_id: identity.subsystem_id,
            revision: identity.revision,
            driver_version: identity.driver_version,
            dx_support_level: DX_SUPPORT_LEVEL,
            max_dx_support_level: DX_SUPPORT_LEVEL,
        })
    }

    pub fn hardware_caps(&self, adapter: usize) -> Option<&HardwareCaps> {
        self.caps.get(adapter)?.as_ref()
    }

    /// Number of display modes in the adapter's desktop format.
    pub fn mode_count(&self, adapter: usize) -> usize {
        let Some(format) = self.backend.desktop_format(adapter) else {
            return 0;
        };
        self.backend.mode_count(adapter, format)
    }

    pub fn mode_info(&self, adapter: usize, index: usize) -> Option<DisplayMode> {
        let format = self.backend.desktop_format(adapter)?;
        self.backend.mode(adapter, format, index)
    }

    /// Checks a mode against the backend, logging rejected modes.
    pub fn validate_mode(&self, adapter: usize, mode: &DisplayMode) -> bool {
        let supported = self.backend.supports_mode(adapter, mode);
        if !supported {
            warn!(
                adapter,
                width = mode.width,
                height = mode.height,
                refresh = mode.refresh_rate,
                "rejecting unsupported display mode"
            );
        }
        supported
    }

    pub fn video_memory_bytes(&self, adapter: usize) -> usize {
        self.backend.video_memory_bytes(adapter)
    }
}
