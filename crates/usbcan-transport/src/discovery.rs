//! Serial device discovery.
//!
//! The host's port enumeration is hidden behind [`PortLister`] so device
//! selection can be tested without hardware.

use tracing::debug;

use crate::error::{Result, TransportError};

/// USB product string reported by the adapter firmware.
pub const DEFAULT_DEVICE: &str = "usb-can";

/// A serial port as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS device identifier, e.g. `/dev/ttyACM0` or `COM3`.
    pub name: String,
    /// Human-readable description; the USB product string for USB ports.
    pub description: Option<String>,
}

impl PortInfo {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_owned),
        }
    }
}

/// Source of available serial ports.
pub trait PortLister {
    fn list_ports(&self) -> Result<Vec<PortInfo>>;
}

impl<F> PortLister for F
where
    F: Fn() -> Result<Vec<PortInfo>>,
{
    fn list_ports(&self) -> Result<Vec<PortInfo>> {
        self()
    }
}

/// Which port attribute a [`DeviceSelector`] compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchBy {
    /// Exact OS device name.
    Name,
    /// Exact description.
    #[default]
    Description,
    /// Description starts with the pattern.
    DescriptionPrefix,
}

/// Picks one port out of the host's port list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    /// Name or description to match.
    pub device: String,
    /// Attribute to match on.
    pub match_by: MatchBy,
    /// Zero-based index among matching ports, for hosts with several adapters.
    pub index: usize,
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            match_by: MatchBy::default(),
            index: 0,
        }
    }
}

impl DeviceSelector {
    /// Select by exact OS device name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            device: name.into(),
            match_by: MatchBy::Name,
            index: 0,
        }
    }

    /// Select by exact description.
    pub fn by_description(description: impl Into<String>) -> Self {
        Self {
            device: description.into(),
            match_by: MatchBy::Description,
            index: 0,
        }
    }

    /// Pick the `index`-th match instead of the first.
    pub fn nth(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Whether `port` matches this selector (ignoring the index).
    pub fn matches(&self, port: &PortInfo) -> bool {
        match self.match_by {
            MatchBy::Name => port.name == self.device,
            MatchBy::Description => port.description.as_deref() == Some(self.device.as_str()),
            MatchBy::DescriptionPrefix => port
                .description
                .as_deref()
                .is_some_and(|desc| desc.starts_with(&self.device)),
        }
    }

    /// Resolve the selector against a lister and return the chosen port.
    pub fn select(&self, lister: &dyn PortLister) -> Result<PortInfo> {
        let ports = lister.list_ports()?;
        debug!(count = ports.len(), device = %self.device, "enumerated serial ports");

        ports
            .into_iter()
            .filter(|port| self.matches(port))
            .nth(self.index)
            .ok_or_else(|| TransportError::DeviceNotFound(self.to_string()))
    }
}

impl std::fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.match_by {
            MatchBy::Name => "name",
            MatchBy::Description => "description",
            MatchBy::DescriptionPrefix => "description prefix",
        };
        write!(f, "{kind} {:?} (index {})", self.device, self.index)
    }
}
