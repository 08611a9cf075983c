use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::layout::Layout;
use crate::types::{DataType, TypedValue};

/// Highest standard (11-bit) CAN identifier.
const MAX_STANDARD_ID: u16 = 0x07FF;

type Result<T> = std::result::Result<T, LayoutError>;

/// On-disk shape of a layout file.
///
/// ```json
/// { "layouts": { "1": ["u16", "u24", "i16"], "0x14": ["f32", "f32"] } }
/// ```
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutDocument {
    layouts: BTreeMap<String, Layout>,
}

/// CAN-ID-keyed registry of payload layouts.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: HashMap<u16, Layout>,
    config: LayoutConfig,
}

impl LayoutRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            layouts: HashMap::new(),
            config,
        }
    }

    /// Register the layout for a CAN ID, replacing any previous one.
    pub fn register(&mut self, id: u16, layout: impl Into<Layout>) -> Result<()> {
        if id > MAX_STANDARD_ID {
            return Err(LayoutError::InvalidId(id.to_string()));
        }
        self.layouts.insert(id, layout.into());
        Ok(())
    }

    /// Register a layout given as a JSON array of type names.
    pub fn register_json(&mut self, id: u16, layout_json: &str) -> Result<()> {
        let layout: Layout = serde_json::from_str(layout_json)?;
        self.register(id, layout)
    }

    /// Load a layout document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_str_with_config(json, LayoutConfig::default())
    }

    /// Load a layout document from a JSON string with explicit config.
    pub fn from_json_str_with_config(json: &str, config: LayoutConfig) -> Result<Self> {
        let document: LayoutDocument = serde_json::from_str(json)?;
        let mut registry = Self::with_config(config);
        for (key, layout) in document.layouts {
            let id = parse_id(&key).ok_or(LayoutError::InvalidId(key))?;
            registry.register(id, layout)?;
        }
        Ok(registry)
    }

    /// Load a layout document from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, LayoutConfig::default())
    }

    /// Load a layout document from a file with explicit config.
    pub fn from_file_with_config(path: &Path, config: LayoutConfig) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| LayoutError::LoadFailed(format!("{}: {err}", path.display())))?;

        let max_bytes = config.max_file_size;
        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| LayoutError::LoadFailed(format!("{}: {err}", path.display())))?;
        if content.len() > max_bytes {
            return Err(LayoutError::LoadFailed(format!(
                "layout file too large (max {max_bytes} bytes): {}",
                path.display()
            )));
        }

        let registry = Self::from_json_str_with_config(&content, config)?;
        debug!(path = %path.display(), count = registry.layouts.len(), "loaded layouts");
        Ok(registry)
    }

    /// Build from layouts compiled into the program.
    pub fn from_embedded(layouts: &[(u16, &[DataType])]) -> Result<Self> {
        let mut registry = Self::new();
        for (id, types) in layouts {
            registry.register(*id, Layout::new(types.to_vec()))?;
        }
        Ok(registry)
    }

    /// Decode a payload with the layout registered for `id`.
    ///
    /// Returns `Ok(None)` for unknown IDs unless `fail_on_missing_layout` is set.
    pub fn decode(&self, id: u16, data: &[u8]) -> Result<Option<Vec<TypedValue>>> {
        match self.layouts.get(&id) {
            Some(layout) => Ok(Some(layout.unpack(data)?)),
            None if self.config.fail_on_missing_layout => Err(LayoutError::NoLayout(id)),
            None => Ok(None),
        }
    }

    /// Layout registered for `id`.
    pub fn layout(&self, id: u16) -> Option<&Layout> {
        self.layouts.get(&id)
    }

    /// Check if an ID has a registered layout.
    pub fn has_layout(&self, id: u16) -> bool {
        self.layouts.contains_key(&id)
    }

    /// IDs that have registered layouts, ascending.
    pub fn ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.layouts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get registry configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }
}

fn parse_id(key: &str) -> Option<u16> {
    let key = key.trim();
    let digits = key.trim_start_matches("0x").trim_start_matches("0X");
    if !digits.starts_with(|c: char| c.is_ascii_hexdigit()) {
        return None;
    }
    let id = match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok()?,
        None => key.parse().ok()?,
    };
    (id <= MAX_STANDARD_ID).then_some(id)
}
