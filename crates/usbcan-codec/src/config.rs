/// Controls how a [`LayoutRegistry`](crate::LayoutRegistry) treats unknown IDs and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// When true, decoding an ID without a layout returns `LayoutError::NoLayout`.
    pub fail_on_missing_layout: bool,
    /// Maximum bytes read from a layout file.
    pub max_file_size: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            fail_on_missing_layout: false,
            max_file_size: 256 * 1024,
        }
    }
}
