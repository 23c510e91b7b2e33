// Default values for configuration
// These serve as fallback values and can be used for "reset to defaults" functionality
pub const DEFAULT_MAX_TILES: usize = 21;
pub const DEFAULT_VISIBLE_TILES: usize = 5;
pub const DEFAULT_QUALITY: Quality = Quality::Good;
pub const DEFAULT_SHOW_BLACK_BARS: bool = true;

/// Texture quality tier. The value is the square texture dimension
/// tiles are letterboxed into before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Low,
    Good,
    Best,
}

impl Quality {
    pub fn image_size(&self) -> u32 {
        match self {
            Quality::Low => 256,
            Quality::Good => 512,
            Quality::Best => 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub max_tiles: usize,           // Max entries in the tile cache
    pub visible_tiles: usize,       // Visible tiles left and right of the center
    pub quality: Quality,           // Texture size tier (256/512/1024)
    pub show_black_bars: bool,      // Letterbox with opaque bars instead of transparent padding
}

impl Config {
    /// The square texture dimension for the configured quality tier.
    pub fn image_size(&self) -> u32 {
        self.quality.image_size()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tiles: DEFAULT_MAX_TILES,
            visible_tiles: DEFAULT_VISIBLE_TILES,
            quality: DEFAULT_QUALITY,
            show_black_bars: DEFAULT_SHOW_BLACK_BARS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_tiers() {
        assert_eq!(Quality::Low.image_size(), 256);
        assert_eq!(Quality::Good.image_size(), 512);
        assert_eq!(Quality::Best.image_size(), 1024);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_tiles, 21);
        assert_eq!(config.visible_tiles, 5);
        assert_eq!(config.image_size(), 512);
        assert!(config.show_black_bars);
    }
}
