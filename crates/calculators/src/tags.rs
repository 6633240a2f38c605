//! Well-known port tags and side-parameter keys for the filter chain.

/// Output tag of the pixelate stage.
pub const TAG_PIXELATED: &str = "pixelated";

/// Output tag of the dither stage.
pub const TAG_DITHERED: &str = "dithered";

/// Output tag of the grayscale stage.
pub const TAG_GRAYSCALE: &str = "grayscale";

// Side-parameter keys

/// Pixelation block size (i32).
pub const PARAM_PIXEL_SIZE: &str = "pixel_size";

/// Pixelation block shape (contracts::PixelShape).
pub const PARAM_PIXEL_SHAPE: &str = "pixel_shape";

/// Red channel quantization levels (i32).
pub const PARAM_RED_LEVELS: &str = "red_levels";

/// Green channel quantization levels (i32).
pub const PARAM_GREEN_LEVELS: &str = "green_levels";

/// Blue channel quantization levels (i32).
pub const PARAM_BLUE_LEVELS: &str = "blue_levels";

/// Dithering spread (i32).
pub const PARAM_SPREAD: &str = "spread";

/// Bayer matrix level: 0 = 2x2, 1 = 4x4, 2 = 8x8 (i32).
pub const PARAM_BAYER_LEVEL: &str = "bayer_level";

/// Banner overlay bitmap (imaging::Image, RGBA).
pub const PARAM_BANNER_IMAGE: &str = "banner_image";

/// Banner overlay X offset in pixels (i32).
pub const PARAM_OVERLAY_X: &str = "overlay_x";

/// Banner overlay Y offset in pixels (i32).
pub const PARAM_OVERLAY_Y: &str = "overlay_y";
