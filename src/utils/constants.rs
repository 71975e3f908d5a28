/// Descriptor-line markers written by the Geo Data Portal
pub const MARKER_MEAN_MM: &str = "MEAN(mm)";
pub const MARKER_MEAN_CELSIUS: &str = "MEAN(C)";

/// File-name markers that separate minimum from maximum temperature
pub const FILE_MARKER_TMIN: &str = "tmin";
pub const FILE_MARKER_TMAX: &str = "tmax";

/// Source preamble: name, units and descriptor lines before the data rows
pub const DEFAULT_HEADER_LINES: usize = 3;
/// Line of the preamble (1-based) that carries the quantity markers
pub const DESCRIPTOR_LINE: usize = 3;

/// File extensions
pub const SOURCE_EXTENSION: &str = "csv";
pub const CBH_EXTENSION: &str = "prms";

/// Directory names
pub const DEFAULT_INPUT_DIR: &str = "outfiles";
pub const DEFAULT_OUTPUT_DIR: &str = "cbh";
pub const DEFAULT_CONFIG_FILE: &str = "cbh-processor.toml";

/// CBH layout
pub const CBH_LINE_ENDING: &str = "\r\n";
pub const CBH_SEPARATOR_WIDTH: usize = 40;
pub const CBH_LABEL_GAP: &str = "      ";
pub const CBH_DECIMALS: usize = 4;

/// Unit conversion
pub const MM_PER_INCH: f64 = 25.4;
/// Precipitation at or below this depth (mm) is written as exactly zero
pub const PRECIP_ZERO_THRESHOLD_MM: f64 = 5e-5;

pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
