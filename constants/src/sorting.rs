/// Bits examined per radix pass
pub const RADIX_BITS: u32 = 4;

/// Buckets per pass (one per digit value)
pub const RADIX_BUCKETS: usize = 1 << RADIX_BITS;

/// Mask extracting one digit after shifting
pub const RADIX_MASK: u32 = (RADIX_BUCKETS as u32) - 1;

/// Smallest supported pass count (8-bit keys)
pub const MIN_PASS_COUNT: u8 = 2;

/// Largest supported pass count (16-bit keys)
pub const MAX_PASS_COUNT: u8 = 4;

/// Key written into padding cells so they sort behind every valid element
pub const PADDING_KEY: f32 = 1.0;

/// Index written into padding cells; never a valid element index
pub const PADDING_INDEX: f32 = -1.0;

/// Number of sorts between periodic debug log lines
pub const DEBUG_LOG_INTERVAL: u32 = 60;
