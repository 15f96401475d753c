//! Fixed layout of a PWS3 file.
//!
//! ```text
//! 0     4   "PWS3"
//! 4     32  salt
//! 36    4   iterations (u32 LE)
//! 40    32  SHA-256 of the stretched key
//! 72    32  key K, Twofish-ECB wrapped
//! 104   32  key L, Twofish-ECB wrapped
//! 136   16  CBC IV
//! 152   ..  Twofish-CBC field stream
//! -48   16  "PWS3-EOFPWS3-EOF"
//! -32   32  HMAC-SHA256(L) over every field payload
//! ```

use std::ops::Range;

use crate::crypto::BLOCK_SIZE;

pub const TAG: &[u8; 4] = b"PWS3";
pub const EOF: &[u8; 4] = b"-EOF";

pub const SALT: Range<usize> = 4..36;
pub const ITERATIONS: Range<usize> = 36..40;
pub const KEY_HASH: Range<usize> = 40..72;
pub const WRAPPED_K: Range<usize> = 72..104;
pub const WRAPPED_L: Range<usize> = 104..136;
pub const IV: Range<usize> = 136..152;
pub const BODY_START: usize = 152;

/// Tag/eof pairs plus the HMAC.
pub const TRAILER_LENGTH: usize = 48;
pub const HMAC_LENGTH: usize = 32;

/// Smallest file that can hold the fixed parts.
pub const MIN_FILE_LENGTH: usize = 200;

/// Fewest stretching iterations a save will write.
pub const MIN_ITERATIONS: u32 = 2048;

/// Type byte closing the header block and every record group.
pub const END_OF_ENTRY: u8 = 0xFF;

/// Length and type prefix of a field block.
pub const FIELD_PREFIX_LENGTH: usize = 5;

/// Size of the block holding a field of `length` payload bytes: prefix and
/// payload rounded up to whole cipher blocks.
pub fn padded_field_length(length: usize) -> usize {
    ((length + FIELD_PREFIX_LENGTH - 1) / BLOCK_SIZE + 1) * BLOCK_SIZE
}

/// Bytes `[len-48, len-32)` of a well-formed file.
pub fn trailer_tags() -> [u8; 16] {
    let mut tags = [0u8; 16];
    for pair in tags.chunks_exact_mut(8) {
        pair[..4].copy_from_slice(TAG);
        pair[4..].copy_from_slice(EOF);
    }
    tags
}
