//! Shared constants for end-to-end tests
//!
//! When seeded users or upload samples change, update only this file.

// ============================================================================
// Seeded users
// ============================================================================

pub const ALICE_USER: &str = "alice";
pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASS: &str = "alicepass123";

pub const BOB_USER: &str = "bob";
pub const BOB_EMAIL: &str = "bob@example.com";
pub const BOB_PASS: &str = "bobpass123";

// ============================================================================
// Upload samples
// ============================================================================

/// Smallest byte sequence `infer` recognizes as `video/mp4`.
pub const MP4_BYTES: [u8; 32] = [
    0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0, 0, 2, 0, b'i', b's', b'o',
    b'm', b'i', b's', b'o', b'2', 0, 0, 0, 8, b'f', b'r', b'e', b'e',
];

/// PNG signature followed by padding, enough for `infer`.
pub const PNG_BYTES: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// An id that never exists in a fresh database.
pub const MISSING_ID: &str = "00000000-0000-4000-8000-000000000000";

// ============================================================================
// Timing
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const TEST_MAX_UPLOAD_BYTES: usize = 1024 * 1024;
