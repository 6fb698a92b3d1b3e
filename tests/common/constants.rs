//! Shared constants for end-to-end tests
//!
//! When the seeded catalog changes, update only this file and `fixtures.rs`.

// ============================================================================
// Collections
// ============================================================================

pub const ARTISTS: &str = "artists";
pub const ALBUMS: &str = "albums";
pub const GENRES: &str = "genres";
pub const PLAYLISTS: &str = "playlists";
pub const SONGS: &str = "songs";

// ============================================================================
// Test Catalog IDs
// ============================================================================
//
// The fixture seeds a fresh database, so ids are assigned in insertion order.

/// Artist ID for "The Test Band"
pub const ARTIST_1_ID: i64 = 1;

/// Artist ID for "Jazz Ensemble"
pub const ARTIST_2_ID: i64 = 2;

/// Album ID for "First Album" by The Test Band
pub const ALBUM_1_ID: i64 = 1;

/// Album ID for "Jazz Collection" by Jazz Ensemble
pub const ALBUM_2_ID: i64 = 2;

/// Genre ID for "Rock"
pub const GENRE_1_ID: i64 = 1;

/// Genre ID for "Jazz"
pub const GENRE_2_ID: i64 = 2;

/// Playlist ID for "Road Trip"
pub const PLAYLIST_1_ID: i64 = 1;

/// Song ID for "Opening Track" on First Album, in Road Trip
pub const SONG_1_ID: i64 = 1;

/// Song ID for "Closing Track" on First Album
pub const SONG_2_ID: i64 = 2;

/// Song ID for "Smooth Jazz" on Jazz Collection, in Road Trip
pub const SONG_3_ID: i64 = 3;

/// An id no seeded entity uses
pub const MISSING_ID: i64 = 999;

// ============================================================================
// Test Catalog Names
// ============================================================================

pub const ARTIST_1_NAME: &str = "The Test Band";
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";
pub const ALBUM_1_NAME: &str = "First Album";
pub const ALBUM_2_NAME: &str = "Jazz Collection";
pub const GENRE_1_NAME: &str = "Rock";
pub const GENRE_2_NAME: &str = "Jazz";
pub const PLAYLIST_1_NAME: &str = "Road Trip";
pub const SONG_1_NAME: &str = "Opening Track";
pub const SONG_2_NAME: &str = "Closing Track";
pub const SONG_3_NAME: &str = "Smooth Jazz";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
