/// Widest query or calendar window, in days (inclusive).
pub const MAX_QUERY_DAYS: i64 = 366;

/// Longest cleaning/prep buffer a caller may apply after each booking.
pub const MAX_BUFFER_DAYS: u32 = 31;

/// Upper bound on concurrently loaded studio snapshots.
pub const MAX_STUDIOS: usize = 10_000;

pub const MAX_STUDIO_NAME_LEN: usize = 128;
