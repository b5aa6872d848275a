/// The ready state of a platform reader which has not started yet.
pub const READY_STATE_EMPTY: u16 = 0;

/// The ready state of a platform reader while the content is loading.
pub const READY_STATE_LOADING: u16 = 1;

/// The ready state of a platform reader once the read has finished.
pub const READY_STATE_DONE: u16 = 2;

/// The line terminator written for text parts when native endings are requested.
#[cfg(windows)]
pub const NATIVE_LINE_ENDING: &str = "\r\n";

/// The line terminator written for text parts when native endings are requested.
#[cfg(not(windows))]
pub const NATIVE_LINE_ENDING: &str = "\n";

/// The message recorded when the platform reports an error without any details.
pub const UNKNOWN_READ_ERROR: &str = "The platform reader failed without reporting an error";
