/// Maximum number of records a single list request may return
pub const MAX_PAGE_SIZE: i64 = 1000;

/// MIME type used when neither the client nor the file extension provides one
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Filename recorded when a multipart part carries none
pub const UNNAMED_FILE: &str = "unnamed";

/// Longest sanitized filename suffix kept in a physical name, in bytes
pub const MAX_PHYSICAL_SUFFIX_LEN: usize = 128;

/// Allowance for multipart framing on top of the configured upload size
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;
