//! Data models returned by dataset reads.

/// Record model materialized from image/label entries.
pub mod record;

#[cfg(test)]
mod tests;
