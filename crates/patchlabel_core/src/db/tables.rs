//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// Flat key-value namespace holding the count, image and label entries.
pub const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");
