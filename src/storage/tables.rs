use redb::TableDefinition;

/// File records: uuid -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Share links: token -> ShareLinkRecord (msgpack)
pub const SHARE_LINKS: TableDefinition<&str, &[u8]> = TableDefinition::new("share_links");

/// File index: file uuid -> msgpack Vec of share tokens pointing at it
pub const FILE_SHARES: TableDefinition<&str, &[u8]> = TableDefinition::new("file_shares");
