mod versioned_schema;

pub use versioned_schema::{
    create_index, open_versioned, stored_version, Column, ForeignKey, ForeignKeyAction, Index,
    SqlType, Table, VersionedSchema, BASE_DB_VERSION,
};
