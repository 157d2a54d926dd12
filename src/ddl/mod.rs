//! Table definition module
//!
//! Renders one external table definition per offer from the schema the
//! partitioned writer actually observed.
//!
//! # Overview
//!
//! A [`TableDefinition`] is a small data model (offer, ordered columns,
//! partition flag, data location) rendered through `Display`. Every column is
//! declared as `string`; the `location` partition clause is only emitted when
//! the schema-capturing row had a location.

mod definition;

pub use definition::{
    create_database_statement, repair_statement, table_name_from_file, TableDefinition,
    DDL_FILE_EXTENSION, DDL_FILE_PREFIX,
};
