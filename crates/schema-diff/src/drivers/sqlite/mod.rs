//! SQLite driver.

mod reader;

pub use reader::SqliteIntrospector;
