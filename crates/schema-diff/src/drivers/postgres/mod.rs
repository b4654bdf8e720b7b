//! PostgreSQL driver.

mod reader;

pub use reader::PostgresIntrospector;
