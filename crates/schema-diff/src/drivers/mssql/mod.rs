//! SQL Server driver.

mod reader;

pub use reader::MssqlIntrospector;
