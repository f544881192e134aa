pub mod connection;
pub mod migrations;
pub mod writer;

pub use connection::{connect, connect_warehouse, connect_with_settings, DbPool};
pub use writer::{
    AppendReceipt, AppendedBatch, Destination, InMemoryRowSetWriter, RowSetWriter,
    SqlRowSetWriter, WriterError,
};
