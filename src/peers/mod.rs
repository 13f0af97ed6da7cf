/// peers.dat domain layer: binary decoding of the address manager database.
pub mod address;
pub mod db;
pub mod errors;
pub mod netaddr;
pub mod network;
pub mod reader;

#[cfg(test)]
pub mod fixture;

pub use address::{AddrInfo, format_time, format_timestamp};
pub use db::{PeersDb, Table};
pub use errors::PeersError;
