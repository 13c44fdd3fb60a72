//! Connection establishment for the schema extractor.
//!
//! Wraps `may_postgres::connect` and puts the session into read-only mode
//! right away; every query the extractor issues is a catalog read. This is a
//! blocking call that works within coroutines. Cancellation and timeout
//! semantics are whatever the driver provides natively.

use may_postgres::Client;

use crate::config::DbConfig;
use crate::error::Result;

/// Open a connection and mark the session read-only.
///
/// # Errors
///
/// Returns `GisError::Postgres` when the connection cannot be established
/// or the session setup statement fails.
pub fn connect(config: &DbConfig) -> Result<Client> {
    let client = may_postgres::connect(&config.conn_string())?;
    client.execute("SET default_transaction_read_only = on", &[])?;
    Ok(client)
}
