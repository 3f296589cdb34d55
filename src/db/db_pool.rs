use duckdb::{AccessMode, Config, Connection};
use r2d2::ManageConnection;

/// r2d2 manager for DuckDB connections. Benchmark databases are opened
/// read-only so an evaluated query can never mutate them.
pub struct DuckDBConnectionManager {
    connection_string: String,
    read_only: bool,
}

impl DuckDBConnectionManager {
    pub fn new(connection_string: String) -> Self {
        Self {
            connection_string,
            read_only: false,
        }
    }

    pub fn new_read_only(connection_string: String) -> Self {
        Self {
            connection_string,
            read_only: true,
        }
    }
}

impl ManageConnection for DuckDBConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        if self.read_only {
            let config = Config::default().access_mode(AccessMode::ReadOnly)?;
            Connection::open_with_flags(&self.connection_string, config)
        } else {
            Connection::open(&self.connection_string)
        }
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute("SELECT 1", [])?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
