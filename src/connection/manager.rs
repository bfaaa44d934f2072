//! Opening connections from model descriptors.

use super::{Connection, SqliteConnection, WorkerConnection};
use crate::config::{Driver, ModelDescriptor};
use crate::error::ConnectionError;
use crate::observe::{ExecContext, Operation};

/// Opens connections. Single attempt, no retries.
pub struct ConnectionManager;

impl ConnectionManager {
    /// Open a connection to the source a descriptor names.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::DriverNotFound`] when the database file or worker
    /// binary cannot be located, [`ConnectionError::Handshake`] when it is
    /// found but refuses the connection.
    pub async fn open(
        descriptor: &ModelDescriptor,
        ctx: &ExecContext,
    ) -> Result<Box<dyn Connection>, ConnectionError> {
        let mut unit = ctx.unit(Operation::Connect);
        unit.attribute("driver", descriptor.driver.as_str());
        unit.attribute("model", descriptor.model.clone());

        let result = match descriptor.driver {
            Driver::Sqlite => {
                SqliteConnection::open(descriptor).map(|c| Box::new(c) as Box<dyn Connection>)
            }
            Driver::Worker => WorkerConnection::open(descriptor)
                .await
                .map(|c| Box::new(c) as Box<dyn Connection>),
        };
        unit.finish_with(result)
    }
}
