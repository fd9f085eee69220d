use std::future::Future;

use bb8::ManageConnection;
use mysql_async::{Conn, Opts};

use crate::pool::SessionConn;

/// bb8 manager for `MySQL` connections.
pub struct MyManager {
    pub(crate) opts: Opts,
}

impl MyManager {
    #[must_use]
    pub fn new(opts: Opts) -> Self {
        Self { opts }
    }
}

impl ManageConnection for MyManager {
    type Connection = SessionConn<Conn>;
    type Error = mysql_async::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let opts = self.opts.clone();
        async move {
            tracing::debug!(
                host = %opts.ip_or_hostname(),
                port = opts.tcp_port(),
                db = ?opts.db_name(),
                "mysql connect"
            );
            let conn = Conn::new(opts).await?;
            Ok(SessionConn::new(conn))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.conn.ping().await }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.in_transaction
    }
}
