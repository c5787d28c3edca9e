use crate::error::CommonError;
use crate::libsql::{Connection, Migrations, run_migrations};

pub async fn setup_in_memory_database(
    migrations: Migrations<'_>,
) -> Result<(libsql::Database, Connection), CommonError> {
    let db = libsql::Builder::new_local(":memory:").build().await?;
    let conn = Connection::new(db.connect()?);

    run_migrations(&conn, &migrations).await?;
    Ok((db, conn))
}
