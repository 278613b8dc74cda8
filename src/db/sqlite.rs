use crate::db::models::{BasicCredentials, Client, Credentials};
use crate::db::schema::SQLITE_INIT;
use crate::error::RegistryError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, error};

pub type SqlitePool = Pool<Sqlite>;

/// Storage handle for clients and their credentials.
///
/// Cloning is cheap; every clone shares the same underlying pool.
#[derive(Clone)]
pub struct ClientStorage {
    pool: SqlitePool,
}

impl ClientStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `database_url` (`:memory:`, `sqlite::memory:`,
    /// `sqlite:path/to/file.db`, or a bare path).
    ///
    /// The pool holds a single connection that is never recycled: an
    /// in-memory database only lives as long as its connection.
    pub async fn open(database_url: &str) -> Result<Self, RegistryError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await?;
        debug!(database_url, "sqlite storage opened");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for the connection to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), RegistryError> {
        // run statement by statement; each one is idempotent
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a client and, when given, its credentials in one transaction.
    /// Nothing is persisted unless both rows are.
    pub async fn insert_client(
        &self,
        full_name: &str,
        age: i64,
        credentials: Option<BasicCredentials>,
    ) -> Result<Client, RegistryError> {
        if full_name.trim().is_empty() {
            return Err(RegistryError::validation("fullName must not be empty"));
        }

        self.insert_client_tx(full_name, age, credentials)
            .await
            .inspect_err(|e| error!(error = %e, full_name, "failed to insert client"))
    }

    async fn insert_client_tx(
        &self,
        full_name: &str,
        age: i64,
        credentials: Option<BasicCredentials>,
    ) -> Result<Client, RegistryError> {
        // dropping `tx` on an early return rolls it back
        let mut tx = self.pool.begin().await?;

        let id: i64 =
            sqlx::query_scalar("INSERT INTO clients (full_name, age) VALUES (?, ?) RETURNING id")
                .bind(full_name)
                .bind(age)
                .fetch_one(&mut *tx)
                .await?;

        let credentials = match credentials {
            Some(creds) => Some(Self::insert_credentials(&mut tx, id, creds).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(Client {
            id,
            full_name: full_name.to_string(),
            age,
            credentials,
        })
    }

    /// Attach credentials to an existing client. Fails with
    /// [`RegistryError::Conflict`] if the client already has some.
    pub async fn attach_credentials(
        &self,
        client_id: i64,
        credentials: BasicCredentials,
    ) -> Result<Credentials, RegistryError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_credentials(&mut conn, client_id, credentials)
            .await
            .inspect_err(|e| error!(error = %e, client_id, "failed to insert credentials"))
    }

    async fn insert_credentials(
        conn: &mut SqliteConnection,
        client_id: i64,
        creds: BasicCredentials,
    ) -> Result<Credentials, RegistryError> {
        let row = sqlx::query_as::<_, Credentials>(
            r#"INSERT INTO client_credentials (client_id, email, password)
               VALUES (?, ?, ?)
               RETURNING id, client_id, email, password"#,
        )
        .bind(client_id)
        .bind(creds.email)
        .bind(creds.password)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// Every client joined with its credentials, if any.
    pub async fn list_clients(&self) -> Result<Vec<Client>, RegistryError> {
        let rows = sqlx::query(
            r#"SELECT c.id, c.full_name, c.age,
                      cc.id AS credentials_id, cc.email, cc.password
               FROM clients c
               LEFT JOIN client_credentials cc ON cc.client_id = c.id
               ORDER BY c.id"#,
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| error!(error = %e, "failed to query clients"))?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    /// Mean age over all clients; `0.0` when there are none.
    pub async fn average_age(&self) -> Result<f64, RegistryError> {
        let avg: Option<f64> = sqlx::query_scalar("SELECT AVG(age) FROM clients")
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| error!(error = %e, "failed to query average age"))?;
        Ok(avg.unwrap_or(0.0))
    }

    fn row_to_model(row: SqliteRow) -> Result<Client, RegistryError> {
        let id: i64 = row.try_get("id")?;
        let full_name: String = row.try_get("full_name")?;
        let age: i64 = row.try_get("age")?;
        let credentials_id: Option<i64> = row.try_get("credentials_id")?;

        let credentials = match credentials_id {
            Some(cred_id) => Some(Credentials {
                id: cred_id,
                client_id: Some(id),
                email: row.try_get("email")?,
                password: row.try_get("password")?,
            }),
            None => None,
        };

        Ok(Client {
            id,
            full_name,
            age,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> ClientStorage {
        let storage = ClientStorage::open(":memory:").await.unwrap();
        storage.init_schema().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn insert_then_list_round_trips() {
        let storage = storage().await;

        let created = storage
            .insert_client(
                "John Doe",
                31,
                Some(BasicCredentials::new("john.doe@example.com", "12345")),
            )
            .await
            .unwrap();

        let clients = storage.list_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0], created);
        assert_eq!(clients[0].full_name, "John Doe");
        assert_eq!(clients[0].age, 31);
        let creds = clients[0].credentials.as_ref().unwrap();
        assert_eq!(creds.email, "john.doe@example.com");
        assert_eq!(creds.password, "12345");
        assert_eq!(creds.client_id, Some(created.id));
    }

    #[tokio::test]
    async fn credentials_absent_unless_supplied() {
        let storage = storage().await;
        storage.insert_client("Amy Kruger", 25, None).await.unwrap();
        storage
            .insert_client(
                "Donald Trump",
                60,
                Some(BasicCredentials::new("donald.trump@example.com", "china")),
            )
            .await
            .unwrap();

        let clients = storage.list_clients().await.unwrap();
        assert_eq!(clients.len(), 2);
        assert!(clients[0].credentials.is_none());
        assert!(clients[1].credentials.is_some());
    }

    #[tokio::test]
    async fn failed_credentials_insert_rolls_back_client() {
        let storage = storage().await;
        sqlx::query(
            r#"CREATE TRIGGER reject_blocked_email BEFORE INSERT ON client_credentials
               WHEN NEW.email = 'blocked@example.com'
               BEGIN SELECT RAISE(ABORT, 'blocked email'); END"#,
        )
        .execute(storage.pool())
        .await
        .unwrap();

        let result = storage
            .insert_client(
                "Blocked Person",
                40,
                Some(BasicCredentials::new("blocked@example.com", "secret")),
            )
            .await;
        assert!(matches!(result, Err(RegistryError::Database(_))));

        assert!(storage.list_clients().await.unwrap().is_empty());
        assert_eq!(storage.average_age().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn second_credentials_for_client_conflicts() {
        let storage = storage().await;
        let client = storage
            .insert_client("John Doe", 31, Some(BasicCredentials::new("a@example.com", "1")))
            .await
            .unwrap();

        let result = storage
            .attach_credentials(client.id, BasicCredentials::new("b@example.com", "2"))
            .await;
        assert!(matches!(result, Err(RegistryError::Conflict(_))));

        let clients = storage.list_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(
            clients[0].credentials.as_ref().unwrap().email,
            "a@example.com"
        );
    }

    #[tokio::test]
    async fn attach_credentials_to_bare_client() {
        let storage = storage().await;
        let client = storage.insert_client("Amy Kruger", 25, None).await.unwrap();

        let creds = storage
            .attach_credentials(client.id, BasicCredentials::new("amy@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(creds.client_id, Some(client.id));

        let clients = storage.list_clients().await.unwrap();
        assert_eq!(clients[0].credentials, Some(creds));
    }

    #[tokio::test]
    async fn attach_credentials_to_unknown_client_fails() {
        let storage = storage().await;
        let result = storage
            .attach_credentials(999, BasicCredentials::new("ghost@example.com", "pw"))
            .await;
        assert!(matches!(result, Err(RegistryError::Database(_))));
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let storage = storage().await;
        let result = storage.insert_client("  ", 30, None).await;
        assert!(matches!(result, Err(RegistryError::Validation(_))));
        assert!(storage.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn average_age_over_clients() {
        let storage = storage().await;
        for (name, age) in [("John Doe", 31), ("Amy Kruger", 25), ("Donald Trump", 60)] {
            storage.insert_client(name, age, None).await.unwrap();
        }

        let avg = storage.average_age().await.unwrap();
        assert!((avg - 116.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn average_age_is_zero_without_clients() {
        let storage = storage().await;
        assert_eq!(storage.average_age().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn read_failure_is_an_error_not_empty() {
        let storage = ClientStorage::open(":memory:").await.unwrap();
        // schema never applied
        assert!(storage.list_clients().await.is_err());
        assert!(storage.average_age().await.is_err());
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let storage = storage().await;
        storage.insert_client("Amy Kruger", 25, None).await.unwrap();

        storage.init_schema().await.unwrap();

        let clients = storage.list_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
    }

    #[tokio::test]
    async fn deleting_client_nulls_credentials_link() {
        let storage = storage().await;
        let client = storage
            .insert_client("John Doe", 31, Some(BasicCredentials::new("j@example.com", "1")))
            .await
            .unwrap();

        sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(client.id)
            .execute(storage.pool())
            .await
            .unwrap();

        let orphan: (Option<i64>, String) =
            sqlx::query_as("SELECT client_id, email FROM client_credentials")
                .fetch_one(storage.pool())
                .await
                .unwrap();
        assert_eq!(orphan, (None, "j@example.com".to_string()));
    }

    #[tokio::test]
    async fn separate_memory_handles_are_isolated() {
        let a = storage().await;
        let b = storage().await;
        a.insert_client("Amy Kruger", 25, None).await.unwrap();
        assert!(b.list_clients().await.unwrap().is_empty());
    }
}
