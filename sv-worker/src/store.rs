//! Postgres user store.
//!
//! The `users` table is shared with the web front end, which creates rows
//! on sign-up. The worker only reads the list and writes back three columns:
//! `domain`, `settings_rev` and `folder_sum`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use sv_worker_core::contract::{User, UserStore};
use sv_worker_core::error::BoxError;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        tracing::info!("Connected to user store");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        storage_token: row.try_get("dropbox_token")?,
        storage_uid: row.try_get("dropbox_uid")?,
        name: row.try_get("name")?,
        folder_checksum: row.try_get("folder_sum")?,
        settings_revision: row.try_get("settings_rev")?,
        domain: row.try_get("domain")?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list_users(&self) -> Result<Vec<User>, BoxError> {
        let rows = sqlx::query(
            r#"
            SELECT id::bigint AS id, dropbox_token, dropbox_uid, name,
                   folder_sum, settings_rev, domain
            FROM users
            WHERE id > 0
            ORDER BY id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn update_domain(
        &self,
        user: &User,
        domain: &str,
        revision: &str,
    ) -> Result<(), BoxError> {
        sqlx::query("UPDATE users SET domain = $1, settings_rev = $2 WHERE id = $3")
            .bind(domain)
            .bind(revision)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_folder_checksum(&self, user: &User, hash: &str) -> Result<(), BoxError> {
        sqlx::query("UPDATE users SET folder_sum = $1 WHERE id = $2")
            .bind(hash)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, BoxError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }
}
