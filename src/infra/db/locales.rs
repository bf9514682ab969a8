use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateLocaleParams, LocalesRepo, LocalesWriteRepo, RepoError, UpdateLocaleParams,
    },
    domain::entities::LocaleRecord,
};

use super::{PostgresRepositories, TRANSLATION_TAGGABLE, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct LocaleRow {
    id: i64,
    code: String,
    name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<LocaleRow> for LocaleRecord {
    fn from(row: LocaleRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl LocalesRepo for PostgresRepositories {
    async fn list_locales(&self) -> Result<Vec<LocaleRecord>, RepoError> {
        let rows = sqlx::query_as::<_, LocaleRow>(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM locales
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LocaleRecord::from).collect())
    }

    async fn find_locale(&self, id: i64) -> Result<Option<LocaleRecord>, RepoError> {
        let row = sqlx::query_as::<_, LocaleRow>(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM locales
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(LocaleRecord::from))
    }

    async fn find_locale_by_code(&self, code: &str) -> Result<Option<LocaleRecord>, RepoError> {
        let row = sqlx::query_as::<_, LocaleRow>(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM locales
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(LocaleRecord::from))
    }

    async fn find_locale_by_name(&self, name: &str) -> Result<Option<LocaleRecord>, RepoError> {
        let row = sqlx::query_as::<_, LocaleRow>(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM locales
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(LocaleRecord::from))
    }
}

#[async_trait]
impl LocalesWriteRepo for PostgresRepositories {
    async fn create_locale(&self, params: CreateLocaleParams) -> Result<LocaleRecord, RepoError> {
        let CreateLocaleParams { code, name } = params;

        let row = sqlx::query_as::<_, LocaleRow>(
            r#"
            INSERT INTO locales (code, name)
            VALUES ($1, $2)
            RETURNING id, code, name, created_at, updated_at
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(LocaleRecord::from(row))
    }

    async fn update_locale(&self, params: UpdateLocaleParams) -> Result<LocaleRecord, RepoError> {
        let UpdateLocaleParams { id, code, name } = params;

        let row = sqlx::query_as::<_, LocaleRow>(
            r#"
            UPDATE locales
            SET code = $2,
                name = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING id, code, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(LocaleRecord::from(row))
    }

    async fn delete_locale(&self, id: i64) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Join rows are polymorphic and carry no FK to translations.
        sqlx::query(
            r#"
            DELETE FROM taggables
            WHERE taggable_type = $1
              AND taggable_id IN (SELECT id FROM translations WHERE locale_id = $2)
            "#,
        )
        .bind(TRANSLATION_TAGGABLE)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM locales
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if deleted.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(())
    }
}
