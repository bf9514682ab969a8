use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    application::repos::{NewSeedTranslation, RepoError, SeedRepo},
    domain::entities::{LocaleRecord, TagRecord},
};

use super::{
    PostgresRepositories, TRANSLATION_TAGGABLE, locales::LocaleRow, map_sqlx_error, tags::TagRow,
};

#[async_trait]
impl SeedRepo for PostgresRepositories {
    async fn ensure_locales(
        &self,
        locales: &[(&str, &str)],
    ) -> Result<Vec<LocaleRecord>, RepoError> {
        if locales.is_empty() {
            return Ok(Vec::new());
        }

        let mut insert = QueryBuilder::<Postgres>::new("INSERT INTO locales (code, name) ");
        insert.push_values(locales, |mut row, (code, name)| {
            row.push_bind(code.to_string()).push_bind(name.to_string());
        });
        insert.push(" ON CONFLICT DO NOTHING");
        insert
            .build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let codes: Vec<String> = locales.iter().map(|(code, _)| code.to_string()).collect();
        let rows = sqlx::query_as::<_, LocaleRow>(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM locales
            WHERE code = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(codes)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LocaleRecord::from).collect())
    }

    async fn ensure_tags(&self, names: &[&str]) -> Result<Vec<TagRecord>, RepoError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO tags (name)
            SELECT name FROM UNNEST($1::varchar[]) AS name
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&names)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM tags
            WHERE name = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&names)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn insert_seed_chunk(&self, rows: &[NewSeedTranslation]) -> Result<u64, RepoError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let mut insert =
            QueryBuilder::<Postgres>::new("INSERT INTO translations (key, content, locale_id) ");
        insert.push_values(rows, |mut row, seed| {
            row.push_bind(seed.key.clone())
                .push_bind(seed.content.clone())
                .push_bind(seed.locale_id);
        });
        insert.push(" ON CONFLICT (locale_id, key) DO NOTHING RETURNING id, locale_id, key");

        let inserted: Vec<(i64, i64, String)> = insert
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let tags_by_row: HashMap<(i64, &str), &[i64]> = rows
            .iter()
            .map(|seed| ((seed.locale_id, seed.key.as_str()), seed.tag_ids.as_slice()))
            .collect();

        let links: Vec<(i64, i64)> = inserted
            .iter()
            .flat_map(|(id, locale_id, key)| {
                tags_by_row
                    .get(&(*locale_id, key.as_str()))
                    .copied()
                    .unwrap_or_default()
                    .iter()
                    .map(move |tag_id| (*tag_id, *id))
            })
            .collect();

        if !links.is_empty() {
            let mut link = QueryBuilder::<Postgres>::new(
                "INSERT INTO taggables (tag_id, taggable_id, taggable_type) ",
            );
            link.push_values(&links, |mut row, (tag_id, translation_id)| {
                row.push_bind(*tag_id)
                    .push_bind(*translation_id)
                    .push_bind(TRANSLATION_TAGGABLE);
            });
            link.push(" ON CONFLICT DO NOTHING");
            link.build()
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(inserted.len() as u64)
    }
}
