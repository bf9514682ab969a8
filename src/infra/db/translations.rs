//! Translation persistence and the dynamic catalog query.
//!
//! [`compose_translation_query`] turns a [`TranslationFilter`] into SQL
//! without touching the database, so the generated statement can be
//! inspected directly. Tags are loaded by a second query over the matched
//! ids; under a tag filter only the matching associations are loaded.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateTranslationParams, RepoError, TranslationsRepo, TranslationsWriteRepo,
        UpdateTranslationParams,
    },
    domain::entities::{LocaleRecord, TagRecord, TranslationRecord, TranslationWithRelations},
    domain::filter::TranslationFilter,
};

use super::{PostgresRepositories, contains_pattern, map_sqlx_error};

/// `taggable_type` value used for translation rows in `taggables`.
pub const TRANSLATION_TAGGABLE: &str = "translation";

const TRANSLATION_SELECT: &str = "SELECT t.id, t.key, t.content, t.locale_id, \
        t.created_at, t.updated_at, \
        l.code AS locale_code, l.name AS locale_name, \
        l.created_at AS locale_created_at, l.updated_at AS locale_updated_at \
     FROM translations t \
     INNER JOIN locales l ON l.id = t.locale_id \
     WHERE 1=1";

#[derive(sqlx::FromRow)]
struct TranslationRow {
    id: i64,
    key: String,
    content: String,
    locale_id: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    locale_code: String,
    locale_name: String,
    locale_created_at: OffsetDateTime,
    locale_updated_at: OffsetDateTime,
}

impl TranslationRow {
    fn into_entry(self, tags: Vec<TagRecord>) -> TranslationWithRelations {
        TranslationWithRelations {
            locale: LocaleRecord {
                id: self.locale_id,
                code: self.locale_code,
                name: self.locale_name,
                created_at: self.locale_created_at,
                updated_at: self.locale_updated_at,
            },
            translation: TranslationRecord {
                id: self.id,
                key: self.key,
                content: self.content,
                locale_id: self.locale_id,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            tags,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaggedRow {
    taggable_id: i64,
    id: i64,
    name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

/// Build the translation query for `filter`.
///
/// Dimensions are ANDed; values inside one dimension are ORed. An empty set
/// in any dimension matches nothing.
pub fn compose_translation_query(filter: &TranslationFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(TRANSLATION_SELECT);

    if let Some(locales) = filter.locales.as_ref() {
        if locales.is_empty() {
            qb.push(" AND FALSE");
        } else {
            qb.push(" AND l.code = ANY(");
            qb.push_bind(locales.iter().cloned().collect::<Vec<String>>());
            qb.push(")");
        }
    }

    if let Some(tag_ids) = filter.tag_ids.as_ref() {
        if tag_ids.is_empty() {
            qb.push(" AND FALSE");
        } else {
            qb.push(
                " AND EXISTS (SELECT 1 FROM taggables tb \
                 WHERE tb.taggable_id = t.id AND tb.taggable_type = ",
            );
            qb.push_bind(TRANSLATION_TAGGABLE);
            qb.push(" AND tb.tag_id = ANY(");
            qb.push_bind(tag_ids.iter().copied().collect::<Vec<i64>>());
            qb.push("))");
        }
    }

    push_contains_any(&mut qb, "t.key", filter.keys.as_ref());
    push_contains_any(&mut qb, "t.content", filter.contents.as_ref());

    qb.push(" ORDER BY t.id");
    qb
}

/// Build the eager load of tags for `translation_ids`, optionally restricted
/// to `only_tag_ids`.
pub fn compose_tag_load_query(
    translation_ids: Vec<i64>,
    only_tag_ids: Option<&BTreeSet<i64>>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT tb.taggable_id, tg.id, tg.name, tg.created_at, tg.updated_at \
         FROM taggables tb \
         INNER JOIN tags tg ON tg.id = tb.tag_id \
         WHERE tb.taggable_type = ",
    );
    qb.push_bind(TRANSLATION_TAGGABLE);
    qb.push(" AND tb.taggable_id = ANY(");
    qb.push_bind(translation_ids);
    qb.push(")");

    if let Some(tag_ids) = only_tag_ids {
        qb.push(" AND tb.tag_id = ANY(");
        qb.push_bind(tag_ids.iter().copied().collect::<Vec<i64>>());
        qb.push(")");
    }

    qb.push(" ORDER BY tb.taggable_id, tg.id");
    qb
}

fn push_contains_any(
    qb: &mut QueryBuilder<'static, Postgres>,
    column: &'static str,
    needles: Option<&BTreeSet<String>>,
) {
    let Some(needles) = needles else {
        return;
    };

    if needles.is_empty() {
        qb.push(" AND FALSE");
        return;
    }

    let patterns: Vec<String> = needles.iter().map(|n| contains_pattern(n)).collect();
    qb.push(" AND ");
    qb.push(column);
    qb.push(" ILIKE ANY(");
    qb.push_bind(patterns);
    qb.push(")");
}

impl PostgresRepositories {
    async fn hydrate_translations(
        &self,
        rows: Vec<TranslationRow>,
        only_tag_ids: Option<&BTreeSet<i64>>,
    ) -> Result<Vec<TranslationWithRelations>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let tagged = compose_tag_load_query(ids, only_tag_ids)
            .build_query_as::<TaggedRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut tags_by_translation: HashMap<i64, Vec<TagRecord>> = HashMap::new();
        for row in tagged {
            tags_by_translation
                .entry(row.taggable_id)
                .or_default()
                .push(TagRecord {
                    id: row.id,
                    name: row.name,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = tags_by_translation.remove(&row.id).unwrap_or_default();
                row.into_entry(tags)
            })
            .collect())
    }

    async fn load_translation(&self, id: i64) -> Result<TranslationWithRelations, RepoError> {
        self.find_translation(id).await?.ok_or(RepoError::NotFound)
    }
}

/// Replace the tag set of one translation inside an open transaction.
async fn sync_tags(conn: &mut PgConnection, id: i64, tag_ids: &[i64]) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        DELETE FROM taggables
        WHERE taggable_type = $1
          AND taggable_id = $2
          AND NOT (tag_id = ANY($3))
        "#,
    )
    .bind(TRANSLATION_TAGGABLE)
    .bind(id)
    .bind(tag_ids.to_vec())
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if !tag_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO taggables (tag_id, taggable_id, taggable_type)
            SELECT tag_id, $2, $3
            FROM UNNEST($1::bigint[]) AS tag_id
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(tag_ids.to_vec())
        .bind(id)
        .bind(TRANSLATION_TAGGABLE)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    }

    Ok(())
}

#[async_trait]
impl TranslationsRepo for PostgresRepositories {
    async fn find_matching(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationWithRelations>, RepoError> {
        let rows = compose_translation_query(filter)
            .build_query_as::<TranslationRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        self.hydrate_translations(rows, filter.tag_ids.as_ref())
            .await
    }

    async fn find_translation(
        &self,
        id: i64,
    ) -> Result<Option<TranslationWithRelations>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(TRANSLATION_SELECT);
        qb.push(" AND t.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<TranslationRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.hydrate_translations(vec![row], None).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_translation_by_key(
        &self,
        locale_id: i64,
        key: &str,
    ) -> Result<Option<TranslationRecord>, RepoError> {
        #[derive(sqlx::FromRow)]
        struct PlainRow {
            id: i64,
            key: String,
            content: String,
            locale_id: i64,
            created_at: OffsetDateTime,
            updated_at: OffsetDateTime,
        }

        let row = sqlx::query_as::<_, PlainRow>(
            r#"
            SELECT id, key, content, locale_id, created_at, updated_at
            FROM translations
            WHERE locale_id = $1 AND key = $2
            "#,
        )
        .bind(locale_id)
        .bind(key)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| TranslationRecord {
            id: row.id,
            key: row.key,
            content: row.content,
            locale_id: row.locale_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

#[async_trait]
impl TranslationsWriteRepo for PostgresRepositories {
    async fn create_translation(
        &self,
        params: CreateTranslationParams,
    ) -> Result<TranslationWithRelations, RepoError> {
        let CreateTranslationParams {
            key,
            content,
            locale_id,
            tag_ids,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO translations (key, content, locale_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(key)
        .bind(content)
        .bind(locale_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(tag_ids) = tag_ids.as_deref() {
            sync_tags(&mut tx, id, tag_ids).await?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        self.load_translation(id).await
    }

    async fn update_translation(
        &self,
        params: UpdateTranslationParams,
    ) -> Result<TranslationWithRelations, RepoError> {
        let UpdateTranslationParams {
            id,
            key,
            content,
            locale_id,
            tag_ids,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query(
            r#"
            UPDATE translations
            SET key = $2,
                content = $3,
                locale_id = $4,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(content)
        .bind(locale_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        if let Some(tag_ids) = tag_ids.as_deref() {
            sync_tags(&mut tx, id, tag_ids).await?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        self.load_translation(id).await
    }

    async fn delete_translation(&self, id: i64) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            DELETE FROM taggables
            WHERE taggable_type = $1 AND taggable_id = $2
            "#,
        )
        .bind(TRANSLATION_TAGGABLE)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM translations
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

    async fn replace_translation_tags(&self, id: i64, tag_ids: &[i64]) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let exists: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM translations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if exists.is_none() {
            return Err(RepoError::NotFound);
        }

        sync_tags(&mut tx, id, tag_ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn unconstrained_filter_selects_everything_in_id_order() {
        let qb = compose_translation_query(&TranslationFilter::default());
        let sql = qb.sql();

        assert!(sql.contains("INNER JOIN locales l ON l.id = t.locale_id"));
        assert!(sql.ends_with("WHERE 1=1 ORDER BY t.id"));
    }

    #[test]
    fn locale_filter_matches_codes_through_the_join() {
        let filter = TranslationFilter {
            locales: Some(strings(&["en", "fr"])),
            ..Default::default()
        };
        let qb = compose_translation_query(&filter);

        assert!(qb.sql().contains("AND l.code = ANY($1)"));
    }

    #[test]
    fn tag_filter_uses_existential_check() {
        let filter = TranslationFilter {
            tag_ids: Some(BTreeSet::from([1, 3])),
            ..Default::default()
        };
        let qb = compose_translation_query(&filter);
        let sql = qb.sql();

        assert!(sql.contains("AND EXISTS (SELECT 1 FROM taggables tb"));
        assert!(sql.contains("tb.taggable_type = $1"));
        assert!(sql.contains("tb.tag_id = ANY($2))"));
    }

    #[test]
    fn all_dimensions_are_anded_in_order() {
        let filter = TranslationFilter {
            locales: Some(strings(&["fr"])),
            tag_ids: Some(BTreeSet::from([2])),
            keys: Some(strings(&["checkout"])),
            contents: Some(strings(&["paiement", "payer"])),
        };
        let qb = compose_translation_query(&filter);
        let sql = qb.sql();

        let locale = sql.find("l.code = ANY($1)").expect("locale clause");
        let tag = sql.find("tb.tag_id = ANY($3)").expect("tag clause");
        let key = sql.find("AND t.key ILIKE ANY($4)").expect("key clause");
        let content = sql
            .find("AND t.content ILIKE ANY($5)")
            .expect("content clause");
        assert!(locale < tag && tag < key && key < content);
    }

    #[test]
    fn empty_sets_match_nothing() {
        let filter = TranslationFilter {
            locales: Some(BTreeSet::new()),
            tag_ids: Some(BTreeSet::new()),
            keys: Some(BTreeSet::new()),
            contents: None,
        };
        let qb = compose_translation_query(&filter);
        let sql = qb.sql();

        assert_eq!(sql.matches("AND FALSE").count(), 3);
        assert!(!sql.contains("ANY("));
    }

    #[test]
    fn tag_load_is_narrowed_under_a_tag_filter() {
        let only = BTreeSet::from([7]);
        let narrowed = compose_tag_load_query(vec![1, 2], Some(&only));
        let full = compose_tag_load_query(vec![1, 2], None);

        assert!(narrowed.sql().contains("AND tb.tag_id = ANY($3)"));
        assert!(!full.sql().contains("tb.tag_id = ANY"));
    }
}
