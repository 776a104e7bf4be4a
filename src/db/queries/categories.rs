use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

pub async fn get_all_categories(pool: &SqlitePool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
SELECT id, type
FROM categories
ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> Result<Category, DbError> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, type FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound {
        resource: "category",
        id,
    })
}

/// Categories whose id is in `ids`, ordered by id. Unknown ids are skipped.
pub async fn get_categories_by_ids(pool: &SqlitePool, ids: &[i64]) -> sqlx::Result<Vec<Category>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, type FROM categories WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    builder.build_query_as::<Category>().fetch_all(pool).await
}

/// Inserts new categories and renames existing ones, matched by id.
pub async fn import_categories(pool: &SqlitePool, categories: Vec<Category>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for category in categories {
        sqlx::query(
            r#"
INSERT INTO categories (id, type) VALUES (?1, ?2)
ON CONFLICT(id) DO UPDATE SET type = excluded.type
            "#,
        )
        .bind(category.id)
        .bind(&category.kind)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::seeded_pool;

    #[tokio::test]
    async fn lists_categories_in_id_order() {
        let pool = seeded_pool().await;
        let categories = get_all_categories(&pool).await.unwrap();

        let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(categories[0].kind, "Science");
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let pool = seeded_pool().await;
        let err = get_category(&pool, 8).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotFound {
                resource: "category",
                id: 8
            }
        ));
    }

    #[tokio::test]
    async fn filters_by_ids_and_skips_unknown() {
        let pool = seeded_pool().await;
        let categories = get_categories_by_ids(&pool, &[5, 2, 42]).await.unwrap();
        let labels: Vec<&str> = categories.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(labels, vec!["Art", "Entertainment"]);

        assert!(get_categories_by_ids(&pool, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_upserts_by_id() {
        let pool = seeded_pool().await;
        import_categories(
            &pool,
            vec![
                Category {
                    id: 2,
                    kind: "Fine Art".into(),
                },
                Category {
                    id: 7,
                    kind: "Music".into(),
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(get_category(&pool, 2).await.unwrap().kind, "Fine Art");
        assert_eq!(get_category(&pool, 7).await.unwrap().kind, "Music");
        assert_eq!(get_all_categories(&pool).await.unwrap().len(), 7);
    }
}
