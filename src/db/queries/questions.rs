use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::DbError;

pub const QUESTIONS_PER_PAGE: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

/// A 1-indexed window of [`QUESTIONS_PER_PAGE`] questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(i64);

impl Page {
    /// Pages start at 1; anything lower has no window.
    pub fn new(number: i64) -> Option<Self> {
        (number >= 1).then_some(Self(number))
    }

    pub fn number(&self) -> i64 {
        self.0
    }

    pub fn offset(&self) -> i64 {
        (self.0 - 1).saturating_mul(QUESTIONS_PER_PAGE)
    }

    pub fn limit(&self) -> i64 {
        QUESTIONS_PER_PAGE
    }
}

impl Default for Page {
    fn default() -> Self {
        Self(1)
    }
}

/// Which categories a quiz draws from. Category id 0 on the wire means all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(i64),
}

impl CategoryFilter {
    pub fn from_id(id: i64) -> Self {
        match id {
            0 => Self::All,
            id => Self::Only(id),
        }
    }
}

#[derive(Debug)]
pub struct SearchResults {
    /// Size of the whole match set, not just the page.
    pub total: i64,
    pub questions: Vec<Question>,
}

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_questions_page(pool: &SqlitePool, page: Page) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty
        FROM questions
        ORDER BY id
        LIMIT ?1 OFFSET ?2
        "#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await
}

pub async fn get_question(pool: &SqlitePool, id: i64) -> Result<Question, DbError> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound {
        resource: "question",
        id,
    })
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty
        FROM questions
        WHERE questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn create_question(pool: &SqlitePool, new: &NewQuestion) -> sqlx::Result<i64> {
    let mut conn = pool.acquire().await?;

    let id = sqlx::query(
        r#"
INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&new.question)
    .bind(&new.answer)
    .bind(new.category)
    .bind(new.difficulty)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;

    let deleted = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if deleted == 0 {
        return Err(DbError::NotFound {
            resource: "question",
            id,
        });
    }
    Ok(())
}

/// Case-insensitive substring match on the question text.
///
/// Both sides are lowercased with Unicode rules, so `école` finds `ÉCOLE`.
/// SQLite's `LIKE` only folds ASCII, so matching happens here rather than in SQL.
pub async fn search_questions(
    pool: &SqlitePool,
    term: &str,
    page: Page,
) -> sqlx::Result<SearchResults> {
    let needle = term.to_lowercase();
    let matches: Vec<Question> = get_all_questions(pool)
        .await?
        .into_iter()
        .filter(|q| q.question.to_lowercase().contains(&needle))
        .collect();

    let total = matches.len() as i64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let questions = matches.into_iter().skip(offset).take(limit).collect();

    Ok(SearchResults { total, questions })
}

/// Every candidate question for a quiz round, in random order.
///
/// `previous` is bound as one JSON array, so its length is not capped by
/// SQLite's bind-parameter limit.
pub async fn get_quiz_questions(
    pool: &SqlitePool,
    filter: CategoryFilter,
    previous: &[i64],
) -> sqlx::Result<Vec<Question>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, question, answer, category, difficulty FROM questions WHERE 1 = 1",
    );
    if let CategoryFilter::Only(category) = filter {
        builder.push(" AND category = ").push_bind(category);
    }
    if !previous.is_empty() {
        let previous =
            serde_json::to_string(previous).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        builder
            .push(" AND id NOT IN (SELECT value FROM json_each(")
            .push_bind(previous)
            .push("))");
    }
    builder.push(" ORDER BY random()");

    builder.build_query_as::<Question>().fetch_all(pool).await
}

/// Inserts new questions and overwrites existing ones, matched by id.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for question in questions {
        sqlx::query(
            r#"
INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(id) DO UPDATE SET
    question = excluded.question,
    answer = excluded.answer,
    category = excluded.category,
    difficulty = excluded.difficulty
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(&question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}
