use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::{get_all_categories, get_categories_by_ids},
            questions::{
                count_questions, create_question, delete_question, get_questions_page,
                search_questions,
            },
        },
        Category, NewQuestion, Page, Question,
    },
    server::{
        app::AppState,
        deserializers::PageQuery,
        error::{ApiError, ApiResponse},
        extractors::{ApiJson, ApiPath, ApiQuery},
    },
    telemetry::{QUESTIONS_CREATED, QUESTIONS_DELETED},
};

#[derive(Deserialize)]
struct QuestionForm {
    question: Option<String>,
    answer: Option<String>,
    difficulty: Option<i64>,
    category: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
#[error("missing field `{0}`")]
struct MissingField(&'static str);

impl QuestionForm {
    fn into_new_question(self) -> Result<NewQuestion, MissingField> {
        Ok(NewQuestion {
            question: self.question.ok_or(MissingField("question"))?,
            answer: self.answer.ok_or(MissingField("answer"))?,
            difficulty: self.difficulty.ok_or(MissingField("difficulty"))?,
            category: self.category.ok_or(MissingField("category"))?,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    current_category: Vec<Category>,
    categories: Vec<Category>,
    total_questions: i64,
}

#[derive(Serialize)]
struct Deleted {
    success: bool,
    message: &'static str,
    total_questions: i64,
}

#[derive(Serialize)]
struct Created {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    success: bool,
    questions: Vec<String>,
    total_questions: i64,
    current_category: Vec<Category>,
}

fn requested_page(query: &PageQuery) -> ApiResponse<Page> {
    query
        .page()
        .ok_or_else(|| ApiError::NotFound(format!("page {} does not exist", query.page)))
}

/// Categories represented on this page only, not in the whole result set.
async fn page_categories(pool: &SqlitePool, questions: &[Question]) -> sqlx::Result<Vec<Category>> {
    let ids: Vec<i64> = questions.iter().map(|q| q.category).unique().collect();
    get_categories_by_ids(pool, &ids).await
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResponse<Json<QuestionsPage>> {
    let page = requested_page(&query)?;
    let questions = get_questions_page(&pool, page).await?;
    if questions.is_empty() {
        return Err(ApiError::NotFound(format!(
            "page {} is empty",
            page.number()
        )));
    }

    Ok(Json(QuestionsPage {
        success: true,
        current_category: page_categories(&pool, &questions).await?,
        categories: get_all_categories(&pool).await?,
        total_questions: count_questions(&pool).await?,
        questions,
    }))
}

async fn remove_question(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<Json<Deleted>> {
    delete_question(&pool, id)
        .await
        .map_err(ApiError::rejected_write)?;
    QUESTIONS_DELETED.inc();
    tracing::info!(id, "Question deleted");

    Ok(Json(Deleted {
        success: true,
        message: "Deleted Successfully",
        total_questions: count_questions(&pool).await?,
    }))
}

async fn add_question(
    State(pool): State<SqlitePool>,
    ApiJson(form): ApiJson<QuestionForm>,
) -> ApiResponse<Json<Created>> {
    let new_question = form.into_new_question().map_err(ApiError::rejected_write)?;
    let id = create_question(&pool, &new_question)
        .await
        .map_err(ApiError::rejected_write)?;
    QUESTIONS_CREATED.inc();
    tracing::info!(id, category = new_question.category, "Question created");

    Ok(Json(Created {
        success: true,
        message: "Question Added Successfully",
    }))
}

async fn search(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<Json<SearchResponse>> {
    let term = body
        .search_term
        .ok_or_else(|| ApiError::NotFound("no search term".into()))?;
    let page = requested_page(&query)?;
    let results = search_questions(&pool, &term, page).await?;
    tracing::debug!(term = %term, total = results.total, "Searched questions");

    Ok(Json(SearchResponse {
        success: true,
        current_category: page_categories(&pool, &results.questions).await?,
        total_questions: results.total,
        questions: results.questions.into_iter().map(|q| q.question).collect(),
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions))
        .route("/questions/new", post(add_question))
        .route("/questions/search", post(search))
        .route("/questions/{id}", delete(remove_question))
        .with_state(state)
}
