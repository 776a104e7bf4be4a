use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_category, questions::get_quiz_questions},
        CategoryFilter, Question,
    },
    server::{
        app::AppState,
        deserializers::deserialize_i64_from_number_or_string,
        error::{ApiError, ApiResponse},
        extractors::ApiJson,
    },
    telemetry::QUIZ_REQUESTS,
};

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(deserialize_with = "deserialize_i64_from_number_or_string")]
    id: i64,
}

#[derive(Deserialize)]
struct QuizRound {
    previous_questions: Option<Vec<i64>>,
    quiz_category: Option<QuizCategory>,
}

#[derive(Serialize)]
struct QuizResponse {
    success: bool,
    questions: Vec<Question>,
}

/// Returns every remaining candidate in random order; the client asks the first one.
async fn next_questions(
    State(pool): State<SqlitePool>,
    ApiJson(round): ApiJson<QuizRound>,
) -> ApiResponse<Json<QuizResponse>> {
    let category = round
        .quiz_category
        .ok_or_else(|| ApiError::BadRequest("missing quiz_category".into()))?;
    let filter = CategoryFilter::from_id(category.id);
    let label = match filter {
        CategoryFilter::All => "all".to_owned(),
        CategoryFilter::Only(id) => get_category(&pool, id).await?.id.to_string(),
    };

    let previous = round.previous_questions.unwrap_or_default();
    let questions = get_quiz_questions(&pool, filter, &previous).await?;
    QUIZ_REQUESTS.with_label_values(&[label.as_str()]).inc();
    tracing::debug!(
        category = %label,
        excluded = previous.len(),
        candidates = questions.len(),
        "Quiz round"
    );

    Ok(Json(QuizResponse {
        success: true,
        questions,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_questions))
        .with_state(state)
}
