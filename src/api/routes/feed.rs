//! Feed Routes
//!
//! - GET /api/v1/topics - Active topics, newest first
//! - GET /api/v1/articles - All articles, newest first
//! - POST /api/v1/articles - Submit a link or written article (login required)
//! - GET /api/v1/articles/:id - Read one article (login required)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::auth::RequireUser;
use crate::api::dto::{ArticleListResponse, ArticleResponse, TopicListResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::feed::ArticleDraft;
use crate::store::Article;

/// GET /api/v1/topics
pub async fn list_topics(State(state): State<Arc<AppState>>) -> ApiResult<Json<TopicListResponse>> {
    let topics = state.store.list_topics(true)?;
    let total = topics.len();
    Ok(Json(TopicListResponse { topics, total }))
}

/// GET /api/v1/articles
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ArticleListResponse>> {
    let articles = state.store.list_articles()?;
    let total = articles.len();
    Ok(Json(ArticleListResponse { articles, total }))
}

/// GET /api/v1/articles/:id
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleResponse>> {
    let article = state.store.get_article(&id)?;
    tracing::debug!(article_id = %id, user_id = %user.id, "Article opened");

    let content = article.content();
    Ok(Json(ArticleResponse { article, content }))
}

/// POST /api/v1/articles
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    Json(draft): Json<ArticleDraft>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let new = draft.to_new_article(&user)?;
    let article = state.store.insert_article(&new)?;
    Ok((StatusCode::CREATED, Json(article)))
}
