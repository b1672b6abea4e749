use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create, destroy, list, mark_read, partial_update, retrieve, update};
use crate::models::{Connection, Endorsement, Message, Profile, Project, Resource, Skill};
use crate::shared::AppState;

/// Collection and item routes for one resource, mounted under /api/{table}
fn resource_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/api/{}", R::SCHEMA.name);
    let item = format!("{}/:id", collection);

    Router::new()
        .route(&collection, get(list::<R>).post(create::<R>))
        .route(
            &item,
            get(retrieve::<R>)
                .put(update::<R>)
                .patch(partial_update::<R>)
                .delete(destroy::<R>),
        )
}

/// Every authenticated resource route
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(resource_routes::<Profile>())
        .merge(resource_routes::<Skill>())
        .merge(resource_routes::<Project>())
        .merge(resource_routes::<Connection>())
        .merge(resource_routes::<Message>())
        .merge(resource_routes::<Endorsement>())
        .route("/api/messages/:id/read", post(mark_read))
}
