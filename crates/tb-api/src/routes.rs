//! API routes

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::extractors::AppState;
use crate::handlers::{board, comments, selection, statistics, tags, tasks};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api", api_router())
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .route(
            "/selection",
            get(selection::get_selection).put(selection::put_selection),
        )
        .nest("/companies/:company_id", company_router())
}

fn company_router() -> Router<AppState> {
    Router::new()
        .route("/refresh", post(tasks::refresh_company))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:task_id",
            get(tasks::get_task).put(tasks::update_task),
        )
        .route("/tasks/:task_id/assignees", get(tasks::list_assignees))
        .route(
            "/tasks/:task_id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/tags/:tag_id",
            put(tags::update_tag).delete(tags::delete_tag),
        )
        .route("/board", get(board::get_board))
        .route("/board/moves", post(board::move_task))
        .route("/statistics", get(statistics::get_statistics))
}

async fn api_root() -> Json<ApiRoot> {
    Json(ApiRoot {
        name: "Taskboard RS",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ApiRoot {
    name: &'static str,
    version: &'static str,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tb_core::config::CompanySelectionStore;
    use tb_core::traits::Id;
    use tb_db::{Backend, MemoryBackend, Operation};
    use tb_core::types::Color;
    use tb_models::{Assignment, AssignmentStatus, Tag, Task, TaskPriority, TaskStatus};
    use tb_services::ChangeFeed;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::extractors::ACTOR_HEADER;

    fn id(n: u128) -> Id {
        Uuid::from_u128(n)
    }

    fn company() -> Id {
        id(900)
    }

    fn task(n: u128, status: TaskStatus, priority: TaskPriority) -> Task {
        let mut task = Task::new(id(n), company(), format!("Task {}", n));
        task.status = status;
        task.priority = priority;
        task
    }

    async fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .insert_task(task(1, TaskStatus::NotStarted, TaskPriority::Low))
            .await;
        backend
            .insert_task(task(2, TaskStatus::NotStarted, TaskPriority::High))
            .await;
        backend
            .insert_task(task(3, TaskStatus::Completed, TaskPriority::Medium))
            .await;
        backend
    }

    fn app(backend: Arc<MemoryBackend>) -> Router {
        let backend: Arc<dyn Backend> = backend;
        router().with_state(AppState::new(backend, ChangeFeed::new(16)))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value, actor: Option<Id>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(actor) = actor {
            builder = builder.header(ACTOR_HEADER, actor.to_string());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ids_of(tasks: &Value) -> Vec<String> {
        tasks
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_api_root() {
        let response = app(seeded().await)
            .oneshot(get_request("/api"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_tasks_sorted_by_priority() {
        let uri = format!("/api/companies/{}/tasks?sort=priority", company());
        let response = app(seeded().await)
            .oneshot(get_request(&uri))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 3);
        assert_eq!(
            ids_of(&body["tasks"]),
            vec![id(2).to_string(), id(3).to_string(), id(1).to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_tasks_filtered_by_status() {
        let uri = format!("/api/companies/{}/tasks?status=completed", company());
        let response = app(seeded().await)
            .oneshot(get_request(&uri))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(ids_of(&body["tasks"]), vec![id(3).to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_sort_is_rejected() {
        let uri = format!("/api/companies/{}/tasks?sort=shuffle", company());
        let response = app(seeded().await)
            .oneshot(get_request(&uri))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_failed");
        assert!(body["details"]["fields"]["sort"].is_array());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_reported() {
        let backend = seeded().await;
        backend.fail(Operation::FetchTasks).await;

        let uri = format!("/api/companies/{}/tasks", company());
        let response = app(backend).oneshot(get_request(&uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "backend_error");
    }

    #[tokio::test]
    async fn test_board_lanes() {
        let uri = format!("/api/companies/{}/board", company());
        let response = app(seeded().await)
            .oneshot(get_request(&uri))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let lanes = body["lanes"].as_array().unwrap();
        assert_eq!(lanes.len(), 3);
        assert_eq!(lanes[0]["status"], "not_started");
        assert_eq!(lanes[0]["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(lanes[1]["tasks"].as_array().unwrap().len(), 0);
        assert_eq!(lanes[2]["tasks"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_board_move_across_lanes() {
        let backend = seeded().await;
        let app = app(Arc::clone(&backend));

        let uri = format!("/api/companies/{}/board/moves", company());
        let drag = json!({
            "task_id": id(1),
            "source": { "lane": "not_started", "index": 0 },
            "destination": { "lane": "in_progress", "index": 0 },
        });
        let response = app
            .oneshot(json_request("POST", &uri, drag, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["effect"], "transferred");
        assert_eq!(body["to"], "in_progress");
        assert_eq!(backend.call_count(Operation::UpdateTaskStatus).await, 1);
        assert_eq!(
            backend.task(id(1)).await.unwrap().status,
            TaskStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_board_move_from_stale_position() {
        let backend = seeded().await;
        let uri = format!("/api/companies/{}/board/moves", company());
        let drag = json!({
            "task_id": id(3),
            "source": { "lane": "not_started", "index": 0 },
            "destination": { "lane": "completed", "index": 0 },
        });
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("POST", &uri, drag, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(backend.call_count(Operation::UpdateTaskStatus).await, 0);
    }

    #[tokio::test]
    async fn test_board_query_is_shared() {
        let backend = seeded().await;
        let app = app(Arc::clone(&backend));
        let board_uri = format!("/api/companies/{}/board", company());
        let moves_uri = format!("/api/companies/{}/board/moves", company());
        let drag = json!({
            "task_id": id(1),
            "source": { "lane": "not_started", "index": 0 },
            "destination": { "lane": "completed", "index": 0 },
        });

        let filtered = format!("{}?query=task%202", board_uri);
        let response = app.clone().oneshot(get_request(&filtered)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["lanes"][0]["tasks"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(json_request("POST", &moves_uri, drag.clone(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        app.clone().oneshot(get_request(&board_uri)).await.unwrap();
        let response = app
            .oneshot(json_request("POST", &moves_uri, drag, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.task(id(1)).await.unwrap().status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_create_task_requires_actor() {
        let uri = format!("/api/companies/{}/tasks", company());
        let response = app(seeded().await)
            .oneshot(json_request("POST", &uri, json!({ "title": "Ship" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_task_validates_title() {
        let backend = seeded().await;
        let uri = format!("/api/companies/{}/tasks", company());
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("POST", &uri, json!({ "title": "" }), Some(id(50))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(backend.call_count(Operation::SaveTask).await, 0);
    }

    #[tokio::test]
    async fn test_create_task() {
        let backend = seeded().await;
        let uri = format!("/api/companies/{}/tasks", company());
        let body = json!({
            "title": "Ship release",
            "new_steps": [{ "title": "" }],
            "assignee_ids": [id(60)],
        });
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("POST", &uri, body, Some(id(50))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["created"], true);
        assert_eq!(body["task"]["title"], "Ship release");
        assert_eq!(body["assignments"][0]["assigned_by"], id(50).to_string());
        assert_eq!(backend.call_count(Operation::ReplaceTaskTags).await, 0);
    }

    #[tokio::test]
    async fn test_assignees_by_scope() {
        let backend = seeded().await;
        for (n, user, status) in [
            (70, 60, AssignmentStatus::Accepted),
            (71, 61, AssignmentStatus::Pending),
        ] {
            backend
                .insert_assignment(Assignment {
                    id: id(n),
                    task_id: id(1),
                    user_id: id(user),
                    assigned_by: id(50),
                    assigned_at: None,
                    status,
                })
                .await;
        }
        let app = app(backend);

        let uri = format!("/api/companies/{}/tasks/{}/assignees", company(), id(1));
        let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["user_ids"].as_array().unwrap().len(), 2);

        let uri = format!("{}?scope=accepted_only", uri);
        let response = app.oneshot(get_request(&uri)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["user_ids"], json!([id(60)]));
    }

    #[tokio::test]
    async fn test_get_missing_task() {
        let uri = format!("/api/companies/{}/tasks/{}", company(), id(404));
        let response = app(seeded().await)
            .oneshot(get_request(&uri))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comment_validation() {
        let uri = format!("/api/companies/{}/tasks/{}/comments", company(), id(1));
        let response = app(seeded().await)
            .oneshot(json_request("POST", &uri, json!({ "comment": "  " }), Some(id(50))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_statistics() {
        let uri = format!("/api/companies/{}/statistics", company());
        let response = app(seeded().await)
            .oneshot(get_request(&uri))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_tasks"], 3);
        assert_eq!(body["completed_tasks"], 1);
        assert_eq!(body["completion_rate"], 33);
    }

    #[tokio::test]
    async fn test_selection_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn Backend> = seeded().await;
        let state = AppState::new(backend, ChangeFeed::new(16))
            .with_selection(CompanySelectionStore::new(dir.path().join("storage.json")));
        let app = router().with_state(state.clone());

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/selection",
                json!({ "company_id": company() }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.registry.get(company()).await.is_some());

        let response = app.oneshot(get_request("/api/selection")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["company_id"], company().to_string());
    }

    #[tokio::test]
    async fn test_selection_unconfigured() {
        let response = app(seeded().await)
            .oneshot(get_request("/api/selection"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_update_task_of_another_company() {
        let backend = seeded().await;
        backend
            .insert_task(Task::new(id(4), id(901), "Elsewhere"))
            .await;

        let uri = format!("/api/companies/{}/tasks/{}", company(), id(4));
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("PUT", &uri, json!({ "title": "Mine now" }), Some(id(50))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(backend.call_count(Operation::SaveTask).await, 0);
        assert_eq!(backend.task(id(4)).await.unwrap().company_id, id(901));
    }

    #[tokio::test]
    async fn test_update_task() {
        let backend = seeded().await;
        let uri = format!("/api/companies/{}/tasks/{}", company(), id(2));
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("PUT", &uri, json!({ "title": "Renamed" }), Some(id(50))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.task(id(2)).await.unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_comment_on_task_of_another_company() {
        let backend = seeded().await;
        backend
            .insert_task(Task::new(id(4), id(901), "Elsewhere"))
            .await;

        let uri = format!("/api/companies/{}/tasks/{}/comments", company(), id(4));
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("POST", &uri, json!({ "comment": "Hi" }), Some(id(50))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(backend.call_count(Operation::InsertComment).await, 0);
    }

    #[tokio::test]
    async fn test_list_tags_by_name() {
        let backend = seeded().await;
        for (n, name) in [(500, "urgent"), (501, "backend")] {
            backend
                .insert_tag(Tag {
                    id: id(n),
                    name: name.into(),
                    color: Color::default(),
                    company_id: company(),
                    created_at: None,
                })
                .await;
        }

        let uri = format!("/api/companies/{}/tags", company());
        let response = app(backend).oneshot(get_request(&uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["name"], "backend");
        assert_eq!(body[1]["name"], "urgent");
    }

    #[tokio::test]
    async fn test_create_tag() {
        let backend = seeded().await;
        let uri = format!("/api/companies/{}/tags", company());
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("POST", &uri, json!({ "name": "qa" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["name"], "qa");
        assert_eq!(body["color"], "#4f46e5");
        assert_eq!(body["company_id"], company().to_string());
    }

    #[tokio::test]
    async fn test_create_tag_rejects_bad_color() {
        let backend = seeded().await;
        let uri = format!("/api/companies/{}/tags", company());
        let body = json!({ "name": "qa", "color": "green" });
        let response = app(Arc::clone(&backend))
            .oneshot(json_request("POST", &uri, body, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(backend.call_count(Operation::SaveTag).await, 0);
    }

    #[tokio::test]
    async fn test_delete_tag_unlinks_tasks() {
        let backend = seeded().await;
        backend
            .insert_tag(Tag {
                id: id(500),
                name: "urgent".into(),
                color: Color::default(),
                company_id: company(),
                created_at: None,
            })
            .await;
        backend.tag_task(id(1), id(500)).await;
        let app = app(Arc::clone(&backend));

        let uri = format!("/api/companies/{}/tags/{}", company(), id(500));
        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let links = tb_db::JoinSource::fetch_task_tags(backend.as_ref(), &[id(1)])
            .await
            .unwrap();
        assert!(links.is_empty());

        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
