//! Dataset and Query HTTP Routes
//!
//! - `GET /datasets` lists registered datasets
//! - `PUT /dataset/:id/:kind` registers a dataset from a JSON array of rows
//! - `DELETE /dataset/:id` removes a dataset
//! - `POST /query` runs a query document
//!
//! Catalog mutations and queries run on the blocking pool.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::dataset::{records_from_json, DatasetInfo, DatasetKind};
use crate::executor::QueryOutput;

use super::errors::{ApiError, ApiResult};

/// Success body: `{"result": ...}`
#[derive(Debug, Serialize)]
pub struct ResultResponse<T> {
    pub result: T,
}

/// Create dataset and query routes
pub fn dataset_routes(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/datasets", get(list_datasets_handler))
        .route("/dataset/:id/:kind", put(add_dataset_handler))
        .route("/dataset/:id", delete(remove_dataset_handler))
        .route("/query", post(query_handler))
        .with_state(catalog)
}

fn parse_body(body: &Bytes) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

async fn list_datasets_handler(
    State(catalog): State<Arc<Catalog>>,
) -> Json<ResultResponse<Vec<DatasetInfo>>> {
    Json(ResultResponse {
        result: catalog.list_datasets(),
    })
}

async fn add_dataset_handler(
    State(catalog): State<Arc<Catalog>>,
    Path((id, kind_name)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<ResultResponse<Vec<String>>>> {
    let kind = DatasetKind::parse(&kind_name).ok_or(ApiError::InvalidKind(kind_name))?;
    let rows = parse_body(&body)?;

    let ids = tokio::task::spawn_blocking(move || {
        let records = records_from_json(kind, rows)?;
        catalog.add_dataset(&id, kind, records)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(ResultResponse { result: ids }))
}

async fn remove_dataset_handler(
    State(catalog): State<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultResponse<String>>> {
    let removed = tokio::task::spawn_blocking(move || catalog.remove_dataset(&id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(ResultResponse { result: removed }))
}

async fn query_handler(
    State(catalog): State<Arc<Catalog>>,
    body: Bytes,
) -> ApiResult<Json<QueryOutput>> {
    let raw = parse_body(&body)?;

    let output = tokio::task::spawn_blocking(move || catalog.query(&raw))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde_json::json;

    fn rooms_body() -> Bytes {
        Bytes::from(
            json!([
                {"fullname": "Hugh Dempster Pavilion", "shortname": "DMP", "number": "110",
                 "name": "DMP_110", "address": "6245 Agronomy Road", "lat": 49.26125,
                 "lon": -123.24807, "seats": 120, "type": "Tiered Large Group",
                 "furniture": "Classroom-Fixed Tablets", "href": ""},
                {"fullname": "Hugh Dempster Pavilion", "shortname": "DMP", "number": "201",
                 "name": "DMP_201", "address": "6245 Agronomy Road", "lat": 49.26125,
                 "lon": -123.24807, "seats": 40, "type": "Small Group",
                 "furniture": "Movable Tables", "href": ""}
            ])
            .to_string(),
        )
    }

    async fn add_rooms(catalog: &Arc<Catalog>) -> ApiResult<Json<ResultResponse<Vec<String>>>> {
        add_dataset_handler(
            State(Arc::clone(catalog)),
            Path(("rooms".to_string(), "rooms".to_string())),
            rooms_body(),
        )
        .await
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let catalog = Arc::new(Catalog::in_memory());

        let added = add_rooms(&catalog).await.unwrap();
        assert_eq!(added.0.result, vec!["rooms"]);

        let listed = list_datasets_handler(State(Arc::clone(&catalog))).await;
        assert_eq!(listed.0.result.len(), 1);
        assert_eq!(listed.0.result[0].num_rows, 2);

        let removed = remove_dataset_handler(State(Arc::clone(&catalog)), Path("rooms".into()))
            .await
            .unwrap();
        assert_eq!(removed.0.result, "rooms");
    }

    #[tokio::test]
    async fn test_add_rejections() {
        let catalog = Arc::new(Catalog::in_memory());
        add_rooms(&catalog).await.unwrap();

        let err = add_rooms(&catalog).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = add_dataset_handler(
            State(Arc::clone(&catalog)),
            Path(("other".to_string(), "buildings".to_string())),
            rooms_body(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidKind(_)));

        let err = add_dataset_handler(
            State(Arc::clone(&catalog)),
            Path(("other".to_string(), "rooms".to_string())),
            Bytes::from_static(b"{not json"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_remove_unknown_is_not_found() {
        let catalog = Arc::new(Catalog::in_memory());
        let err = remove_dataset_handler(State(catalog), Path("ghost".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query() {
        let catalog = Arc::new(Catalog::in_memory());
        add_rooms(&catalog).await.unwrap();

        let body = json!({
            "WHERE": {"GT": {"rooms_seats": 100}},
            "OPTIONS": {"COLUMNS": ["rooms_name", "rooms_seats"]}
        });
        let output = query_handler(State(Arc::clone(&catalog)), Bytes::from(body.to_string()))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&output.0).unwrap(),
            json!({"result": [{"rooms_name": "DMP_110", "rooms_seats": 120}]})
        );

        let err = query_handler(State(catalog), Bytes::from(json!({"WHERE": {}}).to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
