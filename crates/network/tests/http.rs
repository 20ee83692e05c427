// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Integration tests for the GraphQL HTTP client using a mock Axum server.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
};
use prism_network::http::{GraphQlHttpClient, GraphQlHttpError};
use rstest::rstest;
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct TestServerState {
    last_body: Arc<Mutex<Option<Value>>>,
}

fn create_router(state: Arc<TestServerState>) -> Router {
    Router::new()
        .route(
            "/ok",
            post(move |Json(body): Json<Value>| {
                let state = state.clone();
                async move {
                    *state.last_body.lock().await = Some(body);
                    Json(json!({ "data": { "tokens": [{ "id": "0x1" }] } }))
                }
            }),
        )
        .route(
            "/errors",
            post(|| async {
                Json(json!({
                    "data": null,
                    "errors": [{ "message": "Type `Query` has no field `poolz`" }],
                }))
            }),
        )
        .route(
            "/status",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response() }),
        )
        .route("/missing", post(|| async { Json(json!({})) }))
        .route("/garbage", post(|| async { "not json" }))
}

async fn start_test_server(state: Arc<TestServerState>) -> SocketAddr {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().expect("missing local addr");

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .expect("test server failed");
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    addr
}

async fn client_for(path: &str) -> (GraphQlHttpClient, Arc<TestServerState>) {
    let state = Arc::new(TestServerState::default());
    let addr = start_test_server(state.clone()).await;
    let client = GraphQlHttpClient::new(&format!("http://{addr}{path}"), Some(5)).unwrap();
    (client, state)
}

#[rstest]
#[tokio::test]
async fn test_post_returns_data_and_sends_query_with_variables() {
    let (client, state) = client_for("/ok").await;
    let variables = json!({ "pageSize": 2 });

    let data = client
        .post("query Batch($pageSize: Int!) { batch: tokens(first: $pageSize) { id } }", &variables)
        .await
        .unwrap();

    assert_eq!(data, json!({ "tokens": [{ "id": "0x1" }] }));

    let body = state.last_body.lock().await.clone().unwrap();
    assert_eq!(body["variables"], variables);
    assert!(body["query"].as_str().unwrap().starts_with("query Batch"));
}

#[rstest]
#[tokio::test]
async fn test_post_surfaces_graphql_errors() {
    let (client, _) = client_for("/errors").await;
    let result = client.post("query { poolz { id } }", &json!({})).await;

    match result {
        Err(GraphQlHttpError::GraphQl(messages)) => {
            assert_eq!(messages, vec!["Type `Query` has no field `poolz`".to_string()]);
        }
        other => panic!("Expected GraphQL error, was {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn test_post_surfaces_http_status() {
    let (client, _) = client_for("/status").await;
    let result = client.post("query { tokens { id } }", &json!({})).await;

    match result {
        Err(GraphQlHttpError::UnexpectedStatus { status, body }) => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("Expected status error, was {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn test_post_without_data_is_an_error() {
    let (client, _) = client_for("/missing").await;
    let result = client.post("query { tokens { id } }", &json!({})).await;
    assert!(matches!(result, Err(GraphQlHttpError::MissingData)));
}

#[rstest]
#[tokio::test]
async fn test_post_with_invalid_json_is_an_error() {
    let (client, _) = client_for("/garbage").await;
    let result = client.post("query { tokens { id } }", &json!({})).await;
    assert!(matches!(result, Err(GraphQlHttpError::Json(_))));
}

#[rstest]
#[tokio::test]
async fn test_post_to_closed_port_is_a_transport_error() {
    let client = GraphQlHttpClient::new("http://127.0.0.1:9/graphql", Some(2)).unwrap();
    let result = client.post("query { tokens { id } }", &json!({})).await;
    assert!(matches!(result, Err(GraphQlHttpError::Transport(_))));
}
