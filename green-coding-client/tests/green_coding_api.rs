//! HTTP behaviour of `GreenCodingApi` against a wiremock server.

use green_coding_client::{ApiError, GreenCodingApi, MeasurementQuery, MetricsApi, RemoteMetricsClient};
use serde_json::json;
use time::macros::date;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> GreenCodingApi {
    GreenCodingApi::new(reqwest::Client::new(), &format!("{}/v1/ci/", server.uri())).expect("valid base url")
}

fn query(branch: &str) -> MeasurementQuery {
    MeasurementQuery {
        repo: "Green-Software-Foundation/if".to_string(),
        branch: branch.to_string(),
        workflow: 66389738,
        start_date: date!(2024-07-24),
        end_date: date!(2024-07-25),
    }
}

fn measurement_rows() -> serde_json::Value {
    json!([
        [3123, "mJ", "10074332144", "2024-07-24T09:43:38.428708+00:00", "checkout", "EPYC_7763",
         "72db420085ca7a904bc264ff3bcfb54d6a35b4c8", 1, "github", 4, "Node.js CI", "", "", "", "419", "0.001593851"],
        [81767, "mJ", "10074332144", "2024-07-24T09:43:55.393999+00:00", "npm install", "EPYC_7763",
         "72db420085ca7a904bc264ff3bcfb54d6a35b4c8", 17, "github", 48, "Node.js CI", "", "", "", "419", "0.039110708"]
    ])
}

#[tokio::test]
async fn sends_snake_case_date_only_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .and(query_param("repo", "Green-Software-Foundation/if"))
        .and(query_param("branch", "main"))
        .and(query_param("workflow", "66389738"))
        .and(query_param("start_date", "2024-07-24"))
        .and(query_param("end_date", "2024-07-25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": measurement_rows(),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = api(&server).measurements(&query("main")).await.expect("rows");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].energy_mj, 3123.0);
    assert_eq!(rows[1].label(), Some("npm install"));
    assert_eq!(rows[1].carbon_g, 0.039110708);
}

#[tokio::test]
async fn no_content_is_an_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let rows = api(&server).measurements(&query("main")).await.expect("rows");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn unsuccessful_envelope_carries_status_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "data": { "statusText": "Workflow not found" },
        })))
        .mount(&server)
        .await;

    let err = api(&server).measurements(&query("main")).await.unwrap_err();
    assert_eq!(err, ApiError::Unsuccessful("Workflow not found".to_string()));
}

#[tokio::test]
async fn server_error_uses_structured_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "err": [{ "msg": "field required", "loc": ["query", "workflow"] }],
        })))
        .mount(&server)
        .await;

    let err = api(&server).measurements(&query("main")).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Server {
            status: 422,
            message: "field required".to_string(),
        }
    );
}

#[tokio::test]
async fn server_error_without_body_uses_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = api(&server).measurements(&query("main")).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Server {
            status: 500,
            message: "Internal Server Error".to_string(),
        }
    );
}

#[tokio::test]
async fn malformed_rows_are_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [[1, "mJ"]],
        })))
        .mount(&server)
        .await;

    let err = api(&server).measurements(&query("main")).await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let server = MockServer::start().await;
    let api = api(&server);
    drop(server);

    let err = api.measurements(&query("main")).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn all_branches_unions_rows_from_in_range_branches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/runs"))
        .and(query_param("repo", "Green-Software-Foundation/if"))
        .and(query_param("sort_by", "date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                ["Green-Software-Foundation/if", "main", 66389738, "github", "2024-07-24T12:00:00+00:00"],
                ["Green-Software-Foundation/if", "old", 66389738, "github", "2024-06-01T12:00:00+00:00"]
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .and(query_param("branch", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": measurement_rows(),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/ci/measurements"))
        .and(query_param("branch", "old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let client = RemoteMetricsClient::new(api(&server));
    let rows = client.fetch(&query("all")).await.expect("rows");

    assert_eq!(rows.len(), 2);
}
