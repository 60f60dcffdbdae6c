//! HTTP client tests against a mock server

use std::collections::BTreeMap;
use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use binder_core::QueryGraph;
use binder_relay::{
    CypherDegreeLookup, DegreeLookup, OnehopService, RelayError, TrapiClient, TrapiClientConfig,
};

fn onehop_qgraph() -> QueryGraph {
    serde_json::from_value(serde_json::json!({
        "nodes": {
            "n0": {"ids": ["MONDO:0005148"]},
            "n1": {"categories": ["biolink:ChemicalSubstance"]}
        },
        "edges": {
            "e01": {"subject": "n1", "object": "n0", "predicates": ["biolink:treats"]}
        }
    }))
    .unwrap()
}

fn client(server: &MockServer) -> TrapiClient {
    TrapiClient::new(TrapiClientConfig {
        backoff: Duration::from_millis(10),
        ..TrapiClientConfig::new(format!("{}/query", server.uri()))
    })
}

#[tokio::test]
async fn decodes_knowledge_graph_and_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(serde_json::json!({
            "message": {"query_graph": {"nodes": {"n0": {"ids": ["MONDO:0005148"]}}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {
                "knowledge_graph": {
                    "nodes": {
                        "MONDO:0005148": {"categories": ["biolink:Disease"]},
                        "CHEBI:6801": {"categories": ["biolink:ChemicalSubstance"]}
                    },
                    "edges": {
                        "e-treats": {
                            "subject": "CHEBI:6801",
                            "predicate": "biolink:treats",
                            "object": "MONDO:0005148"
                        }
                    }
                },
                "results": [{
                    "node_bindings": {
                        "n0": [{"id": "MONDO:0005148"}],
                        "n1": [{"id": "CHEBI:6801"}]
                    },
                    "edge_bindings": {"e01": [{"id": "e-treats"}]}
                }]
            }
        })))
        .mount(&server)
        .await;

    let (kgraph, answers) = client(&server).lookup(&onehop_qgraph()).await.unwrap();
    assert_eq!(kgraph.nodes.len(), 2);
    assert_eq!(kgraph.edges["e-treats"].predicate, "biolink:treats");
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].node_bindings["n1"][0].id, "CHEBI:6801");
}

#[tokio::test]
async fn missing_response_fields_default_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {}
        })))
        .mount(&server)
        .await;

    let (kgraph, answers) = client(&server).lookup(&onehop_qgraph()).await.unwrap();
    assert!(kgraph.is_empty());
    assert!(answers.is_empty());
}

#[tokio::test]
async fn retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {"results": [{"node_bindings": {}, "edge_bindings": {}}]}
        })))
        .mount(&server)
        .await;

    let (_, answers) = client(&server).lookup(&onehop_qgraph()).await.unwrap();
    assert_eq!(answers.len(), 1);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).lookup(&onehop_qgraph()).await.unwrap_err();
    assert!(matches!(err, RelayError::Remote { attempts: 3, .. }));
}

#[tokio::test]
async fn degree_lookup_parses_cypher_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cypher"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"data": [{"row": [42]}]}]
        })))
        .mount(&server)
        .await;

    let lookup = CypherDegreeLookup::new(format!("{}/cypher", server.uri()));
    assert_eq!(lookup.degree("MONDO:0005737").await.unwrap(), 42);
}

#[tokio::test]
async fn malformed_degree_response_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": []
        })))
        .mount(&server)
        .await;

    let lookup = CypherDegreeLookup::new(server.uri());
    let err = lookup.degree("MONDO:0005737").await.unwrap_err();
    assert!(matches!(err, RelayError::Degree(_)));
}

#[tokio::test]
async fn request_body_carries_the_onehop_graph() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "message": {
                "query_graph": {
                    "edges": {"e01": {"subject": "n1", "object": "n0"}}
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let qgraph = QueryGraph {
        nodes: BTreeMap::from([
            ("n0".to_string(), serde_json::from_value(serde_json::json!({"ids": ["X:1"]})).unwrap()),
            ("n1".to_string(), serde_json::from_value(serde_json::json!({})).unwrap()),
        ]),
        edges: BTreeMap::from([(
            "e01".to_string(),
            serde_json::from_value(serde_json::json!({"subject": "n1", "object": "n0"})).unwrap(),
        )]),
    };
    client(&server).lookup(&qgraph).await.unwrap();
}
