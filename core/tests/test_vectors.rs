//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each case names an operation, its inputs, the exact request the builder
//! must produce, a simulated response, and either the ids the parser must
//! return or the error kind it must raise. URLs and bodies are compared as
//! raw strings because parameter order and percent-encoding are part of the
//! wire contract.

use facebook_graph::{GraphConfig, GraphError, GraphRequests, HttpMethod, HttpRequest, HttpResponse, NewCheckin, PlacesRequests};
use serde_json::Value;

const BASE_URL: &str = "https://graph.facebook.com";

fn graph() -> GraphRequests {
    GraphRequests::new(GraphConfig::new("someAccessToken"))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn error_kind(err: &GraphError) -> &'static str {
    match err {
        GraphError::NotAuthorized(_) => "NotAuthorized",
        GraphError::ResourceNotFound { .. } => "ResourceNotFound",
        GraphError::Api { .. } => "Api",
        GraphError::Deserialization(_) => "Deserialization",
        GraphError::Serialization(_) => "Serialization",
        GraphError::InvalidUrl(_) => "InvalidUrl",
        GraphError::Transport(_) => "Transport",
    }
}

fn build(places: &PlacesRequests<'_>, operation: &str, input: &Value) -> HttpRequest {
    let str_field = |name: &str| input[name].as_str().map(str::to_string);
    let u32_field = |name: &str, default: u32| input[name].as_u64().map_or(default, |v| v as u32);
    let f64_field = |name: &str| input[name].as_f64().unwrap();

    match operation {
        "get_checkins" => {
            let user = str_field("user_id").unwrap_or_else(|| "me".to_string());
            places
                .build_get_checkins(&user, u32_field("offset", 0), u32_field("limit", 25))
                .unwrap()
        }
        "get_checkin" => places.build_get_checkin(&str_field("id").unwrap()).unwrap(),
        "checkin" => {
            let mut checkin = NewCheckin::new(
                str_field("place_id").unwrap(),
                f64_field("latitude"),
                f64_field("longitude"),
            );
            if let Some(message) = str_field("message") {
                checkin = checkin.message(message);
            }
            if let Some(tags) = input["tags"].as_array() {
                checkin = checkin.tags(tags.iter().map(|t| t.as_str().unwrap().to_string()));
            }
            places.build_checkin(&checkin).unwrap()
        }
        "search" => places
            .build_search(
                &str_field("query").unwrap(),
                f64_field("latitude"),
                f64_field("longitude"),
                u32_field("distance", 0),
            )
            .unwrap(),
        other => panic!("unknown operation: {other}"),
    }
}

/// Run the parser for `operation` and reduce the result to returned ids.
fn parse(places: &PlacesRequests<'_>, operation: &str, response: HttpResponse) -> Result<Vec<String>, GraphError> {
    match operation {
        "get_checkins" => places
            .parse_get_checkins(response)
            .map(|list| list.into_iter().map(|c| c.id).collect()),
        "get_checkin" => places.parse_get_checkin(response).map(|c| vec![c.id]),
        "checkin" => places.parse_checkin(response).map(|id| vec![id]),
        "search" => places
            .parse_search(response)
            .map(|list| list.into_iter().map(|p| p.id).collect()),
        other => panic!("unknown operation: {other}"),
    }
}

#[test]
fn places_test_vectors() {
    let raw = include_str!("../../test-vectors/places.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let graph = graph();
    let places = PlacesRequests::new(&graph);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = build(&places, operation, &case["input"]);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
        assert_eq!(req.body.as_deref(), expected_req["body"].as_str(), "{name}: body");

        // Verify parse
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = parse(&places, operation, response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.expect_err(name);
            assert_eq!(error_kind(&err), expected_error.as_str().unwrap(), "{name}: error kind");
        } else {
            let ids = result.unwrap_or_else(|e| panic!("{name}: {e}"));
            let expected: Vec<String> = serde_json::from_value(case["expected_ids"].clone()).unwrap();
            assert_eq!(ids, expected, "{name}: parsed ids");
        }
    }
}
