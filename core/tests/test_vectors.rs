//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Bodies and results are compared as parsed
//! JSON or typed values, never as raw strings.

use library_core::{
    ApiError, Credentials, HttpMethod, HttpRequest, HttpResponse, LibraryClient, Loan, LoanInput,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client(vectors: &Value) -> LibraryClient {
    let c = LibraryClient::new(BASE_URL);
    match vectors["token"].as_str() {
        Some(token) => c.with_token(token),
        None => c,
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be absent"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn error_variant(err: &ApiError) -> &'static str {
    match err {
        ApiError::Unauthorized(_) => "Unauthorized",
        ApiError::Forbidden(_) => "Forbidden",
        ApiError::NotFound(_) => "NotFound",
        ApiError::Rejected { .. } => "Rejected",
        ApiError::Server { .. } => "Server",
        ApiError::Deserialization(_) => "Deserialization",
        other => panic!("unexpected error variant: {other:?}"),
    }
}

fn check_error(name: &str, case: &Value, err: &ApiError) {
    assert_eq!(error_variant(err), case["expected_error"].as_str().unwrap(), "{name}: error");
    if let Some(message) = case["expected_message"].as_str() {
        assert_eq!(err.to_string(), message, "{name}: message");
    }
}

// ---------------------------------------------------------------------------
// Create loan
// ---------------------------------------------------------------------------

#[test]
fn loan_create_test_vectors() {
    let raw = include_str!("../../test-vectors/loan_create.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client(&vectors);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: LoanInput = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create::<Loan>(&input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let loan = c.parse_one::<Loan>(simulated(case)).unwrap();
        let expected: Loan = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(loan, expected, "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// Loan actions
// ---------------------------------------------------------------------------

#[test]
fn loan_action_test_vectors() {
    let raw = include_str!("../../test-vectors/loan_actions.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client(&vectors);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();

        let req = match case["action"].as_str().unwrap() {
            "renew" => c.build_renew_loan(id),
            "return" => c.build_return_loan(id),
            "pay_fine" => c.build_pay_fine(id),
            other => panic!("unknown action: {other}"),
        };
        check_request(name, &req, &case["expected_request"]);

        match c.parse_one::<Loan>(simulated(case)) {
            Ok(loan) => {
                assert!(case.get("expected_error").is_none(), "{name}: expected an error");
                let expected: Loan = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(loan, expected, "{name}: result");
            }
            Err(err) => check_error(name, case, &err),
        }
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let raw = include_str!("../../test-vectors/login.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client(&vectors);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let credentials = Credentials::new(
            input["email"].as_str().unwrap(),
            input["senha"].as_str().unwrap(),
        );

        let req = c.build_login(&credentials).unwrap();
        check_request(name, &req, &case["expected_request"]);

        match c.parse_login(simulated(case)) {
            Ok(login) => {
                assert_eq!(login.token, case["expected_token"].as_str().unwrap(), "{name}: token");
                let user_id = login.user.and_then(|u| u.id);
                assert_eq!(user_id.as_deref(), case["expected_user_id"].as_str(), "{name}: user");
            }
            Err(err) => check_error(name, case, &err),
        }
    }
}
