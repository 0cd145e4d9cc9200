use super::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use multicare_core::constants::MIN_PBKDF2_ITERATIONS;
use multicare_core::{CoreConfig, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "correct-horse";

fn test_app() -> (TempDir, Router) {
    let temp = TempDir::new().unwrap();
    let cfg = CoreConfig::new(temp.path().join("api.db"), temp.path().join("uploads"), 30)
        .unwrap()
        .with_password_iterations(MIN_PBKDF2_ITERATIONS)
        .unwrap();
    cfg.prepare_upload_dir().unwrap();
    let store = Store::open(cfg.database_path()).unwrap();
    let state = AppState::new(Arc::new(cfg), store);
    (temp, app(state, cors_layer(None)))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn sign_up(app: &Router, role: &str, email: &str, full_name: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            json!({"email": email, "password": PASSWORD, "full_name": full_name, "role": role}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn log_in(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={email}&password={password}")))
        .unwrap();
    send(app, req).await
}

/// Signs up and logs in; returns the user id and bearer token.
async fn account(app: &Router, role: &str, email: &str, full_name: &str) -> (String, String) {
    let user = sign_up(app, role, email, full_name).await;
    let (status, body) = log_in(app, email, PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    (
        user["id"].as_str().unwrap().to_string(),
        body["access_token"].as_str().unwrap().to_string(),
    )
}

async fn register_patient(app: &Router, first_name: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/patients/register",
            None,
            json!({
                "first_name": first_name,
                "last_name": "Doe",
                "date_of_birth": "1984-02-29",
                "gender": "female",
                "presenting_complaint": "fever"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let (_temp, app) = test_app();
    let (status, body) = send(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, get_request("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/patients/ipd"].is_object());
}

#[tokio::test]
async fn test_signup_and_token_flow() {
    let (_temp, app) = test_app();
    let user = sign_up(&app, "doctor", "house@example.org", "Gregory House").await;
    assert_eq!(user["role"], "doctor");
    assert!(user.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            json!({"email": "HOUSE@example.org", "password": PASSWORD, "full_name": "Greg House", "role": "doctor"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_KEY");

    let (status, body) = log_in(&app, "house@example.org", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["email"], "house@example.org");

    let (status, body) = log_in(&app, "house@example.org", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_logout_revokes_the_token() {
    let (_temp, app) = test_app();
    let (_, nurse) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let (status, _) = send(&app, get_request("/patients", Some(&nurse))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, json_request("POST", "/auth/logout", Some(&nurse), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT, "{body}");

    let (status, _) = send(&app, get_request("/patients", Some(&nurse))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, json_request("POST", "/auth/logout", Some(&nurse), json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, json_request("POST", "/auth/logout", None, json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = log_in(&app, "carla@example.org", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_credentials_are_checked_before_the_body() {
    let (_temp, app) = test_app();
    let patient = register_patient(&app, "Jane").await;
    let triage_uri = format!("/patients/{patient}/triage");

    let malformed = Request::builder()
        .method("PUT")
        .uri(&triage_uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");

    let (status, body) = send(
        &app,
        json_request("PUT", &triage_uri, Some("forged-token"), json!({"triage_level": "Critical"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");

    for token in [None, Some("forged-token")] {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/documents/upload")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=xyz");
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let (status, body) = send(&app, builder.body(Body::from("garbage")).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
    }
}

#[tokio::test]
async fn test_staff_routes_require_a_staff_token() {
    let (_temp, app) = test_app();

    let response = app.clone().oneshot(get_request("/patients", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let (status, _) = send(&app, get_request("/patients", Some("forged-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, patient_token) = account(&app, "patient", "pat@example.org", "Pat Ient").await;
    let (status, body) = send(&app, get_request("/patients", Some(&patient_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (_, nurse_token) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let (status, body) = send(&app, get_request("/patients", Some(&nurse_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_triage_and_high_priority_alerts() {
    let (_temp, app) = test_app();
    let (_, nurse) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let urgent = register_patient(&app, "Jane").await;
    let calm = register_patient(&app, "John").await;

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/patients/{urgent}/triage"),
            Some(&nurse),
            json!({"triage_level": "Emergency"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["triage_level"], "Emergency");

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/patients/{calm}/triage"),
            Some(&nurse),
            json!({"triage_level": "Non-urgent"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/patients/{calm}/triage"),
            Some(&nurse),
            json!({"triage_level": "Critical"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = send(&app, get_request("/patients/alerts/high-priority", Some(&nurse))).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![urgent.as_str()]);

    let missing = multicare_core::ShardableUuid::new();
    let (status, body) = send(&app, get_request(&format!("/patients/{missing}"), Some(&nurse))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_admission_lifecycle() {
    let (_temp, app) = test_app();
    let (doctor_id, doctor) = account(&app, "doctor", "house@example.org", "Gregory House").await;
    let (_, nurse) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let patient = register_patient(&app, "Jane").await;
    let admit = json!({"patient_id": patient, "room_number": "ICU-3"});

    let (status, _) = send(&app, json_request("POST", "/patients/ipd", Some(&nurse), admit.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, admission) =
        send(&app, json_request("POST", "/patients/ipd", Some(&doctor), admit.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{admission}");
    assert_eq!(admission["status"], "Admitted");
    assert_eq!(admission["admitting_doctor_id"], doctor_id.as_str());

    let (status, body) = send(&app, json_request("POST", "/patients/ipd", Some(&doctor), admit)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, roster) = send(&app, get_request("/patients/ipd", Some(&nurse))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster[0]["doctor_name"], "Gregory House");
    assert_eq!(roster[0]["patient_name"], "Jane Doe");

    let admission_id = admission["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/patients/ipd/{admission_id}/transfer?new_department_id=7"),
            Some(&nurse),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "Transferred");
    assert_eq!(body["room_number"], "Dept-7");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/patients/ipd/{admission_id}/discharge"),
            Some(&nurse),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, roster) = send(&app, get_request("/patients/ipd", Some(&nurse))).await;
    assert_eq!(roster, json!([]));
}

#[tokio::test]
async fn test_bed_assignment() {
    let (_temp, app) = test_app();
    let (_, nurse) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let patient = register_patient(&app, "Jane").await;

    let (status, bed) = send(
        &app,
        json_request("POST", "/beds", Some(&nurse), json!({"bed_number": "B-1", "ward": "North"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bed["is_occupied"], false);

    let (status, body) = send(
        &app,
        json_request("POST", "/beds", Some(&nurse), json!({"bed_number": "B-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_KEY");

    let bed_id = bed["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/beds/{bed_id}"),
            Some(&nurse),
            json!({"is_occupied": true, "patient_id": patient}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_occupied"], true);
    assert_eq!(body["patient_id"], patient.as_str());

    let (status, body) = send(
        &app,
        json_request("PUT", &format!("/beds/{bed_id}"), Some(&nurse), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_occupied"], false);
    assert_eq!(body["patient_id"], Value::Null);
}

#[tokio::test]
async fn test_appointments_and_opd_view() {
    let (_temp, app) = test_app();
    let (doctor_id, _) = account(&app, "doctor", "house@example.org", "Gregory House").await;
    let (_, nurse) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let patient = register_patient(&app, "Jane").await;

    let (status, doctors) = send(&app, get_request("/appointments/doctors", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doctors[0]["id"], doctor_id.as_str());

    let (status, appointment) = send(
        &app,
        json_request(
            "POST",
            "/appointments/",
            None,
            json!({
                "patient_id": patient,
                "doctor_id": doctor_id,
                "appointment_time": "2026-03-14T09:30:00",
                "reason": "follow-up"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{appointment}");
    assert_eq!(appointment["status"], "pending");

    let (status, rows) = send(
        &app,
        get_request("/patients/opd?date_filter=2026-03-14", Some(&nurse)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["doctor_name"], "Gregory House");

    let (status, _) = send(
        &app,
        get_request("/patients/opd?date_filter=14-03-2026", Some(&nurse)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = appointment["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/appointments/{id}/status"),
            Some(&nurse),
            json!({"status": "cancelled"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/appointments/{id}/status"),
            Some(&nurse),
            json!({"status": "confirmed"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_prescriptions_are_written_by_doctors() {
    let (_temp, app) = test_app();
    let (_, doctor) = account(&app, "doctor", "house@example.org", "Gregory House").await;
    let (_, nurse) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let patient = register_patient(&app, "Jane").await;
    let prescription = json!({
        "patient_id": patient,
        "notes": "after meals",
        "medications": [
            {"medication_name": "Amoxicillin", "dosage": "500mg", "frequency": "3x daily", "duration": "7 days"},
            {"medication_name": "Paracetamol", "dosage": "1g", "frequency": "as needed", "duration": "5 days"}
        ]
    });

    let (status, _) = send(
        &app,
        json_request("POST", "/prescriptions/", Some(&nurse), prescription.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        send(&app, json_request("POST", "/prescriptions/", Some(&doctor), prescription)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["medications"][1]["medication_name"], "Paracetamol");

    let (status, list) = send(
        &app,
        get_request(&format!("/prescriptions/patient/{patient}"), Some(&nurse)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_document_upload_and_download() {
    let (_temp, app) = test_app();
    let (_, nurse) = account(&app, "nurse", "carla@example.org", "Carla Espinosa").await;
    let patient = register_patient(&app, "Jane").await;

    let boundary = "multicare-test-boundary";
    let multipart = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"patient_id\"\r\n\r\n{patient}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"document_type\"\r\n\r\nlab-result\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cbc.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nhaemoglobin 13.5\r\n--{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method("POST")
        .uri("/documents/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {nurse}"))
        .body(Body::from(multipart))
        .unwrap();
    let (status, document) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED, "{document}");
    assert_eq!(document["document_name"], "cbc.txt");
    assert_eq!(document["document_type"], "lab-result");
    assert_eq!(document["size_bytes"], 16);

    let (status, list) = send(
        &app,
        get_request(&format!("/documents/patient/{patient}"), Some(&nurse)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let id = document["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(get_request(&format!("/documents/{id}/content"), Some(&nurse)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"haemoglobin 13.5");
}

#[test]
fn test_cors_layer_accepts_origin_lists() {
    let _ = cors_layer(Some("https://ward.example.org, https://opd.example.org"));
    let _ = cors_layer(Some(""));
}
