//! Integration tests for issuance, courses and config against PostgreSQL.
//!
//! Requires TEST_DATABASE_URL environment variable or local PostgreSQL.
//! Run with: cargo test --test issuance_integration -- --ignored

mod common;

use axum::http::StatusCode;
use certdesk_server::create_router;
use certdesk_server::models::{CourseInsert, InstitutionConfig, NewCertificate};
use certdesk_server::storage;
use chrono::NaiveDate;
use common::*;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Tests the complete issuance flow:
/// 1. Create a course
/// 2. Issue a certificate for it
/// 3. Find it through the public search
/// 4. Download the PDF
/// 5. Reject a second certificate for the same person and course
#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_complete_issuance_flow() {
    let pool = create_test_pool().await;
    let (state, mailer) = test_state(pool.clone());
    let app = create_router(state);

    let course = unique("Primeros Auxilios");
    let identification = unique("ID");

    // Step 1: create the course
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/courses",
            Some(ADMIN_TOKEN),
            &json!({ "name": course }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Step 2: issue
    let form = json!({
        "names": "Ana María",
        "surnames": "López",
        "identification": identification,
        "email": "ana@example.org",
        "course": course,
        "issueDate": "2025-03-15"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/certificates", Some(ADMIN_TOKEN), &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    let code = body["certificate"]["uniqueCode"].as_str().unwrap().to_string();
    assert!(certdesk_core::is_valid_code(&code));
    assert_eq!(body["fileName"], "Certificado_Ana María_López.pdf");
    assert_eq!(body["email"]["success"], true);
    assert!(body["certificate"]["courseId"].is_string());
    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(mailer.sent()[0].mail.code, code);

    // Step 3: public search by a fragment of the identification
    let fragment = &identification[3..12];
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/public/certificates?identification={}", fragment),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["certificates"][0]["uniqueCode"], code.as_str());
    assert!(body["certificates"][0].get("email").is_none());

    // Step 4: download
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/public/certificates/{}/pdf", code),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    // Step 5: duplicate
    let response = app
        .oneshot(json_request("POST", "/api/v1/certificates", Some(ADMIN_TOKEN), &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_duplicate_guard_matches_literal_course_names() {
    let pool = create_test_pool().await;
    let identification = unique("ID");
    let course = unique("Curso sin catálogo");

    assert!(!storage::certificate_exists(&pool, &identification, &course)
        .await
        .unwrap());

    let certificate = storage::insert_certificate(
        &pool,
        &NewCertificate {
            names: "Luis".to_string(),
            surnames: "Pardo".to_string(),
            identification: identification.clone(),
            email: "luis@example.org".to_string(),
            phone: None,
            course: course.clone(),
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            unique_code: certdesk_core::generate_unique_code(),
            snapshot: InstitutionConfig::default(),
        },
    )
    .await
    .unwrap();

    assert!(certificate.course_id.is_none());
    assert_eq!(certificate.course, course);
    assert!(storage::certificate_exists(&pool, &identification, &course)
        .await
        .unwrap());

    let found = storage::find_by_code(&pool, &certificate.unique_code.to_lowercase())
        .await
        .unwrap()
        .expect("lookup by code is case-insensitive");
    assert_eq!(found.id, certificate.id);
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_course_insert_reports_duplicates() {
    let pool = create_test_pool().await;
    let name = unique("Excel Avanzado");

    assert_eq!(storage::insert_course(&pool, &name).await.unwrap(), CourseInsert::Created);
    assert_eq!(storage::insert_course(&pool, &name).await.unwrap(), CourseInsert::Duplicate);
    assert!(storage::list_course_names(&pool).await.contains(&name));

    assert!(storage::delete_course(&pool, &name).await.unwrap());
    assert!(!storage::delete_course(&pool, &name).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_config_defaults_and_upsert() {
    let pool = create_test_pool().await;

    sqlx::query("DELETE FROM app_config")
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(storage::fetch_config(&pool).await, InstitutionConfig::default());

    let updated = InstitutionConfig {
        institution_name: "Academia Norte".to_string(),
        primary_color: "#aa0000".to_string(),
        ..InstitutionConfig::default()
    };
    storage::update_config(&pool, &updated).await.unwrap();
    assert_eq!(storage::fetch_config(&pool).await, updated);

    // Second upsert updates the same row.
    let renamed = InstitutionConfig {
        institution_name: "Academia Sur".to_string(),
        ..updated
    };
    storage::update_config(&pool, &renamed).await.unwrap();
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM app_config")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.0, 1);
    assert_eq!(storage::fetch_config(&pool).await.institution_name, "Academia Sur");

    sqlx::query("DELETE FROM app_config")
        .execute(&pool)
        .await
        .unwrap();
}
