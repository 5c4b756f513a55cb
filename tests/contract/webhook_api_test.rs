//! Contract tests for POST /payments/webhook
//!
//! The endpoint is public; gateways retry on any non-2xx, so status codes
//! decide whether a callback is redelivered.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::test;
use helpers::*;
use rust_decimal_macros::dec;

use feegov::payments::services::SIGNATURE_HEADER;
use feegov::payments::{PaymentStatus, WebhookVerifier};

fn callback(body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
}

#[actix_web::test]
async fn test_success_callback_returns_completed() {
    let f = Fixture::new();
    let app = api!(f);
    let seeded = f.seed_payment(dec!(1000.00), dec!(500.00));

    let req = callback(callback_body(&seeded.reference, SUCCESS_CODE)).to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["transaction_reference"], seeded.reference.as_str());
    assert_eq!(body["data"]["amount_paid"], "500.00");
    assert_eq!(body["data"]["fee_amount"], "12.50");
    assert_eq!(body["data"]["paid_amount"], "500.00");
    assert_eq!(body["data"]["assignment_status"], "active");
    assert_eq!(body["data"]["installment_label"], "Full Payment");
}

#[actix_web::test]
async fn test_redelivery_returns_duplicate() {
    let f = Fixture::new();
    let app = api!(f);
    let seeded = f.seed_payment(dec!(1000.00), dec!(500.00));

    for _ in 0..2 {
        let req = callback(callback_body(&seeded.reference, SUCCESS_CODE)).to_request();
        send(&app, req).await;
    }
    let req = callback(callback_body(&seeded.reference, SUCCESS_CODE)).to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "duplicate");
    assert_eq!(body["data"]["payment_status"], "completed");
    assert_eq!(f.store.ledger().len(), 1);
}

#[actix_web::test]
async fn test_failure_callback_returns_failed() {
    let f = Fixture::new();
    let app = api!(f);
    let seeded = f.seed_payment(dec!(1000.00), dec!(500.00));

    let req = callback(callback_body(&seeded.reference, "INS-2001")).to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["result_code"], "INS-2001");
    assert_eq!(f.store.payment(seeded.payment_id).status, PaymentStatus::Failed);
}

#[actix_web::test]
async fn test_plain_field_names_and_numeric_codes() {
    let f = Fixture::new();
    let app = api!(f);
    let seeded = f.seed_payment(dec!(1000.00), dec!(500.00));

    let body = serde_json::to_vec(&serde_json::json!({
        "transaction_reference": seeded.reference,
        "result_code": 17,
    }))
    .unwrap();
    let (status, body) = send(&app, callback(body).to_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["result_code"], "17");
}

#[actix_web::test]
async fn test_unknown_reference_is_not_found() {
    let f = Fixture::new();
    let app = api!(f);

    let req = callback(callback_body("TXN-unknown", SUCCESS_CODE)).to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_malformed_callback_is_server_error() {
    let f = Fixture::new();
    let app = api!(f);

    for payload in [
        b"not json".to_vec(),
        b"[1, 2, 3]".to_vec(),
        br#"{"output_ResponseCode": "INS-0"}"#.to_vec(),
        br#"{"input_ThirdPartyReference": "TXN-1"}"#.to_vec(),
    ] {
        let (status, body) = send(&app, callback(payload).to_request()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "MALFORMED_CALLBACK");
    }
}

#[actix_web::test]
async fn test_signature_required_when_secret_configured() {
    let secret = "whsec_test";
    let f = Fixture::with_webhook_secret(secret);
    let app = api!(f);
    let seeded = f.seed_payment(dec!(1000.00), dec!(500.00));
    let body = callback_body(&seeded.reference, SUCCESS_CODE);

    // Missing
    let (status, json) = send(&app, callback(body.clone()).to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");

    // Signed with the wrong secret
    let forged = WebhookVerifier::sign("other", &body).unwrap();
    let req = callback(body.clone())
        .insert_header((SIGNATURE_HEADER, forged))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(f.store.payment(seeded.payment_id).status, PaymentStatus::Pending);

    // Valid, with the optional scheme prefix
    let signature = WebhookVerifier::sign(secret, &body).unwrap();
    let req = callback(body)
        .insert_header((SIGNATURE_HEADER, format!("sha256={}", signature)))
        .to_request();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "completed");
}

#[actix_web::test]
async fn test_storage_failure_asks_for_redelivery() {
    let f = Fixture::new();
    let app = api!(f);
    let seeded = f.seed_payment(dec!(1000.00), dec!(500.00));

    f.store.set_unavailable(true);
    let req = callback(callback_body(&seeded.reference, SUCCESS_CODE)).to_request();
    let (status, body) = send(&app, req).await;
    f.store.set_unavailable(false);

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
    assert!(f.store.ledger().is_empty());
}
