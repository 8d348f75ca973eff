use mockito::{Matcher, Server};
use pay_sdk::http::build_client;
use pay_sdk::psp::MoneyFusionGateway;
use pay_sdk::{PaymentError, PaymentGateway, PaymentRequest, PaymentStatus};
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;

fn gateway(server: &Server) -> MoneyFusionGateway {
    MoneyFusionGateway::new(format!("{}/api/pay", server.url()))
        .with_status_url(format!("{}/paiementNotif", server.url()))
}

#[tokio::test]
async fn create_payment_returns_token_as_transaction_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/pay")
        .match_body(Matcher::PartialJson(json!({
            "totalPrice": 1500.0,
            "article": [{"item": "Monthly plan", "price": 1500.0}],
            "personal_Info": [{"orderId": "order-5"}],
            "numeroSend": "0700000000",
            "nomclient": "Koffi",
            "return_url": "https://shop.example/back",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "statut": true,
                "token": "tok_5f1e",
                "message": "Paiement en cours",
                "url": "https://payin.moneyfusion.net/payment/tok_5f1e",
            })
            .to_string(),
        )
        .create_async()
        .await;

    let request = PaymentRequest::new(dec!(1500), "order-5")
        .customer_phone("0700000000")
        .customer_name("Koffi")
        .description("Monthly plan")
        .return_url("https://shop.example/back");
    let resp = gateway(&server).create_payment(request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(resp.transaction_id, "tok_5f1e");
    assert_eq!(resp.payment_url, "https://payin.moneyfusion.net/payment/tok_5f1e");
    assert_eq!(resp.raw_response["message"], "Paiement en cours");
}

#[tokio::test]
async fn missing_phone_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/pay")
        .expect(0)
        .create_async()
        .await;

    let err = gateway(&server)
        .create_payment(PaymentRequest::new(dec!(1000), "order-1").customer_name("Awa"))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, PaymentError::Validation(_)), "{err}");
}

#[tokio::test]
async fn false_flag_with_http_200_is_declined() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/pay")
        .with_status(200)
        .with_body(r#"{"statut": false, "message": "insufficient funds"}"#)
        .create_async()
        .await;

    let err = gateway(&server)
        .create_payment(PaymentRequest::new(dec!(1000), "order-1").customer_phone("0700000000"))
        .await
        .unwrap_err();

    match err {
        PaymentError::Declined { message, .. } => assert_eq!(message, "insufficient funds"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_failure_on_create_is_upstream() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/pay")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let err = gateway(&server)
        .create_payment(PaymentRequest::new(dec!(1000), "order-1").customer_phone("0700000000"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Upstream { status: Some(500), .. }), "{err}");
}

#[tokio::test]
async fn success_without_token_is_upstream() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/pay")
        .with_status(200)
        .with_body(r#"{"statut": true, "url": "https://payin.moneyfusion.net/payment/x"}"#)
        .create_async()
        .await;

    let err = gateway(&server)
        .create_payment(PaymentRequest::new(dec!(1000), "order-1").customer_phone("0700000000"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Upstream { .. }), "{err}");
}

#[tokio::test]
async fn no_paid_is_pending() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/paiementNotif/tok_1")
        .with_status(200)
        .with_body(r#"{"statut": true, "data": {"statut": "no paid", "Montant": 1000}}"#)
        .create_async()
        .await;

    let status = gateway(&server).check_status("tok_1").await.unwrap();
    assert_eq!(status, PaymentStatus::Pending);
}

#[tokio::test]
async fn false_top_level_flag_is_unknown() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/paiementNotif/tok_404")
        .with_status(200)
        .with_body(r#"{"statut": false, "message": "Paiement introuvable"}"#)
        .create_async()
        .await;

    let status = gateway(&server).check_status("tok_404").await.unwrap();
    assert_eq!(status, PaymentStatus::Unknown);
}

#[tokio::test]
async fn not_found_is_unknown() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/paiementNotif/tok_gone")
        .with_status(404)
        .create_async()
        .await;

    let status = gateway(&server).check_status("tok_gone").await.unwrap();
    assert_eq!(status, PaymentStatus::Unknown);
}

#[tokio::test]
async fn status_server_error_is_upstream() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/paiementNotif/tok_1")
        .with_status(502)
        .create_async()
        .await;

    let err = gateway(&server).check_status("tok_1").await.unwrap_err();
    assert!(matches!(err, PaymentError::Upstream { status: Some(502), .. }), "{err}");
}

#[tokio::test]
async fn token_reaches_the_same_record_on_the_status_host() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/api/pay")
        .with_status(200)
        .with_body(r#"{"statut": true, "token": "tok_rt", "url": "https://payin.moneyfusion.net/payment/tok_rt"}"#)
        .create_async()
        .await;
    let status = server
        .mock("GET", "/paiementNotif/tok_rt")
        .with_status(200)
        .with_body(r#"{"statut": true, "data": {"statut": "paid"}}"#)
        .expect(1)
        .create_async()
        .await;

    let gateway = gateway(&server);
    let resp = gateway
        .create_payment(PaymentRequest::new(dec!(250), "order-rt").customer_phone("0700000000"))
        .await
        .unwrap();
    assert_eq!(
        gateway.check_status(&resp.transaction_id).await.unwrap(),
        PaymentStatus::Paid
    );
    status.assert_async().await;
}

#[tokio::test]
async fn token_with_slash_is_escaped() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/paiementNotif/tok%2Fa")
        .with_status(200)
        .with_body(r#"{"statut": true, "data": {"statut": "failure"}}"#)
        .expect(1)
        .create_async()
        .await;

    let status = gateway(&server).check_status("tok/a").await.unwrap();
    assert_eq!(status, PaymentStatus::Failed);
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_token_is_unknown_without_a_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let status = gateway(&server).check_status("").await.unwrap();
    assert_eq!(status, PaymentStatus::Unknown);
    mock.assert_async().await;
}

#[tokio::test]
async fn silent_server_times_out_as_upstream_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = build_client(Duration::from_millis(300)).unwrap();
    let gateway = MoneyFusionGateway::with_client(format!("http://{addr}/api/pay"), client);
    let err = gateway
        .create_payment(PaymentRequest::new(dec!(1000), "order-1").customer_phone("0700000000"))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Upstream { status: None, .. }), "{err}");
    assert!(err.to_string().contains("timed out"), "{err}");
}
