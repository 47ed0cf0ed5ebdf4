//! Integration tests for the reqwest transport against a local TCP responder.

// `expect` is idiomatic in test code for failing fast on precondition violations.
#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use std::sync::Arc;
use std::time::Duration;

use rental_sync::domain::ports::{Transport, TransportError};
use rental_sync::domain::{Endpoint, ErrorKind, FetchOutcome, ResourceClient};
use rental_sync::outbound::http::ReqwestTransport;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Serve exactly one canned HTTP response and return the raw request text.
async fn serve_once(response: &'static str) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let address = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let request = read_request(&mut socket).await;
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.expect("shutdown socket");
        request
    });
    let base = Url::parse(&format!("http://{address}")).expect("valid local URL");
    (base, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut received = Vec::new();
    let mut buffer = [0_u8; 1024];
    loop {
        let read = socket.read(&mut buffer).await.expect("read request");
        received.extend(buffer.iter().take(read));
        let text = String::from_utf8_lossy(&received);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let expected = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if body.len() >= expected {
                return text.into_owned();
            }
        }
        if read == 0 {
            return text.into_owned();
        }
    }
}

fn client(base: Url) -> ResourceClient {
    let transport = ReqwestTransport::new(Some(Duration::from_secs(5))).expect("build transport");
    ResourceClient::new(Arc::new(transport), base)
}

#[tokio::test]
async fn success_bodies_and_request_details_cross_the_wire() {
    let (base, server) = serve_once(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 28\r\nConnection: close\r\n\r\n{\"membership_tier\":\"gold\"}\r\n",
    )
    .await;
    let endpoint = Endpoint::put("/api/v1/user/settings")
        .query("user_id", "7")
        .header("userId", "7")
        .json_body(json!({ "name": "Ada" }))
        .build();

    let outcome = client(base).call(&endpoint).await;
    let request = server.await.expect("server task");

    assert_eq!(
        outcome,
        FetchOutcome::success(200, json!({ "membership_tier": "gold" }))
    );
    assert!(request.starts_with("PUT /api/v1/user/settings?user_id=7 HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(request.to_ascii_lowercase().contains("userid: 7"));
    assert!(request.ends_with(r#"{"name":"Ada"}"#));
}

#[tokio::test]
async fn error_statuses_keep_the_server_message() {
    let (base, server) = serve_once(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nContent-Length: 17\r\nConnection: close\r\n\r\n{\"message\":\"bad\"}",
    )
    .await;

    let outcome = client(base)
        .call(&Endpoint::get("/api/v1/billing/bills").build())
        .await;
    server.await.expect("server task");

    assert_eq!(
        outcome,
        FetchOutcome::failure(ErrorKind::HttpError, "bad", Some(500))
    );
}

#[tokio::test]
async fn status_phrases_stand_in_for_missing_messages() {
    let (base, server) = serve_once(
        "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope",
    )
    .await;

    let outcome = client(base)
        .call(&Endpoint::get("/api/v1/billing/invoice").build())
        .await;
    server.await.expect("server task");

    assert_eq!(
        outcome,
        FetchOutcome::failure(ErrorKind::HttpError, "Not Found", Some(404))
    );
}

#[tokio::test]
async fn refused_connections_are_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let address = listener.local_addr().expect("listener address");
    drop(listener);
    let transport = ReqwestTransport::new(Some(Duration::from_secs(5))).expect("build transport");
    let request = rental_sync::domain::ports::TransportRequest {
        method: rental_sync::domain::Method::Get,
        url: Url::parse(&format!("http://{address}/api/v1/booking/vehicles"))
            .expect("valid local URL"),
        headers: std::collections::BTreeMap::new(),
        body: None,
    };

    let error = transport.send(&request).await.expect_err("nothing listens");

    assert!(matches!(error, TransportError::Unreachable { .. }));
}
