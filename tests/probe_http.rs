use std::collections::HashSet;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::header::{LOCATION, USER_AGENT as USER_AGENT_HEADER};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use sitewatch::http_probe::prelude::*;

fn with_status(status: u16) -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = StatusCode::from_u16(status).expect("status");
    response
}

fn redirect_to(status: u16, location: &'static str) -> Response<String> {
    let mut response = with_status(status);
    response
        .headers_mut()
        .insert(LOCATION, hyper::header::HeaderValue::from_static(location));
    response
}

async fn route(req: Request<Incoming>) -> Result<Response<String>, Infallible> {
    let response = match req.uri().path() {
        "/ok" => Response::new("hello".to_string()),
        // 3xx without a Location header is returned as the final response
        "/moved" => with_status(301),
        "/hop" => redirect_to(302, "/ok"),
        "/loop" => redirect_to(302, "/loop"),
        "/missing" => with_status(404),
        "/broken" => with_status(500),
        "/odd" => with_status(999),
        "/agent" => {
            let agent = req
                .headers()
                .get(USER_AGENT_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if agent == USER_AGENT {
                with_status(200)
            } else {
                with_status(400)
            }
        }
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            with_status(200)
        }
        _ => with_status(404),
    };
    Ok(response)
}

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(route))
                    .await;
            });
        }
    });
    addr
}

/// Answers a TLS ClientHello with plain HTTP bytes.
async fn spawn_plaintext_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                    .await;
                tokio::time::sleep(Duration::from_secs(2)).await;
            });
        }
    });
    addr
}

/// Reads the request, then closes the socket without answering.
async fn spawn_hangup_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            drop(stream);
        }
    });
    addr
}

#[tokio::test]
async fn test_online() {
    let addr = spawn_server().await;
    let outcome = check_one(&format!("http://{addr}/ok"), 5).await;
    assert_eq!(outcome.category, Category::Online);
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.display_label(), "Online");
    assert!(outcome.response_time_ms >= 0.0);
}

#[tokio::test]
async fn test_not_found_is_client_error() {
    let addr = spawn_server().await;
    let outcome = check_one(&format!("http://{addr}/missing"), 5).await;
    assert_eq!(outcome.category, Category::ClientError);
    assert_eq!(outcome.status_code, Some(404));
    assert_eq!(outcome.display_label(), "Client Error (404)");
}

#[tokio::test]
async fn test_server_error_and_unknown_status() {
    let addr = spawn_server().await;
    let broken = check_one(&format!("http://{addr}/broken"), 5).await;
    assert_eq!(broken.category, Category::ServerError);
    assert_eq!(broken.status_code, Some(500));

    let odd = check_one(&format!("http://{addr}/odd"), 5).await;
    assert_eq!(odd.category, Category::UnknownStatus);
    assert_eq!(odd.status_code, Some(999));
}

#[tokio::test]
async fn test_final_redirect_status_is_reported() {
    let addr = spawn_server().await;
    let outcome = check_one(&format!("http://{addr}/moved"), 5).await;
    assert_eq!(outcome.category, Category::Redirect);
    assert_eq!(outcome.status_code, Some(301));
    assert_eq!(outcome.display_label(), "Redirect (301)");
}

#[tokio::test]
async fn test_intermediate_redirect_is_followed() {
    let addr = spawn_server().await;
    let outcome = check_one(&format!("http://{addr}/hop"), 5).await;
    assert_eq!(outcome.category, Category::Online);
    assert_eq!(outcome.status_code, Some(200));
}

#[tokio::test]
async fn test_redirect_loop_is_other_error() {
    let addr = spawn_server().await;
    let outcome = check_one(&format!("http://{addr}/loop"), 5).await;
    assert_eq!(outcome.category, Category::OtherError);
    assert_eq!(outcome.status_code, None);
    assert!(outcome.error.is_some_and(|e| e.chars().count() <= 50));
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let addr = spawn_server().await;
    let outcome = check_one(&format!("http://{addr}/agent"), 5).await;
    assert_eq!(outcome.status_code, Some(200));
}

#[tokio::test]
async fn test_timeout_reports_configured_budget() {
    let addr = spawn_server().await;
    let outcome = check_one(&format!("http://{addr}/slow"), 1).await;
    assert_eq!(outcome.category, Category::Timeout);
    assert_eq!(outcome.status_code, None);
    assert_eq!(outcome.response_time_ms, 1000.0);
}

#[tokio::test]
async fn test_tls_handshake_failure_is_ssl_error() {
    let addr = spawn_plaintext_server().await;
    let outcome = check_one(&format!("https://{addr}/"), 5).await;
    assert_eq!(outcome.category, Category::SSLError);
    assert_eq!(outcome.status_code, None);
    assert_eq!(outcome.display_label(), "SSL Error");
}

#[tokio::test]
async fn test_peer_hangup_is_connection_failed() {
    let addr = spawn_hangup_server().await;
    let outcome = check_one(&format!("http://{addr}/"), 5).await;
    assert_eq!(outcome.category, Category::ConnectionFailed);
    assert_eq!(outcome.status_code, None);
    assert_eq!(outcome.error, None);
}

#[tokio::test]
async fn test_unbounded_concurrency_is_accepted() {
    let addr = spawn_server().await;
    let urls = vec![format!("http://{addr}/ok"), format!("http://{addr}/missing")];
    let results = check_all(&urls, 5, usize::MAX).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[&urls[0]].category, Category::Online);
    assert_eq!(results[&urls[1]].category, Category::ClientError);
}

#[tokio::test]
async fn test_unreachable_host_is_stable() {
    let first = check_one("http://10.255.255.1", 1).await;
    let second = check_one("http://10.255.255.1", 1).await;
    assert!(matches!(
        first.category,
        Category::Timeout | Category::ConnectionFailed
    ));
    assert_eq!(first.category, second.category);
}

#[tokio::test]
async fn test_check_all_covers_every_input() {
    let addr = spawn_server().await;
    let urls = vec![
        format!("http://{addr}/ok"),
        format!("http://{addr}/missing"),
        format!("http://{addr}/moved"),
        format!("http://{addr}/ok"),
        format!("{addr}/ok"),
        "http://exa mple.com".to_string(),
    ];

    for concurrency in [1, 5, 10] {
        let results = check_all(&urls, 5, concurrency).await;
        let keys: HashSet<&String> = results.keys().collect();
        let expected: HashSet<&String> = urls.iter().collect();
        assert_eq!(keys, expected);

        assert_eq!(results[&urls[0]].category, Category::Online);
        assert_eq!(results[&urls[1]].category, Category::ClientError);
        assert_eq!(results[&urls[2]].category, Category::Redirect);
        // no scheme, so https is tried against a plain HTTP server
        assert!(results[&urls[4]].url.starts_with("https://"));
        assert!(results[&urls[4]].category.is_network_failure());
        assert_eq!(results[&urls[5]].category, Category::OtherError);
    }
}
