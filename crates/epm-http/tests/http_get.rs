//! Exercises real TCP sockets: a loopback listener standing in for the
//! remote server. Kept out of the unit-test tree since every case here
//! drives an actual `TcpListener`/`TcpStream` pair rather than just
//! exercising in-memory parsing.

use epm_http::{get, Error, Scheme};
use tokio::net::TcpListener;

async fn serve_once(listener: TcpListener, response: &'static [u8]) {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut discard = vec![0u8; 4096];
    let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut discard).await;
    tokio::io::AsyncWriteExt::write_all(&mut socket, response).await.unwrap();
    tokio::io::AsyncWriteExt::shutdown(&mut socket).await.unwrap();
}

#[tokio::test]
async fn gets_content_length_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello";
    let server = tokio::spawn(serve_once(listener, response));

    let mut body = Vec::new();
    let result = get(Scheme::Http, "127.0.0.1", addr.port(), "/", &mut body, |_, _, _| {}).await.unwrap();

    server.await.unwrap();
    assert_eq!(result.status, 200);
    assert_eq!(body, b"hello");
    assert_eq!(result.body_len, 5);
}

#[tokio::test]
async fn gets_chunked_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response =
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nwiki\r\n5\r\npedia\r\n0\r\n\r\n";
    let server = tokio::spawn(serve_once(listener, response));

    let mut body = Vec::new();
    let result = get(Scheme::Http, "127.0.0.1", addr.port(), "/", &mut body, |_, _, _| {}).await.unwrap();

    server.await.unwrap();
    assert_eq!(result.status, 200);
    assert_eq!(body, b"wikipedia");
}

#[tokio::test]
async fn rejects_embedded_newline_in_request_target() {
    let result = get(Scheme::Http, "127.0.0.1", 1, "/foo\r\nX-Evil: 1", std::io::sink(), |_, _, _| {}).await;
    assert!(matches!(result, Err(Error::EmbeddedNewline)));
}

#[tokio::test(start_paused = true)]
async fn times_out_on_a_silent_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept the connection and never write anything back.
    let server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    });

    let result = get(Scheme::Http, "127.0.0.1", addr.port(), "/", std::io::sink(), |_, _, _| {}).await;

    server.abort();
    assert!(matches!(result, Err(Error::ReadTimeout { .. })));
}
