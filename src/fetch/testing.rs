// src/fetch/testing.rs
//
// Local HTTP fixture for tests: answers exactly one request with a canned body.

use reqwest::Client;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use url::Url;

/// Client that never routes through a proxy, so requests reach 127.0.0.1.
pub(crate) fn local_client() -> Client {
    Client::builder()
        .no_proxy()
        .build()
        .expect("test client should build")
}

/// Serve `body` once with the given status line, e.g. `"200 OK"`.
pub(crate) async fn serve_once(status: &'static str, body: String) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();

        // read until the end of the request headers
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = sock.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        sock.write_all(response.as_bytes()).await.unwrap();
        let _ = sock.shutdown().await;
    });

    Url::parse(&format!("http://{}/wiki/List_of_largest_banks", addr)).unwrap()
}

/// A page shaped like the archived bank list: header row, then one row per
/// `(name, market cap cell text)`.
pub(crate) fn banks_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, (name, cap))| {
            format!(
                "<tr><td>{}</td><td><span class=\"flagicon\"><a href=\"/wiki/X\" title=\"Country\">\
                 <img src=\"f.png\"></a></span> <a href=\"/wiki/B\" title=\"{name}\">{name}</a></td>\
                 <td>{cap}\n</td></tr>\n",
                i + 1
            )
        })
        .collect();
    format!(
        "<html><body><table class=\"wikitable\"><tbody>\n\
         <tr><th>Rank</th><th>Bank name</th><th>Market cap<br>(US$ billion)</th></tr>\n\
         {body}</tbody></table></body></html>"
    )
}
