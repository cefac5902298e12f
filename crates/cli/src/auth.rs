//! Browser side of the OAuth handshake.
//!
//! # Flow
//! 1. The backend hands out the provider authorization URL (`GET /auth/login`).
//! 2. The URL is opened in the system browser.
//! 3. A one-shot local HTTP server receives the provider redirect.
//! 4. The raw redirect target is passed to [`session::AuthClient::complete_redirect`].

use anyhow::Context;
use session::oauth::parse_query_params;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, trace};

// ── Browser opener ────────────────────────────────────────────────────────────

/// Attempts to open `url` in the default system browser (best-effort).
#[cfg(not(test))]
pub fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let _ = std::process::Command::new("open").arg(url).spawn();
    #[cfg(target_os = "linux")]
    let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    #[cfg(target_os = "windows")]
    let _ = std::process::Command::new("cmd")
        .args(["/C", "start", "", url])
        .spawn();
}

#[cfg(test)]
pub fn open_browser(_url: &str) {}

// ── Local redirect receiver ───────────────────────────────────────────────────

/// Listens on `127.0.0.1:{port}` until the provider redirects the browser to
/// `callback_path`, and returns the raw request target (path plus query).
pub async fn receive_redirect(
    port: u16,
    callback_path: &str,
    timeout: Duration,
) -> anyhow::Result<String> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}"))
        .await
        .with_context(|| format!("failed to bind OAuth callback port {port}"))?;
    debug!(port, path = %callback_path, "Waiting for OAuth redirect");

    tokio::time::timeout(timeout, accept_redirect(&listener, callback_path))
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "timed out after {}s waiting for the browser redirect",
                timeout.as_secs()
            )
        })?
}

/// Serves requests until one hits `callback_path`. Other paths (favicon
/// probes and the like) get a 404 and do not end the wait.
async fn accept_redirect(listener: &TcpListener, callback_path: &str) -> anyhow::Result<String> {
    loop {
        let (mut stream, peer) = listener
            .accept()
            .await
            .context("failed to accept callback connection")?;

        let mut buf = vec![0u8; 8192];
        let n = stream
            .read(&mut buf)
            .await
            .context("failed to read callback request")?;
        let request = String::from_utf8_lossy(&buf[..n]);

        let Some(target) = request_target(&request) else {
            trace!(%peer, "Ignoring unparsable request");
            let _ = stream.write_all(http_response("400 Bad Request", "").as_bytes()).await;
            continue;
        };
        let path = target.split_once('?').map_or(target, |(p, _)| p);
        if path != callback_path {
            trace!(%peer, path, "Ignoring request outside the callback path");
            let _ = stream.write_all(http_response("404 Not Found", "").as_bytes()).await;
            continue;
        }

        let target = target.to_string();
        let body = redirect_page(&target);
        let _ = stream.write_all(http_response("200 OK", body).as_bytes()).await;
        return Ok(target);
    }
}

/// Request target of the first line of an HTTP GET request.
fn request_target(request: &str) -> Option<&str> {
    // "GET /oauth/callback?code=X&state=Y HTTP/1.1"
    let first_line = request.lines().next()?;
    let rest = first_line.strip_prefix("GET ")?;
    rest.split_whitespace().next().filter(|t| t.starts_with('/'))
}

fn redirect_page(target: &str) -> &'static str {
    let has_code = parse_query_params(target)
        .ok()
        .and_then(|params| params.get("code").map(|c| !c.trim().is_empty()))
        .unwrap_or(false);
    if has_code {
        "<html><body><h2>&#10003; Authorization received</h2>\
         <p>You may close this tab and return to the terminal.</p></body></html>"
    } else {
        "<html><body><h2>&#10007; Authentication failed</h2>\
         <p>No authorization code received. You may close this tab.</p></body></html>"
    }
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    async fn send_get(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect");
        let request = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        stream.write_all(request.as_bytes()).await.expect("write");
        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read");
        response
    }

    #[test]
    fn request_target_extracts_path_and_query() {
        let req = "GET /oauth/callback?code=abc123&state=deadbeef HTTP/1.1\r\nHost: localhost\r\n\r\n";
        assert_eq!(
            request_target(req),
            Some("/oauth/callback?code=abc123&state=deadbeef")
        );
    }

    #[test]
    fn request_target_rejects_non_get_and_garbage() {
        assert_eq!(request_target("POST /oauth/callback HTTP/1.1\r\n"), None);
        assert_eq!(request_target(""), None);
        assert_eq!(request_target("GET http://evil/ HTTP/1.1"), None);
    }

    #[test]
    fn redirect_page_reflects_code_presence() {
        assert!(redirect_page("/oauth/callback?code=abc").contains("Authorization received"));
        assert!(redirect_page("/oauth/callback?state=abc").contains("No authorization code"));
        assert!(redirect_page("/oauth/callback?code=%20").contains("No authorization code"));
    }

    #[tokio::test]
    async fn accept_redirect_skips_other_paths() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let server =
            tokio::spawn(async move { accept_redirect(&listener, "/oauth/callback").await });

        let favicon = send_get(port, "/favicon.ico").await;
        assert!(favicon.starts_with("HTTP/1.1 404"));

        let page = send_get(port, "/oauth/callback?code=abc%20123&state=xyz").await;
        assert!(page.starts_with("HTTP/1.1 200 OK"));
        assert!(page.contains("Authorization received"));

        let target = server.await.expect("join").expect("redirect");
        assert_eq!(target, "/oauth/callback?code=abc%20123&state=xyz");
    }

    #[tokio::test]
    async fn receive_redirect_times_out() {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = probe.local_addr().expect("addr").port();
        drop(probe);

        let err = receive_redirect(port, "/oauth/callback", Duration::from_millis(50))
            .await
            .expect_err("no browser");
        assert!(err.to_string().contains("timed out"));
    }
}
