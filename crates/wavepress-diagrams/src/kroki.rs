//! WaveDrom rendering via the Kroki service.
//!
//! Diagrams are sent one at a time as `POST {server}/wavedrom/svg` with the
//! normalized JSON description as a plain-text body. Availability is probed
//! with `GET {server}/health`.

use std::time::Duration;

use ureq::Agent;

use crate::consts::{DEFAULT_TIMEOUT, DIAGRAM_LANGUAGE};
use crate::renderer::{DiagramRenderer, DiagramRequest, RendererError};

/// Create HTTP agent with the specified timeout.
///
/// HTTP status codes are not turned into errors so that error bodies from
/// Kroki can be reported.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Renderer backed by a Kroki server.
pub struct KrokiRenderer {
    /// Server URL without trailing slash.
    server_url: String,
    /// HTTP agent for connection pooling (reused across render calls).
    agent: Agent,
}

impl KrokiRenderer {
    /// Create a renderer for the given Kroki server URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let renderer = KrokiRenderer::new("https://kroki.io");
    /// ```
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_owned(),
            agent: create_agent(DEFAULT_TIMEOUT),
        }
    }

    /// Set HTTP timeout for Kroki requests.
    ///
    /// Default is 30 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Server URL this renderer talks to.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn render_url(&self) -> String {
        format!("{}/{DIAGRAM_LANGUAGE}/svg", self.server_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.server_url)
    }
}

impl DiagramRenderer for KrokiRenderer {
    fn name(&self) -> &str {
        "kroki"
    }

    fn cache_id(&self) -> String {
        format!("kroki:{}", self.server_url)
    }

    fn check_available(&self) -> Result<(), RendererError> {
        let url = self.health_url();
        let response = self.agent.get(&url).call().map_err(|e| {
            RendererError::Unavailable(format!("cannot reach Kroki at {}: {e}", self.server_url))
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(RendererError::Unavailable(format!(
                "Kroki at {} answered HTTP {status} on /health",
                self.server_url
            )));
        }

        tracing::debug!(url = %url, status, "Kroki is available");
        Ok(())
    }

    fn render(&self, request: &DiagramRequest<'_>) -> Result<String, RendererError> {
        let body = request.description.to_json();

        let response = self
            .agent
            .post(&self.render_url())
            .header("Content-Type", "text/plain")
            .send(body.as_bytes())
            .map_err(|e| RendererError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(RendererError::Http(format!(
                "HTTP {status}: {}",
                error_body.trim()
            )));
        }

        let data = body
            .read_to_vec()
            .map_err(|e| RendererError::Io(e.to_string()))?;
        let svg = String::from_utf8(data)
            .map_err(|e| RendererError::InvalidOutput(format!("invalid UTF-8 in SVG: {e}")))?;

        if !svg.contains("<svg") {
            return Err(RendererError::InvalidOutput(
                "response does not contain an <svg> element".to_owned(),
            ));
        }

        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use super::*;
    use crate::description::DiagramDescription;

    /// Serve a single HTTP response and hand back the request that was received.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
                let end = line == "\r\n" || line.is_empty();
                head.push_str(&line);
                if end {
                    break;
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "{status_line}\r\nContent-Type: image/svg+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();

            head + &String::from_utf8(request_body).unwrap()
        });

        (url, handle)
    }

    fn request(description: &DiagramDescription) -> DiagramRequest<'_> {
        DiagramRequest {
            index: 0,
            title: "DEMO - Diagram 1".to_owned(),
            source: "{ signal: [] }",
            description,
        }
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let renderer = KrokiRenderer::new("https://kroki.io/");
        assert_eq!(renderer.server_url(), "https://kroki.io");
        assert_eq!(renderer.render_url(), "https://kroki.io/wavedrom/svg");
        assert_eq!(renderer.health_url(), "https://kroki.io/health");
    }

    #[test]
    fn test_cache_id_includes_server() {
        let public = KrokiRenderer::new("https://kroki.io/");
        let local = KrokiRenderer::new("http://localhost:8000");
        assert_eq!(public.cache_id(), "kroki:https://kroki.io");
        assert_eq!(local.cache_id(), "kroki:http://localhost:8000");
    }

    #[test]
    fn test_render_posts_normalized_json() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", "<svg id=\"w\"></svg>");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));
        let description = DiagramDescription::parse("{ signal: [{ name: 'clk' }] }").unwrap();

        let svg = renderer.render(&request(&description)).unwrap();
        let received = server.join().unwrap();

        assert_eq!(svg, "<svg id=\"w\"></svg>");
        assert!(received.starts_with("POST /wavedrom/svg "));
        assert!(received.contains("\"name\": \"clk\""));
    }

    #[test]
    fn test_render_reports_http_error_body() {
        let (url, server) = serve_once("HTTP/1.1 400 Bad Request", "Error 400: bad wave\n");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));
        let description = DiagramDescription::parse("{}").unwrap();

        let err = renderer.render(&request(&description)).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, RendererError::Http(_)));
        assert_eq!(err.to_string(), "HTTP error: HTTP 400: Error 400: bad wave");
    }

    #[test]
    fn test_render_rejects_non_svg() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", "not an image");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));
        let description = DiagramDescription::parse("{}").unwrap();

        let err = renderer.render(&request(&description)).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, RendererError::InvalidOutput(_)));
    }

    #[test]
    fn test_check_available_healthy() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", "{\"status\":\"pass\"}");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));

        assert!(renderer.check_available().is_ok());
        assert!(server.join().unwrap().starts_with("GET /health "));
    }

    #[test]
    fn test_check_available_unhealthy_status() {
        let (url, server) = serve_once("HTTP/1.1 503 Service Unavailable", "down");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));

        let err = renderer.check_available().unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, RendererError::Unavailable(_)));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_check_available_unreachable() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let renderer =
            KrokiRenderer::new(format!("http://127.0.0.1:{port}")).timeout(Duration::from_secs(5));

        let err = renderer.check_available().unwrap_err();
        assert!(matches!(err, RendererError::Unavailable(_)));
        assert!(err.to_string().contains("cannot reach Kroki"));
    }
}
