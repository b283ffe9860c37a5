use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Client;
use url::Url;

use crate::config::Config;
use crate::error::{cause_chain, AppError, Result};
use crate::models::ReadableArticle;

use super::article::extract_article;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

pub struct ArticleFetcher {
    client: Client,
}

impl ArticleFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// One GET, then extraction against the final (post-redirect) URL.
    /// Either a complete article or an error; nothing partial.
    pub async fn fetch(&self, article_url: &str) -> Result<ReadableArticle> {
        let url = Url::parse(article_url)
            .map_err(|e| AppError::fetch(article_url, format!("invalid URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_HTML))
            .send()
            .await
            .map_err(|e| AppError::fetch(article_url, cause_chain(e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Failed to fetch {}: {}", article_url, status);
            return Err(AppError::fetch(article_url, format!("HTTP {status}")));
        }

        let resolved_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| AppError::fetch(&resolved_url, cause_chain(e)))?;

        tracing::debug!(
            "Fetched {} bytes from {} (resolved {})",
            html.len(),
            article_url,
            resolved_url
        );

        extract_article(&html, &resolved_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const PAGE: &str = "<html><head><title>Stub Page</title></head><body><p>Plain body text.</p></body></html>";

    /// Serves `count` requests: `/old` redirects to `/new`, `/new` is a page,
    /// anything else is a 404.
    fn spawn_server(count: usize) -> (String, thread::JoinHandle<()>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            for request in server.incoming_requests().take(count) {
                let response = match request.url() {
                    "/new" => tiny_http::Response::from_string(PAGE).with_header(
                        "Content-Type: text/html; charset=utf-8"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    "/old" => tiny_http::Response::from_string("")
                        .with_status_code(302)
                        .with_header("Location: /new".parse::<tiny_http::Header>().unwrap()),
                    _ => tiny_http::Response::from_string("not here").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        (base, handle)
    }

    fn fetcher() -> ArticleFetcher {
        ArticleFetcher::new(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn not_found_is_a_fetch_error() {
        let (base, handle) = spawn_server(1);
        let url = format!("{base}/missing");

        let err = fetcher().fetch(&url).await.unwrap_err();
        match &err {
            AppError::Fetch { url: failed, reason } => {
                assert_eq!(failed, &url);
                assert!(reason.contains("404"));
            }
            other => panic!("expected fetch error, got {other}"),
        }
        assert!(err.to_string().contains("404"));
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn redirect_resolves_to_final_url() {
        let (base, handle) = spawn_server(2);

        let article = fetcher().fetch(&format!("{base}/old")).await.unwrap();
        assert_eq!(article.url, format!("{base}/new"));
        assert_eq!(article.title, "Stub Page");
        assert_eq!(article.text_content, "Plain body text.");
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn refused_connection_reports_os_cause() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{port}/x");

        let err = fetcher().fetch(&url).await.unwrap_err();
        let msg = err.to_string().to_lowercase();
        assert!(msg.contains(&url), "{msg}");
        assert!(msg.contains("connection refused"), "{msg}");
    }

    #[tokio::test]
    async fn malformed_url_is_a_fetch_error() {
        let err = fetcher().fetch("not a url").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
    }
}
