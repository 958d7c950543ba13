use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{split_message, ChatPlatform};

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord caps message content at 2000 chars
const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    username: String,
}

pub struct DiscordPlatform {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DiscordPlatform {
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(token: &str, base_url: String) -> Self {
        Self {
            base_url,
            ..Self::new(token)
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    fn channel_messages_url(&self, channel_id: i64) -> String {
        format!("{}/channels/{}/messages", self.base_url, channel_id)
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn connect(&self) -> Result<String> {
        let url = format!("{}/users/@me", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .context("Failed to reach Discord")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Discord login failed ({}): {}", status, error_body);
        }

        let user: CurrentUser = response
            .json()
            .await
            .context("Failed to parse Discord user")?;
        Ok(user.username)
    }

    async fn send_message(&self, channel_id: i64, text: &str) -> Result<()> {
        let url = self.channel_messages_url(channel_id);

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            debug!("Posting to Discord: {}", url);

            let response = self
                .client
                .post(&url)
                .header("Authorization", self.auth_header())
                .json(&CreateMessage { content: &chunk })
                .send()
                .await
                .context("Failed to send request to Discord")?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                anyhow::bail!("Channel {} not found", channel_id);
            }
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                anyhow::bail!("Discord API error ({}): {}", status, error_body);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answer a single HTTP request with `status` and `body`. The handle
    /// resolves to the raw request that was received.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });
        (base_url, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_ascii_lowercase();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_send_to_missing_channel() {
        let (base_url, server) =
            serve_once("404 Not Found", r#"{"message":"Unknown Channel","code":10003}"#).await;
        let platform = DiscordPlatform::with_base_url("secret", base_url);

        let err = platform.send_message(5, "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Channel 5 not found");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /channels/5/messages "));
        assert!(request.to_ascii_lowercase().contains("authorization: bot secret"));
        assert!(request.contains(r#"{"content":"hi"}"#));
    }

    #[tokio::test]
    async fn test_send_error_carries_body() {
        let (base_url, server) =
            serve_once("403 Forbidden", r#"{"message":"Missing Access","code":50001}"#).await;
        let platform = DiscordPlatform::with_base_url("secret", base_url);

        let err = platform.send_message(5, "hi").await.unwrap_err().to_string();
        assert!(err.contains("403"));
        assert!(err.contains("Missing Access"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_reads_username() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"id":"80351110224678912","username":"spacebot"}"#).await;
        let platform = DiscordPlatform::with_base_url("secret", base_url);

        assert_eq!(platform.connect().await.unwrap(), "spacebot");
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /users/@me "));
    }

    #[tokio::test]
    async fn test_login_rejected_token() {
        let (base_url, server) =
            serve_once("401 Unauthorized", r#"{"message":"401: Unauthorized","code":0}"#).await;
        let platform = DiscordPlatform::with_base_url("bad", base_url);

        let err = platform.connect().await.unwrap_err().to_string();
        assert!(err.starts_with("Discord login failed (401 Unauthorized)"));
        assert!(err.contains(r#""message":"401: Unauthorized""#));
        server.await.unwrap();
    }

    #[test]
    fn test_request_shape() {
        let platform = DiscordPlatform::new("secret");
        assert_eq!(platform.auth_header(), "Bot secret");
        assert_eq!(
            platform.channel_messages_url(123),
            "https://discord.com/api/v10/channels/123/messages"
        );
        let body = serde_json::to_value(CreateMessage { content: "hi" }).unwrap();
        assert_eq!(body, serde_json::json!({ "content": "hi" }));
    }
}
