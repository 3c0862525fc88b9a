use crate::domain::ports::MailService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

pub struct HttpMailService {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailService {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[derive(Serialize)]
struct MailPayload {
    from_addr: String,
    to_addr: String,
    subject: String,
    html_body: String,
}

#[async_trait]
impl MailService for HttpMailService {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let payload = MailPayload {
            from_addr: self.from.clone(),
            to_addr: recipient.to_string(),
            subject: subject.to_string(),
            html_body: body.to_string(),
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Mail service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Mail service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}
