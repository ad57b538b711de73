use crate::config::MailerConfig;
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    from_email: &'a str,
    from_name: &'a str,
    to_email: &'a str,
    to_name: &'a str,
    subject: String,
    html_body: String,
}

/// 事务邮件 HTTP 中继客户端
/// 只在开奖后发"中奖通知"; 发送失败只记日志, 由调用方决定是否关心,
/// 永远不会影响已提交的开奖结果
#[derive(Clone)]
pub struct MailerService {
    client: Client,
    config: MailerConfig,
}

impl MailerService {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 发送中奖通知
    /// 未配置 api_key 时跳过（本地/测试环境常态），记一条警告即可
    pub async fn send_winner_notification(
        &self,
        to_email: &str,
        to_name: &str,
        draw_title: &str,
        draw_date: NaiveDate,
    ) -> AppResult<()> {
        if self.config.api_key.is_empty() {
            log::warn!("Mailer API key not set, skipping winner email to {to_email}");
            return Ok(());
        }

        let subject = format!("🎉 Congratulations! You Won: {draw_title}");
        let html_body = format!(
            "<html><body>\
             <h2>🎉 Congratulations, {to_name}!</h2>\
             <p>You have been selected as the <b>winner</b> of:</p>\
             <p><b>{draw_title}</b></p>\
             <p>Date: {draw_date}</p>\
             <hr>\
             <p>Thank you for participating.</p>\
             </body></html>"
        );

        let payload = SendMailRequest {
            from_email: &self.config.from_email,
            from_name: &self.config.from_name,
            to_email,
            to_name,
            subject,
            html_body,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Winner email sent to {to_email}");
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Winner email failed to send: {to_email}, Error: {error_text}");
            Err(AppError::ExternalApiError(format!(
                "Mail sending failed: {error_text}"
            )))
        }
    }
}
