use crate::core::config::AppConfig;
use crate::providers::TelegramNotifier;
use crate::providers::util::build_client;
use anyhow::{Context, Result};
use tracing::info;

pub async fn run(config: &AppConfig, message: &str) -> Result<()> {
    let (token, chat_id) = config.telegram.credentials().context(
        "Telegram credentials missing: set telegram.bot_token and telegram.chat_id \
         or TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID",
    )?;
    let client = build_client(config.http_timeout())?;
    let notifier = TelegramNotifier::new(&config.telegram.base_url, &token, &chat_id, client)?;

    notifier
        .send_message(message)
        .await
        .context("Failed to send Telegram message")?;
    info!("Message sent to chat {}", chat_id);
    println!("Message sent");
    Ok(())
}
