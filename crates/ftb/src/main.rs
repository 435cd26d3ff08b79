//! Echo bot: long-polls for updates and repeats every text message back.

use std::sync::Arc;

use anyhow::Context;
use ftb_core::{
    api::{AnswerCallbackQuery, BotClient, SendMessage},
    config::Config,
    ports::BotTransport,
    throttled::ThrottledTransport,
    types::{Update, UpdatePayload},
};
use ftb_http::HttpTransport;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ftb_core::logging::init("ftb")?;

    let cfg = Config::load().context("loading config")?;

    let http: Arc<dyn BotTransport> = Arc::new(HttpTransport::from_config(&cfg)?);
    let transport: Arc<dyn BotTransport> = match cfg.throttle {
        Some(throttle) => Arc::new(ThrottledTransport::new(http, throttle)),
        None => http,
    };
    let bot = BotClient::new(transport);

    let me = bot.get_me().await.context("getMe failed; check TELEGRAM_BOT_TOKEN")?;
    tracing::info!(bot = %me, "connected");

    let cancel = CancellationToken::new();
    let replies = bot.clone();
    let handle = bot.start_polling(
        move |batch: Vec<Update>| {
            let bot = replies.clone();
            async move {
                for update in &batch {
                    echo(&bot, update).await?;
                }
                Ok::<(), ftb_core::Error>(())
            }
        },
        cfg.polling_options(),
        cancel.clone(),
    )?;

    // The offset channel closes when the poller ends on its own.
    let mut offsets = handle.subscribe();
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("listening for ctrl-c")?;
            tracing::info!("shutting down");
            cancel.cancel();
        }
        _ = async { while offsets.changed().await.is_ok() {} } => {}
    }

    handle.join().await.context("update poller failed")?;
    Ok(())
}

async fn echo(bot: &BotClient, update: &Update) -> ftb_core::Result<()> {
    match &update.payload {
        UpdatePayload::Message(msg) => {
            let (Some(chat), Some(text)) = (&msg.chat, &msg.text) else {
                return Ok(());
            };
            tracing::debug!(update_id = update.id, chat_id = chat.id, "echoing message");
            bot.send_message(&SendMessage::new(chat.id, text.as_str()).reply_to(msg.id))
                .await?;
        }
        UpdatePayload::CallbackQuery(query) => {
            let mut answer = AnswerCallbackQuery::new(query.id.as_str());
            if let Some(data) = &query.data {
                answer = answer.text(data.as_str());
            }
            bot.answer_callback_query(&answer).await?;
        }
        _ => {
            tracing::debug!(update_id = update.id, kind = %update.kind(), "ignored update");
        }
    }
    Ok(())
}
