//! Local REPL driving the command router without a chat platform: type a
//! command per line (e.g. `/news`), replies print to stdout.

use tokio::io::{AsyncBufReadExt, BufReader};

use news_digest_bot::analyze::llm::build_llm_client;
use news_digest_bot::bot::{BotService, ChatKind, Incoming};
use news_digest_bot::config::AppConfig;
use news_digest_bot::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = AppConfig::from_env()?;
    let store = Store::new(&cfg.data_dir);
    let llm = build_llm_client(&cfg.llm);
    let bot = BotService::new(cfg, store, llm);

    println!("chat demo ready, type /help (ctrl-d to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let replies = bot
            .handle(Incoming {
                user_id: 1,
                chat: ChatKind::Direct,
                text: line,
            })
            .await;
        for reply in replies {
            println!("{}", reply.text);
            for button in &reply.buttons {
                println!("  [{}]", button.label);
            }
        }
    }

    println!("chat demo done");
    Ok(())
}
