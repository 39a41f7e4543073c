use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use chiacchiera::client::config::ClientConfig;
use chiacchiera::client::services::chat_session::ChatSession;
use chiacchiera::client::ui::TerminalRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment from .env (optional)
    let _ = dotenvy::dotenv();
    let config = ClientConfig::from_env();
    std::env::set_var("RUST_LOG", &config.log_level); //setto env var per usare log::info
    env_logger::init();

    println!("[CLIENT] Benvenuto, {}! Scrivi un messaggio e premi invio (/users, /quit):", config.username);
    let renderer = TerminalRenderer::new(&config.username, config.show_timestamps);
    let session = ChatSession::start(&config, Box::new(renderer))?;

    let mut input = BufReader::new(stdin());
    let mut input_line = String::new();
    loop {
        input_line.clear();
        let n = input.read_line(&mut input_line).await?;
        if n == 0 {
            break;
        }
        let line = input_line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "/quit" => {
                println!("[CLIENT] Disconnessione e uscita.");
                break;
            }
            "/users" => session.show_roster()?,
            _ => session.send(line)?,
        }
    }
    session.shutdown();
    Ok(())
}
