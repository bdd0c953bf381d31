use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::error;

use crate::conversations::process_single_conversation;
use crate::state::AppState;

/// Run the interactive terminal chat loop over one session. Blocks for the
/// whole turn: the next prompt only appears once the model response (and any
/// image generation) has finished.
pub async fn run_chat_loop(state: AppState) -> anyhow::Result<()> {
    let character_name = state.config.character_config.display_name().to_string();
    let human_name = state.config.character_config.human_name.clone();

    let session = state.create_session();
    let session_uid = session.read().await.session_uid.clone();

    println!("Chat with {}. Type /exit to quit.", character_name);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("{}> ", human_name);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }
        if input == "/exit" || input == "/quit" {
            break;
        }

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let render_name = character_name.clone();
        let renderer = tokio::spawn(async move { render_events(&render_name, rx).await });

        let result = {
            let mut session = session.write().await;
            process_single_conversation(&state, &mut session, &input, &tx).await
        };
        drop(tx);
        renderer.await?;

        if let Err(e) = result {
            error!("Conversation turn failed: {:#}", e);
            println!("[model backend error, turn aborted]");
        }
    }

    state.remove_session(&session_uid);
    Ok(())
}

/// Render JSON turn events as they arrive: thinking indicator, streamed
/// tokens, the apology text and image notices.
async fn render_events(character_name: &str, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(raw) = rx.recv().await {
        let Ok(event) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        let text = event["text"].as_str().unwrap_or("");
        match event["type"].as_str() {
            Some("control") if text == "conversation-chain-start" => {
                println!("[thinking...]");
                print!("{}: ", character_name);
                let _ = std::io::stdout().flush();
            }
            Some("control") if text == "conversation-chain-end" => {
                println!();
            }
            Some("token") | Some("full-text") => {
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
            Some("image") => {
                let path = event["path"].as_str().unwrap_or("");
                print!("\n[image saved to {}]", path);
                let _ = std::io::stdout().flush();
            }
            _ => {}
        }
    }
}
