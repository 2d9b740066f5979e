//! Client execution logic: terminal input, event printing and the command
//! loop.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    error::ClientError,
    session::{ChatClient, ClientConfig, ClientEvent, LineOutcome},
    ui::{PROMPT, redisplay_prompt, render_event},
};

/// Run the interactive client until the user quits or reconnecting fails
///
/// # Errors
///
/// Returns an error if the first connection cannot be made or if the
/// reconnect budget is exhausted.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let max_attempts = config.max_reconnect_attempts;
    tracing::info!("Connecting to {}:{}", config.host, config.port);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(event_rx));

    let mut client = ChatClient::connect(config, event_tx).await?;
    let state = client.state();
    let mut input_rx = spawn_input_thread();
    let mut exhausted = false;

    loop {
        tokio::select! {
            line = input_rx.recv() => match line {
                Some(line) => match client.handle_line(&line).await {
                    LineOutcome::Continue => {}
                    LineOutcome::Quit => break,
                    LineOutcome::GaveUp => {
                        exhausted = true;
                        break;
                    }
                },
                None => {
                    // Ctrl+C / Ctrl+D
                    tracing::info!("Input closed, exiting");
                    client.shutdown().await;
                    break;
                }
            },
            _ = state.wait_disconnected() => {
                if !state.is_alive() && !client.reconnect().await {
                    exhausted = true;
                    break;
                }
            }
        }
    }

    drop(client);
    if let Err(e) = printer.await {
        tracing::warn!("Printer task failed: {}", e);
    }

    if exhausted {
        return Err(ClientError::ReconnectExhausted(max_attempts));
    }
    Ok(())
}

async fn print_events(mut events: mpsc::UnboundedReceiver<ClientEvent>) {
    while let Some(event) = events.recv().await {
        println!("\n{}", render_event(&event));
        redisplay_prompt();
    }
}

/// Read lines on a blocking thread; the channel closes on Ctrl+C or Ctrl+D
fn spawn_input_thread() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if line.is_empty() {
                        continue;
                    }
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    // Trimming is mode dependent and left to plan_line
                    if input_tx.send(line).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
