use std::io::Write;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use bankd_client::{BankClient, validate};
use bankd_protocol::reply;

const DEFAULT_SERVER: &str = "127.0.0.1:9000";

fn server_addr() -> String {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(addr), None) => addr,
        _ => std::env::var("BANKD_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string()),
    }
}

fn prompt() {
    print!("> input command: ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bankd_observability::init();

    let addr = server_addr();
    let mut client = BankClient::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    println!("* connected to {addr}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("failed to read stdin")? else {
                    stdin_open = false;
                    client.send(reply::QUIT).await?;
                    continue;
                };
                if line.trim().is_empty() {
                    prompt();
                    continue;
                }
                match validate(&line) {
                    Ok(_) => client.send(line.trim()).await?,
                    Err(err) => {
                        println!("invalid command: {line} ({err})");
                        prompt();
                    }
                }
            }
            message = client.recv() => {
                let message = match message {
                    Ok(message) => message,
                    Err(err) if err.is_closed() => {
                        println!("* connection closed");
                        break;
                    }
                    Err(err) => return Err(err.into()),
                };
                if message.starts_with(reply::ERROR_PREFIX) {
                    eprintln!("{message}");
                } else {
                    println!("{message}");
                }
                if message == reply::QUIT {
                    break;
                }
                prompt();
            }
        }
    }

    println!("* bye~");
    Ok(())
}
