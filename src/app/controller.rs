use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{AppError, Result};
use crate::services::MarketService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Indices,
    History(Vec<String>),
    Quota,
    Help,
    Exit,
}

/// One reply as printed by the front end. Admission denials map to `TooManyRequests`,
/// every other failure to `ServerError`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok(serde_json::Value),
    Notice(String),
    TooManyRequests(String),
    ServerError(String),
}

impl Reply {
    fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result.and_then(|value| serde_json::to_value(value).map_err(AppError::from)) {
            Ok(json) => Reply::Ok(json),
            Err(err) if err.is_throttled() => Reply::TooManyRequests(err.to_string()),
            Err(err) => {
                log::error!("request failed: {err:#}");
                Reply::ServerError(err.to_string())
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_) | Reply::Notice(_))
    }

    pub fn render(&self) -> String {
        match self {
            Reply::Ok(json) => {
                serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string())
            }
            Reply::Notice(text) => text.clone(),
            Reply::TooManyRequests(reason) => format!("too many requests: {reason}"),
            Reply::ServerError(reason) => format!("server error: {reason}"),
        }
    }
}

/// Parse one interactive input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<std::result::Result<Command, String>> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let args: Vec<String> = parts.map(String::from).collect();

    let command = match head.as_str() {
        "indices" => Ok(Command::Indices),
        "history" if args.is_empty() => Err("usage: history <SYMBOL> [SYMBOL...]".to_string()),
        "history" => Ok(Command::History(args)),
        "quota" => Ok(Command::Quota),
        "help" => Ok(Command::Help),
        "exit" | "quit" => Ok(Command::Exit),
        other => Err(format!("unknown command `{other}`, try `help`")),
    };
    Some(command)
}

const HELP: &str = "commands: indices | history <SYMBOL> [SYMBOL...] | quota | help | exit";

pub struct AppController {
    service: MarketService,
}

impl AppController {
    pub fn new(service: MarketService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &MarketService {
        &self.service
    }

    pub async fn execute(&self, command: Command) -> Vec<Reply> {
        match command {
            Command::Indices => vec![Reply::from_result(self.service.indices().await)],
            Command::History(symbols) => self
                .service
                .histories(&symbols)
                .await
                .into_iter()
                .map(Reply::from_result)
                .collect(),
            Command::Quota => vec![Reply::from_result(Ok(self.service.quota()))],
            Command::Help => vec![Reply::Notice(HELP.to_string())],
            Command::Exit => Vec::new(),
        }
    }

    pub async fn run_interactive(&self) -> Result<()> {
        let mut lines = BufReader::new(io::stdin()).lines();
        let mut stdout = io::stdout();

        loop {
            stdout.write_all(b"Waiting for command: ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let command = match parse_command(&line) {
                None => continue,
                Some(Err(usage)) => {
                    println!("{usage}");
                    continue;
                }
                Some(Ok(Command::Exit)) => {
                    println!("Exiting...");
                    break;
                }
                Some(Ok(command)) => command,
            };

            for reply in self.execute(command).await {
                println!("{}", reply.render());
            }
        }

        Ok(())
    }
}
