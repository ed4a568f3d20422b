use skycast_core::{UiCommand, WeatherController};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::terminal::TerminalPresenter;

const HELP: &str = "\
Type a city name to search.
  :u  switch between °C and °F
  :l  use current location
  :f  list favorites
  :h  show this help
  :q  quit";

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Command(UiCommand),
    Help,
    Quit,
    Unknown(String),
}

/// Map one prompt line to an input. Lines starting with `:` are shortcuts,
/// anything else is a search.
pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let Some(shortcut) = line.strip_prefix(':') else {
        return Input::Command(UiCommand::Search(line.to_string()));
    };

    match shortcut.trim() {
        "u" | "unit" | "units" => Input::Command(UiCommand::ToggleUnit),
        "l" | "loc" | "location" => Input::Command(UiCommand::UseCurrentLocation),
        "f" | "fav" | "favorites" => Input::Command(UiCommand::ListFavorites),
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

pub async fn run(controller: &mut WeatherController<TerminalPresenter>) -> anyhow::Result<()> {
    println!("{HELP}");
    controller.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let prompt = match controller.presenter_mut().active_banner(Instant::now()) {
            Some(message) => format!("[{message}]\n> "),
            None => "> ".to_string(),
        };
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            Input::Command(command) => controller.handle(command).await,
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Unknown(shortcut) => {
                println!("Unknown command ':{shortcut}'. Type :h for help.")
            }
        }
    }

    Ok(())
}
