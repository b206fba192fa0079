//! Terminal chat over a technical document.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::{IsTerminal as _, Write as _};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser as _;
use docchat::command::{self, Command};
use docchat::config::{Args, Settings};
use docchat::core::Gateway;
use docchat::{App, Error, Outcome, view};
use docchat_gemini_model::GeminiProvider;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, BufReader, Stdin};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut settings =
        match Settings::resolve(Args::parse(), |key| env::var(key).ok()) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        };
    debug!("settings: {settings:?}");

    let mut stdin = BufReader::new(io::stdin());
    if settings.api_key.is_none() && std::io::stdin().is_terminal() {
        println!(
            "{}",
            "⚠️  GEMINI_API_KEY is not set, enter a key to continue. \
             The key is shown as you type it."
                .yellow()
        );
        settings.api_key = prompt(&mut stdin, "Gemini API key (visible): ")
            .await
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty());
    }

    let gateway = match settings.gemini_config() {
        Some(config) => match GeminiProvider::new(config) {
            Ok(provider) => {
                Gateway::new(provider).with_timeout(settings.timeout)
            }
            Err(err) => {
                eprintln!("cannot set up the model client: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            warn!("no API key, every model call will fail");
            Gateway::without_credential()
        }
    };

    let mut app = App::from_settings(&settings, gateway);
    if let Some(file) = settings.file.clone() {
        show(run(&mut app, Command::Upload(file)).await);
    }
    println!("{}", view::render(app.workbench().active()));
    println!("{}", "Type /help for the list of commands.".dimmed());

    loop {
        let label = app.workbench().active().label().to_owned();
        let Some(line) = prompt(&mut stdin, &format!("[{label}]> ")).await else {
            break;
        };
        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                show(Err(err));
                continue;
            }
        };
        let result = run(&mut app, command).await;
        if result.as_ref().is_ok_and(|outcome| *outcome == Outcome::Quit) {
            break;
        }
        show(result);
    }
    ExitCode::SUCCESS
}

/// Runs a command, with a spinner while the model is working.
async fn run(app: &mut App, command: Command) -> Result<Outcome, Error> {
    if !command.calls_model() {
        return app.execute(command).await;
    }

    let style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(style);
    progress_bar.set_message(match command {
        Command::Generate => "📝 Preparing the report...",
        _ => "🤔 Thinking...",
    });
    progress_bar.enable_steady_tick(Duration::from_millis(100));

    let result = app.execute(command).await;
    progress_bar.finish_and_clear();
    result
}

fn show(result: Result<Outcome, Error>) {
    match result {
        Ok(Outcome::Reply(text)) => {
            println!("{}🤖 {}\n", BAR_CHAR.bright_cyan(), text.bright_white());
        }
        Ok(Outcome::Message(text)) => println!("{}", text.trim_end()),
        Ok(Outcome::Exported(path)) => {
            println!("{}", format!("📥 Saved {}", path.display()).green());
        }
        Ok(Outcome::Quit) => {}
        Err(err) => {
            println!("{}⚠️  {}", BAR_CHAR.bright_red(), err.red());
        }
    }
}

async fn prompt(stdin: &mut BufReader<Stdin>, text: &str) -> Option<String> {
    print!("{text}");
    if let Err(err) = std::io::stdout().flush() {
        error!("error flushing output: {err}");
    }
    command::read_line(stdin).await
}
