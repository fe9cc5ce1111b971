//! Interactive terminal front-end over a [`GenerationController`].

use crate::controller::GenerationController;
use crate::models::Phase;
use crate::{Error, Result};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

pub const HELP: &str = "\
Commands:
  models                 list available models
  model <name|number>    select a model
  prompt <text>          set the prompt
  generate               generate an image from the current prompt
  download [dir]         save the current image as generated_image.jpg
  history                show previous generations
  export <file.html>     write the history as an HTML page
  status                 show the current session state
  help                   show this message
  quit                   leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Models,
    Model(String),
    Prompt(String),
    Generate,
    Download(Option<PathBuf>),
    History,
    Export(PathBuf),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim_start();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (line.trim_end(), ""),
        };
        let arg = rest.trim();

        match name.to_ascii_lowercase().as_str() {
            "models" => Ok(Command::Models),
            "model" if !arg.is_empty() => Ok(Command::Model(arg.to_string())),
            "model" => Err("usage: model <name|number>".to_string()),
            // Prompt text is kept verbatim apart from the separating space
            "prompt" => Ok(Command::Prompt(
                rest.strip_suffix('\n').unwrap_or(rest).to_string(),
            )),
            "generate" | "g" => Ok(Command::Generate),
            "download" => Ok(Command::Download(
                (!arg.is_empty()).then(|| PathBuf::from(arg)),
            )),
            "history" => Ok(Command::History),
            "export" if !arg.is_empty() => Ok(Command::Export(PathBuf::from(arg))),
            "export" => Err("usage: export <file.html>".to_string()),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err(String::new()),
            other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
        }
    }
}

/// Label of the submit control for the given phase.
pub fn submit_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Loading => "Generating...",
        _ => "Generate Image",
    }
}

pub fn render_models(controller: &GenerationController) -> String {
    let selected = controller
        .state()
        .selected_endpoint
        .as_ref()
        .map(|e| e.url.as_str());

    let mut out = String::new();
    for (index, endpoint) in controller.endpoints().iter().enumerate() {
        let marker = if Some(endpoint.url.as_str()) == selected {
            "*"
        } else {
            " "
        };
        let _ = writeln!(out, "{} {}. {}", marker, index + 1, endpoint.display_name);
    }
    out
}

pub fn render_status(controller: &GenerationController) -> String {
    let state = controller.state();
    let mut out = String::new();

    let model = state
        .selected_endpoint
        .as_ref()
        .map(|e| e.display_name.as_str())
        .unwrap_or("Select a model");
    let _ = writeln!(out, "Model:  {}", model);
    let _ = writeln!(out, "Prompt: {}", state.current_prompt);
    let _ = writeln!(out, "[{}]", submit_label(state.phase));

    if let Some(message) = &state.last_error {
        let _ = writeln!(out, "Error:  {}", message);
    }
    if state.phase != Phase::Loading {
        if let Some(handle) = &state.current_image {
            let size = controller
                .store()
                .get(handle)
                .map(|image| image.bytes.len())
                .unwrap_or(0);
            let _ = writeln!(out, "Image:  {} ({} bytes) [Download Image]", handle, size);
        }
    }
    out
}

pub fn render_history(controller: &GenerationController) -> String {
    let history = controller.history();
    if history.is_empty() {
        return "No history yet.\n".to_string();
    }

    let mut out = String::new();
    for (index, entry) in history.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{}] {}\n   {}",
            index + 1,
            entry.created_at.format("%H:%M:%S"),
            entry.prompt,
            entry.image
        );
    }
    out
}

/// Start a generation, announcing it only once the controller accepted it.
///
/// Returns the label shown while the request ran. The outcome itself is
/// reported through the session state.
async fn run_generate(controller: &mut GenerationController) -> Option<&'static str> {
    let pending = match controller.begin_submit() {
        Ok(pending) => pending,
        Err(Error::ConcurrentSubmission) => {
            println!("{}", Error::ConcurrentSubmission);
            return None;
        }
        Err(_) => return None,
    };

    let label = submit_label(controller.phase());
    println!("{}", label);
    let _ = controller.generate(pending).await;
    Some(label)
}

/// Apply one command. Returns `false` once the session should stop.
pub async fn execute(controller: &mut GenerationController, command: Command) -> Result<bool> {
    match command {
        Command::Models => print!("{}", render_models(controller)),
        Command::Model(choice) => {
            let by_number = choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| controller.endpoints().get(index).cloned());
            match by_number {
                Some(endpoint) => controller.select_endpoint(endpoint),
                None => controller.select_endpoint_by_name(&choice)?,
            }
            print!("{}", render_models(controller));
        }
        Command::Prompt(text) => controller.set_prompt(text),
        Command::Generate => {
            run_generate(controller).await;
            print!("{}", render_status(controller));
        }
        Command::Download(dir) => {
            let handle = controller.state().current_image;
            let saved = match dir {
                Some(dir) => controller.download_to(handle.as_ref(), &dir)?,
                None => controller.download(handle.as_ref())?,
            };
            if let Some(path) = saved {
                println!("Saved {}", path.display());
            }
        }
        Command::History => print!("{}", render_history(controller)),
        Command::Export(path) => {
            controller.export_history(&path)?;
            println!("Wrote {}", path.display());
        }
        Command::Status => print!("{}", render_status(controller)),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run_interactive(controller: &mut GenerationController) -> Result<()> {
    println!("Image Generator");
    println!("{}", HELP);
    print!("{}", render_models(controller));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                if !message.is_empty() {
                    println!("{}", message);
                }
                continue;
            }
        };

        match execute(controller, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Command failed: {}", e);
                println!("{}", e);
            }
        }
    }

    controller.end_session();
    Ok(())
}
