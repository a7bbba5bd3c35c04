use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

/// Send a signal to the running server-overlay daemon.
#[derive(Parser, Debug)]
#[command(name = "server-overlay-ctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the overlay, or update it in place
    Show(ShowArgs),
    /// Close the overlay regardless of its dismiss policy
    Dismiss,
    /// The session is back: close the overlay and reset the retry delay
    SignedIn,
    /// The server link is down
    Disconnected {
        /// Record the state without opening the overlay
        #[arg(long)]
        silent: bool,
        #[command(flatten)]
        show: ShowArgs,
    },
    /// Ask the daemon to restart itself (only while the overlay is open)
    Reload,
    /// Stop the daemon
    Quit,
}

#[derive(clap::Args, Debug, Default)]
struct ShowArgs {
    /// Status message
    #[arg(long, short)]
    message: Option<String>,
    /// Icon name or path
    #[arg(long, short)]
    icon: Option<String>,
    /// Show the busy indicator
    #[arg(long, short)]
    spinner: bool,
    /// Spinner variant (loading-icon-01 .. loading-icon-05)
    #[arg(long)]
    loading_icon: Option<String>,
    /// Backdrop opacity between 0 and 1
    #[arg(long)]
    opacity: Option<f32>,
    /// Whether Escape is ignored (default: true)
    #[arg(long)]
    block_on_escape: Option<bool>,
    /// Whether clicking outside is ignored (default: false)
    #[arg(long)]
    block_on_outside_click: Option<bool>,
}

impl ShowArgs {
    fn to_json(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(message) = &self.message {
            map.insert("message".into(), json!(message));
        }
        if let Some(icon) = &self.icon {
            map.insert("icon".into(), json!(icon));
        }
        if self.spinner {
            map.insert("spinner".into(), json!(true));
        }
        if let Some(loading_icon) = &self.loading_icon {
            map.insert("loadingIcon".into(), json!(loading_icon));
        }
        if let Some(opacity) = self.opacity {
            map.insert("opacity".into(), json!(opacity));
        }
        if let Some(block) = self.block_on_escape {
            map.insert("blockOnEscape".into(), json!(block));
        }
        if let Some(block) = self.block_on_outside_click {
            map.insert("blockOnOutsideClick".into(), json!(block));
        }
        map
    }
}

fn socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("server-overlay.sock")
}

/// The single IPC line for a command.
fn command_line(command: &Command) -> String {
    match command {
        Command::Show(args) => with_payload("show-overlay", args.to_json()),
        Command::Dismiss => "dismiss-overlay".to_string(),
        Command::SignedIn => "signed-in".to_string(),
        Command::Disconnected { silent, show } => {
            let mut payload = show.to_json();
            if *silent {
                payload.insert("silent".into(), json!(true));
            }
            with_payload("disconnected", payload)
        }
        Command::Reload => "reload".to_string(),
        Command::Quit => "quit".to_string(),
    }
}

fn with_payload(name: &str, payload: Map<String, Value>) -> String {
    if payload.is_empty() {
        name.to_string()
    } else {
        format!("{name} {}", Value::Object(payload))
    }
}

fn main() {
    let cli = Cli::parse();
    let line = command_line(&cli.command);

    let path = socket_path();
    let mut stream = match UnixStream::connect(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("server-overlay not running ({path:?}): {e}");
            process::exit(1);
        }
    };

    if let Err(e) = writeln!(stream, "{line}") {
        eprintln!("failed to send command: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(std::iter::once("server-overlay-ctl").chain(args.iter().copied()))
            .unwrap();
        command_line(&cli.command)
    }

    #[test]
    fn bare_commands() {
        assert_eq!(line(&["dismiss"]), "dismiss-overlay");
        assert_eq!(line(&["signed-in"]), "signed-in");
        assert_eq!(line(&["show"]), "show-overlay");
        assert_eq!(line(&["reload"]), "reload");
        assert_eq!(line(&["quit"]), "quit");
    }

    #[test]
    fn show_builds_payload() {
        let out = line(&[
            "show",
            "--message",
            "Reconnecting",
            "--spinner",
            "--block-on-escape",
            "false",
        ]);
        let (name, payload) = out.split_once(' ').unwrap();
        assert_eq!(name, "show-overlay");
        let payload: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(
            payload,
            json!({"message": "Reconnecting", "spinner": true, "blockOnEscape": false})
        );
    }

    #[test]
    fn disconnected_silent() {
        assert_eq!(line(&["disconnected"]), "disconnected");
        assert_eq!(line(&["disconnected", "--silent"]), r#"disconnected {"silent":true}"#);
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
