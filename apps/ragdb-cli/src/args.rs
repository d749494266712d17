use std::path::PathBuf;

pub const USAGE: &str = "Usage: ragdb <command> [args...]

Commands:
  ingest [dir]     chunk, embed and index every .txt file under dir
  query \"<q>\"      retrieve and print the top candidates
  ask \"<q>\"        retrieve, then answer with the configured model
  demo             index three sample snippets in memory and run a query";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ingest { dir: Option<PathBuf> },
    Query { text: String },
    Ask { text: String },
    Demo,
}

impl Command {
    /// Parse the arguments after the program name. `Err` carries the message to print.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some((cmd, rest)) = args.split_first() else {
            return Err(USAGE.to_string());
        };
        match cmd.as_str() {
            "ingest" => Ok(Command::Ingest { dir: rest.iter().find(|a| !a.starts_with('-')).map(PathBuf::from) }),
            "query" | "ask" => {
                let text = rest.join(" ");
                if text.trim().is_empty() {
                    return Err(format!("Usage: ragdb {cmd} \"<query>\""));
                }
                Ok(if cmd == "query" { Command::Query { text } } else { Command::Ask { text } })
            }
            "demo" => Ok(Command::Demo),
            "-h" | "--help" | "help" => Err(USAGE.to_string()),
            other => Err(format!("Unknown command: {other}\n\n{USAGE}")),
        }
    }
}
