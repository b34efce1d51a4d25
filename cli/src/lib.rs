pub mod commands;
pub mod context;
pub mod reader;
pub mod settings;

pub use context::CliContext;

use std::io::Write;

/// Blocking prompt for the REPL loop.
pub fn readline() -> Result<String, String> {
    write!(std::io::stdout(), "> ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    let mut buffer = String::new();
    std::io::stdin()
        .read_line(&mut buffer)
        .map_err(|e| e.to_string())?;
    Ok(buffer)
}
