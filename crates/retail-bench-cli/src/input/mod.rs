pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a command's input document: `--input` file first, then piped stdin.
pub fn load<T: DeserializeOwned>(
    path: &Option<String>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(ref path) = path {
        file::read_json(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("Provide --input <file> or pipe {} JSON via stdin", what).into())
    }
}
