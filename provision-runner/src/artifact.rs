//! Writer environment file
//!
//! Derives the key=value connection document from the parameter set and
//! writes it owner-read/write only. This file is the sole channel between
//! the pipeline and the downstream writer, which loads it with dotenv
//! rules: values are single-quoted so `#`, surrounding whitespace and
//! quote characters survive verbatim.

use provision_core::StageError;
use provision_core::domain::params::{ADMIN_USERNAME, LISTENER_HOST, LISTENER_PORT, ParameterSet};
use std::fs::{self, OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use tracing::debug;

/// Permission bits of the generated file
pub const ENV_FILE_MODE: u32 = 0o600;

/// Keys the writer requires, in the order they are written
pub const REQUIRED_KEYS: [&str; 6] = [
    "ORACLE_USERNAME",
    "ORACLE_PASSWORD",
    "ORACLE_HOST",
    "ORACLE_PORT",
    "ORACLE_SERVICE_NAME",
    "ORACLE_SID",
];

/// Ordered key/value pairs of the environment file
pub fn entries(params: &ParameterSet) -> Vec<(String, String)> {
    let values = [
        ADMIN_USERNAME.to_string(),
        params.credentials.system_password.clone(),
        LISTENER_HOST.to_string(),
        LISTENER_PORT.to_string(),
        params.topology.pdb_name.clone(),
        params.sid.clone(),
    ];

    let mut entries: Vec<(String, String)> = REQUIRED_KEYS
        .iter()
        .map(|key| key.to_string())
        .zip(values)
        .collect();

    entries.extend(
        params
            .app_flags
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    entries
}

/// Renders the environment file content
pub fn render(params: &ParameterSet) -> String {
    entries(params)
        .into_iter()
        .map(|(key, value)| format!("{}={}\n", key, quote(&value)))
        .collect()
}

/// Single-quotes a value, escaping `\` and `'`
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Writes the environment file, replacing any previous one in place
///
/// The parameter set is validated first so no partial document is written.
pub fn write_env_file(params: &ParameterSet, path: &Path) -> Result<(), StageError> {
    params.validate()?;
    if let Some(key) = REQUIRED_KEYS
        .iter()
        .find(|key| params.app_flags.contains_key(**key))
    {
        return Err(StageError::invalid(
            format!("app_flags.{}", key),
            "collides with a connection key",
        ));
    }

    let content = render(params);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(ENV_FILE_MODE)
        .open(path)
        .map_err(|e| StageError::io(format!("open {}", path.display()), e))?;

    // `mode` only applies on creation; an existing file keeps its old bits
    file.set_permissions(Permissions::from_mode(ENV_FILE_MODE))
        .map_err(|e| StageError::io(format!("restrict permissions on {}", path.display()), e))?;

    file.write_all(content.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| StageError::io(format!("write {}", path.display()), e))?;

    debug!(
        "Wrote environment file {} ({} entries)",
        path.display(),
        content.lines().count()
    );
    Ok(())
}

/// Parses an environment file back into key/value pairs, the way a
/// dotenv loader reads it
///
/// Blank lines and `#` comments are ignored. Single-quoted values only
/// unescape `\\` and `\'`; double-quoted values also expand `\n` and `\t`.
/// Unquoted values end at a whitespace-preceded `#` and lose trailing
/// whitespace.
pub fn parse(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.strip_prefix("export ").unwrap_or(line))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), parse_value(value.trim_start())))
        .collect()
}

fn parse_value(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(quote @ ('\'' | '"')) => {
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    c if c == quote => break,
                    '\\' => match (quote, chars.next()) {
                        (_, Some(next)) if next == quote || next == '\\' => value.push(next),
                        ('"', Some('n')) => value.push('\n'),
                        ('"', Some('t')) => value.push('\t'),
                        (_, Some(next)) => {
                            value.push('\\');
                            value.push(next);
                        }
                        (_, None) => value.push('\\'),
                    },
                    c => value.push(c),
                }
            }
            value
        }
        _ => {
            let end = raw
                .char_indices()
                .find(|&(i, c)| {
                    c == '#' && raw[..i].ends_with(|p: char| p.is_whitespace())
                })
                .map_or(raw.len(), |(i, _)| i);
            raw[..end].trim_end().to_string()
        }
    }
}

/// Current permission bits of a file
pub fn mode_of(path: &Path) -> Result<u32, StageError> {
    fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o777)
        .map_err(|e| StageError::io(format!("stat {}", path.display()), e))
}
