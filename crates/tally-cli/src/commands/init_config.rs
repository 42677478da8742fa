//! Writing a default configuration file.

use std::io::Write;
use std::path::PathBuf;

use tally_peer::PeerConfig;

use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Init-config command executor.
pub struct InitConfigCommand {
    output: Option<PathBuf>,
    force: bool,
}

impl InitConfigCommand {
    /// Create a new init-config command.
    #[must_use]
    pub const fn new(output: Option<PathBuf>, force: bool) -> Self {
        Self { output, force }
    }

    /// Render `config` as TOML to the output file, or to `writer` if no file
    /// was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and `force` is unset, or if
    /// writing fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        config: &PeerConfig,
    ) -> Result<(), CliError> {
        let rendered = config.to_toml()?;
        let Some(path) = &self.output else {
            write!(writer, "{rendered}")?;
            return Ok(());
        };
        if path.exists() && !self.force {
            return Err(CliError::InvalidArgument(format!(
                "{} already exists, pass --force to overwrite",
                path.display()
            )));
        }
        std::fs::write(path, rendered)?;
        format.write(writer, &Message::success(format!("Wrote {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_to_writer() {
        let mut out = Vec::new();
        InitConfigCommand::new(None, false)
            .execute(&mut out, &OutputFormat::default(), &PeerConfig::default())
            .expect("render");
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("channel_id = \"tally-channel\""));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "").unwrap();

        let cmd = InitConfigCommand::new(Some(path.clone()), false);
        let err = cmd
            .execute(&mut Vec::new(), &OutputFormat::default(), &PeerConfig::default())
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));

        InitConfigCommand::new(Some(path.clone()), true)
            .execute(&mut Vec::new(), &OutputFormat::default(), &PeerConfig::default())
            .expect("forced write");
        let written = PeerConfig::from_file(&path).expect("valid config");
        assert_eq!(written, PeerConfig::default());
    }
}
