//! Payload script for the fragment sender.
//!
//! A script is an ordered list of hand-crafted byte payloads designed to
//! stress a chat client's TCP stream parser:
//! - lines with non-standard casing
//! - one logical line split across two writes (including mid-word splits)
//! - several complete lines packed into a single write
//!
//! The built-in script reproduces the canonical test sequence; alternate
//! sequences can be loaded from a TOML file.

use bytes::Bytes;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One payload: an immutable ASCII byte string sent verbatim in a single write.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    bytes: Bytes,
}

impl Payload {
    /// Create a payload, rejecting anything outside ASCII.
    ///
    /// The wire encoding is defined as ASCII; a payload that cannot be
    /// ASCII-encoded is a script authoring mistake, not something to send.
    pub fn new(s: &str) -> Result<Self, ScriptError> {
        if !s.is_ascii() {
            return Err(ScriptError::NonAscii(s.to_string()));
        }
        Ok(Payload {
            bytes: Bytes::copy_from_slice(s.as_bytes()),
        })
    }

    /// Raw bytes to write to the socket.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Human-readable preview with CR and LF escaped as literal `\r` and `\n`,
    /// so line boundaries are visible in the prompt instead of being
    /// interpreted by the terminal.
    pub fn preview(&self) -> String {
        let mut out = String::with_capacity(self.bytes.len());
        for &b in self.bytes.iter() {
            match b {
                b'\r' => out.push_str("\\r"),
                b'\n' => out.push_str("\\n"),
                _ => out.push(b as char),
            }
        }
        out
    }
}

/// Ordered, immutable payload sequence, consumed front to back.
#[derive(Debug, Clone)]
pub struct Script {
    payloads: Vec<Payload>,
}

/// TOML script file: `payloads = ["...", "..."]`
#[derive(Debug, Deserialize)]
struct ScriptFile {
    payloads: Vec<String>,
}

impl Script {
    /// The canonical test sequence.
    ///
    /// Covers: a REPLY line split after the status word, three MSG lines in
    /// one write, a MSG line split at a space, a MSG line split inside a
    /// word, and a trailing BYE.
    pub fn builtin() -> Self {
        let payloads = [
            "RePLy Ok ",
            "iS oK\r\n",
            "MSg FROM 2 is 2\r\nmsg from 3 is 3\r\nmsg from 4 is 4\r\n",
            "msg fROm 5 is 5\r\nmsg from 6 is 6\r\nmsg from 7 is",
            " 7\r\n",
            "msg from",
            " 8 is 8\r\n",
            "bYE from xd\r\n",
        ]
        .iter()
        .map(|s| Payload::new(s))
        .collect::<Result<Vec<_>, _>>()
        .unwrap(); // built-in payloads are all ASCII

        Script { payloads }
    }

    /// Load an alternate payload sequence from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScriptError::FileRead(path.to_path_buf(), e))?;
        let file: ScriptFile = toml::from_str(&contents)
            .map_err(|e| ScriptError::TomlParse(path.to_path_buf(), e))?;

        if file.payloads.is_empty() {
            return Err(ScriptError::Empty(path.to_path_buf()));
        }

        let payloads = file
            .payloads
            .iter()
            .map(|s| Payload::new(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Script { payloads })
    }

    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Script loading and validation errors
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("failed to parse script file '{0}'")]
    TomlParse(PathBuf, #[source] toml::de::Error),

    #[error("payload is not ASCII: {0:?}")]
    NonAscii(String),

    #[error("script file '{0}' contains no payloads")]
    Empty(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_escapes_line_endings() {
        let payload = Payload::new("iS oK\r\n").unwrap();
        assert_eq!(payload.preview(), "iS oK\\r\\n");
    }

    #[test]
    fn test_preview_plain_text_unchanged() {
        let payload = Payload::new("RePLy Ok ").unwrap();
        assert_eq!(payload.preview(), "RePLy Ok ");
    }

    #[test]
    fn test_preview_embedded_crlf() {
        let payload = Payload::new("a\r\nb\r\n").unwrap();
        assert_eq!(payload.preview(), "a\\r\\nb\\r\\n");
    }

    #[test]
    fn test_non_ascii_rejected() {
        match Payload::new("zpráva\r\n") {
            Err(ScriptError::NonAscii(_)) => {}
            _ => panic!("Expected NonAscii error"),
        }
    }

    #[test]
    fn test_builtin_script_order() {
        let script = Script::builtin();
        assert_eq!(script.len(), 8);
        assert_eq!(script.payloads()[0].as_bytes(), b"RePLy Ok ");
        assert_eq!(script.payloads()[1].as_bytes(), b"iS oK\r\n");
        assert_eq!(script.payloads()[7].as_bytes(), b"bYE from xd\r\n");
    }

    #[test]
    fn test_builtin_split_reply_concatenates() {
        let script = Script::builtin();
        let mut joined = Vec::new();
        joined.extend_from_slice(script.payloads()[0].as_bytes());
        joined.extend_from_slice(script.payloads()[1].as_bytes());
        assert_eq!(joined, b"RePLy Ok iS oK\r\n");
    }

    #[test]
    fn test_builtin_mid_word_split() {
        let script = Script::builtin();
        assert_eq!(script.payloads()[5].as_bytes(), b"msg from");
        assert_eq!(script.payloads()[6].as_bytes(), b" 8 is 8\r\n");
    }

    #[test]
    fn test_script_from_toml() {
        let dir = std::env::temp_dir().join("fragsend-script-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("combined.toml");
        std::fs::write(&path, "payloads = [\"RePLy Ok iS oK\\r\\n\"]\n").unwrap();

        let script = Script::from_file(&path).unwrap();
        assert_eq!(script.len(), 1);
        assert_eq!(script.payloads()[0].as_bytes(), b"RePLy Ok iS oK\r\n");
    }

    #[test]
    fn test_script_file_missing() {
        let path = Path::new("/nonexistent/fragsend/script.toml");
        match Script::from_file(path) {
            Err(ScriptError::FileRead(p, _)) => assert_eq!(p, path),
            _ => panic!("Expected FileRead error"),
        }
    }

    #[test]
    fn test_script_file_empty_payloads() {
        let dir = std::env::temp_dir().join("fragsend-script-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.toml");
        std::fs::write(&path, "payloads = []\n").unwrap();

        match Script::from_file(&path) {
            Err(ScriptError::Empty(_)) => {}
            _ => panic!("Expected Empty error"),
        }
    }

    #[test]
    fn test_script_file_bad_toml() {
        let dir = std::env::temp_dir().join("fragsend-script-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "payloads = not-a-list\n").unwrap();

        match Script::from_file(&path) {
            Err(ScriptError::TomlParse(_, _)) => {}
            _ => panic!("Expected TomlParse error"),
        }
    }
}
