use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Flag image metadata attached to a country. `file_content` is an
/// opaque base64 string; the core never decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub file_name: String,
    pub file_content: String,
    pub file_extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl Flag {
    /// Build flag metadata from a picked file, encoding the raw bytes to
    /// base64. The extension is whatever follows the last dot of the
    /// file name, or the whole name if it has none.
    pub fn from_file_bytes(file_name: &str, bytes: &[u8]) -> Self {
        let file_extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or(file_name)
            .to_string();

        Self {
            file_name: file_name.to_string(),
            file_content: STANDARD.encode(bytes),
            file_extension,
            file_path: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_content_and_extension() {
        let flag = Flag::from_file_bytes("germany.png", b"\x89PNG");

        assert_eq!(flag.file_name, "germany.png");
        assert_eq!(flag.file_extension, "png");
        assert_eq!(flag.file_content, STANDARD.encode(b"\x89PNG"));
        assert!(flag.file_path.is_none());
    }

    #[test]
    fn extension_falls_back_to_name() {
        let flag = Flag::from_file_bytes("flagfile", &[1, 2, 3]);
        assert_eq!(flag.file_extension, "flagfile");
    }

    #[test]
    fn file_path_is_omitted_when_absent() {
        let flag = Flag::from_file_bytes("a.svg", b"<svg/>");
        let json = serde_json::to_value(&flag).unwrap();
        assert!(json.get("file_path").is_none());
    }
}
