use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// Where a letter is written when the request doesn't say
pub const DEFAULT_OUTPUT_PATH: &str = "approved_letter.pdf";

/// A request to render one letter
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LetterRequest {
    /// The body, exactly as submitted. Lines are separated by `\n`.
    #[serde(default)]
    pub letter_text: String,
    /// Signature blocks, drawn left to right in this order
    #[serde(default)]
    pub signers: Vec<Signer>,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

impl LetterRequest {
    pub fn from_json(payload: &str) -> Result<LetterRequest, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// A person signing the letter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub name: String,
    pub role: String,
    /// Shown verbatim after "Date: "
    pub date: String,
    /// An image of the signature on disk. If this is missing, or the file doesn't exist, the
    /// name is drawn in the signature font instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_image_path: Option<PathBuf>,
    /// A base64 (optionally data URI) signature image, turned into
    /// `signature_image_path` by [crate::resolve_signatures]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_data: Option<String>,
}

impl Signer {
    pub fn new<S: ToString>(name: S, role: S, date: S) -> Signer {
        Signer {
            name: name.to_string(),
            role: role.to_string(),
            date: date.to_string(),
            signature_image_path: None,
            signature_data: None,
        }
    }

    /// The signature image to draw, if one was given and it exists
    pub fn existing_signature_image(&self) -> Option<&PathBuf> {
        self.signature_image_path
            .as_ref()
            .filter(|path| path.exists())
    }
}

/// The outcome of one invocation, reported as a single line of JSON
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResult {
    Success {
        output_path: PathBuf,
        file_size: u64,
        message: String,
    },
    Failure {
        error: String,
        message: String,
    },
}

impl RenderResult {
    pub fn success(output_path: PathBuf, file_size: u64) -> RenderResult {
        RenderResult::Success {
            output_path,
            file_size,
            message: "PDF generated successfully".to_string(),
        }
    }

    pub fn failure<E: std::fmt::Display>(error: E) -> RenderResult {
        let error = error.to_string();
        RenderResult::Failure {
            message: format!("Letter generation failed: {error}"),
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RenderResult::Success { .. })
    }

    /// The one-line JSON record printed on stdout
    pub fn to_json(&self) -> String {
        // serializing a map of strings, bools and integers can't fail
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":"unserializable result","message":"Letter generation failed"}"#
                .to_string()
        })
    }
}

impl Serialize for RenderResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RenderResult::Success {
                output_path,
                file_size,
                message,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("output_path", &output_path.to_string_lossy())?;
                map.serialize_entry("file_size", file_size)?;
                map.serialize_entry("message", message)?;
                map.end()
            }
            RenderResult::Failure { error, message } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("message", message)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn missing_fields_take_defaults() {
        let request = LetterRequest::from_json("{}").unwrap();
        assert_eq!(request.letter_text, "");
        assert!(request.signers.is_empty());
        assert_eq!(request.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
    }

    #[test]
    fn signers_use_camel_case_fields() {
        let request = LetterRequest::from_json(
            r#"{"signers": [{"name": "Dr. A", "role": "HOD", "date": "2024-01-01",
                "signatureImagePath": "/tmp/a.png", "extra": 1}]}"#,
        )
        .unwrap();
        let signer = &request.signers[0];
        assert_eq!(signer.name, "Dr. A");
        assert_eq!(signer.signature_image_path, Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(signer.signature_data, None);
    }

    #[test]
    fn signer_without_name_is_rejected() {
        let err = LetterRequest::from_json(r#"{"signers": [{"role": "HOD", "date": "x"}]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn nonexistent_signature_image_is_ignored() {
        let mut signer = Signer::new("A", "B", "C");
        signer.signature_image_path = Some("/no/such/signature.png".into());
        assert!(signer.existing_signature_image().is_none());
    }

    #[test]
    fn success_record_shape() {
        let record: Value =
            serde_json::from_str(&RenderResult::success("/tmp/t1.pdf".into(), 1234).to_json())
                .unwrap();
        assert_eq!(
            record,
            json!({
                "success": true,
                "output_path": "/tmp/t1.pdf",
                "file_size": 1234,
                "message": "PDF generated successfully",
            })
        );
    }

    #[test]
    fn failure_record_shape() {
        let result = RenderResult::failure("boom");
        assert!(!result.is_success());
        let record: Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(
            record,
            json!({
                "success": false,
                "error": "boom",
                "message": "Letter generation failed: boom",
            })
        );
    }
}
