//! Wire types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use freeshare_session::GUEST_EMAIL;

/// Public description of a shared file and what it takes to download it.
///
/// Immutable once fetched; the only way to observe server-side changes is
/// to resolve the link again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMetadata {
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub shared_link: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requires_password: bool,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default, rename = "requires2FA")]
    pub requires_2fa: bool,
    #[serde(default, rename = "ownerEmail", alias = "userEmail")]
    pub owner_email: Option<String>,
}

impl ShareMetadata {
    /// Encrypted files need the cipher password even when not flagged
    pub fn requires_password_step(&self) -> bool {
        self.requires_password || self.encrypted
    }

    /// True when nothing beyond the link is needed to download
    pub fn is_open(&self) -> bool {
        !self.requires_password_step() && !self.requires_2fa
    }

    /// Files without a registered owner are removed after one download
    pub fn is_guest_owned(&self) -> bool {
        match self.owner_email.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(email) => email.eq_ignore_ascii_case(GUEST_EMAIL),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|at| at <= now)
    }

    pub fn display_size(&self) -> Option<String> {
        self.size.map(format_size)
    }
}

/// A file as listed in its owner's dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub file_id: String,
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shared_link: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub requires_password: bool,
    #[serde(default, rename = "requires2FA")]
    pub requires_2fa: bool,
    #[serde(default)]
    pub encrypted: bool,
}

impl FileRecord {
    /// Stored names carry a `<prefix>_` uniqueness prefix; hide it.
    pub fn display_name(&self) -> &str {
        match self.filename.split_once('_') {
            Some((_, rest)) if !rest.is_empty() => rest,
            _ => &self.filename,
        }
    }
}

/// Multipart upload payload
#[derive(Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub encrypt: bool,
    /// Sent only when `encrypt` is set
    pub password: Option<String>,
    pub requires_2fa: bool,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .field("encrypt", &self.encrypt)
            .field("requires_2fa", &self.requires_2fa)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    pub shared_link: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub jwt_token: String,
    pub email: String,
}

#[derive(Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Credentials attached to a gated download. `None` means the parameter is
/// left out of the request entirely.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DownloadCredentials {
    pub password: Option<String>,
    pub two_factor_code: Option<String>,
}

impl std::fmt::Debug for DownloadCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadCredentials")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "two_factor_code",
                &self.two_factor_code.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Body and naming hints of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    /// Name from `Content-Disposition`, when the server sent one
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// Public URL a share link is reachable at
pub fn share_url(origin: &str, shared_link: &str) -> String {
    format!("{}/share/{}", origin.trim_end_matches('/'), shared_link)
}

pub(crate) fn format_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes < MIB {
        format!("{:.2} KB", bytes / 1024.0)
    } else {
        format!("{:.2} MB", bytes / MIB)
    }
}

/// Accepts RFC 3339 timestamps as well as zone-less ones, read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metadata(json: &str) -> ShareMetadata {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_share_metadata_from_backend() {
        let meta = metadata(
            r#"{
                "filename": "report.pdf",
                "size": 51200,
                "contentType": "application/pdf",
                "sharedLink": "abc123",
                "expirationDate": "2030-05-01T10:30:00",
                "requiresPassword": false,
                "encrypted": true,
                "requires2FA": true,
                "userEmail": "ana@example.com"
            }"#,
        );

        assert_eq!(meta.filename, "report.pdf");
        assert_eq!(meta.size, Some(51_200));
        assert!(meta.requires_password_step());
        assert!(meta.requires_2fa);
        assert_eq!(meta.owner_email.as_deref(), Some("ana@example.com"));
        assert_eq!(
            meta.expiration_date,
            Some(Utc.with_ymd_and_hms(2030, 5, 1, 10, 30, 0).unwrap())
        );
        assert!(!meta.is_guest_owned());
        assert!(!meta.is_open());
    }

    #[test]
    fn test_minimal_metadata_defaults() {
        let meta = metadata(r#"{"filename": "a.doc", "expirationDate": null}"#);
        assert!(meta.is_open());
        assert!(meta.is_guest_owned());
        assert!(meta.expiration_date.is_none());
        assert!(meta.size.is_none());
    }

    #[test]
    fn test_guest_owner_sentinel() {
        let mut meta = metadata(r#"{"filename": "a.doc", "ownerEmail": "guest"}"#);
        assert!(meta.is_guest_owned());

        meta.owner_email = Some("GUEST".to_string());
        assert!(meta.is_guest_owned());

        meta.owner_email = Some("   ".to_string());
        assert!(meta.is_guest_owned());

        meta.owner_email = Some("guest@example.com".to_string());
        assert!(!meta.is_guest_owned());
    }

    #[test]
    fn test_expiration() {
        let meta = metadata(r#"{"filename": "a.pdf", "expirationDate": "2024-01-01T00:00:00Z"}"#);
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
        assert!(!meta.is_expired(before));
        assert!(meta.is_expired(after));
    }

    #[test]
    fn test_unparseable_timestamp_is_rejected() {
        let result: std::result::Result<ShareMetadata, _> =
            serde_json::from_str(r#"{"filename": "a.pdf", "expirationDate": "next tuesday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_file_record_numeric_id_and_display_name() {
        let record: FileRecord = serde_json::from_str(
            r#"{
                "fileId": 42,
                "filename": "5f1c_quarterly_report.xlsx",
                "sharedLink": "xyz",
                "uploadDate": "2024-03-01T09:00:00.123",
                "requires2FA": false
            }"#,
        )
        .unwrap();

        assert_eq!(record.file_id, "42");
        assert_eq!(record.display_name(), "quarterly_report.xlsx");
        assert!(record.upload_date.is_some());

        let plain = FileRecord {
            filename: "plain.pdf".to_string(),
            ..record
        };
        assert_eq!(plain.display_name(), "plain.pdf");
    }

    #[test]
    fn test_sizes_and_share_url() {
        assert_eq!(format_size(51_200), "50.00 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(
            share_url("https://share.example.com/", "abc"),
            "https://share.example.com/share/abc"
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = DownloadCredentials {
            password: Some("hunter2".to_string()),
            two_factor_code: None,
        };
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("hunter2"));
    }
}
