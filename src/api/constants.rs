//! API constants for the Shotgun JSON API

/// JSON RPC endpoint, relative to the server URL
pub const API_PATH: &str = "/api3/json";

/// File upload endpoint
pub const UPLOAD_FILE_PATH: &str = "/upload/upload_file";

/// Thumbnail upload endpoint
pub const UPLOAD_THUMBNAIL_PATH: &str = "/upload/publish_thumbnail";

/// Attachment download endpoint; the attachment id is appended
pub const DOWNLOAD_ATTACHMENT_PATH: &str = "/file_serve/attachment";

/// Operations that no longer exist in this API
pub const REMOVED_OPERATIONS: &[&str] = &["schema", "entity_types"];

/// RPC method names
pub mod rpc {
    pub const READ: &str = "read";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const REVIVE: &str = "revive";
    pub const BATCH: &str = "batch";
    pub const SUMMARIZE: &str = "summarize";
    pub const INFO: &str = "info";
    pub const GET_SESSION_TOKEN: &str = "get_session_token";
}

/// Request headers
pub mod headers {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
    pub const USER_AGENT: &str = "user-agent";
}

/// Version of this client, reported in the user agent
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the RPC endpoint URL
pub fn api_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url, API_PATH)
}

/// Build the attachment download URL
pub fn attachment_endpoint(base_url: &str, attachment_id: i64) -> String {
    format!("{}{}/{}", base_url, DOWNLOAD_ATTACHMENT_PATH, attachment_id)
}

/// The removed operation called `name`, if it is one
pub fn removed_operation(name: &str) -> Option<&'static str> {
    REMOVED_OPERATIONS.iter().copied().find(|removed| *removed == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(api_endpoint("https://site.example"), "https://site.example/api3/json");
        assert_eq!(
            attachment_endpoint("https://site.example", 12),
            "https://site.example/file_serve/attachment/12"
        );
    }

    #[test]
    fn test_removed_operations() {
        assert_eq!(removed_operation("schema"), Some("schema"));
        assert_eq!(removed_operation("entity_types"), Some("entity_types"));
        assert_eq!(removed_operation("find"), None);
    }
}
