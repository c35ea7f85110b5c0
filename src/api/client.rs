//! The public Shotgun client

use log::{debug, info};
use serde_json::{Map, Value, json};
use std::path::Path;
use std::sync::Arc;

use super::capabilities::{ClientCapabilities, Feature, ServerCapabilities};
use super::constants::{self, rpc};
use super::datetime::{DateTimeNormalizer, LocalZone};
use super::dispatcher::RequestDispatcher;
use super::entity::{Entity, FieldValue};
use super::error::{Result, ShotgunError};
use super::logging::{ApiLogger, MonitoringConfig};
use super::operations::{BatchRequest, OperationResult, Operations, batch, field_list};
use super::query::{FindRequest, ReadPage, SummaryRequest, SummaryResult};
use super::transport::{HttpTransport, Transport, UploadRequest};
use crate::config::Config;

/// Client for one Shotgun site
///
/// Building a client never touches the network; [`Shotgun::connect`] also
/// reads the server's capabilities and checks it speaks the JSON API.
#[derive(Clone)]
pub struct Shotgun {
    config: Config,
    dispatcher: RequestDispatcher,
    client_caps: ClientCapabilities,
    server_caps: Option<ServerCapabilities>,
}

impl Shotgun {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_client_caps(config, transport, ClientCapabilities::detect())
    }

    pub fn with_client_caps(
        mut config: Config,
        transport: Arc<dyn Transport>,
        client_caps: ClientCapabilities,
    ) -> Result<Self> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;

        let local = LocalZone::from_name(config.local_timezone.as_deref())?;
        let normalizer = DateTimeNormalizer::new(config.convert_datetimes_to_utc, local);
        let dispatcher = RequestDispatcher::new(
            config.base_url.clone(),
            config.credentials(),
            config.ensure_ascii,
            normalizer,
            client_caps.clone(),
            transport,
        );

        debug!("Created client for {} on {:?}", config.base_url, client_caps.platform);

        Ok(Self {
            config,
            dispatcher,
            client_caps,
            server_caps: None,
        })
    }

    /// Client over the default reqwest transport
    pub fn with_http_transport(config: Config) -> Result<Self> {
        let client_caps = ClientCapabilities::detect();
        let transport = HttpTransport::new(&config, &client_caps)?;
        Self::with_client_caps(config, Arc::new(transport), client_caps)
    }

    /// Build a client and load the server's capabilities
    pub async fn connect(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let mut client = Self::new(config, transport)?;
        client.load_server_caps().await?;
        Ok(client)
    }

    pub fn with_monitoring(mut self, monitoring: MonitoringConfig) -> Self {
        self.dispatcher = self.dispatcher.with_logger(ApiLogger::new(monitoring));
        self
    }

    /// Call `info` and check the server supports the JSON API
    pub async fn load_server_caps(&mut self) -> Result<&ServerCapabilities> {
        let meta = self.info().await?;
        let caps = ServerCapabilities::new(host_of(&self.config.base_url), &meta)?;
        caps.ensure(Feature::JsonApi)?;

        info!("Connected to {} running {}", caps.host, caps.version);
        let caps = self.server_caps.insert(caps);
        Ok(&*caps)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn server_caps(&self) -> Option<&ServerCapabilities> {
        self.server_caps.as_ref()
    }

    pub fn client_caps(&self) -> &ClientCapabilities {
        &self.client_caps
    }

    pub fn normalizer(&self) -> &DateTimeNormalizer {
        self.dispatcher.normalizer()
    }

    /// Server metadata, as sent
    pub async fn info(&self) -> Result<Value> {
        self.dispatcher.call_rpc_raw(rpc::INFO, None).await
    }

    /// A session token usable in place of the script credentials
    pub async fn session_token(&self) -> Result<String> {
        let result = self.dispatcher.call_rpc_raw(rpc::GET_SESSION_TOKEN, Some(json!({}))).await?;
        result
            .get("session_id")
            .and_then(Value::as_str)
            .or_else(|| result.as_str())
            .map(str::to_string)
            .ok_or_else(|| ShotgunError::response(format!("no session token in {}", result)))
    }

    /// Read every matching record, paging as needed
    pub async fn find(&self, request: &FindRequest) -> Result<Vec<Entity>> {
        let plan = request.plan(self.config.records_per_page, self.normalizer())?;

        let mut entities = Vec::new();
        let mut page = plan.first_page();
        loop {
            let result = self.dispatcher.call_rpc(rpc::READ, Some(plan.page_params(page))).await?;
            let read = ReadPage::from_value(result)?;
            let page_len = read.len();
            entities.extend(read.entities);

            if plan.is_done(entities.len(), page_len) {
                break;
            }
            page += 1;
        }

        if plan.limit() > 0 {
            entities.truncate(plan.limit() as usize);
        }

        debug!("find {} returned {} records", request.entity_type(), entities.len());
        Ok(entities)
    }

    pub async fn find_one(&self, request: FindRequest) -> Result<Option<Entity>> {
        let entities = self.find(&request.limit(1)).await?;
        Ok(entities.into_iter().next())
    }

    /// Create a record; `return_fields` picks the fields sent back
    pub async fn create(&self, entity_type: &str, data: Entity, return_fields: Option<&[&str]>) -> Result<Entity> {
        require_entity_type(entity_type)?;

        let mut params = Map::new();
        params.insert("type".to_string(), json!(entity_type));
        params.insert("fields".to_string(), field_list(&data, self.normalizer())?);
        if let Some(return_fields) = return_fields {
            params.insert("return_fields".to_string(), json!(return_fields));
        }

        let result = self.dispatcher.call_rpc(rpc::CREATE, Some(Value::Object(params))).await?;
        into_entity(result, rpc::CREATE)
    }

    pub async fn update(&self, entity_type: &str, id: i64, data: Entity) -> Result<Entity> {
        require_entity_type(entity_type)?;

        let params = json!({
            "type": entity_type,
            "id": id,
            "fields": field_list(&data, self.normalizer())?,
        });

        let result = self.dispatcher.call_rpc(rpc::UPDATE, Some(params)).await?;
        into_entity(result, rpc::UPDATE)
    }

    /// Retire a record; `false` when nothing was retired
    pub async fn delete(&self, entity_type: &str, id: i64) -> Result<bool> {
        self.call_flag(rpc::DELETE, entity_type, id).await
    }

    /// Bring a retired record back
    pub async fn revive(&self, entity_type: &str, id: i64) -> Result<bool> {
        self.call_flag(rpc::REVIVE, entity_type, id).await
    }

    async fn call_flag(&self, method: &str, entity_type: &str, id: i64) -> Result<bool> {
        require_entity_type(entity_type)?;

        let params = json!({"type": entity_type, "id": id});
        match self.dispatcher.call_rpc(method, Some(params)).await? {
            FieldValue::Bool(flag) => Ok(flag),
            other => Err(ShotgunError::response(format!(
                "{} returned {} instead of a boolean",
                method,
                other.kind()
            ))),
        }
    }

    /// Validate every request, then send them all in one call
    pub async fn batch(&self, requests: &[BatchRequest]) -> Result<Vec<OperationResult>> {
        let operations = Operations::from_requests(requests)?;
        self.execute(&operations).await
    }

    /// Send validated operations in one call
    pub async fn execute(&self, operations: &Operations) -> Result<Vec<OperationResult>> {
        if operations.is_empty() {
            return Ok(Vec::new());
        }

        let params = batch::to_wire(operations.operations(), self.normalizer())?;
        let result = self.dispatcher.call_rpc(rpc::BATCH, Some(params)).await?;
        batch::parse_results(operations.operations(), result)
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResult> {
        let params = request.build(self.normalizer())?;
        let result = self.dispatcher.call_rpc(rpc::SUMMARIZE, Some(params)).await?;
        SummaryResult::from_value(result)
    }

    /// Attach a file to a record and return the attachment id
    pub async fn upload(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: impl AsRef<Path>,
        tag_list: Option<&str>,
    ) -> Result<i64> {
        self.upload_file(
            constants::UPLOAD_FILE_PATH,
            "file",
            entity_type,
            entity_id,
            path.as_ref(),
            tag_fields(tag_list),
        )
        .await
    }

    /// Set a record's thumbnail image and return the attachment id
    pub async fn upload_thumbnail(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: impl AsRef<Path>,
        tag_list: Option<&str>,
    ) -> Result<i64> {
        self.upload_file(
            constants::UPLOAD_THUMBNAIL_PATH,
            "thumb_image",
            entity_type,
            entity_id,
            path.as_ref(),
            tag_fields(tag_list),
        )
        .await
    }

    async fn upload_file(
        &self,
        endpoint: &str,
        file_field: &str,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        extra_fields: Vec<(String, String)>,
    ) -> Result<i64> {
        require_entity_type(entity_type)?;

        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ShotgunError::validation(format!("{} is not a file", path.display())))?;

        let mut fields = vec![
            ("entity_type".to_string(), entity_type.to_string()),
            ("entity_id".to_string(), entity_id.to_string()),
        ];
        if let Value::Object(auth) = self.config.credentials().to_wire() {
            fields.extend(
                auth.into_iter()
                    .filter_map(|(key, value)| value.as_str().map(|v| (key, v.to_string()))),
            );
        }
        fields.extend(extra_fields);

        debug!("Uploading {} ({} bytes) to {} {}", file_name, content.len(), entity_type, entity_id);

        let response = self
            .dispatcher
            .transport()
            .upload(UploadRequest {
                url: format!("{}{}", self.config.base_url, endpoint),
                fields,
                file_field: file_field.to_string(),
                file_name,
                content,
            })
            .await?;

        if response.status != 200 {
            return Err(ShotgunError::Protocol {
                status: response.status,
                reason: response.reason,
            });
        }
        parse_upload_response(&response.text(), path)
    }

    /// Raw bytes of an attachment; `None` when the server does not have it
    pub async fn download_attachment(&self, attachment_id: i64) -> Result<Option<Vec<u8>>> {
        let url = constants::attachment_endpoint(&self.config.base_url, attachment_id);
        let response = self.dispatcher.transport().download(&url).await?;

        match response.status {
            200 => Ok(Some(response.body)),
            404 => Ok(None),
            status => Err(ShotgunError::Protocol {
                status,
                reason: response.reason,
            }),
        }
    }

    /// Always fails; entity schemas are no longer served through this call
    pub fn schema(&self, _entity_type: &str) -> Result<Value> {
        Err(removed("schema"))
    }

    /// Always fails; entity types are no longer served through this call
    pub fn entity_types(&self) -> Result<Value> {
        Err(removed("entity_types"))
    }
}

/// Error for an operation that no longer exists
pub fn removed(name: &str) -> ShotgunError {
    match constants::removed_operation(name) {
        Some(removed) => ShotgunError::Removed(removed),
        None => ShotgunError::validation(format!("'{}' is not a removed operation", name)),
    }
}

fn tag_fields(tag_list: Option<&str>) -> Vec<(String, String)> {
    tag_list
        .map(|tags| vec![("tag_list".to_string(), tags.to_string())])
        .unwrap_or_default()
}

fn require_entity_type(entity_type: &str) -> Result<()> {
    if entity_type.is_empty() {
        return Err(ShotgunError::validation("entity type must not be empty"));
    }
    Ok(())
}

fn into_entity(result: FieldValue, method: &str) -> Result<Entity> {
    let record = match result {
        FieldValue::List(items) => items.into_iter().next().unwrap_or_default(),
        other => other,
    };
    Entity::try_from(record)
        .map_err(|other| ShotgunError::response(format!("{} returned {} instead of a record", method, other.kind())))
}

/// Uploads answer `1:<id>` on success
fn parse_upload_response(body: &str, path: &Path) -> Result<i64> {
    if !body.starts_with('1') {
        return Err(ShotgunError::response(format!(
            "could not upload {}: {}",
            path.display(),
            body.trim()
        )));
    }

    body.split(':')
        .nth(1)
        .and_then(|rest| rest.lines().next())
        .and_then(|id| id.trim().parse().ok())
        .ok_or_else(|| ShotgunError::response(format!("upload answered without an attachment id: {}", body.trim())))
}

fn host_of(base_url: &str) -> &str {
    let rest = base_url.split_once("://").map(|(_, rest)| rest).unwrap_or(base_url);
    rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_operations() {
        assert!(matches!(removed("schema"), ShotgunError::Removed("schema")));
        assert!(matches!(removed("entity_types"), ShotgunError::Removed("entity_types")));
        assert!(removed("find").is_validation());
    }

    #[test]
    fn test_parse_upload_response() {
        let path = Path::new("/tmp/plate.jpg");
        assert_eq!(parse_upload_response("1:123\n", path).unwrap(), 123);
        assert!(parse_upload_response("0:failed", path).is_err());
        assert!(parse_upload_response("1", path).is_err());
    }

    #[test]
    fn test_into_entity() {
        let record = FieldValue::from(serde_json::json!({"type": "Shot", "id": 3}));
        assert_eq!(into_entity(record.clone(), "create").unwrap().id(), Some(3));
        assert_eq!(into_entity(FieldValue::List(vec![record]), "create").unwrap().id(), Some(3));
        assert!(into_entity(FieldValue::Bool(true), "update").is_err());
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://example.shotgunstudio.com"), "example.shotgunstudio.com");
        assert_eq!(host_of("http://server_path/sub"), "server_path");
    }
}
