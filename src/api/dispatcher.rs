//! RPC dispatch: envelope in, normalized result out

use serde::Serialize;
use serde_json::{Value, json};
use std::io;
use std::sync::Arc;

use super::capabilities::ClientCapabilities;
use super::constants::{self, headers};
use super::datetime::DateTimeNormalizer;
use super::entity::FieldValue;
use super::error::{Result, ShotgunError};
use super::logging::ApiLogger;
use super::models::Credentials;
use super::transport::{HttpRequest, HttpResponse, Transport};

/// Writes JSON with every non-ASCII character escaped as `\uXXXX`
struct AsciiFormatter;

impl serde_json::ser::Formatter for AsciiFormatter {
    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Serialize a request body, escaping non-ASCII text when asked to
pub fn encode_body(value: &Value, ensure_ascii: bool) -> Result<Vec<u8>> {
    let encode_error = |e: serde_json::Error| ShotgunError::validation(format!("cannot encode request: {}", e));

    if !ensure_ascii {
        return serde_json::to_vec(value).map_err(encode_error);
    }

    let mut body = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, AsciiFormatter);
    value.serialize(&mut serializer).map_err(encode_error)?;
    Ok(body)
}

/// Turn a raw HTTP response into the RPC result
pub fn decode_response(response: &HttpResponse) -> Result<Value> {
    if response.status != 200 {
        return Err(ShotgunError::Protocol {
            status: response.status,
            reason: response.reason.clone(),
        });
    }

    let body: Value = serde_json::from_slice(&response.body)
        .map_err(|e| ShotgunError::response(format!("response is not JSON ({}): {}", e, response.text())))?;

    match body {
        Value::Object(mut map) => {
            if map.get("exception").is_some_and(is_truthy) {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown Error")
                    .to_string();
                return Err(ShotgunError::Fault(message));
            }
            Ok(map.remove("results").unwrap_or(Value::Object(map)))
        }
        other => Ok(other),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Sends RPC calls through a [`Transport`] and normalizes what comes back
#[derive(Clone)]
pub struct RequestDispatcher {
    base_url: String,
    credentials: Credentials,
    ensure_ascii: bool,
    normalizer: DateTimeNormalizer,
    client_caps: ClientCapabilities,
    logger: ApiLogger,
    transport: Arc<dyn Transport>,
}

impl RequestDispatcher {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        ensure_ascii: bool,
        normalizer: DateTimeNormalizer,
        client_caps: ClientCapabilities,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            ensure_ascii,
            normalizer,
            client_caps,
            logger: ApiLogger::default(),
            transport,
        }
    }

    pub fn with_logger(mut self, logger: ApiLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn normalizer(&self) -> &DateTimeNormalizer {
        &self.normalizer
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// `{"method_name", "params": [auth, params?]}`
    pub fn envelope(&self, method: &str, params: Option<Value>) -> Value {
        envelope(method, self.credentials.to_wire(), params)
    }

    /// Call `method` and return the unwrapped result as received
    pub async fn call_rpc_raw(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let context = self.logger.start_rpc(method);
        let url = constants::api_endpoint(&self.base_url);

        self.logger.log_request(
            &context,
            &url,
            &envelope(method, self.credentials.to_redacted_wire(), params.clone()),
        );

        let body = encode_body(&self.envelope(method, params), self.ensure_ascii)?;
        let request = HttpRequest::post(url, body).header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_JSON);

        let outcome = match self.transport.send(request).await {
            Ok(response) => decode_response(&response).map(|result| (response.status, result)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((status, result)) => {
                self.logger.complete_rpc(&context, status);
                Ok(result)
            }
            Err(e) => {
                self.logger.fail_rpc(&context, &e);
                Err(e)
            }
        }
    }

    /// Call `method` and normalize datetimes and local paths in the result
    pub async fn call_rpc(&self, method: &str, params: Option<Value>) -> Result<FieldValue> {
        let result = self.call_rpc_raw(method, params).await?;
        Ok(self.normalize(result))
    }

    pub fn normalize(&self, result: Value) -> FieldValue {
        let mut value = self.normalizer.from_wire_value(result);
        self.client_caps.localize_paths(&mut value);
        value
    }
}

fn envelope(method: &str, auth: Value, params: Option<Value>) -> Value {
    let mut call_params = vec![auth];
    call_params.extend(params);
    json!({
        "method_name": method,
        "params": call_params,
    })
}
