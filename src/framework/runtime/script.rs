use crate::framework::core::{DispatchError, PendingRequest};

/// A decoded `callback(request, sequence)` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCall {
    pub request: PendingRequest,
    pub sequence: i64,
}

/// Render the script that hands `request` to the UI runtime
pub fn render_script(
    callback: &str,
    request: &PendingRequest,
    sequence: i64,
) -> Result<String, DispatchError> {
    let encoded = request
        .to_json()
        .map_err(|e| DispatchError::Serialization(e.to_string()))?;
    Ok(format!("{}({}, {})", callback, encoded, sequence))
}

/// Inverse of [`render_script`], for consumers living on the Rust side
pub fn parse_script(callback: &str, script: &str) -> Option<ScriptCall> {
    let args = script
        .trim()
        .strip_prefix(callback)?
        .strip_prefix('(')?
        .strip_suffix(')')?;
    // The sequence is always the last argument and never contains ", ".
    let (encoded, sequence) = args.rsplit_once(", ")?;
    Some(ScriptCall {
        request: PendingRequest::from_json(encoded).ok()?,
        sequence: sequence.trim().parse().ok()?,
    })
}
