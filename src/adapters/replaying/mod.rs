//! Replaying adapters that serve recorded interactions from cassettes.

pub mod clock;
pub mod filesystem;
pub mod host;

pub use clock::ReplayingClock;
pub use filesystem::ReplayingFileSystem;
pub use host::ReplayingHost;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;

/// Take the output of the next `port`/`method` interaction.
///
/// Panics if the cassette has no further interaction for that method.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut replayer = replayer.lock().expect("replayer lock poisoned");
    replayer.next_interaction(port, method).output.clone()
}

/// Decode a recorded `Result`.
///
/// Expects `{"ok": <value>}` or `{"err": "<message>"}`; a bare value is
/// treated as `ok`.
pub(crate) fn extract_result<T: DeserializeOwned>(
    output: &serde_json::Value,
    context: &str,
) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(err) = output.get("err") {
        let msg = err.as_str().unwrap_or("unknown error").to_string();
        return Err(msg.into());
    }
    let value = output.get("ok").unwrap_or(output);
    serde_json::from_value(value.clone())
        .map_err(|e| format!("{context}: failed to deserialize: {e}").into())
}
