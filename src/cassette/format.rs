//! On-disk cassette layout.
//!
//! A cassette is a YAML document holding the ordered calls one run made
//! through the ports, so the same run can be replayed offline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One call made through a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the recording, assigned by the recorder.
    pub seq: u64,
    /// Port name: `fs`, `clock` or `host`.
    pub port: String,
    /// Port method invoked.
    pub method: String,
    /// Call arguments.
    pub input: serde_json::Value,
    /// Returned value; fallible methods use `{"ok": ..}` / `{"err": ..}`.
    pub output: serde_json::Value,
}

/// A recorded run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Session name, `<timestamp>-<port>` for per-port files.
    pub name: String,
    /// When recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Commit of the tool that made the recording.
    pub commit: String,
    /// Calls in recording order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Interactions grouped by port, each group renumbered from zero.
    #[must_use]
    pub fn split_by_port(&self) -> BTreeMap<String, Vec<Interaction>> {
        let mut by_port: BTreeMap<String, Vec<Interaction>> = BTreeMap::new();
        for interaction in &self.interactions {
            let group = by_port.entry(interaction.port.clone()).or_default();
            group.push(Interaction { seq: group.len() as u64, ..interaction.clone() });
        }
        by_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(seq: u64, port: &str, method: &str) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output: json!(null) }
    }

    #[test]
    fn parses_hand_written_yaml() {
        let yaml = r#"
name: compare-prebid
recorded_at: 2024-05-01T12:00:00Z
commit: abc123
interactions:
  - seq: 0
    port: host
    method: list_tags
    input: { repo: prebid/Prebid.js }
    output: { ok: ["9.0.0", "8.52.0"] }
"#;
        let cassette: Cassette = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cassette.interactions.len(), 1);
        assert_eq!(cassette.interactions[0].output, json!({"ok": ["9.0.0", "8.52.0"]}));
    }

    #[test]
    fn split_by_port_renumbers_each_group() {
        let cassette = Cassette {
            name: "session".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions: vec![
                call(0, "host", "list_tree"),
                call(1, "fs", "exists"),
                call(2, "host", "list_tree"),
                call(3, "clock", "now"),
            ],
        };
        let split = cassette.split_by_port();
        assert_eq!(split.keys().collect::<Vec<_>>(), vec!["clock", "fs", "host"]);
        let host_seqs: Vec<u64> = split["host"].iter().map(|i| i.seq).collect();
        assert_eq!(host_seqs, vec![0, 1]);
        assert_eq!(split["fs"][0].seq, 0);
    }
}
