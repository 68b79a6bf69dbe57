//! Serves recorded interactions back in order.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Replays a cassette. Each `(port, method)` pair has its own queue, so
/// calls to different methods may interleave differently than they were
/// recorded.
pub struct CassetteReplayer {
    queues: HashMap<(String, String), VecDeque<Interaction>>,
    current: Option<Interaction>,
}

impl CassetteReplayer {
    /// Index the interactions of `cassette` by port and method.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        Self { queues, current: None }
    }

    /// Interactions not yet served, across all methods.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Return the next interaction recorded for `port`/`method`.
    ///
    /// # Panics
    ///
    /// Panics if the cassette holds no further interaction for that pair.
    /// The message lists the pairs that were recorded.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> &Interaction {
        let key = (port.to_string(), method.to_string());
        if !self.queues.contains_key(&key) {
            let mut available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            available.sort();
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            );
        }
        let next = self.queues.get_mut(&key).and_then(VecDeque::pop_front).unwrap_or_else(|| {
            panic!(
                "Cassette exhausted: all interactions for port={port:?} method={method:?} \
                 have been consumed."
            )
        });
        self.current.insert(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn call(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    fn replayer(interactions: Vec<Interaction>) -> CassetteReplayer {
        CassetteReplayer::new(&Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions,
        })
    }

    #[test]
    fn serves_each_method_in_recorded_order() {
        let mut replayer = replayer(vec![
            call(0, "host", "list_tree", json!({"ok": ["a"]})),
            call(1, "fs", "exists", json!(true)),
            call(2, "host", "list_tree", json!({"ok": ["b"]})),
        ]);
        assert_eq!(replayer.remaining(), 3);

        assert_eq!(replayer.next_interaction("fs", "exists").seq, 1);
        assert_eq!(replayer.next_interaction("host", "list_tree").output, json!({"ok": ["a"]}));
        assert_eq!(replayer.next_interaction("host", "list_tree").seq, 2);
        assert_eq!(replayer.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "have been consumed")]
    fn exhausted_method_panics() {
        let mut replayer = replayer(vec![call(0, "host", "list_tags", json!({"ok": []}))]);
        let _ = replayer.next_interaction("host", "list_tags");
        let _ = replayer.next_interaction("host", "list_tags");
    }

    #[test]
    #[should_panic(expected = "Available port::method pairs: [clock::now]")]
    fn unknown_method_lists_what_was_recorded() {
        let mut replayer = replayer(vec![call(0, "clock", "now", json!("2024-01-01T00:00:00Z"))]);
        let _ = replayer.next_interaction("host", "first_commit");
    }
}
