//! Splits a monolithic cassette into per-port cassette files laid out like
//! a recording session (`<output_dir>/<port>.cassette.yaml`), so the result
//! can be replayed with `CassetteConfig::from_session_dir`.
//!
//! Usage: `cassette_split <input.yaml> <output_dir>`

use std::path::Path;
use std::{env, fs, process};

use modcompare::cassette::config::CassetteConfig;
use modcompare::cassette::format::Cassette;

fn split_cassette(input: &Path, output_dir: &Path) -> Result<Vec<String>, String> {
    let cassette = CassetteConfig::read_cassette(input)?;
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create {}: {e}", output_dir.display()))?;

    let mut written = Vec::new();
    for (port, interactions) in cassette.split_by_port() {
        let per_port = Cassette {
            name: format!("{}-{port}", cassette.name),
            recorded_at: cassette.recorded_at,
            commit: cassette.commit.clone(),
            interactions,
        };
        let path = output_dir.join(format!("{port}.cassette.yaml"));
        let yaml = serde_yaml::to_string(&per_port)
            .map_err(|e| format!("Failed to serialize cassette for port {port}: {e}"))?;
        fs::write(&path, yaml).map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        println!("Wrote {}", path.display());
        written.push(port);
    }
    Ok(written)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: cassette_split <input.yaml> <output_dir>");
        process::exit(1);
    }

    if let Err(e) = split_cassette(Path::new(&args[1]), Path::new(&args[2])) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modcompare::cassette::format::Interaction;
    use serde_json::json;

    fn call(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    #[test]
    fn split_writes_session_layout() {
        let dir = std::env::temp_dir().join("modcompare_cassette_split_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let input = dir.join("monolithic.yaml");
        let cassette = Cassette {
            name: "compare-run".into(),
            recorded_at: chrono::Utc::now(),
            commit: "abc123".into(),
            interactions: vec![
                call(0, "host", "list_tree", json!({"ok": []})),
                call(1, "fs", "exists", json!(false)),
                call(2, "host", "list_tree", json!({"ok": []})),
            ],
        };
        fs::write(&input, serde_yaml::to_string(&cassette).unwrap()).unwrap();

        let output = dir.join("session");
        let ports = split_cassette(&input, &output).unwrap();
        assert_eq!(ports, vec!["fs", "host"]);

        let config = CassetteConfig::from_session_dir(&output);
        assert!(config.clock.is_none(), "ports without interactions get no file");
        let host = CassetteConfig::read_cassette(config.host.as_deref().unwrap()).unwrap();
        assert_eq!(host.name, "compare-run-host");
        let seqs: Vec<u64> = host.interactions.iter().map(|i| i.seq).collect();
        assert_eq!(seqs, vec![0, 1]);

        let _ = fs::remove_dir_all(&dir);
    }
}
