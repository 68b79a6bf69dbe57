//! Rename inference between removed and added modules of one category.
//!
//! Five stages run in order. Each stage is a pure function of two names;
//! a stage only sees the modules earlier stages left unclaimed. Within a
//! stage, candidate pairs are claimed by descending score, and ties go to
//! the pair that comes first in input order (removed, then added).

use log::debug;
use serde::Serialize;

use crate::inventory::ModuleRecord;

/// Renames asserted from repository history that no name heuristic can find.
pub const KNOWN_RENAMES: [(&str, &str); 2] = [("imds", "advertising"), ("gothamads", "intenze")];

/// Minimum edit-distance similarity for the last stage.
pub const SIMILARITY_THRESHOLD: f64 = 0.75;

/// Shortest name the abbreviation stage will consider.
const MIN_ABBREVIATION_LEN: usize = 3;

/// Shorter name must be at least this fraction of the longer one.
const MIN_ABBREVIATION_RATIO: f64 = 0.2;

/// Which stage confirmed a rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Listed in [`KNOWN_RENAMES`].
    GitHistory,
    /// Same letters once case and separators are ignored.
    CaseChange,
    /// Shorter name is an in-order subsequence of the longer.
    Abbreviation,
    /// One name contains the other.
    Substring,
    /// Normalised edit distance above [`SIMILARITY_THRESHOLD`].
    Similarity,
}

impl DetectionMethod {
    /// Tag used in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHistory => "git_history",
            Self::CaseChange => "case_change",
            Self::Abbreviation => "abbreviation",
            Self::Substring => "substring",
            Self::Similarity => "similarity",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A removed module paired with the added module that probably replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRename {
    /// Module as it was in the source version.
    pub old_module: ModuleRecord,
    /// Module as it is in the target version.
    pub new_module: ModuleRecord,
    /// Confidence in `[0, 1]`.
    pub similarity_score: f64,
    /// Stage that confirmed the pair.
    pub detection_method: DetectionMethod,
}

/// Output of [`detect_renames`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenameDetection {
    /// Confirmed renames in claim order.
    pub renames: Vec<ModuleRename>,
    /// Removed modules no stage matched, in input order.
    pub remaining_removed: Vec<ModuleRecord>,
    /// Added modules no stage matched, in input order.
    pub remaining_added: Vec<ModuleRecord>,
}

type Stage = fn(&str, &str) -> Option<(f64, DetectionMethod)>;

const STAGES: [Stage; 5] = [git_history, case_change, abbreviation, substring, similarity];

/// Match pairs from the fixed history table.
#[must_use]
pub fn git_history(old: &str, new: &str) -> Option<(f64, DetectionMethod)> {
    KNOWN_RENAMES
        .iter()
        .any(|(from, to)| old.eq_ignore_ascii_case(from) && new.eq_ignore_ascii_case(to))
        .then_some((1.0, DetectionMethod::GitHistory))
}

fn normalize(name: &str) -> String {
    name.chars().filter(|c| *c != '_' && *c != '-').flat_map(char::to_lowercase).collect()
}

/// `camelCase` ↔ `snake_case` style renames.
#[must_use]
pub fn case_change(old: &str, new: &str) -> Option<(f64, DetectionMethod)> {
    (old != new && normalize(old) == normalize(new)).then_some((0.95, DetectionMethod::CaseChange))
}

fn is_subsequence(short: &str, long: &str) -> bool {
    let mut rest = long.chars();
    short.chars().all(|c| rest.any(|l| l == c))
}

/// `incrx` → `incrementx`: same first letter, in-order subsequence, but not
/// a plain substring (that is the next stage's job).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn abbreviation(old: &str, new: &str) -> Option<(f64, DetectionMethod)> {
    let (old, new) = (old.to_lowercase(), new.to_lowercase());
    let (short, long) = if old.chars().count() < new.chars().count() {
        (old, new)
    } else if new.chars().count() < old.chars().count() {
        (new, old)
    } else {
        return None;
    };
    let (short_len, long_len) = (short.chars().count(), long.chars().count());
    let matches = short_len >= MIN_ABBREVIATION_LEN
        && short.chars().next() == long.chars().next()
        && !long.contains(short.as_str())
        && short_len as f64 / long_len as f64 >= MIN_ABBREVIATION_RATIO
        && is_subsequence(&short, &long);
    matches.then_some((0.9, DetectionMethod::Abbreviation))
}

/// One name literally contains the other, ignoring case.
#[must_use]
pub fn substring(old: &str, new: &str) -> Option<(f64, DetectionMethod)> {
    let (old, new) = (old.to_lowercase(), new.to_lowercase());
    (old != new && (new.contains(&old) || old.contains(&new)))
        .then_some((0.85, DetectionMethod::Substring))
}

/// Edit-distance similarity at or above [`SIMILARITY_THRESHOLD`].
#[must_use]
pub fn similarity(old: &str, new: &str) -> Option<(f64, DetectionMethod)> {
    let score = normalized_levenshtein_similarity(&old.to_lowercase(), &new.to_lowercase());
    (score >= SIMILARITY_THRESHOLD && score < 1.0).then_some((score, DetectionMethod::Similarity))
}

/// Levenshtein distance over chars.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// `1 - distance / max_len`, in `[0, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalized_levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

/// Pair removed modules with added ones. Inputs are left untouched; pairs
/// are only formed within one category.
#[must_use]
pub fn detect_renames(removed: &[ModuleRecord], added: &[ModuleRecord]) -> RenameDetection {
    let mut removed_claimed = vec![false; removed.len()];
    let mut added_claimed = vec![false; added.len()];
    let mut renames = Vec::new();

    for stage in STAGES {
        let mut candidates: Vec<(usize, usize, f64, DetectionMethod)> = Vec::new();
        for (i, old) in removed.iter().enumerate().filter(|(i, _)| !removed_claimed[*i]) {
            for (j, new) in added.iter().enumerate().filter(|(j, _)| !added_claimed[*j]) {
                if old.category != new.category {
                    continue;
                }
                if let Some((score, method)) = stage(&old.name, &new.name) {
                    candidates.push((i, j, score, method));
                }
            }
        }
        // Stable: equal scores keep input order.
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        for (i, j, score, method) in candidates {
            if removed_claimed[i] || added_claimed[j] {
                continue;
            }
            removed_claimed[i] = true;
            added_claimed[j] = true;
            debug!("Rename {} -> {} ({method}, {score:.2})", removed[i].name, added[j].name);
            renames.push(ModuleRename {
                old_module: removed[i].clone(),
                new_module: added[j].clone(),
                similarity_score: score,
                detection_method: method,
            });
        }
    }

    let unclaimed = |records: &[ModuleRecord], claimed: &[bool]| -> Vec<ModuleRecord> {
        records.iter().zip(claimed).filter(|(_, c)| !**c).map(|(r, _)| r.clone()).collect()
    };

    RenameDetection {
        remaining_removed: unclaimed(removed, &removed_claimed),
        remaining_added: unclaimed(added, &added_claimed),
        renames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(name: &str) -> ModuleRecord {
        ModuleRecord::new(name, "Bid Adapters", format!("modules/{name}BidAdapter.js"), "prebid-js")
    }

    fn bids(names: &[&str]) -> Vec<ModuleRecord> {
        names.iter().map(|n| bid(n)).collect()
    }

    fn find<'a>(detection: &'a RenameDetection, old: &str) -> &'a ModuleRename {
        detection.renames.iter().find(|r| r.old_module.name == old).unwrap()
    }

    #[test]
    fn known_history_renames_score_one() {
        let detection = detect_renames(&bids(&["imds", "gothamads"]), &bids(&["advertising", "intenze"]));
        assert_eq!(detection.renames.len(), 2);
        assert!(detection.remaining_removed.is_empty());
        assert!(detection.remaining_added.is_empty());
        for old in ["imds", "gothamads"] {
            let rename = find(&detection, old);
            assert_eq!(rename.detection_method, DetectionMethod::GitHistory);
            assert!((rename.similarity_score - 1.0).abs() < f64::EPSILON);
        }
        assert_eq!(find(&detection, "imds").new_module.name, "advertising");
        assert_eq!(find(&detection, "gothamads").new_module.name, "intenze");
    }

    #[test]
    fn case_changes_score_point_nine_five() {
        let detection = detect_renames(
            &bids(&["cadentApertureMX", "epomDsp"]),
            &bids(&["cadent_aperture_mx", "epom_dsp"]),
        );
        assert_eq!(detection.renames.len(), 2);
        for rename in &detection.renames {
            assert_eq!(rename.detection_method, DetectionMethod::CaseChange);
            assert!((rename.similarity_score - 0.95).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn abbreviations_score_point_nine() {
        let detection =
            detect_renames(&bids(&["incrx", "rtbx"]), &bids(&["incrementx", "realtimebidexchange"]));
        assert_eq!(detection.renames.len(), 2);
        assert_eq!(find(&detection, "incrx").new_module.name, "incrementx");
        assert_eq!(find(&detection, "rtbx").new_module.name, "realtimebidexchange");
        for rename in &detection.renames {
            assert_eq!(rename.detection_method, DetectionMethod::Abbreviation);
            assert!((rename.similarity_score - 0.9).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn substrings_score_point_eight_five() {
        let detection = detect_renames(&bids(&["amazon", "google"]), &bids(&["amazonuam", "googleads"]));
        assert_eq!(detection.renames.len(), 2);
        for rename in &detection.renames {
            assert_eq!(rename.detection_method, DetectionMethod::Substring);
            assert!((rename.similarity_score - 0.85).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn near_identical_names_fall_to_similarity() {
        let detection = detect_renames(&bids(&["bidder1"]), &bids(&["bidder2"]));
        assert_eq!(detection.renames.len(), 1);
        let rename = &detection.renames[0];
        assert_eq!(rename.detection_method, DetectionMethod::Similarity);
        assert!(rename.similarity_score >= 0.7 && rename.similarity_score <= 0.9);
    }

    #[test]
    fn unrelated_names_stay_unmatched() {
        let detection = detect_renames(&bids(&["appnexus"]), &bids(&["rubicon"]));
        assert!(detection.renames.is_empty());
        assert_eq!(detection.remaining_removed, bids(&["appnexus"]));
        assert_eq!(detection.remaining_added, bids(&["rubicon"]));
    }

    #[test]
    fn different_categories_never_pair() {
        let removed = vec![ModuleRecord::new("appnexus", "Bid Adapters", "", "js")];
        let added = vec![ModuleRecord::new("appnexus", "Analytics Adapters", "", "js")];
        let detection = detect_renames(&removed, &added);
        assert!(detection.renames.is_empty());
        assert_eq!(detection.remaining_removed.len(), 1);
        assert_eq!(detection.remaining_added.len(), 1);
    }

    #[test]
    fn one_removed_module_claims_only_one_candidate() {
        let detection = detect_renames(&bids(&["ad"]), &bids(&["adtech", "adserver", "adform"]));
        assert_eq!(detection.renames.len(), 1);
        assert!(detection.remaining_removed.is_empty());
        assert_eq!(detection.remaining_added.len(), 2);
        // Equal scores: first added module in input order wins.
        assert_eq!(detection.renames[0].new_module.name, "adtech");
    }

    #[test]
    fn stages_combine_and_leave_residue() {
        let detection = detect_renames(
            &bids(&["imds", "cadentApertureMX", "incrx", "unmatched"]),
            &bids(&["advertising", "cadent_aperture_mx", "incrementx", "newmodule"]),
        );
        assert_eq!(detection.renames.len(), 3);
        assert_eq!(find(&detection, "imds").detection_method, DetectionMethod::GitHistory);
        assert_eq!(find(&detection, "cadentApertureMX").detection_method, DetectionMethod::CaseChange);
        assert_eq!(find(&detection, "incrx").detection_method, DetectionMethod::Abbreviation);
        assert_eq!(detection.remaining_removed, bids(&["unmatched"]));
        assert_eq!(detection.remaining_added, bids(&["newmodule"]));
    }

    #[test]
    fn output_partitions_inputs() {
        let removed = bids(&["amazon", "bidder1", "zzz", "cadentApertureMX"]);
        let added = bids(&["amazonuam", "bidder2", "cadent_aperture_mx", "qqq", "extra"]);
        let detection = detect_renames(&removed, &added);

        let n = detection.renames.len();
        assert_eq!(n + detection.remaining_removed.len(), removed.len());
        assert_eq!(n + detection.remaining_added.len(), added.len());
        for rename in &detection.renames {
            assert!(removed.contains(&rename.old_module));
            assert!(added.contains(&rename.new_module));
        }
        let mut olds: Vec<&str> = detection.renames.iter().map(|r| r.old_module.name.as_str()).collect();
        olds.sort_unstable();
        olds.dedup();
        assert_eq!(olds.len(), n);
    }

    #[test]
    fn higher_scoring_pair_wins_within_a_stage() {
        // bidder2 scores ~0.86, bidderx9 exactly 0.75; score beats input order.
        let detection = detect_renames(&bids(&["bidder1"]), &bids(&["bidderx9", "bidder2"]));
        assert_eq!(detection.renames.len(), 1);
        assert_eq!(detection.renames[0].new_module.name, "bidder2");
        assert_eq!(detection.remaining_added, bids(&["bidderx9"]));
    }

    #[test]
    fn levenshtein_matches_known_distances() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
        assert!((normalized_levenshtein_similarity("", "") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stage_functions_reject_identical_names() {
        assert!(case_change("foo", "foo").is_none());
        assert!(substring("foo", "foo").is_none());
        assert!(similarity("foo", "foo").is_none());
        assert!(abbreviation("foo", "foo").is_none());
    }
}
