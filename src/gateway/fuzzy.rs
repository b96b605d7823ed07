//! Filename match scoring.

use regex::Regex;
use std::sync::LazyLock;

/// Edit-distance similarity below this counts as no match.
const MIN_SIMILARITY: f64 = 0.5;

/// Every query word appears inside some word of the target.
const ALL_WORDS_SCORE: f64 = 0.85;

/// The query spells the initials of the target's words.
const ACRONYM_SCORE: f64 = 0.8;

/// Weight applied to the averaged per-word similarity.
const WORD_WEIGHT: f64 = 0.9;

/// `HTTPSConnection` -> `HTTPS Connection`
static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("acronym regex is valid"));

/// `getFile` -> `get File`
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("camel regex is valid"));

static WORD_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_\-.]+").expect("separator regex is valid"));

/// Scores how well `query` matches `target`, case-insensitively, in `0.0..=1.0`.
///
/// - identical: `1.0`
/// - `query` inside `target`: `0.9` minus up to `0.1` for the extra length
/// - `target` inside `query`: `0.8` minus up to `0.1` for the extra length
/// - otherwise, when `fuzzy` is set: normalized Levenshtein similarity,
///   or `0.0` if that is below `0.5`
///
/// Empty inputs score `0.0`.
#[must_use]
pub fn match_score(query: &str, target: &str, fuzzy: bool) -> f64 {
    if query.is_empty() || target.is_empty() {
        return 0.0;
    }

    let query = query.to_lowercase();
    let target = target.to_lowercase();

    if query == target {
        return 1.0;
    }

    let query_len = query.chars().count() as f64;
    let target_len = target.chars().count() as f64;

    if target.contains(&query) {
        return 0.9 - 0.1 * (target_len - query_len) / target_len;
    }
    if query.contains(&target) {
        return 0.8 - 0.1 * (query_len - target_len) / query_len;
    }
    if !fuzzy {
        return 0.0;
    }

    let similarity = strsim::normalized_levenshtein(&query, &target);
    if similarity < MIN_SIMILARITY {
        0.0
    } else {
        similarity
    }
}

/// Splits an identifier-like name into lowercase words.
///
/// Breaks on camelCase and PascalCase boundaries, runs of capitals followed
/// by a capitalized word, whitespace, `_`, `-` and `.`.
///
/// ```
/// use docroot::gateway::split_words;
///
/// assert_eq!(split_words("HTTPSConnection_pool.rs"), ["https", "connection", "pool", "rs"]);
/// ```
#[must_use]
pub fn split_words(text: &str) -> Vec<String> {
    let spaced = ACRONYM_BOUNDARY.replace_all(text, "$1 $2");
    let spaced = CAMEL_BOUNDARY.replace_all(&spaced, "$1 $2");
    WORD_SEPARATORS
        .split(&spaced)
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Scores a file name against a search query.
///
/// On top of [`match_score`] this understands word structure:
///
/// - a substring match scores `0.9..=0.95`, higher the earlier it starts
/// - every query word found inside a target word scores `0.85`
/// - a query equal to the target's word initials (`gfn` for
///   `getFileName`) scores `0.8`
/// - with `fuzzy`, the better of whole-string similarity and the averaged
///   best per-word similarity (weighted by `0.9`)
#[must_use]
pub fn filename_score(query: &str, target: &str, fuzzy: bool) -> f64 {
    if query.is_empty() || target.is_empty() {
        return 0.0;
    }

    let query_lower = query.to_lowercase();
    let target_lower = target.to_lowercase();

    if query_lower == target_lower {
        return 1.0;
    }

    if let Some(at) = target_lower.find(&query_lower) {
        let position = target_lower[..at].chars().count() as f64;
        let length = target_lower.chars().count() as f64;
        return 0.9 + 0.05 * (1.0 - position / length);
    }

    let target_words = split_words(target);
    let query_words = split_words(query);

    if !query_words.is_empty()
        && query_words
            .iter()
            .all(|qw| target_words.iter().any(|tw| tw.contains(qw.as_str())))
    {
        return ALL_WORDS_SCORE;
    }

    if query_lower.chars().count() >= 2 {
        let initials: String = target_words.iter().filter_map(|w| w.chars().next()).collect();
        if query_lower == initials {
            return ACRONYM_SCORE;
        }
    }

    if !fuzzy {
        return 0.0;
    }

    let whole = match_score(query, target, true);
    if query_words.len() <= 1 && target_words.len() <= 1 {
        return whole;
    }

    let per_word: f64 = query_words
        .iter()
        .map(|qw| {
            target_words
                .iter()
                .map(|tw| match_score(qw, tw, true))
                .fold(0.0, f64::max)
        })
        .sum();
    let averaged = if query_words.is_empty() {
        0.0
    } else {
        per_word / query_words.len() as f64
    };

    whole.max(averaged * WORD_WEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_ignores_case() {
        assert_eq!(match_score("hello", "hello", true), 1.0);
        assert_eq!(match_score("Hello", "hELLO", false), 1.0);
    }

    #[test]
    fn substring_scores_high() {
        let score = match_score("doc", "document", false);
        assert!((0.8..1.0).contains(&score), "{score}");

        let score = match_score("test", "unittest.py", false);
        assert!((0.8..1.0).contains(&score), "{score}");
    }

    #[test]
    fn reverse_substring_scores_below_substring() {
        let forward = match_score("api", "api.md", false);
        let reverse = match_score("api.md.bak", "api.md", false);
        assert!(reverse < forward);
        assert!((0.7..0.8).contains(&reverse), "{reverse}");
    }

    #[test]
    fn unrelated_strings_score_zero() {
        assert_eq!(match_score("xyz", "abc", true), 0.0);
        assert_eq!(match_score("hello", "world", true), 0.0);
    }

    #[test]
    fn near_misses_need_fuzzy() {
        assert!(match_score("gude", "guide", true) > 0.7);
        assert_eq!(match_score("gude", "guide", false), 0.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(match_score("", "readme.md", true), 0.0);
        assert_eq!(match_score("readme", "", true), 0.0);
        assert_eq!(filename_score("", "readme.md", true), 0.0);
    }

    #[test]
    fn words_split_on_case_and_separators() {
        assert_eq!(split_words("getUserName"), ["get", "user", "name"]);
        assert_eq!(split_words("XMLHttpRequest"), ["xml", "http", "request"]);
        assert_eq!(split_words("my-file_name.v2.md"), ["my", "file", "name", "v2", "md"]);
        assert!(split_words("._-").is_empty());
    }

    #[test]
    fn earlier_substring_scores_higher() {
        let start = filename_score("api", "api_reference.md", false);
        let later = filename_score("api", "rest_api.md", false);
        assert!(start > later);
        assert!((0.9..=0.95).contains(&start), "{start}");
        assert!((0.9..=0.95).contains(&later), "{later}");
    }

    #[test]
    fn camel_case_words_match_in_any_order() {
        assert_eq!(filename_score("name user", "getUserName.ts", false), ALL_WORDS_SCORE);
        assert_eq!(filename_score("file_handler", "FileHandler.py", false), ALL_WORDS_SCORE);
    }

    #[test]
    fn acronyms_match_word_initials() {
        assert_eq!(filename_score("gfn", "getFileName", false), ACRONYM_SCORE);
        assert_eq!(filename_score("GFN", "get_file_name", true), ACRONYM_SCORE);
        assert_eq!(filename_score("fg", "getFileName", false), 0.0);
    }

    #[test]
    fn per_word_similarity_catches_typos() {
        let score = filename_score("confgi loader", "config_loader.rs", true);
        assert!(score >= 0.7, "{score}");
        assert_eq!(filename_score("confgi loader", "config_loader.rs", false), 0.0);
    }

    #[test]
    fn unrelated_names_stay_below_threshold() {
        assert!(filename_score("xyz", "README.md", true) < 0.5);
        assert!(filename_score("../../etc/passwd", "api.md", true) < 0.7);
    }
}
