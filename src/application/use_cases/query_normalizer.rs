//! Query Normalizer
//!
//! Rewrites free-text questions into canonical instruction phrasing before
//! they reach the agent, so informal queries like:
//! - "how many employees in each department" → "count employees in each department"
//! - "who has the highest salary" → "show the row where salary is maximum"
//! - "top 5 by age" → "sort by age descending and show first 5 rows"
//!
//! Pure string rewriting, no LLM involved. Rule order is significant: the
//! first matching rule wins, and a query matching no rule comes back as the
//! trimmed, whitespace-collapsed input.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_HOW_MANY_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^how many (\w+) in each (\w+)").unwrap());

static RE_HOW_MUCH_CALC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^how much is the (total|average|sum|mean) (\w+)").unwrap());

static RE_WHAT_IS_CALC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^what is the (average|sum|total|mean|median|max|min|maximum|minimum) (?:of )?(\w+)")
        .unwrap()
});

static RE_WHAT_ARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^what are the (\w+)").unwrap());

static RE_WHERE_IS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^where (?:is|are) (\w+)").unwrap());

static RE_CAN_YOU: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^can you (show|give|get|find|display) (?:me )?(.+)").unwrap());

static RE_I_WANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^i want to (?:see|know|find|get) (.+)").unwrap());

static RE_HAS_HIGHEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:which|who|what)\s+(?:has|have)\s+(?:the\s+)?(highest|lowest|max|min)\s+(\w+)")
        .unwrap()
});

static RE_TOP_N: Lazy<Regex> = Lazy::new(|| Regex::new(r"^top\s+(\d+)\s+(?:by\s+)?(\w+)").unwrap());

static RE_SORT_TOP_N: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sort\s+(?:the\s+)?top\s+(\d+)\s+(?:by|rows by)\s+(\w+)").unwrap());

static RE_DEPT_SHORTHAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s+(?:department|employees|workers)").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Words a well-formed instruction starts with; used by the catch-all rule
/// that prepends "show" to action-less sort/filter queries.
const ACTION_WORDS: &[&str] = &["show", "display", "get", "find", "calculate", "list", "count"];

/// Shorthand expansions applied to the rewritten query. Space-padded so
/// only whole words are replaced.
const ABBREVIATIONS: &[(&str, &str)] = &[
    (" exp ", " experience "),
    (" perf ", " performance "),
    (" dept ", " department "),
    (" sal ", " salary "),
    (" avg ", " average "),
];

/// Rewrite a raw user query into canonical instruction phrasing.
///
/// Deterministic and infallible: always returns a string, falling back to
/// the trimmed, whitespace-collapsed input when no rule matches.
pub fn normalize(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let lower = collapsed.to_lowercase();

    let rewritten = apply_rules(&collapsed, &lower).unwrap_or(collapsed);
    expand_abbreviations(&rewritten)
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(raw: &str) -> String {
    RE_WHITESPACE.replace_all(raw.trim(), " ").to_string()
}

/// Ordered rule application against the lowercased query.
/// Returns None when no rule matches.
fn apply_rules(collapsed: &str, lower: &str) -> Option<String> {
    // "how many X in each Y" -> grouped count
    if let Some(caps) = RE_HOW_MANY_GROUPED.captures(lower) {
        return Some(format!("count {} in each {}", &caps[1], &caps[2]));
    }

    // "how many X" -> total count
    if let Some(rest) = lower.strip_prefix("how many ") {
        return Some(format!("count total number of {}", rest.trim()));
    }

    // "how much is the total/average/sum/mean X"
    if let Some(caps) = RE_HOW_MUCH_CALC.captures(lower) {
        return Some(format!("calculate the {} of {}", &caps[1], &caps[2]));
    }

    // "what is the average/sum/total/mean/median/max/min [of] X"
    if let Some(caps) = RE_WHAT_IS_CALC.captures(lower) {
        let operation = &caps[1];
        let column = &caps[2];
        return Some(match operation {
            "max" | "maximum" => format!("show the row where {} is maximum", column),
            "min" | "minimum" => format!("show the row where {} is minimum", column),
            _ => format!("calculate the {} of {}", operation, column),
        });
    }

    // "what are the X" -> unique values, unless the user already asked
    // for unique values explicitly
    if let Some(caps) = RE_WHAT_ARE.captures(lower) {
        if !lower.contains("unique") {
            return Some(format!("show unique values in {} column", &caps[1]));
        }
    }

    // "where is/are X" -> row filter
    if RE_WHERE_IS.is_match(lower) {
        let condition = lower.replace("where is ", "").replace("where are ", "");
        return Some(format!("show rows where {}", condition));
    }

    // "can you show/give/get/find/display [me] X" -> drop the politeness
    if let Some(caps) = RE_CAN_YOU.captures(lower) {
        return Some(format!("{} {}", &caps[1], &caps[2]));
    }

    // "i want to see/know/find/get X" -> "show X"
    if let Some(caps) = RE_I_WANT.captures(lower) {
        return Some(format!("show {}", &caps[1]));
    }

    // "tell me X" / "give me X" -> "show X"
    if let Some(rest) = lower.strip_prefix("tell me ") {
        return Some(format!("show {}", rest));
    }
    if let Some(rest) = lower.strip_prefix("give me ") {
        return Some(format!("show {}", rest));
    }

    // "which/who/what has the highest/lowest/max/min X" -> extremum row
    if let Some(caps) = RE_HAS_HIGHEST.captures(lower) {
        let direction = match &caps[1] {
            "highest" | "max" => "maximum",
            _ => "minimum",
        };
        return Some(format!("show the row where {} is {}", &caps[2], direction));
    }

    // "sort [the] top N by X" / "top N [by] X" -> explicit sort + head
    if let Some(caps) = RE_SORT_TOP_N.captures(lower) {
        return Some(format!(
            "sort by {} descending and show first {} rows",
            &caps[2], &caps[1]
        ));
    }
    if let Some(caps) = RE_TOP_N.captures(lower) {
        return Some(format!(
            "sort by {} descending and show first {} rows",
            &caps[2], &caps[1]
        ));
    }

    // Bare "average X"
    if lower.starts_with("average ") && lower.split(' ').count() == 2 {
        let column = lower.split(' ').nth(1).unwrap_or_default();
        return Some(format!("calculate the average of {}", column));
    }

    // "X department" / "X employees" shorthand
    if let Some(caps) = RE_DEPT_SHORTHAND.captures(lower) {
        if !lower.starts_with("show") {
            return Some(format!("show all rows where department equals {}", &caps[1]));
        }
    }

    // Fixed informal phrases
    match lower {
        "oldest" | "who is oldest" | "oldest employee" | "who is the oldest" => {
            return Some("show the row where age is maximum".to_string());
        }
        "youngest" | "who is youngest" | "youngest employee" | "who is the youngest" => {
            return Some("show the row where age is minimum".to_string());
        }
        "best performer" | "best employee" | "highest performer" | "who is the best" => {
            return Some("show the row where performance_score is maximum".to_string());
        }
        _ => {}
    }

    // Sorting/filtering query with no leading action word -> prepend "show"
    let starts_with_action = ACTION_WORDS.iter().any(|w| lower.starts_with(w));
    if !starts_with_action {
        let has_clause_word = ["sort", "filter", "where", "group"]
            .iter()
            .any(|w| lower.contains(w));
        if has_clause_word {
            return Some(format!("show {}", collapsed));
        }
    }

    None
}

/// Expand space-padded abbreviations in the rewritten query.
fn expand_abbreviations(query: &str) -> String {
    let mut out = query.to_string();
    for (short, long) in ABBREVIATIONS {
        out = out.replace(short, long);
    }
    out
}
