//! Discovery of named test procedures in a source script

use regex::Regex;

use crate::error::Result;

/// Reserved name prefix marking a procedure as a test
pub const TEST_PREFIX: &str = "Test_";

/// Scan source text for test procedure definitions.
///
/// A definition is a line whose head is one of the common procedure
/// keywords (`func`, `function`, `def`, `fn`, `proc`) followed by a name
/// starting with [`TEST_PREFIX`]. Names are returned in the order found,
/// deduplicated; the orchestrator sorts them before execution so run order
/// is independent of definition order.
pub fn discover(source: &str) -> Result<Vec<String>> {
    let def = Regex::new(r"(?m)^\s*(?:func(?:tion)?!?|def|fn|proc)\s+(Test_\w+)\s*\(")?;
    let mut names: Vec<String> = Vec::new();
    for caps in def.captures_iter(source) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Keep only names matching `pattern`.
///
/// The pattern is treated as a regex; a pattern that fails to compile
/// degrades to plain substring matching. Zero matches is a valid result,
/// not an error.
pub fn filter_names(names: Vec<String>, pattern: &str) -> Vec<String> {
    match Regex::new(pattern) {
        Ok(re) => names.into_iter().filter(|n| re.is_match(n)).collect(),
        Err(_) => names.into_iter().filter(|n| n.contains(pattern)).collect(),
    }
}
