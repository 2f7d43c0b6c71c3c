//! Scripting variables and `$(name)` expansion.

use std::collections::HashMap;

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::char,
    sequence::delimited,
    IResult,
};

/// A named scripting variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
    /// Whether a script `:SETVAR` may replace the value.
    pub can_be_overridden: bool,
}

/// Case-insensitive variable table owned by one parse pass.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    entries: HashMap<String, Variable>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a caller-supplied variable, replacing any previous entry.
    pub fn insert(&mut self, name: &str, value: &str, can_be_overridden: bool) {
        self.entries.insert(
            key(name),
            Variable {
                name: name.to_string(),
                value: value.to_string(),
                can_be_overridden,
            },
        );
    }

    /// Apply a script assignment.
    ///
    /// Blank names are ignored, and so are assignments to variables that can't
    /// be overridden. Returns whether the store changed.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        if let Some(existing) = self.entries.get(&key(name)) {
            if !existing.can_be_overridden {
                tracing::trace!("Setting variable '{}' ignored", name);
                return false;
            }
        }
        self.insert(name, value, true);
        tracing::trace!("Variable '{}' updated", name);
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&key(name)).map(|v| v.value.as_str())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.entries.get(&key(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every `$(name)` whose name is defined; see [`expand`].
    pub fn expand(&self, text: &str) -> String {
        expand(text, |name| self.get(name))
    }
}

/// `$(name)` with a non-empty name.
fn reference(input: &str) -> IResult<&str, &str> {
    delimited(tag("$("), take_until(")"), char(')'))(input)
}

/// Single-pass `$(name)` substitution.
///
/// Unknown names and unclosed `$(` are kept verbatim, and substituted values
/// are never rescanned.
///
/// # Example
///
/// ```
/// use sqlscript::variables::expand;
///
/// let lookup = |name: &str| (name == "db").then_some("master");
/// assert_eq!(expand("USE $(db); -- $(other)", lookup), "USE master; -- $(other)");
/// ```
pub fn expand<'v, F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("$(") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        match reference(candidate) {
            Ok((after, name)) if !name.is_empty() => {
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&candidate[..candidate.len() - after.len()]),
                }
                rest = after;
            }
            _ => {
                out.push('$');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VariableStore {
        let mut store = VariableStore::new();
        store.insert("Db", "master", true);
        store.insert("Locked", "fixed", false);
        store
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let store = store();
        assert_eq!(store.get("DB"), Some("master"));
        assert_eq!(store.get("db"), Some("master"));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_set_overrides_and_marks_overridable() {
        let mut store = store();
        assert!(store.set("DB", "tempdb"));
        assert_eq!(store.get("db"), Some("tempdb"));
        assert!(store.variable("db").unwrap().can_be_overridden);

        assert!(store.set("new", "1"));
        assert!(store.set("NEW", "2"));
        assert_eq!(store.get("new"), Some("2"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_set_ignores_locked_and_blank() {
        let mut store = store();
        assert!(!store.set("locked", "changed"));
        assert_eq!(store.get("Locked"), Some("fixed"));
        assert!(!store.set("  ", "x"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expand_known_and_unknown() {
        let store = store();
        assert_eq!(store.expand("USE $(db);"), "USE master;");
        assert_eq!(store.expand("'$(nope)'"), "'$(nope)'");
        assert_eq!(store.expand("$(db)$(DB)"), "mastermaster");
    }

    #[test]
    fn test_expand_unclosed_and_empty() {
        let store = store();
        assert_eq!(store.expand("cost $( 5"), "cost $( 5");
        assert_eq!(store.expand("$()"), "$()");
        assert_eq!(store.expand("$$(db)"), "$master");
        assert_eq!(store.expand("$(db"), "$(db");
    }

    #[test]
    fn test_expand_is_single_pass() {
        let mut store = VariableStore::new();
        store.insert("a", "$(b)", true);
        store.insert("b", "deep", true);
        assert_eq!(store.expand("$(a)"), "$(b)");
    }
}
