//! @ai:module:intent Derive node fields from unstructured values with per-extension regex grammars
//! @ai:module:layer domain
//! @ai:module:public_api GrammarFile, RuleDef, MatchDef, SetField, Grammar, GrammarCache, LoadedGrammars
//! @ai:module:depends_on node, error
//! @ai:module:stateless true
//! @ai:module:thread_safe true

use crate::error::{Error, Result};
use crate::node::Node;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Nested rule-sets deeper than this are not applied.
pub const MAX_RECURSION_DEPTH: usize = 32;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("Invalid regex"));

/// @ai:intent On-disk grammar file, `emits.grammar.<name>.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrammarFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extension: Vec<String>,
    #[serde(default)]
    pub grammar: Vec<RuleDef>,
}

/// @ai:intent One rule: a pattern plus actions keyed by named capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDef {
    pub pattern: String,
    #[serde(rename = "match", default)]
    pub matches: BTreeMap<String, MatchDef>,
}

/// @ai:intent What to do with a named capture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDef {
    /// Render templates into node fields.
    Set(BTreeMap<SetField, String>),
    /// Re-apply sub-rules to the capture's text.
    Grammar(Vec<RuleDef>),
}

/// @ai:intent Node fields a grammar may assign
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetField {
    Value,
    Keyword,
    Index,
    Line,
    Parent,
    Separator,
    Flags,
}

impl SetField {
    /// @ai:intent Assign a rendered template to the matching node field
    /// @ai:post integer fields fall back to 0 on parse failure
    /// @ai:effects pure
    pub fn assign(self, node: &mut Node, rendered: &str) {
        match self {
            SetField::Value => node.value = rendered.to_string(),
            SetField::Keyword => node.keyword = rendered.to_string(),
            SetField::Index => node.index = rendered.trim().parse().unwrap_or(0),
            SetField::Line => node.line = rendered.trim().parse().unwrap_or(0),
            SetField::Parent => node.parent = rendered.trim().parse().unwrap_or(0),
            SetField::Separator => node.separator = parse_bool(rendered),
            SetField::Flags => {
                node.flags = rendered
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
    }
}

fn parse_bool(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "1" | "t" | "true")
}

#[derive(Debug, Clone)]
enum Action {
    Set(Vec<(SetField, String)>),
    Rules(Vec<Rule>),
}

/// @ai:intent A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    actions: Vec<(String, Action)>,
}

impl Rule {
    /// @ai:intent Compile a rule definition, ordering actions by capture position
    /// @ai:effects pure
    pub fn compile(def: &RuleDef) -> Result<Self> {
        let regex = Regex::new(&def.pattern).map_err(|e| Error::InvalidPattern {
            pattern: def.pattern.clone(),
            source: e,
        })?;

        let mut actions = Vec::new();
        for name in regex.capture_names().flatten() {
            let Some(matched) = def.matches.get(name) else {
                continue;
            };
            let action = match matched {
                MatchDef::Set(targets) => Action::Set(
                    targets
                        .iter()
                        .map(|(field, template)| (*field, template.clone()))
                        .collect(),
                ),
                MatchDef::Grammar(rules) => Action::Rules(
                    rules.iter().map(Rule::compile).collect::<Result<Vec<_>>>()?,
                ),
            };
            actions.push((name.to_string(), action));
        }

        for name in def.matches.keys() {
            if !regex.capture_names().flatten().any(|n| n == name) {
                tracing::debug!("Pattern `{}` has no capture named `{}`", def.pattern, name);
            }
        }

        Ok(Self { regex, actions })
    }
}

/// @ai:intent A compiled, extension-scoped rule-set
#[derive(Debug, Clone)]
pub struct Grammar {
    pub name: String,
    pub extensions: Vec<String>,
    rules: Vec<Rule>,
}

impl Grammar {
    /// @ai:intent Compile a grammar file into a rule-set
    /// @ai:effects pure
    pub fn compile(file: &GrammarFile) -> Result<Self> {
        Ok(Self {
            name: file.name.clone(),
            extensions: file
                .extension
                .iter()
                .map(|e| normalize_extension(e).to_string())
                .collect(),
            rules: file
                .grammar
                .iter()
                .map(Rule::compile)
                .collect::<Result<Vec<_>>>()?,
        })
    }

    /// @ai:intent Parse and compile a grammar from JSON text
    /// @ai:effects pure
    pub fn from_json(json: &str) -> Result<Self> {
        let file: GrammarFile = serde_json::from_str(json)?;
        Self::compile(&file)
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        let extension = normalize_extension(extension);
        self.extensions.iter().any(|e| e == extension)
    }

    /// @ai:intent Apply every top-level rule in order, each against the current value
    /// @ai:effects pure
    pub fn apply(&self, node: &mut Node) {
        for rule in &self.rules {
            let source = node.value.clone();
            apply_rule(rule, &source, node, 0);
        }
    }
}

fn apply_rule(rule: &Rule, source: &str, node: &mut Node, depth: usize) {
    let Some(captures) = rule.regex.captures(source) else {
        return;
    };

    for (name, action) in &rule.actions {
        match action {
            Action::Set(targets) => {
                for (field, template) in targets {
                    field.assign(node, &render(template, &captures));
                }
            }
            Action::Rules(rules) => {
                let Some(text) = captures.name(name).map(|m| m.as_str()) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                if depth + 1 > MAX_RECURSION_DEPTH {
                    tracing::warn!(
                        "Grammar recursion deeper than {} levels at line {}; stopping",
                        MAX_RECURSION_DEPTH,
                        node.line
                    );
                    continue;
                }
                for sub in rules {
                    apply_rule(sub, text, node, depth + 1);
                }
            }
        }
    }
}

/// @ai:intent Substitute `{{name}}` placeholders with capture text
/// @ai:post placeholders naming absent captures render as empty strings
/// @ai:example ("{{name}}!", name=foo) -> "foo!"
/// @ai:effects pure
pub fn render(template: &str, captures: &Captures<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |placeholder: &Captures<'_>| {
            captures
                .name(&placeholder[1])
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

fn normalize_extension(extension: &str) -> &str {
    extension.trim().trim_start_matches('.')
}

/// @ai:intent Read-only collection of loaded grammars, shared across files
#[derive(Debug, Clone, Default)]
pub struct GrammarCache {
    grammars: Vec<Grammar>,
}

/// @ai:intent Grammars that loaded plus the failures to report
#[derive(Debug, Default)]
pub struct LoadedGrammars {
    pub cache: GrammarCache,
    pub failures: Vec<Error>,
}

impl GrammarCache {
    pub fn new(grammars: Vec<Grammar>) -> Self {
        Self { grammars }
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    pub fn grammars(&self) -> &[Grammar] {
        &self.grammars
    }

    /// @ai:intent Offer a node to every grammar registered for `extension`
    /// @ai:pre extension is given without the leading dot, or with it
    /// @ai:post nodes with a keyword, without a value, or marked configuration are untouched
    /// @ai:effects pure
    pub fn apply(&self, node: &mut Node, extension: &str) {
        if node.has_keyword() || !node.has_value() {
            return;
        }
        for grammar in self.grammars.iter().filter(|g| g.has_extension(extension)) {
            grammar.apply(node);
        }
    }

    /// @ai:intent Load named grammars from a directory tree
    /// @ai:post a grammar that fails to load is reported in failures and skipped
    /// @ai:effects fs:read
    pub fn load(dir: &Path, names: &[String]) -> LoadedGrammars {
        let mut loaded = LoadedGrammars::default();

        for name in names {
            match load_grammar(dir, name) {
                Ok(grammar) => {
                    tracing::debug!(
                        "Loaded grammar `{}` for {:?}",
                        name,
                        grammar.extensions
                    );
                    loaded.cache.grammars.push(grammar);
                }
                Err(e) => {
                    tracing::warn!("Skipping grammar `{}`: {}", name, e);
                    loaded.failures.push(e);
                }
            }
        }

        loaded
    }
}

fn load_grammar(dir: &Path, name: &str) -> Result<Grammar> {
    let path = find_grammar_file(dir, name).ok_or_else(|| Error::GrammarLoad {
        name: name.to_string(),
        message: format!("{} not found under {}", grammar_file_name(name), dir.display()),
    })?;

    let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
        path: path.clone(),
        source: e,
    })?;

    Grammar::from_json(&content).map_err(|e| Error::GrammarLoad {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// @ai:intent File name a grammar is stored under
pub fn grammar_file_name(name: &str) -> String {
    format!("emits.grammar.{}.json", name)
}

fn find_grammar_file(dir: &Path, name: &str) -> Option<PathBuf> {
    let wanted = grammar_file_name(name);
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| e.file_name().to_str() == Some(wanted.as_str()))
        .map(|e| e.path().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn value_node(value: &str) -> Node {
        Node {
            line: 7,
            value: value.to_string(),
            ..Default::default()
        }
    }

    const ASSIGNMENT: &str = r#"{
        "name": "assignment",
        "extension": ["go", ".rs"],
        "grammar": [
            {
                "pattern": "^(?P<name>\\w+)=(?P<rest>.*)$",
                "match": {
                    "name": { "set": { "keyword": "{{name}}" } },
                    "rest": { "set": { "value": "{{rest}}{{missing}}" } }
                }
            }
        ]
    }"#;

    #[test]
    fn test_set_keyword_from_capture() {
        let cache = GrammarCache::new(vec![Grammar::from_json(ASSIGNMENT).unwrap()]);
        let mut node = value_node("foo=bar");
        cache.apply(&mut node, "go");
        assert_eq!(node.keyword, "foo");
        assert_eq!(node.value, "bar");
    }

    #[test]
    fn test_extension_scoping() {
        let cache = GrammarCache::new(vec![Grammar::from_json(ASSIGNMENT).unwrap()]);

        let mut node = value_node("foo=bar");
        cache.apply(&mut node, ".rs");
        assert_eq!(node.keyword, "foo");

        let mut untouched = value_node("foo=bar");
        cache.apply(&mut untouched, "py");
        assert_eq!(untouched.keyword, "");
        assert_eq!(untouched.value, "foo=bar");
    }

    #[test]
    fn test_nodes_with_keyword_are_skipped() {
        let cache = GrammarCache::new(vec![Grammar::from_json(ASSIGNMENT).unwrap()]);
        let mut node = value_node("foo=bar");
        node.keyword = "kept".to_string();
        cache.apply(&mut node, "go");
        assert_eq!(node.keyword, "kept");
        assert_eq!(node.value, "foo=bar");
    }

    #[test]
    fn test_typed_fields_reset_on_bad_input() {
        let grammar = Grammar::from_json(
            r#"{
                "extension": ["go"],
                "grammar": [{
                    "pattern": "^(?P<n>\\S+) (?P<b>\\S+) (?P<f>\\S+)$",
                    "match": {
                        "n": { "set": { "index": "{{n}}", "line": "{{n}}" } },
                        "b": { "set": { "separator": "{{b}}" } },
                        "f": { "set": { "flags": "{{f}}" } }
                    }
                }]
            }"#,
        )
        .unwrap();

        let mut node = value_node("abc TRUE x,y,,z");
        node.index = 4;
        grammar.apply(&mut node);
        assert_eq!(node.index, 0);
        assert_eq!(node.line, 0);
        assert!(node.separator);
        assert_eq!(node.flags, vec!["x", "y", "z"]);

        let mut node = value_node("3 nope a");
        grammar.apply(&mut node);
        assert_eq!(node.index, 3);
        assert!(!node.separator);
    }

    #[test]
    fn test_nested_rules_apply_to_capture() {
        let grammar = Grammar::from_json(
            r#"{
                "extension": ["go"],
                "grammar": [{
                    "pattern": "^func (?P<sig>.*)$",
                    "match": {
                        "sig": { "grammar": [{
                            "pattern": "^(?P<fn>\\w+)\\((?P<args>[^)]*)\\)",
                            "match": {
                                "fn": { "set": { "keyword": "func", "value": "{{fn}}" } },
                                "args": { "set": { "flags": "{{args}}" } }
                            }
                        }] }
                    }
                }]
            }"#,
        )
        .unwrap();

        let mut node = value_node("func Open(name,mode) error");
        grammar.apply(&mut node);
        assert_eq!(node.keyword, "func");
        assert_eq!(node.value, "Open");
        assert_eq!(node.flags, vec!["name", "mode"]);
    }

    #[test]
    fn test_later_rules_override_earlier() {
        let grammar = Grammar::from_json(
            r#"{
                "extension": ["go"],
                "grammar": [
                    { "pattern": "(?P<all>.+)", "match": { "all": { "set": { "keyword": "first" } } } },
                    { "pattern": "(?P<all>.+)", "match": { "all": { "set": { "keyword": "second" } } } },
                    { "pattern": "^never$", "match": {} }
                ]
            }"#,
        )
        .unwrap();

        let mut node = value_node("anything");
        grammar.apply(&mut node);
        assert_eq!(node.keyword, "second");
    }

    #[test]
    fn test_self_similar_rules_stop_at_depth_limit() {
        let mut rule = RuleDef {
            pattern: "(?P<x>.+)".to_string(),
            matches: BTreeMap::new(),
        };
        rule.matches.insert(
            "x".to_string(),
            MatchDef::Set(BTreeMap::from([(SetField::Keyword, "deep".to_string())])),
        );
        for _ in 0..(MAX_RECURSION_DEPTH + 5) {
            let inner = rule.clone();
            rule = RuleDef {
                pattern: "(?P<x>.+)".to_string(),
                matches: BTreeMap::from([("x".to_string(), MatchDef::Grammar(vec![inner]))]),
            };
        }
        let grammar = Grammar::compile(&GrammarFile {
            extension: vec!["go".to_string()],
            grammar: vec![rule],
            ..Default::default()
        })
        .unwrap();

        let mut node = value_node("text");
        grammar.apply(&mut node);
        assert_eq!(node.keyword, "");
    }

    #[test]
    fn test_unknown_set_field_is_rejected() {
        let err = Grammar::from_json(
            r#"{ "grammar": [{ "pattern": "(?P<a>.)", "match": { "a": { "set": { "colour": "x" } } } }] }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = Grammar::from_json(r#"{ "grammar": [{ "pattern": "(unclosed" }] }"#);
        assert!(matches!(err, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_load_reports_missing_and_keeps_good() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("grammars");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(grammar_file_name("assign")), ASSIGNMENT).unwrap();
        std::fs::write(dir.path().join(grammar_file_name("broken")), "{ not json").unwrap();

        let names = vec![
            "assign".to_string(),
            "missing".to_string(),
            "broken".to_string(),
        ];
        let loaded = GrammarCache::load(dir.path(), &names);

        assert!(!loaded.cache.is_empty());
        assert_eq!(loaded.cache.grammars().len(), 1);
        assert_eq!(loaded.failures.len(), 2);

        assert!(GrammarCache::load(dir.path(), &["missing".to_string()])
            .cache
            .is_empty());
        assert!(loaded
            .failures
            .iter()
            .all(|e| matches!(e, Error::GrammarLoad { .. })));
    }
}
