use once_cell::sync::Lazy;
use regex::Regex;

// `import { a, b as c } from "pkg";` - braces may span lines
static NAMED_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*\{([^}]*)\}\s*from\s*(?:"[^"\n]*"|'[^'\n]*')[ \t]*;?"#).unwrap()
});

// `import * as pkg from "pkg";`
static NAMESPACE_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*\*\s*as\s+([A-Za-z_$][A-Za-z0-9_$]*)\s+from\s*(?:"[^"\n]*"|'[^'\n]*')[ \t]*;?"#)
        .unwrap()
});

/// Remove named and namespace import statements from a snippet.
///
/// This is a textual pass, not a parser: import-looking text inside string
/// literals or comments is stripped too, and anything that does not match one
/// of the two recognized shapes is left alone. The result is trimmed.
pub fn strip_imports(source: &str) -> String {
    let without_named = NAMED_IMPORT_RE.replace_all(source, "");
    let without_namespace = NAMESPACE_IMPORT_RE.replace_all(&without_named, "");
    without_namespace.trim().to_string()
}

/// Local names the recognized import statements would have bound.
///
/// `import { a, b as c } from "x"` yields `a` and `c`, `import * as N from "x"`
/// yields `N`. Order follows the source text.
pub fn imported_names(source: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for caps in NAMED_IMPORT_RE.captures_iter(source) {
        let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
        for specifier in caps[1].split(',') {
            let specifier = specifier.trim();
            if specifier.is_empty() {
                continue;
            }
            let local = match specifier.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => specifier,
            };
            found.push((start, local.to_string()));
        }
    }

    for caps in NAMESPACE_IMPORT_RE.captures_iter(source) {
        let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
        found.push((start, caps[1].to_string()));
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, name)| name).collect()
}
