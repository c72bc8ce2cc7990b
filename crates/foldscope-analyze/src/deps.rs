//! Best-effort dependency extraction from source files.
//!
//! Extraction is dispatched through [`DependencyExtractors`], a table from
//! lowercase file extension to a [`DependencyExtractor`]. Supporting another
//! language means registering one more extractor.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Parser};

/// Pulls imported module names out of source text.
///
/// Implementations never fail: unparseable input yields an empty set.
pub trait DependencyExtractor: Send + Sync {
    /// Short name of the language family, for logging.
    fn language(&self) -> &'static str;

    /// Extract the modules imported by `source`.
    fn extract(&self, source: &str) -> BTreeSet<String>;
}

/// Python imports, read from a tree-sitter syntax tree.
///
/// Collects every `import a.b` target and every `from m import x` module.
/// Relative imports contribute their module part (`from .util import x`
/// yields `util`); a bare `from . import x` contributes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonImports;

impl DependencyExtractor for PythonImports {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extract(&self, source: &str) -> BTreeSet<String> {
        let mut deps = BTreeSet::new();

        let mut parser = Parser::new();
        if let Err(err) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
            tracing::warn!(error = %err, "python grammar unavailable");
            return deps;
        }
        let Some(tree) = parser.parse(source, None) else {
            return deps;
        };

        let root = tree.root_node();
        if root.has_error() {
            return deps;
        }

        visit_all(&root, &mut |node: &Node| match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let target = if name.kind() == "aliased_import" {
                        name.child_by_field_name("name")
                    } else {
                        Some(name)
                    };
                    if let Some(text) = target.and_then(|n| node_text(&n, source)) {
                        deps.insert(text.to_string());
                    }
                }
            }
            "import_from_statement" => {
                if let Some(module) = node.child_by_field_name("module_name") {
                    if let Some(text) = module_name(&module, source) {
                        deps.insert(text.to_string());
                    }
                }
            }
            "future_import_statement" => {
                deps.insert("__future__".to_string());
            }
            _ => {}
        });

        deps
    }
}

/// Module text of a `from` import, with relative prefixes removed.
fn module_name<'a>(module: &Node, source: &'a str) -> Option<&'a str> {
    if module.kind() == "relative_import" {
        let mut cursor = module.walk();
        let dotted = module
            .children(&mut cursor)
            .find(|child| child.kind() == "dotted_name")?;
        return node_text(&dotted, source);
    }
    node_text(module, source)
}

fn node_text<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

/// Depth-first walk over every node in the tree.
fn visit_all<'tree>(root: &Node<'tree>, visit: &mut impl FnMut(&Node<'tree>)) {
    let mut cursor = root.walk();
    loop {
        visit(&cursor.node());

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

static ES_IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s+.*?from\s+['"](.+?)['"]"#).expect("Invalid ES_IMPORT_FROM regex")
});

static ES_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(['"](.+?)['"]\)"#).expect("Invalid ES_REQUIRE regex"));

/// JavaScript/TypeScript imports, matched with regular expressions.
///
/// Collects the module string of every `import ... from "m"` statement and
/// every `require("m")` call anywhere in the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcmaScriptImports;

impl DependencyExtractor for EcmaScriptImports {
    fn language(&self) -> &'static str {
        "ecmascript"
    }

    fn extract(&self, source: &str) -> BTreeSet<String> {
        [&*ES_IMPORT_FROM, &*ES_REQUIRE]
            .into_iter()
            .flat_map(|re| re.captures_iter(source))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Extension-indexed table of dependency extractors.
#[derive(Clone)]
pub struct DependencyExtractors {
    by_extension: HashMap<&'static str, Arc<dyn DependencyExtractor>>,
}

impl DependencyExtractors {
    /// Create an empty table.
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Register `extractor` for each of the given lowercase extensions.
    pub fn register(
        &mut self,
        extensions: &[&'static str],
        extractor: Arc<dyn DependencyExtractor>,
    ) -> &mut Self {
        for ext in extensions {
            self.by_extension.insert(*ext, Arc::clone(&extractor));
        }
        self
    }

    /// Look up the extractor for an extension (case-insensitive).
    pub fn get(&self, extension: &str) -> Option<&dyn DependencyExtractor> {
        self.by_extension
            .get(extension.to_ascii_lowercase().as_str())
            .map(|e| &**e)
    }

    /// Extract dependencies, or an empty set if no extractor is registered.
    pub fn extract(&self, extension: &str, source: &str) -> BTreeSet<String> {
        match self.get(extension) {
            Some(extractor) => {
                let deps = extractor.extract(source);
                tracing::trace!(language = extractor.language(), count = deps.len(), "extracted dependencies");
                deps
            }
            None => BTreeSet::new(),
        }
    }
}

impl Default for DependencyExtractors {
    fn default() -> Self {
        let mut table = Self::empty();
        table
            .register(&["py"], Arc::new(PythonImports))
            .register(&["js", "ts"], Arc::new(EcmaScriptImports));
        table
    }
}

impl std::fmt::Debug for DependencyExtractors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<&&str> = self.by_extension.keys().collect();
        extensions.sort();
        f.debug_struct("DependencyExtractors")
            .field("extensions", &extensions)
            .finish()
    }
}
