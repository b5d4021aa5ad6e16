//! Line-level scanner for AsciiDoc metadata.
//!
//! Recovers the document title and every file the document pulls in,
//! without rendering. Diagram macros are picked up from raw lines, including
//! those inside nested includes, because they are invisible once the
//! document is parsed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::{ConvertError, DocumentMetadata};
use crate::routing::{IncludedFile, normalize_lexically, to_slash};

/// Same limit asciidoctor applies to nested includes.
const MAX_INCLUDE_DEPTH: usize = 64;

/// Block macros whose target is an external diagram source.
pub const DIAGRAM_MACROS: &[&str] = &["plantuml", "d2", "mermaid", "graphviz", "ditaa"];

static INCLUDE_RE: OnceLock<Regex> = OnceLock::new();
static DIAGRAM_RE: OnceLock<Regex> = OnceLock::new();

fn include_regex() -> &'static Regex {
    INCLUDE_RE.get_or_init(|| {
        Regex::new(r"^include::(?P<path>[^\[\s][^\[]*)\[.*\]\s*$").expect("include pattern is valid")
    })
}

fn diagram_regex() -> &'static Regex {
    DIAGRAM_RE.get_or_init(|| {
        let pattern = format!(
            r"^(?:{})::(?P<path>[^\[]+?)\[[^\]]*\]",
            DIAGRAM_MACROS.join("|")
        );
        Regex::new(&pattern).expect("diagram pattern is valid")
    })
}

/// Directives found in one source text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScannedSource {
    pub title: Option<String>,
    pub includes: Vec<String>,
    pub diagrams: Vec<String>,
}

/// Scan one source text without following includes.
pub fn scan_source(source: &str) -> ScannedSource {
    let mut scanned = ScannedSource {
        title: extract_title(source),
        ..Default::default()
    };

    let mut in_comment_block = false;
    for line in source.lines() {
        let line = line.trim_end();
        if line == "////" {
            in_comment_block = !in_comment_block;
            continue;
        }
        if in_comment_block || line.starts_with("//") {
            continue;
        }

        if let Some(caps) = include_regex().captures(line) {
            scanned.includes.push(caps["path"].trim().to_string());
        } else if let Some(caps) = diagram_regex().captures(line) {
            scanned.diagrams.push(caps["path"].trim().to_string());
        }
    }

    scanned
}

/// Extract the level-0 document title from the header.
///
/// The title must be the first line that is not blank, a comment or an
/// attribute entry.
pub fn extract_title(source: &str) -> Option<String> {
    let mut in_comment_block = false;

    for line in source.lines() {
        let line = line.trim_end();
        if line == "////" {
            in_comment_block = !in_comment_block;
            continue;
        }
        if in_comment_block || line.is_empty() || line.starts_with("//") || is_attribute_entry(line)
        {
            continue;
        }

        let title = line
            .strip_prefix("= ")
            .or_else(|| line.strip_prefix("# "))?
            .trim();
        return (!title.is_empty()).then(|| title.to_string());
    }

    None
}

fn is_attribute_entry(line: &str) -> bool {
    line.strip_prefix(':')
        .and_then(|rest| rest.find(':'))
        .is_some_and(|end| end > 0)
}

/// True if a target cannot be followed on disk as written.
fn is_unresolvable(target: &str) -> bool {
    target.contains('{') || target.contains("://")
}

/// Re-express an include target found in a nested include relative to the
/// top document's directory. Absolute targets stay as written.
fn rebase(rel_dir: &Path, target: String) -> String {
    if Path::new(&target).is_absolute() {
        return target;
    }
    to_slash(&normalize_lexically(&rel_dir.join(&target)))
}

/// Read a source file, replacing invalid UTF-8 instead of failing.
/// Directives are ASCII, so a stray Latin-1 byte must not hide them.
fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            crate::debug_event!("scanner", "invalid utf-8", "{}", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

/// Scan a document and everything it includes, transitively.
///
/// Nested include targets are recorded relative to the top document's
/// directory so that every entry resolves against the same base.
pub fn scan_document(path: &Path) -> Result<DocumentMetadata, ConvertError> {
    let source = read_lossy(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let root_abs = normalize_lexically(path);
    let root_dir = root_abs.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut metadata = DocumentMetadata {
        title: extract_title(&source),
        included_files: Vec::new(),
    };
    let mut seen_entries: HashSet<IncludedFile> = HashSet::new();
    let mut visited: HashSet<PathBuf> = HashSet::from([root_abs.clone()]);

    // (source text, directory relative to the root document, depth)
    let mut pending: Vec<(String, PathBuf, usize)> = vec![(source, PathBuf::new(), 0)];

    while let Some((text, rel_dir, depth)) = pending.pop() {
        let scanned = scan_source(&text);

        // Macro targets resolve against the top document, wherever they appear
        for diagram in scanned.diagrams {
            let entry = IncludedFile::diagram(diagram);
            if seen_entries.insert(entry.clone()) {
                metadata.included_files.push(entry);
            }
        }

        for target in scanned.includes {
            if is_unresolvable(&target) {
                let entry = IncludedFile::include(target);
                if seen_entries.insert(entry.clone()) {
                    metadata.included_files.push(entry);
                }
                continue;
            }

            let recorded = rebase(&rel_dir, target);
            let target_abs = normalize_lexically(&root_dir.join(&recorded));
            if target_abs == root_abs {
                continue;
            }

            let entry = IncludedFile::include(recorded.clone());
            if seen_entries.insert(entry.clone()) {
                metadata.included_files.push(entry);
            }

            if depth + 1 > MAX_INCLUDE_DEPTH || !visited.insert(target_abs.clone()) {
                continue;
            }
            match read_lossy(&target_abs) {
                Ok(nested) => {
                    let nested_dir = Path::new(&recorded)
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_default();
                    pending.push((nested, nested_dir, depth + 1));
                }
                Err(e) => {
                    crate::debug_event!(
                        "scanner",
                        "unreadable include",
                        "{}: {e}",
                        target_abs.display()
                    );
                }
            }
        }
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_title_after_comments_and_attributes() {
        let source = "// leading comment\n:toc: left\n\n= Getting Started\nAuthor Name\n";
        assert_eq!(extract_title(source), Some("Getting Started".to_string()));
    }

    #[test]
    fn test_extract_title_skips_comment_block() {
        let source = "////\n= Not the title\n////\n= Real Title\n";
        assert_eq!(extract_title(source), Some("Real Title".to_string()));
    }

    #[test]
    fn test_extract_title_missing() {
        assert_eq!(extract_title("Just a paragraph.\n\n= Late"), None);
        assert_eq!(extract_title("== Section only"), None);
        assert_eq!(extract_title(""), None);
    }

    #[test]
    fn test_scan_source_finds_includes_and_diagrams() {
        let source = "\
= Doc

include::shared/fragment.adoc[]
include::{partials}/attr.adoc[leveloffset=+1]
plantuml::diagrams/flow.puml[format=svg]
d2::arch.d2[]
// include::commented.adoc[]
 include::indented.adoc[]
";
        let scanned = scan_source(source);
        assert_eq!(scanned.title.as_deref(), Some("Doc"));
        assert_eq!(
            scanned.includes,
            vec!["shared/fragment.adoc", "{partials}/attr.adoc"]
        );
        assert_eq!(scanned.diagrams, vec!["diagrams/flow.puml", "arch.d2"]);
    }

    #[test]
    fn test_scan_document_follows_nested_includes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("shared/parts")).unwrap();

        fs::write(
            root.join("intro.adoc"),
            "= Intro\n\ninclude::shared/fragment.adoc[]\n",
        )
        .unwrap();
        fs::write(
            root.join("shared/fragment.adoc"),
            "include::parts/deep.adoc[]\nplantuml::diagrams/seq.puml[]\n",
        )
        .unwrap();
        fs::write(root.join("shared/parts/deep.adoc"), "Deep text\n").unwrap();

        let metadata = scan_document(&root.join("intro.adoc")).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Intro"));

        let mut paths: Vec<_> = metadata
            .included_files
            .iter()
            .map(|f| f.path().to_string())
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec!["diagrams/seq.puml", "shared/fragment.adoc", "shared/parts/deep.adoc"]
        );
        assert!(metadata
            .included_files
            .contains(&IncludedFile::diagram("diagrams/seq.puml")));
    }

    #[test]
    fn test_scan_document_survives_cycles_and_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("a.adoc"), "= A\ninclude::b.adoc[]\ninclude::missing.adoc[]\n").unwrap();
        fs::write(root.join("b.adoc"), "include::a.adoc[]\ninclude::b.adoc[]\n").unwrap();

        let metadata = scan_document(&root.join("a.adoc")).unwrap();
        let paths: Vec<_> = metadata.included_files.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["b.adoc", "missing.adoc"]);
    }

    #[test]
    fn test_scan_document_unreadable_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = scan_document(&temp_dir.path().join("absent.adoc"));
        assert!(matches!(result, Err(ConvertError::Read { .. })));
    }

    #[test]
    fn test_scan_document_tolerates_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        // Latin-1 bytes in the title and in an included fragment
        fs::write(
            root.join("menu.adoc"),
            b"= Caf\xe9\n\ninclude::parts/dish.adoc[]\n".as_slice(),
        )
        .unwrap();
        fs::create_dir_all(root.join("parts")).unwrap();
        fs::write(
            root.join("parts/dish.adoc"),
            b"Cr\xe8me\ninclude::sauce.adoc[]\n".as_slice(),
        )
        .unwrap();

        let metadata = scan_document(&root.join("menu.adoc")).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Caf\u{fffd}"));
        let paths: Vec<_> = metadata.included_files.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["parts/dish.adoc", "parts/sauce.adoc"]);
    }
}
