//! Rule-driven file matcher.
//!
//! For each pack the matcher walks the root-level entries and produces one
//! [`RuleMatch`] per file-handler pairing. Per-pack override rules are
//! evaluated before the built-in defaults, first match wins, and files no
//! rule claims are silently skipped. Subdirectory traversal is the matched
//! handler's concern, never the matcher's.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use glob::Pattern;

use crate::config::{OverrideRule, PACK_CONFIG_FILE, PACK_IGNORE_FILE, RuleType};
use crate::fsys::FileSystem;
use crate::handlers::HandlerKind;
use crate::packs::Pack;

/// One file-handler pairing produced by the matcher.
///
/// Lives for a single command invocation.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    /// Name of the owning pack.
    pub pack_name: String,
    /// Path relative to the pack root.
    pub relative_path: PathBuf,
    /// Absolute path of the entry.
    pub absolute_path: PathBuf,
    /// Handler the entry is dispatched to.
    pub handler: HandlerKind,
    /// Options carried by the matching rule.
    pub options: BTreeMap<String, toml::Value>,
}

/// A single matching rule.
#[derive(Debug, Clone)]
struct Rule {
    rule_type: RuleType,
    pattern: String,
    handler: HandlerKind,
    options: BTreeMap<String, toml::Value>,
}

impl Rule {
    fn builtin(rule_type: RuleType, pattern: String, handler: HandlerKind) -> Self {
        Self {
            rule_type,
            pattern,
            handler,
            options: BTreeMap::new(),
        }
    }

    fn matches(&self, name: &str, is_dir: bool) -> bool {
        match self.rule_type {
            RuleType::Filename => !is_dir && name == self.pattern,
            RuleType::Directory => is_dir && name == self.pattern,
            RuleType::Exact => name == self.pattern,
            RuleType::Glob => Pattern::new(&self.pattern).is_ok_and(|p| p.matches(name)),
        }
    }
}

/// The built-in default rules, evaluated after any pack overrides.
fn default_rules() -> Vec<Rule> {
    vec![
        Rule::builtin(
            RuleType::Filename,
            String::from("Brewfile"),
            HandlerKind::Homebrew,
        ),
        Rule::builtin(
            RuleType::Filename,
            String::from("install.sh"),
            HandlerKind::Install,
        ),
        Rule::builtin(
            RuleType::Glob,
            String::from("*aliases.sh"),
            HandlerKind::Shell,
        ),
        Rule::builtin(
            RuleType::Filename,
            String::from("profile.sh"),
            HandlerKind::Shell,
        ),
        Rule::builtin(RuleType::Glob, String::from("*.sh"), HandlerKind::Shell),
        Rule::builtin(
            RuleType::Directory,
            String::from("bin"),
            HandlerKind::Path,
        ),
        Rule::builtin(RuleType::Glob, String::from("*"), HandlerKind::Symlink),
    ]
}

/// Convert pack override rules, dropping any that name an unknown handler.
fn override_rules(pack: &Pack) -> Vec<Rule> {
    pack.config
        .rules
        .iter()
        .filter_map(|o: &OverrideRule| match HandlerKind::from_name(&o.handler) {
            Some(handler) => Some(Rule {
                rule_type: o.rule_type,
                pattern: o.pattern.clone(),
                handler,
                options: o.options.clone(),
            }),
            None => {
                tracing::warn!(
                    "pack {}: override rule '{}' names unknown handler '{}'",
                    pack.name,
                    o.pattern,
                    o.handler
                );
                None
            }
        })
        .collect()
}

/// Whether a root-level directory is a mapping-prefix directory whose files
/// deploy individually rather than as one directory link.
///
/// Covers the explicit `_home`/`_xdg` override prefixes, the `config`
/// convention directories, and any directory the force-home set names (its
/// files land under `$HOME/.<dir>/` one by one).
fn traverses(pack: &Pack, name: &str) -> bool {
    if matches!(name, "_home" | "_xdg" | "config" | ".config") {
        return true;
    }
    let stem = name.trim_start_matches('.');
    pack.config
        .force_home
        .iter()
        .any(|entry| entry == stem || Pattern::new(entry).is_ok_and(|p| p.matches(stem)))
}

/// Recursively collect the files under a mapping-prefix directory as
/// symlink matches with their full pack-relative paths.
fn collect_tree(
    fs: &dyn FileSystem,
    pack: &Pack,
    dir: &std::path::Path,
    relative: &std::path::Path,
    matches: &mut Vec<RuleMatch>,
) -> Result<()> {
    for entry in fs
        .read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
    {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let rel = relative.join(name);
        if fs.is_dir(&entry) {
            collect_tree(fs, pack, &entry, &rel, matches)?;
        } else {
            matches.push(RuleMatch {
                pack_name: pack.name.clone(),
                relative_path: rel,
                absolute_path: entry,
                handler: HandlerKind::Symlink,
                options: BTreeMap::new(),
            });
        }
    }
    Ok(())
}

/// Match every root-level entry of `pack` against the effective rule list.
///
/// Mapping-prefix directories (see [`traverses`]) are walked and their
/// files emitted individually; every other entry is matched as-is. The
/// result is sorted by `(relative_path, handler name)` for stable output.
///
/// # Errors
///
/// Returns an error if the pack directory cannot be read.
pub fn match_pack(fs: &dyn FileSystem, pack: &Pack) -> Result<Vec<RuleMatch>> {
    let entries = fs
        .read_dir(&pack.path)
        .with_context(|| format!("reading pack directory {}", pack.path.display()))?;

    let mut rules = override_rules(pack);
    rules.extend(default_rules());

    let ignore_patterns: Vec<Pattern> = pack
        .config
        .ignore
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut matches = Vec::new();
    for entry in entries {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name == PACK_CONFIG_FILE || name == PACK_IGNORE_FILE {
            continue;
        }
        if ignore_patterns.iter().any(|p| p.matches(name)) {
            tracing::debug!("matcher: pack {}: ignoring {name}", pack.name);
            continue;
        }
        let is_dir = fs.is_dir(&entry);
        if is_dir && traverses(pack, name) {
            if pack.config.handler_enabled(HandlerKind::Symlink.name()) {
                collect_tree(fs, pack, &entry, std::path::Path::new(name), &mut matches)?;
            }
            continue;
        }
        let Some(rule) = rules.iter().find(|r| r.matches(name, is_dir)) else {
            continue;
        };
        if !pack.config.handler_enabled(rule.handler.name()) {
            tracing::debug!(
                "matcher: pack {}: handler {} disabled, skipping {name}",
                pack.name,
                rule.handler.name()
            );
            continue;
        }
        matches.push(RuleMatch {
            pack_name: pack.name.clone(),
            relative_path: PathBuf::from(name),
            absolute_path: entry,
            handler: rule.handler,
            options: rule.options.clone(),
        });
    }

    matches.sort_by(|a, b| {
        (&a.relative_path, a.handler.name()).cmp(&(&b.relative_path, b.handler.name()))
    });
    Ok(matches)
}
