use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use phylotree::tree::{NewickFormat, Tree as PhyloTree};

use crate::tree::Tree;

/// Load a tree set from a Newick or Nexus file.
///
/// Trees are numbered by their position in the file; that index is what
/// error messages downstream refer to.
pub fn load_trees(path: &Path) -> Result<Vec<Tree>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read tree file: {}", path.display()))?;

    let trees = if is_nexus(&raw) {
        parse_nexus(&raw)?
    } else {
        parse_newick(&raw)?
    };

    if trees.is_empty() {
        bail!("tree file did not contain any trees: {}", path.display());
    }
    Ok(trees)
}

/// A file is treated as Nexus iff its first significant line is `#NEXUS`;
/// everything else is taken as (possibly multi-tree) Newick.
fn is_nexus(raw: &str) -> bool {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.to_ascii_uppercase().starts_with("#NEXUS"))
}

/// Parse a concatenation of `;`-terminated Newick strings.
pub(crate) fn parse_newick(raw: &str) -> Result<Vec<Tree>> {
    let mut trees = Vec::new();
    for chunk in raw.split_inclusive(';') {
        let candidate = chunk.trim();
        if candidate.is_empty() || !candidate.ends_with(';') {
            continue;
        }
        trees.push(build_tree(trees.len(), None, candidate, &HashMap::new())?);
    }
    Ok(trees)
}

/// Parse the TREES block of a Nexus file: an optional TRANSLATE table
/// followed by TREE / UTREE statements. Statements may span lines; bracket
/// comments and rooting annotations are stripped.
pub(crate) fn parse_nexus(raw: &str) -> Result<Vec<Tree>> {
    let mut trees = Vec::new();
    let mut translate: HashMap<String, String> = HashMap::new();
    let mut in_trees_block = false;

    // The #NEXUS header is not ';'-terminated; drop it so it cannot glue
    // onto the first real statement.
    let body = raw.trim_start();
    let body = if body.len() >= 6 && body[..6].eq_ignore_ascii_case("#NEXUS") {
        &body[6..]
    } else {
        body
    };

    for statement in statements(body) {
        let upper = statement.to_ascii_uppercase();

        if upper.starts_with("BEGIN TREES") {
            in_trees_block = true;
            continue;
        }
        if upper.starts_with("END") {
            in_trees_block = false;
            continue;
        }
        if !in_trees_block {
            continue;
        }

        if upper.starts_with("TRANSLATE") {
            translate = parse_translate(&statement);
            continue;
        }

        if upper.starts_with("TREE ") || upper.starts_with("UTREE ") {
            match split_tree_statement(&statement) {
                Ok((label, newick)) => {
                    trees.push(build_tree(trees.len(), label, &newick, &translate)?);
                }
                Err(err) => warn!("skipping malformed tree statement: {err}"),
            }
        }
    }

    Ok(trees)
}

/// Split a Nexus body into `;`-terminated statements with bracket comments
/// removed and whitespace collapsed.
fn statements(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut comment_depth = 0usize;

    for ch in raw.chars() {
        match ch {
            '[' => comment_depth += 1,
            ']' => comment_depth = comment_depth.saturating_sub(1),
            ';' if comment_depth == 0 => {
                let trimmed = current.trim().to_owned();
                if !trimmed.is_empty() {
                    out.push(trimmed);
                }
                current.clear();
            }
            _ if comment_depth == 0 => {
                if ch.is_whitespace() {
                    if !current.ends_with(' ') && !current.is_empty() {
                        current.push(' ');
                    }
                } else {
                    current.push(ch);
                }
            }
            _ => {}
        }
    }
    out
}

/// TRANSLATE maps short tokens (usually numbers) to taxon names:
/// `TRANSLATE 1 Homo_sapiens, 2 Pan_troglodytes`.
fn parse_translate(statement: &str) -> HashMap<String, String> {
    let body = &statement["TRANSLATE".len()..];
    let mut table = HashMap::new();
    for entry in body.split(',') {
        let mut parts = entry.split_whitespace();
        if let (Some(token), Some(name)) = (parts.next(), parts.next()) {
            table.insert(
                token.to_owned(),
                name.trim_matches('\'').trim_matches('"').to_owned(),
            );
        }
    }
    table
}

/// Split `TREE name = (...)` into its label and Newick payload.
fn split_tree_statement(statement: &str) -> Result<(Option<String>, String)> {
    let body = statement
        .splitn(2, ' ')
        .nth(1)
        .ok_or_else(|| anyhow!("missing tree body: {statement}"))?;

    let mut parts = body.splitn(2, '=');
    let label_part = parts
        .next()
        .ok_or_else(|| anyhow!("missing tree identifier: {statement}"))?;
    let payload = parts
        .next()
        .ok_or_else(|| anyhow!("missing tree definition: {statement}"))?
        .trim();

    let label = {
        let cleaned = label_part.trim().trim_start_matches('*').trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.trim_matches('\'').trim_matches('"').to_owned())
        }
    };

    // Whitespace introduced by statement joining is meaningless outside
    // quoted taxon names; drop it so the Newick parser sees a clean string.
    let mut newick = String::with_capacity(payload.len() + 1);
    let mut in_quote = false;
    for ch in payload.trim().trim_end_matches(';').chars() {
        if ch == '\'' {
            in_quote = !in_quote;
        }
        if in_quote || !ch.is_whitespace() {
            newick.push(ch);
        }
    }
    newick.push(';');
    Ok((label, newick))
}

fn build_tree(
    index: usize,
    label: Option<String>,
    newick: &str,
    translate: &HashMap<String, String>,
) -> Result<Tree> {
    let phylo = PhyloTree::from_newick(newick)
        .map_err(|err| anyhow!("failed to parse newick tree {index}: {err}"))?;
    let canonical_newick = phylo
        .to_formatted_newick(NewickFormat::NoComments)
        .unwrap_or_else(|_| newick.to_owned());

    let mut tree = Tree::new(index, label, canonical_newick, phylo);
    if !translate.is_empty() {
        for node in &mut tree.nodes {
            if let Some(name) = &node.name {
                if let Some(full) = translate.get(name) {
                    node.name = Some(full.clone());
                }
            }
        }
    }
    Ok(tree)
}
