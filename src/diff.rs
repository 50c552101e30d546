//! Tree-aware unified diff.
//!
//! Unlike a textual diff, this traversal is tolerant of reordered siblings
//! and parent/child shape differences: children are matched by text within
//! each sibling group, shared sections are recursed into, and only the
//! differing subtrees are emitted. Same-text siblings (under parents that
//! allow duplicates) pair off by insertion order; surplus on either side
//! becomes `-`/`+` lines.
//!
//! Command order inside ACLs is not considered; ACLs where order matters
//! should carry sequence numbers.

use std::collections::HashMap;

use crate::tree::{ConfigTree, NodeRef};

/// Diff two trees into unified-diff style lines: `-` for subtrees only in
/// `a`, `+` for subtrees only in `b`, and unprefixed context lines for
/// shared sections with differing content.
pub fn unified_diff(a: &ConfigTree, b: &ConfigTree) -> Vec<String> {
    let mut out = Vec::new();
    diff_at(a.root(), b.root(), &mut out);
    out
}

fn diff_at(a: NodeRef<'_>, b: NodeRef<'_>, out: &mut Vec<String>) {
    // Pair same-text siblings by insertion order.
    let mut b_by_text: HashMap<&str, Vec<NodeRef<'_>>> = HashMap::new();
    for b_child in b.children() {
        b_by_text.entry(b_child.text()).or_default().push(b_child);
    }

    let mut a_occurrence: HashMap<&str, usize> = HashMap::new();
    for a_child in a.children() {
        let occurrence = a_occurrence.entry(a_child.text()).or_insert(0);
        let counterpart = b_by_text
            .get(a_child.text())
            .and_then(|matches| matches.get(*occurrence))
            .copied();
        *occurrence += 1;

        match counterpart {
            Some(b_child) => {
                let mut inner = Vec::new();
                diff_at(a_child, b_child, &mut inner);
                if !inner.is_empty() {
                    out.push(format!("{}{}", a_child.indentation(), a_child.text()));
                    out.append(&mut inner);
                }
            }
            None => emit_subtree(a_child, '-', out),
        }
    }

    let mut b_occurrence: HashMap<&str, usize> = HashMap::new();
    let a_counts: HashMap<&str, usize> =
        a_occurrence.iter().map(|(&text, &count)| (text, count)).collect();
    for b_child in b.children() {
        let occurrence = b_occurrence.entry(b_child.text()).or_insert(0);
        let unpaired = *occurrence >= a_counts.get(b_child.text()).copied().unwrap_or(0);
        *occurrence += 1;
        if unpaired {
            emit_subtree(b_child, '+', out);
        }
    }
}

fn emit_subtree(node: NodeRef<'_>, marker: char, out: &mut Vec<String>) {
    out.push(format!("{}{} {}", node.indentation(), marker, node.text()));
    for child in node.all_children_sorted() {
        out.push(format!("{}{} {}", child.indentation(), marker, child.text()));
    }
}
