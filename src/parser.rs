//! Loading configuration text into trees.
//!
//! Two grammars are supported, selected by the driver:
//! - **Indented** (Cisco style): whole-input substitutions run first, then
//!   lines are rewritten per-line, placed by indentation depth (with
//!   virtual indent adjustments), and trailing sectional-exit tokens are
//!   stripped. Multi-line banners collapse into a single node.
//! - **Set statements** (Junos style): braced blocks are converted to flat
//!   `set` statements, then each statement walks/creates a path of nodes;
//!   `delete` statements mark the reached leaf negated.
//!
//! Post-load callbacks from the driver run last, in declaration order.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use crate::driver::{ConfigSyntax, Driver};
use crate::error::{Error, Result};
use crate::tree::{ConfigTree, NodeId};

impl ConfigTree {
    /// Parse raw configuration text with a driver.
    pub fn parse(driver: Arc<Driver>, text: &str) -> Result<ConfigTree> {
        let mut config = ConfigTree::new(Arc::clone(&driver));
        match driver.syntax() {
            ConfigSyntax::SetStatements => {
                let statements = convert_to_set_statements(text);
                load_set_statements(&mut config, &statements)?;
            }
            ConfigSyntax::Indented => {
                let text = driver.apply_full_text_subs(text);
                load_indented(&mut config, &driver, &text)?;
                strip_sectional_exits(&mut config);
            }
        }
        for callback in driver.post_load_callbacks() {
            callback(&mut config);
        }
        Ok(config)
    }
}

// ============================================================================
// Indented grammar
// ============================================================================

fn load_indented(config: &mut ConfigTree, driver: &Driver, text: &str) -> Result<()> {
    let mut real_indent: HashMap<NodeId, i64> = HashMap::new();
    real_indent.insert(NodeId::ROOT, -1);

    let mut current_section = NodeId::ROOT;
    let mut most_recent = NodeId::ROOT;
    let mut indent_adjust: i64 = 0;
    let mut end_adjust: Vec<Regex> = Vec::new();

    let mut banner = BannerState::default();

    for (line_number, raw_line) in text.lines().enumerate() {
        let line_number = line_number + 1;

        // Fold banner bodies into one node.
        if banner.active {
            if raw_line != "!" {
                banner.lines.push(raw_line.to_string());
            }
            if banner.is_end(raw_line) {
                let text = banner.lines.join("\n");
                most_recent = config.add_child_if_absent(NodeId::ROOT, &text)?;
                real_indent.insert(most_recent, 0);
                current_section = NodeId::ROOT;
                banner.close();
            }
            continue;
        }
        if raw_line.starts_with("banner ") && raw_line != "banner motd ##" {
            banner.open(raw_line);
            continue;
        }

        // Normalize internal whitespace, keep leading indentation.
        let actual_indent = (raw_line.len() - raw_line.trim_start().len()) as i64;
        let words: Vec<&str> = raw_line.split_whitespace().collect();
        let normalized = format!(
            "{}{}",
            " ".repeat(actual_indent as usize),
            words.join(" ")
        );

        let line = driver.apply_per_line_subs(&normalized);
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        let indent = (line.len() - line.trim_start().len()) as i64 + indent_adjust;
        let line = line.trim_start();

        // Walk back up the tree.
        while indent <= real_indent[&current_section] {
            current_section = parent_of(config, current_section);
        }
        // Walk down the tree by one step.
        if indent > real_indent[&most_recent] {
            if most_recent != current_section
                && indent > real_indent[&most_recent] + driver.indentation() as i64
            {
                warn!(line_number, text = line, "indentation jumped more than one level");
            }
            current_section = most_recent;
        }

        most_recent = config.add_child_if_absent(current_section, line)?;
        real_indent.insert(most_recent, indent);

        // Virtual indent for grammars whose block bodies are not indented.
        for (start, end) in driver.indent_adjust_rules() {
            if start.is_match(line) {
                indent_adjust += 1;
                end_adjust.push(end.clone());
            }
        }
        if let Some(first_end) = end_adjust.first() {
            if first_end.is_match(line) {
                indent_adjust -= 1;
                end_adjust.remove(0);
            }
        }
    }

    if banner.active {
        return Err(Error::Parse {
            line: text.lines().count(),
            text: banner.lines.first().cloned().unwrap_or_default(),
            message: "banner never terminated".to_string(),
        });
    }
    Ok(())
}

fn parent_of(config: &ConfigTree, id: NodeId) -> NodeId {
    config
        .node_ref(id)
        .parent()
        .map(|p| p.id())
        .unwrap_or(NodeId::ROOT)
}

/// Remove trailing closing tokens (`exit`, `exit-address-family`, ...) that
/// duplicate what rendering re-derives from the sectional exiting rules.
fn strip_sectional_exits(config: &mut ConfigTree) {
    let mut deletions: Vec<NodeId> = Vec::new();
    for node in config.all_children() {
        if node.is_leaf() {
            continue;
        }
        let Some(exit_text) = config.sectional_exit_text(node) else {
            continue;
        };
        if let Some(last_child) = node.children().last() {
            if last_child.is_leaf() && last_child.text() == exit_text {
                deletions.push(last_child.id());
            }
        }
    }
    for id in deletions {
        config.delete(id);
    }
}

#[derive(Default)]
struct BannerState {
    active: bool,
    lines: Vec<String>,
    end_lines: BTreeSet<String>,
    end_contains: Vec<String>,
}

impl BannerState {
    fn open(&mut self, line: &str) {
        self.active = true;
        self.lines.push(line.to_string());
        self.end_lines.extend(["EOF", "%", "!"].map(String::from));
        if let Some(delimiter) = line.split_whitespace().nth(2) {
            self.end_contains.push(delimiter.to_string());
            // ArubaOS-style quoted banner delimiters
            if delimiter.starts_with('"') {
                self.end_contains.push("\"".to_string());
            }
            self.end_lines.insert(delimiter.chars().take(1).collect());
            self.end_lines.insert(delimiter.chars().take(2).collect());
        }
    }

    fn is_end(&self, line: &str) -> bool {
        line.starts_with('^')
            || self.end_lines.contains(line)
            || self.end_contains.iter().any(|c| line.contains(c))
    }

    fn close(&mut self) {
        self.active = false;
        self.lines.clear();
    }
}

// ============================================================================
// Set-statement grammar
// ============================================================================

/// Convert a braced Junos configuration into flat `set` statements. Input
/// already in statement form passes through unchanged.
fn convert_to_set_statements(raw: &str) -> Vec<(usize, String)> {
    let mut path: Vec<String> = Vec::new();
    let mut statements: Vec<(usize, String)> = Vec::new();

    for (line_number, line) in raw.lines().enumerate() {
        let line_number = line_number + 1;
        let mut stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') || stripped.starts_with('!') {
            continue;
        }
        stripped = stripped.trim_end_matches(';').trim_end();
        if stripped.is_empty() {
            continue;
        }

        // Block depth follows physical indentation (4 columns per level).
        let level = (line.len() - line.trim_start().len()) / 4;
        path.truncate(level);

        if stripped == "}" {
            continue;
        }
        if let Some(header) = stripped.strip_suffix('{') {
            path.push(header.trim().to_string());
        } else if stripped == "set"
            || stripped == "delete"
            || stripped.starts_with("set ")
            || stripped.starts_with("delete ")
        {
            statements.push((line_number, stripped.to_string()));
        } else if path.is_empty() {
            statements.push((line_number, format!("set {stripped}")));
        } else {
            statements.push((line_number, format!("set {} {stripped}", path.join(" "))));
        }
    }
    statements
}

fn load_set_statements(config: &mut ConfigTree, statements: &[(usize, String)]) -> Result<()> {
    for &(line_number, ref statement) in statements {
        let mut tokens = tokenize(statement).into_iter();
        let verb = tokens.next().unwrap_or_default();
        let negated = match verb.as_str() {
            "set" => false,
            "delete" => true,
            _ => {
                return Err(Error::Parse {
                    line: line_number,
                    text: statement.clone(),
                    message: "expected a set or delete statement".to_string(),
                })
            }
        };

        let mut cursor = NodeId::ROOT;
        let mut walked = false;
        for token in tokens {
            cursor = config.add_child_if_absent(cursor, &token)?;
            walked = true;
        }
        if !walked {
            return Err(Error::Parse {
                line: line_number,
                text: statement.clone(),
                message: "statement has no path".to_string(),
            });
        }
        if negated {
            config.set_negated(cursor, true);
        }
    }
    Ok(())
}

/// Split a statement on whitespace, keeping quoted strings atomic.
fn tokenize(statement: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    for c in statement.chars() {
        match c {
            '"' => {
                in_quote = !in_quote;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
