//! Reader for the subset of Gherkin the careers features use.
//!
//! Supported: `Feature`, `Background`, `Scenario`/`Example`, `Scenario Outline`
//! with `Examples` tables, `@tags`, `#` comments and `"""` doc strings.

use crate::error::{CareersError, Result};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub tags: Vec<String>,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    /// Feature tags followed by the scenario's own.
    pub tags: Vec<String>,
    pub line: usize,
    pub steps: Vec<StepText>,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t.trim_start_matches('@') == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepText {
    pub keyword: String,
    pub text: String,
    pub doc_string: Option<String>,
    pub line: usize,
}

const STEP_KEYWORDS: [&str; 6] = ["Given", "When", "Then", "And", "But", "*"];

#[derive(Debug, Default)]
struct Outline {
    name: String,
    tags: Vec<String>,
    line: usize,
    steps: Vec<StepText>,
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    in_examples: bool,
}

#[derive(Debug)]
enum Block {
    Preamble,
    Background,
    Scenario(usize),
    Outline(Outline),
}

struct FeatureBuilder {
    name: Option<String>,
    tags: Vec<String>,
    pending_tags: Vec<String>,
    background: Vec<StepText>,
    scenarios: Vec<Scenario>,
    block: Block,
}

pub fn load_feature(path: &Path) -> Result<Feature> {
    let text = std::fs::read_to_string(path)?;
    parse_feature(&text)
}

pub fn parse_feature(source: &str) -> Result<Feature> {
    let mut builder = FeatureBuilder {
        name: None,
        tags: Vec::new(),
        pending_tags: Vec::new(),
        background: Vec::new(),
        scenarios: Vec::new(),
        block: Block::Preamble,
    };

    let lines: Vec<&str> = source.lines().collect();
    let mut index = 0;
    while index < lines.len() {
        let line_no = index + 1;
        let raw = lines[index];
        let line = raw.trim();
        index += 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with("\"\"\"") || line.starts_with("```") {
            let (doc, next) = read_doc_string(&lines, index - 1)?;
            builder.attach_doc_string(doc, line_no)?;
            index = next;
            continue;
        }

        if line.starts_with('@') {
            builder
                .pending_tags
                .extend(line.split_whitespace().map(str::to_string));
            continue;
        }

        if let Some(rest) = line.strip_prefix("Feature:") {
            if builder.name.is_some() {
                return Err(feature_error(line_no, "only one Feature per file is supported"));
            }
            builder.name = Some(rest.trim().to_string());
            builder.tags = std::mem::take(&mut builder.pending_tags);
            continue;
        }

        if builder.name.is_none() {
            return Err(feature_error(line_no, "expected `Feature:` first"));
        }

        if line.starts_with("Background:") {
            builder.finish_block()?;
            builder.block = Block::Background;
            continue;
        }

        if let Some(rest) = strip_any(line, &["Scenario Outline:", "Scenario Template:"]) {
            builder.finish_block()?;
            builder.block = Block::Outline(Outline {
                name: rest.trim().to_string(),
                tags: builder.take_tags(),
                line: line_no,
                ..Default::default()
            });
            continue;
        }

        if let Some(rest) = strip_any(line, &["Scenario:", "Example:"]) {
            builder.finish_block()?;
            let scenario = Scenario {
                name: rest.trim().to_string(),
                tags: builder.take_tags(),
                line: line_no,
                steps: Vec::new(),
            };
            builder.scenarios.push(scenario);
            builder.block = Block::Scenario(builder.scenarios.len() - 1);
            continue;
        }

        if strip_any(line, &["Examples:", "Scenarios:"]).is_some() {
            match &mut builder.block {
                Block::Outline(outline) => outline.in_examples = true,
                _ => return Err(feature_error(line_no, "`Examples:` outside a Scenario Outline")),
            }
            continue;
        }

        if line.starts_with('|') {
            builder.add_table_row(line, line_no)?;
            continue;
        }

        if let Some((keyword, text)) = split_step(line) {
            builder.add_step(StepText {
                keyword: keyword.to_string(),
                text: text.to_string(),
                doc_string: None,
                line: line_no,
            })?;
            continue;
        }

        // Free-form description text under a header.
        if !builder.block_has_steps() {
            continue;
        }
        return Err(feature_error(line_no, &format!("unexpected line `{}`", line)));
    }

    builder.finish_block()?;
    builder.build()
}

impl FeatureBuilder {
    fn take_tags(&mut self) -> Vec<String> {
        let mut tags = self.tags.clone();
        tags.append(&mut self.pending_tags);
        tags
    }

    fn block_has_steps(&self) -> bool {
        match &self.block {
            Block::Preamble => false,
            Block::Background => !self.background.is_empty(),
            Block::Scenario(i) => !self.scenarios[*i].steps.is_empty(),
            Block::Outline(outline) => !outline.steps.is_empty(),
        }
    }

    fn add_step(&mut self, step: StepText) -> Result<()> {
        let line = step.line;
        match &mut self.block {
            Block::Preamble => Err(feature_error(line, "step outside a scenario")),
            Block::Background => {
                self.background.push(step);
                Ok(())
            }
            Block::Scenario(i) => {
                self.scenarios[*i].steps.push(step);
                Ok(())
            }
            Block::Outline(outline) if outline.in_examples => {
                Err(feature_error(line, "step after `Examples:`"))
            }
            Block::Outline(outline) => {
                outline.steps.push(step);
                Ok(())
            }
        }
    }

    fn last_step_mut(&mut self) -> Option<&mut StepText> {
        match &mut self.block {
            Block::Preamble => None,
            Block::Background => self.background.last_mut(),
            Block::Scenario(i) => self.scenarios[*i].steps.last_mut(),
            Block::Outline(outline) => outline.steps.last_mut(),
        }
    }

    fn attach_doc_string(&mut self, doc: String, line: usize) -> Result<()> {
        let step = self
            .last_step_mut()
            .ok_or_else(|| feature_error(line, "doc string without a step"))?;
        if step.doc_string.is_some() {
            return Err(feature_error(line, "step already has a doc string"));
        }
        step.doc_string = Some(doc);
        Ok(())
    }

    fn add_table_row(&mut self, line: &str, line_no: usize) -> Result<()> {
        let Block::Outline(outline) = &mut self.block else {
            return Err(feature_error(line_no, "data tables are only supported under Examples"));
        };
        if !outline.in_examples {
            return Err(feature_error(line_no, "data tables are only supported under Examples"));
        }
        let cells = table_cells(line);
        if let Some(header) = &outline.header {
            if header.len() != cells.len() {
                return Err(feature_error(
                    line_no,
                    &format!("row has {} cells, header has {}", cells.len(), header.len()),
                ));
            }
            outline.rows.push(cells);
        } else {
            outline.header = Some(cells);
        }
        Ok(())
    }

    fn finish_block(&mut self) -> Result<()> {
        let block = std::mem::replace(&mut self.block, Block::Preamble);
        if let Block::Outline(outline) = block {
            let header = match outline.header {
                Some(header) if !outline.rows.is_empty() => header,
                _ => {
                    return Err(feature_error(
                        outline.line,
                        "Scenario Outline needs an Examples table with at least one row",
                    ))
                }
            };
            for (n, row) in outline.rows.iter().enumerate() {
                let values: HashMap<&str, &str> = header
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().map(String::as_str))
                    .collect();
                let name = substitute(&outline.name, &values);
                let name = if name == outline.name {
                    format!("{} (example {})", outline.name, n + 1)
                } else {
                    name
                };
                let steps = outline
                    .steps
                    .iter()
                    .map(|step| StepText {
                        keyword: step.keyword.clone(),
                        text: substitute(&step.text, &values),
                        doc_string: step.doc_string.as_deref().map(|d| substitute(d, &values)),
                        line: step.line,
                    })
                    .collect();
                self.scenarios.push(Scenario {
                    name,
                    tags: outline.tags.clone(),
                    line: outline.line,
                    steps,
                });
            }
        }
        Ok(())
    }

    fn build(self) -> Result<Feature> {
        let name = self
            .name
            .ok_or_else(|| feature_error(1, "no `Feature:` found"))?;
        let background = self.background;
        let scenarios = self
            .scenarios
            .into_iter()
            .map(|mut scenario| {
                let mut steps = background.clone();
                steps.append(&mut scenario.steps);
                scenario.steps = steps;
                scenario
            })
            .collect();
        Ok(Feature {
            name,
            tags: self.tags,
            scenarios,
        })
    }
}

fn feature_error(line: usize, reason: &str) -> CareersError {
    CareersError::FeatureParse {
        line,
        reason: reason.to_string(),
    }
}

fn strip_any<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| line.strip_prefix(p))
}

fn split_step(line: &str) -> Option<(&str, &str)> {
    STEP_KEYWORDS.iter().find_map(|keyword| {
        let rest = line.strip_prefix(keyword)?;
        rest.starts_with(char::is_whitespace)
            .then(|| (*keyword, rest.trim()))
    })
}

fn table_cells(line: &str) -> Vec<String> {
    let inner = line.trim().trim_start_matches('|');
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn substitute(text: &str, values: &HashMap<&str, &str>) -> String {
    values.iter().fold(text.to_string(), |acc, (key, value)| {
        acc.replace(&format!("<{}>", key), value)
    })
}

/// Reads a doc string whose opening delimiter is at `start`; returns it and the
/// index of the first line after the closing delimiter.
fn read_doc_string(lines: &[&str], start: usize) -> Result<(String, usize)> {
    let opening = lines[start];
    let indent = opening.len() - opening.trim_start().len();
    let delimiter = if opening.trim_start().starts_with("```") {
        "```"
    } else {
        "\"\"\""
    };

    let mut body = Vec::new();
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        if line.trim() == delimiter {
            return Ok((body.join("\n"), start + offset + 2));
        }
        body.push(strip_indent(line, indent));
    }
    Err(feature_error(start + 1, "unterminated doc string"))
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let leading = line.len() - line.trim_start().len();
    &line[leading.min(indent)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_step_requires_space_after_keyword() {
        assert_eq!(split_step("Given a thing"), Some(("Given", "a thing")));
        assert_eq!(split_step("* a thing"), Some(("*", "a thing")));
        assert_eq!(split_step("Andrew said"), None);
    }

    #[test]
    fn test_table_cells() {
        assert_eq!(table_cells("| a | b c |"), vec!["a", "b c"]);
    }

    #[test]
    fn test_doc_string_indent_is_relative_to_delimiter() {
        let lines = ["    \"\"\"", "    first", "      second", "    \"\"\"", "after"];
        let (doc, next) = read_doc_string(&lines, 0).unwrap();
        assert_eq!(doc, "first\n  second");
        assert_eq!(next, 4);
    }
}
