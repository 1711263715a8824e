// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - regenerate and print metadata.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::common::{PipelineArgs, Result};
use flvforge::{FlvRewriter, Properties, ScriptValue};

/// Print the metadata that a rewrite would write.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    /// Input FLV file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print only these keys (format: duration,keyframes)
    #[arg(long, value_name = "KEY,...", value_delimiter = ',')]
    keys: Vec<String>,

    /// Print the metadata object as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

impl InfoCmd {
    pub fn run(self, config: Option<&Path>, verbose: bool) -> Result<()> {
        let options = self.pipeline.to_options(config, verbose)?;
        let rewriter = FlvRewriter::new(options)?;
        let report = rewriter.info(&self.input)?;

        if self.json {
            let value = ScriptValue::AssociativeArray(report.metadata).to_json();
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        for line in render(&report.metadata, &self.keys) {
            println!("{line}");
        }
        Ok(())
    }
}

/// `key: value` lines, sorted by key, or only `keys` in the given order.
///
/// Selected Object values are expanded to one `key[sub]: value` line per
/// entry.
fn render(metadata: &Properties, keys: &[String]) -> Vec<String> {
    if keys.is_empty() {
        let mut all: Vec<(&str, &ScriptValue)> = metadata.iter().collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        return all
            .into_iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
    }

    let mut lines = Vec::new();
    for key in keys {
        match metadata.get(key) {
            Some(ScriptValue::Object(props)) => {
                for (sub, value) in props.iter() {
                    lines.push(format!("{key}[{sub}]: {value}"));
                }
            }
            Some(value) => lines.push(format!("{key}: {value}")),
            None => tracing::warn!(key = %key, "no such metadata key"),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Properties {
        Properties::new()
            .with("width", ScriptValue::Number(640.0))
            .with(
                "keyframes",
                ScriptValue::Object(
                    Properties::new()
                        .with("times", ScriptValue::OrderedList(vec![ScriptValue::Number(0.0)]))
                        .with(
                            "filepositions",
                            ScriptValue::OrderedList(vec![ScriptValue::Number(13.0)]),
                        ),
                ),
            )
            .with("duration", ScriptValue::Number(2.0))
    }

    #[test]
    fn test_render_sorted() {
        let lines = render(&sample(), &[]);
        assert_eq!(lines[0], "duration: 2");
        assert!(lines[1].starts_with("keyframes: {"));
        assert_eq!(lines[2], "width: 640");
    }

    #[test]
    fn test_render_selected_keys_expands_objects() {
        let keys = vec!["keyframes".to_string(), "width".to_string(), "nope".to_string()];
        let lines = render(&sample(), &keys);
        assert_eq!(
            lines,
            vec![
                "keyframes[times]: [0]".to_string(),
                "keyframes[filepositions]: [13]".to_string(),
                "width: 640".to_string(),
            ]
        );
    }
}
