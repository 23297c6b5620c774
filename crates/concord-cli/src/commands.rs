use std::convert::Infallible;

use anyhow::Context;
use colored::Colorize;
use concord_engine::{AlignmentTable, Step};
use concord_sdk::{MergeStats, Reconciler};
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;
use crate::config::ConcordConfig;
use crate::record::{load_records, RecordSchema};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Merge(args) => cmd_merge(args, cli.format),
        Command::Plan(args) => cmd_plan(args, cli.format),
    }
}

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = ConcordConfig::for_merge(&args)?;
    let source = load_records(&args.source)?;
    let target = args.target.as_deref().map(load_records).transpose()?;
    debug!(key = %config.key, ordered = config.ordered, sources = source.len(), "merging records");

    let (records, stats) = merge_records(&config, &source, target)?;
    let rendered = match format {
        OutputFormat::Text => serde_json::to_string_pretty(&records)?,
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "stats": stats,
            "records": records,
        }))?,
    };
    match &args.output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{rendered}"),
    }

    eprintln!(
        "{} {} records: {} matched, {} created, {} moved, {} rescued, {} tombstoned, {} removed",
        "✓".green().bold(),
        stats.surviving().to_string().bold(),
        stats.matched + stats.replaced,
        stats.created.to_string().green(),
        stats.moved,
        stats.rescued,
        stats.tombstoned.to_string().yellow(),
        stats.removed.to_string().red(),
    );
    Ok(())
}

fn cmd_plan(args: PlanArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = ConcordConfig::for_plan(&args)?;
    let source = load_records(&args.source)?;
    let target = load_records(&args.target)?;
    let schema = RecordSchema::from_config(&config);
    let table = align(&schema, &source, &target);
    let steps = table.script();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&steps)?),
        OutputFormat::Text => {
            for step in &steps {
                match *step {
                    Step::Keep { source: i, .. } => {
                        println!("{} {}", "=".dimmed(), schema.describe(&source[i]))
                    }
                    Step::Insert { source: i } => {
                        println!("{} {}", "+".green(), schema.describe(&source[i]))
                    }
                    Step::Delete { target: j } => {
                        println!("{} {}", "-".red(), schema.describe(&target[j]))
                    }
                }
            }
        }
    }

    let kept = table.common_len();
    eprintln!(
        "{} kept, {} to insert, {} to delete",
        kept.to_string().bold(),
        (table.source_len() - kept).to_string().green(),
        (table.target_len() - kept).to_string().red(),
    );
    Ok(())
}

/// Reconcile `source` records into `target` as `config` describes.
pub(crate) fn merge_records(
    config: &ConcordConfig,
    source: &[Value],
    target: Option<Vec<Value>>,
) -> anyhow::Result<(Vec<Value>, MergeStats)> {
    let schema = RecordSchema::from_config(config);
    let mut reconciler = Reconciler::list(
        |s: &Value, t: &Value| Ok(schema.matches(s, t)),
        |s: Option<&Value>, t: Option<&mut Value>| schema.merge(s, t),
    )
    .options(config.merge.clone());

    let mut records = target.unwrap_or_default();
    let stats = if config.ordered {
        reconciler.merge_ordered(Some(source), &mut records)?
    } else {
        reconciler.merge_into(Some(source), &mut records)?
    };
    Ok((records, stats))
}

/// Line `source` up with `target` by key.
pub(crate) fn align(schema: &RecordSchema, source: &[Value], target: &[Value]) -> AlignmentTable {
    let table = AlignmentTable::build(source, target, |s: &Value, t: &Value| {
        Ok::<_, Infallible>(schema.matches(s, t))
    });
    match table {
        Ok(table) => table,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn write(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn unordered_merge_keeps_target_order() {
        let source = vec![json!({"id": 2, "v": "b"}), json!({"id": 3})];
        let target = vec![json!({"id": 1}), json!({"id": 2, "v": "old", "x": 0})];
        let (records, stats) =
            merge_records(&ConcordConfig::default(), &source, Some(target)).unwrap();
        assert_eq!(records, vec![json!({"id": 2, "v": "b", "x": 0}), json!({"id": 3})]);
        assert_eq!((stats.matched, stats.created, stats.removed), (1, 1, 1));
    }

    #[test]
    fn ordered_merge_follows_source_without_recreating() {
        let config = ConcordConfig {
            ordered: true,
            ..Default::default()
        };
        let source = vec![json!({"id": 2}), json!({"id": 1, "n": "x"})];
        let target = vec![json!({"id": 1, "keep": true}), json!({"id": 2})];
        let (records, stats) = merge_records(&config, &source, Some(target)).unwrap();
        assert_eq!(records, vec![json!({"id": 2}), json!({"id": 1, "keep": true, "n": "x"})]);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.surviving(), 2);
    }

    #[test]
    fn soft_delete_marks_missing_records() {
        let config = ConcordConfig {
            soft_delete: true,
            tombstone_field: "gone".into(),
            ..Default::default()
        };
        let source = vec![json!({"id": 1})];
        let target = vec![json!({"id": 1}), json!({"id": 2})];
        let (records, stats) = merge_records(&config, &source, Some(target)).unwrap();
        assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2, "gone": true})]);
        assert_eq!(stats.tombstoned, 1);
    }

    #[test]
    fn preserve_absent_leaves_missing_records_alone() {
        let mut config = ConcordConfig::default();
        config.merge.preserve_absent = true;
        let source = vec![json!({"id": 1})];
        let target = vec![json!({"id": 2})];
        let (records, _) = merge_records(&config, &source, Some(target)).unwrap();
        assert_eq!(records, vec![json!({"id": 2}), json!({"id": 1})]);
    }

    #[test]
    fn bad_record_surfaces_as_error() {
        let source = vec![json!("not a record")];
        let err = merge_records(&ConcordConfig::default(), &source, None).unwrap_err();
        assert!(format!("{err:#}").contains("not a JSON object"));
    }

    #[test]
    fn plan_lines_up_records() {
        let schema = RecordSchema::from_config(&ConcordConfig::default());
        let source = vec![json!({"id": "a"}), json!({"id": "b"})];
        let target = vec![json!({"id": "b"}), json!({"id": "c"})];
        let table = align(&schema, &source, &target);
        assert_eq!((table.source_len(), table.target_len(), table.common_len()), (2, 2, 1));
        assert_eq!(
            table.script(),
            vec![
                Step::Insert { source: 0 },
                Step::Keep { source: 1, target: 0 },
                Step::Delete { target: 1 },
            ]
        );
    }

    #[test]
    fn merge_command_writes_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(
            dir.path(),
            "source.json",
            json!([{"sku": "a", "qty": 2}, {"sku": "b"}]),
        );
        let target = write(dir.path(), "target.json", json!([{"sku": "a", "qty": 1}]));
        let output = dir.path().join("out.json");

        let cli = Cli {
            command: Command::Merge(MergeArgs {
                source,
                target: Some(target),
                key: Some("sku".into()),
                ordered: true,
                soft_delete: false,
                preserve_absent: false,
                config: None,
                output: Some(output.clone()),
            }),
            verbose: false,
            format: OutputFormat::Json,
        };
        run_command(cli).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let written: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(written["records"], json!([{"sku": "a", "qty": 2}, {"sku": "b"}]));
        assert_eq!(written["stats"]["matched"], 1);
        assert_eq!(written["stats"]["created"], 1);
    }

    #[test]
    fn missing_source_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            command: Command::Plan(PlanArgs {
                source: dir.path().join("nope.json"),
                target: dir.path().join("nope.json"),
                key: None,
                config: None,
            }),
            verbose: false,
            format: OutputFormat::Text,
        };
        let err = run_command(cli).unwrap_err();
        assert!(err.to_string().starts_with("reading"));
    }
}
