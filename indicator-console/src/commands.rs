//! Console subcommands.

use anyhow::{bail, Context};
use tracing::warn;

use indicator_editor::{
    validate_edit, DimensionHint, EditSession, IndicatorGateway, IndicatorValueGrid,
    ReferenceData, SessionState,
};

/// Print the grid as an aligned table.
pub async fn show(
    gateway: &dyn IndicatorGateway,
    reference: &ReferenceData,
    indicator: &str,
) -> anyhow::Result<()> {
    let mut session = EditSession::new(indicator);
    session
        .open(gateway, reference)
        .await
        .with_context(|| format!("loading indicator {}", indicator))?;

    if let Some(grid) = session.grid() {
        let data_type = session
            .data_type()
            .map(|dt| dt.name.clone())
            .unwrap_or_else(|| grid.data_type_code.clone());
        println!("{} ({})", grid.indicator_name, data_type);
        if let Some(loaded_at) = session.loaded_at() {
            println!("loaded {}", loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        print_grid(grid);
    }
    Ok(())
}

fn print_grid(grid: &IndicatorValueGrid) {
    let mut header: Vec<&str> = vec!["fact"];
    header.extend(grid.dimension_columns.iter().map(String::as_str));
    header.push("value");
    println!("{}", header.join("\t"));

    for row in &grid.rows {
        let mut cells = vec![row.fact_id.clone()];
        for column in &grid.dimension_columns {
            cells.push(row.dimensions.get(column).cloned().unwrap_or_default());
        }
        cells.push(match row.value {
            Some(value) => value.to_string(),
            None => "(empty)".to_string(),
        });
        println!("{}", cells.join("\t"));
    }
}

fn parse_assignment(raw: &str) -> anyhow::Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((fact, value)) if !fact.trim().is_empty() => Ok((fact.trim(), value)),
        _ => bail!("expected FACT=VALUE, got {:?}", raw),
    }
}

/// Stage every assignment, then commit unless told otherwise.
pub async fn edit(
    gateway: &dyn IndicatorGateway,
    reference: &ReferenceData,
    indicator: &str,
    assignments: &[String],
    column: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut session = EditSession::new(indicator);
    session
        .open(gateway, reference)
        .await
        .with_context(|| format!("loading indicator {}", indicator))?;

    let mut rejected = 0;
    for raw in assignments {
        let (fact, value) = parse_assignment(raw)?;
        let verdict = session.stage_edit(fact, column, value)?;

        match (&verdict.error, &verdict.warning) {
            (Some(error), _) => {
                rejected += 1;
                println!("{}: rejected, {}", fact, error);
            }
            (None, Some(warning)) => println!("{}: staged ({})", fact, warning),
            (None, None) => println!("{}: staged", fact),
        }
    }

    if rejected > 0 {
        bail!("{} edit(s) rejected, nothing submitted", rejected);
    }

    if session.state() == SessionState::Clean {
        println!("No changes to submit");
        return Ok(());
    }

    if dry_run {
        println!("Dry run: {} pending edit(s) not submitted", session.pending_count());
        return Ok(());
    }

    match session.commit(gateway).await {
        Ok(summary) => {
            println!(
                "Committed {} value(s), {} previously empty",
                summary.updated, summary.new_rows
            );
            Ok(())
        }
        Err(e) => {
            warn!(pending = session.pending_count(), "Edits kept after failed commit");
            Err(e).context("submitting edits")
        }
    }
}

/// Validate one edit without touching the network.
pub fn validate(old: &str, text: &str, data_type: &str, hint: Option<&str>) -> anyhow::Result<()> {
    let old_value = match old.trim() {
        "-" | "" => None,
        raw => Some(
            raw.parse::<f64>()
                .with_context(|| format!("old value {:?} is not a number", raw))?,
        ),
    };

    let hint = match hint {
        Some(raw) => match DimensionHint::parse(raw) {
            Some(hint) => Some(hint),
            None => bail!("unknown hint {:?}", raw),
        },
        None => None,
    };

    let verdict = validate_edit(old_value, text, data_type, hint);
    match verdict.into_result()? {
        Some(warning) => println!("valid ({})", warning),
        None => println!("valid"),
    }
    Ok(())
}

pub async fn data_types(reference: &ReferenceData) -> anyhow::Result<()> {
    for data_type in reference.data_types().await? {
        println!("{}\t{}\t{}", data_type.id, data_type.code, data_type.name);
    }
    Ok(())
}

pub async fn units(reference: &ReferenceData) -> anyhow::Result<()> {
    for (group, units) in reference.units().await? {
        println!("{}", group);
        for unit in units {
            let symbol = unit.symbol.unwrap_or_default();
            println!("  {}\t{}\t{}\t{}", unit.id, unit.code, unit.name, symbol);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("f1=42").unwrap(), ("f1", "42"));
        assert_eq!(parse_assignment(" f1 = 4.5").unwrap(), ("f1", " 4.5"));
        assert!(parse_assignment("f1").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn test_validate_command() {
        assert!(validate("10", "5.5", "decimal", None).is_ok());
        assert!(validate("10", "5.5", "integer", None).is_err());
        assert!(validate("-", "1800", "decimal", Some("time")).is_err());
        assert!(validate("-", "2024", "decimal", Some("time")).is_ok());
        assert!(validate("-", "1", "decimal", Some("space")).is_err());
    }
}
