use crate::config::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color, Table as ComfyTable};
use connector_core::{options, ConnectorConfig, Schema};
use connector_planner::PartitionDefinition;
use connector_rest::{
    find_partitions, get_schema, random_backend, random_backend_from_config, Transport,
};
use std::sync::Arc;
use std::time::Instant;

pub fn describe_schema(
    transport: &dyn Transport,
    config: &ConnectorConfig,
    output: OutputFormat,
) -> Result<()> {
    println!(
        "{} Fetching schema of {}",
        "→".bright_blue(),
        config
            .get_or(options::STARROCKS_TABLE_IDENTIFIER, "")
            .bright_cyan()
    );

    let schema = get_schema(transport, config)?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
        OutputFormat::Table => {
            println!("{}", render_schema(&schema));
            println!("{} {} columns", "✓".bright_green(), schema.len());
        }
    }
    Ok(())
}

pub fn plan_scan(
    transport: &dyn Transport,
    config: ConnectorConfig,
    output: OutputFormat,
) -> Result<()> {
    let start = Instant::now();
    println!(
        "{} Planning scan of {}",
        "→".bright_blue(),
        config
            .get_or(options::STARROCKS_TABLE_IDENTIFIER, "")
            .bright_cyan()
    );

    let partitions = find_partitions(transport, &Arc::new(config))?;
    let elapsed = start.elapsed();

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&partitions)?),
        OutputFormat::Table => {
            println!("{}", render_partitions(&partitions));
            println!(
                "{} {} partitions, {} tablets",
                "✓".bright_green(),
                partitions.len(),
                partitions.iter().map(|p| p.tablet_ids().len()).sum::<usize>()
            );
        }
    }
    println!(
        "{} {:.2}ms",
        "Planning time:".bright_yellow(),
        elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

pub fn pick_backend(
    transport: &dyn Transport,
    config: &ConnectorConfig,
    from_config: bool,
) -> Result<()> {
    let backend = if from_config {
        random_backend_from_config(config)?
    } else {
        random_backend(transport, config)?
    };
    println!("{}", backend);
    Ok(())
}

/// Column listing, one row per field.
pub fn render_schema(schema: &Schema) -> ComfyTable {
    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Yellow),
        Cell::new("Size").fg(Color::Green),
        Cell::new("Aggregation").fg(Color::Magenta),
        Cell::new("Comment").fg(Color::White),
    ]);

    for field in schema.fields() {
        table.add_row(vec![
            field.name().to_string(),
            field.data_type().to_string(),
            format!("{},{}", field.precision(), field.scale()),
            field.aggregation_type().unwrap_or("").to_string(),
            field.comment().to_string(),
        ]);
    }
    table
}

/// Partition listing in planning order.
pub fn render_partitions(partitions: &[PartitionDefinition]) -> ComfyTable {
    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Backend").fg(Color::Yellow),
        Cell::new("Tablets").fg(Color::Green),
    ]);

    for (i, partition) in partitions.iter().enumerate() {
        let tablets: Vec<String> = partition
            .tablet_ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        table.add_row(vec![
            i.to_string(),
            partition.be_address().to_string(),
            tablets.join(","),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use connector_core::Field;
    use std::collections::BTreeSet;

    fn rows(table: &ComfyTable) -> Vec<Vec<String>> {
        table
            .row_iter()
            .map(|row| row.cell_iter().map(|cell| cell.content()).collect())
            .collect()
    }

    fn header(table: &ComfyTable) -> Vec<String> {
        table
            .header()
            .map(|row| row.cell_iter().map(|cell| cell.content()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_render_schema() {
        let schema = Schema::new(
            200,
            vec![
                Field::new("k1", "INT").with_comment("key"),
                Field::new("v1", "DECIMAL").with_size(10, 2),
            ],
        );
        let table = render_schema(&schema);

        assert_eq!(
            header(&table),
            vec!["Name", "Type", "Size", "Aggregation", "Comment"]
        );
        assert_eq!(
            rows(&table),
            vec![
                vec!["k1", "INT", "0,0", "", "key"],
                vec!["v1", "DECIMAL", "10,2", "", ""],
            ]
        );
        assert!(table.to_string().contains("DECIMAL"));
    }

    #[test]
    fn test_render_partitions() {
        let config = Arc::new(ConnectorConfig::new());
        let partitions = vec![
            PartitionDefinition::new(
                "db",
                "tbl",
                Arc::clone(&config),
                "be1:9060",
                BTreeSet::from([1, 3]),
                "tok",
            ),
            PartitionDefinition::new("db", "tbl", config, "be2:9060", BTreeSet::from([2]), "tok"),
        ];
        let table = render_partitions(&partitions);

        assert_eq!(header(&table), vec!["#", "Backend", "Tablets"]);
        assert_eq!(
            rows(&table),
            vec![vec!["0", "be1:9060", "1,3"], vec!["1", "be2:9060", "2"]]
        );
    }

    #[test]
    fn test_render_empty_table() {
        let table = render_partitions(&[]);
        assert!(rows(&table).is_empty());
        assert_eq!(header(&table).len(), 3);
    }
}
