use super::QueryPlanVisitor;
use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use crate::plan_utils::{dataset_from_uri, normalize_location, PRODUCER};
use lineage_types::{output_statistics_facet, Dataset};

/// Output dataset of a file write (`df.write.save(path)` and file-format inserts).
pub struct InsertIntoHadoopFsRelationVisitor;

impl QueryPlanVisitor for InsertIntoHadoopFsRelationVisitor {
    fn name(&self) -> &str {
        "InsertIntoHadoopFsRelationVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        matches!(plan, LogicalPlan::InsertIntoHadoopFsRelationCommand(_))
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let LogicalPlan::InsertIntoHadoopFsRelationCommand(cmd) = plan else {
            return Ok(Vec::new());
        };

        let url = normalize_location(&cmd.output_path)?;
        let mut dataset = dataset_from_uri(&url, &cmd.query.schema());
        if let Some(metrics) = cmd.metrics {
            dataset = dataset.with_facet(
                "outputStatistics",
                output_statistics_facet(PRODUCER, metrics.num_output_rows, metrics.num_output_bytes),
            );
        }
        Ok(vec![dataset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::{file_scan, project};
    use crate::plan::{InsertIntoHadoopFsRelationCommand, SaveMode, WriteMetrics};

    #[test]
    fn test_output_path_and_query_schema() {
        let plan = LogicalPlan::InsertIntoHadoopFsRelationCommand(InsertIntoHadoopFsRelationCommand {
            output_path: "s3a://bucket/out".into(),
            file_format: "parquet".into(),
            catalog_table: None,
            query: Box::new(project(
                &[("word", "string"), ("count", "long")],
                file_scan("/in.txt", "text", &[("value", "string")]),
            )),
            mode: SaveMode::Overwrite,
            metrics: Some(WriteMetrics {
                num_output_rows: 7,
                num_output_bytes: None,
            }),
        });

        let datasets = InsertIntoHadoopFsRelationVisitor.apply(&plan).unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].namespace(), "s3a://bucket");
        assert_eq!(datasets[0].name(), "/out");

        let fields = datasets[0].facet("schema").and_then(|f| f.get("fields")).unwrap();
        assert_eq!(fields[1]["name"], "count");
        let stats = datasets[0].facet("outputStatistics").unwrap();
        assert_eq!(stats.get("rowCount").and_then(|v| v.as_i64()), Some(7));
        assert!(stats.get("size").is_none());
    }
}
