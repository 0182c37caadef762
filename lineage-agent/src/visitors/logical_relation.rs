//! Input datasets read through a `LogicalRelation`.
//!
//! File-based relations yield one dataset per root path. JDBC relations are
//! named after their table, namespaced by the connection URL. A relation backed
//! by a catalog table is identified by the table's location instead.

use super::QueryPlanVisitor;
use crate::error::ExtractionError;
use crate::plan::{BaseRelation, LogicalPlan, LogicalRelation};
use crate::plan_utils::{dataset_from_uri, normalize_location, resolve_table_location, PRODUCER};
use lineage_types::{datasource_facet, schema_facet, Dataset};

pub struct LogicalRelationVisitor;

impl LogicalRelationVisitor {
    fn relation_datasets(relation: &LogicalRelation) -> Result<Vec<Dataset>, ExtractionError> {
        if let Some(table) = &relation.catalog_table {
            let url = resolve_table_location(table)?;
            return Ok(vec![dataset_from_uri(&url, relation.relation.schema())]);
        }

        match &relation.relation {
            BaseRelation::HadoopFsRelation {
                root_paths,
                data_schema,
                ..
            } => root_paths
                .iter()
                .map(|path| normalize_location(path).map(|url| dataset_from_uri(&url, data_schema)))
                .collect(),
            BaseRelation::JdbcRelation { url, table, schema } => {
                let namespace = url.trim_start_matches("jdbc:").to_string();
                Ok(vec![Dataset::new(namespace.clone(), table.clone())
                    .with_facet("schema", schema_facet(PRODUCER, &schema.to_schema_fields()))
                    .with_facet("dataSource", datasource_facet(PRODUCER, &namespace, url))])
            }
            BaseRelation::KafkaRelation { .. } | BaseRelation::Other { .. } => Ok(Vec::new()),
        }
    }
}

impl QueryPlanVisitor for LogicalRelationVisitor {
    fn name(&self) -> &str {
        "LogicalRelationVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        match plan {
            LogicalPlan::LogicalRelation(r) => {
                r.catalog_table.is_some()
                    || matches!(
                        r.relation,
                        BaseRelation::HadoopFsRelation { .. } | BaseRelation::JdbcRelation { .. }
                    )
            }
            _ => false,
        }
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        match plan {
            LogicalPlan::LogicalRelation(relation) => Self::relation_datasets(relation),
            _ => Ok(Vec::new()),
        }
    }
}
