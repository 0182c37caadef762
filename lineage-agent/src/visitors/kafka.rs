//! Kafka topics read through a `KafkaRelation` and written with
//! `df.write.format("kafka")`.
//!
//! Topics are namespaced by the first bootstrap server and named after the
//! topic itself.

use super::QueryPlanVisitor;
use crate::error::ExtractionError;
use crate::plan::{BaseRelation, LogicalPlan};
use crate::plan_utils::{kafka_dataset, kafka_namespace};
use lineage_types::Dataset;

const KAFKA_PROVIDER: &str = "kafka";
const BOOTSTRAP_SERVERS_OPTION: &str = "kafka.bootstrap.servers";
const TOPIC_OPTION: &str = "topic";

/// Input datasets of a Kafka read, one per subscribed topic.
pub struct KafkaRelationVisitor;

impl QueryPlanVisitor for KafkaRelationVisitor {
    fn name(&self) -> &str {
        "KafkaRelationVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        matches!(
            plan,
            LogicalPlan::LogicalRelation(r) if matches!(r.relation, BaseRelation::KafkaRelation { .. })
        )
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let LogicalPlan::LogicalRelation(relation) = plan else {
            return Ok(Vec::new());
        };
        let BaseRelation::KafkaRelation {
            bootstrap_servers,
            topics,
            schema,
        } = &relation.relation
        else {
            return Ok(Vec::new());
        };

        let Some(namespace) = kafka_namespace(bootstrap_servers) else {
            log::debug!("[VISITORS] Kafka relation without bootstrap servers, skipping");
            return Ok(Vec::new());
        };
        Ok(topics
            .iter()
            .map(|topic| kafka_dataset(&namespace, topic, schema))
            .collect())
    }
}

/// Output dataset of a Kafka write.
///
/// Writes that route rows by a `topic` column instead of the `topic` option
/// have no single target and yield nothing.
pub struct KafkaWriteVisitor;

impl QueryPlanVisitor for KafkaWriteVisitor {
    fn name(&self) -> &str {
        "KafkaWriteVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        matches!(
            plan,
            LogicalPlan::SaveIntoDataSourceCommand(cmd) if cmd.provider.eq_ignore_ascii_case(KAFKA_PROVIDER)
        )
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let LogicalPlan::SaveIntoDataSourceCommand(cmd) = plan else {
            return Ok(Vec::new());
        };

        let namespace = cmd
            .options
            .get(BOOTSTRAP_SERVERS_OPTION)
            .and_then(|servers| kafka_namespace(servers));
        let topic = cmd.options.get(TOPIC_OPTION).filter(|t| !t.trim().is_empty());

        match (namespace, topic) {
            (Some(namespace), Some(topic)) => Ok(vec![kafka_dataset(&namespace, topic, &cmd.query.schema())]),
            _ => {
                log::debug!("[VISITORS] Kafka write without bootstrap servers or topic option, skipping");
                Ok(Vec::new())
            }
        }
    }
}
