//! Plan builders for tests.

use super::*;

pub fn schema(cols: &[(&str, &str)]) -> StructType {
    StructType::new(cols.iter().map(|(n, t)| StructField::new(*n, *t)).collect())
}

pub fn file_scan(path: &str, format: &str, cols: &[(&str, &str)]) -> LogicalPlan {
    LogicalPlan::LogicalRelation(LogicalRelation {
        relation: BaseRelation::HadoopFsRelation {
            root_paths: vec![path.to_string()],
            data_schema: schema(cols),
            file_format: format.to_string(),
        },
        catalog_table: None,
    })
}

pub fn table(database: &str, name: &str, location: Option<&str>, cols: &[(&str, &str)]) -> CatalogTable {
    CatalogTable::new(Some(database), name, location, schema(cols))
}

pub fn project(cols: &[(&str, &str)], child: LogicalPlan) -> LogicalPlan {
    LogicalPlan::Project(Project {
        output: schema(cols),
        child: Box::new(child),
    })
}
