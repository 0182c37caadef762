//! Helpers shared by the plan visitors: location normalization, catalog
//! location lookup with fallback, and dataset construction from a URI.

use crate::error::{AnalysisError, ExtractionError};
use crate::plan::{CatalogTable, StructType};
use lineage_types::{datasource_facet, schema_facet, Dataset};
use percent_encoding::percent_decode_str;
use url::Url;

/// Identifies this agent as the producer of events and facets.
pub const PRODUCER: &str = concat!(
    "https://crates.io/crates/lineage-agent/",
    env!("CARGO_PKG_VERSION")
);

/// Scheme assumed for locations recorded without one.
pub const DEFAULT_SCHEME: &str = "file";

/// Parse a location, treating a scheme-less path as a local file path.
///
/// Only the scheme and authority go through URI parsing. The remainder is
/// taken as a literal path, so characters such as `#`, `?`, `%` and spaces
/// stay part of it instead of starting a fragment or query.
pub fn normalize_location(raw: &str) -> Result<Url, ExtractionError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ExtractionError::InvalidLocation {
        location: raw.to_string(),
        reason,
    };

    let (base, path) = match split_scheme(trimmed) {
        Some((scheme, rest)) => match rest.strip_prefix("//") {
            Some(hierarchy) => {
                let (authority, path) = hierarchy
                    .find('/')
                    .map_or((hierarchy, ""), |at| hierarchy.split_at(at));
                (format!("{}://{}", scheme, authority), path)
            }
            // `file:/tmp/t` as written by some catalogs
            None => (format!("{}://", scheme), rest),
        },
        None => (format!("{}://", DEFAULT_SCHEME), trimmed),
    };

    let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("location has no hierarchical path".to_string()));
    }
    url.set_path(&path.replace('%', "%25"));
    Ok(url)
}

/// `(scheme, rest)` when the location starts with a URI scheme.
///
/// Single letters are not schemes so that `C:\data` stays a path.
fn split_scheme(location: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = location.split_once(':')?;
    let valid = scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}

/// The URI path with percent-escapes decoded, as the dataset name.
pub fn decoded_path(url: &Url) -> String {
    percent_decode_str(url.path())
        .decode_utf8()
        .map(|path| path.into_owned())
        .unwrap_or_else(|_| url.path().to_string())
}

/// Resolve where a catalog table lives.
///
/// The catalog location is tried first. When the engine cannot provide it (or
/// it does not parse) the qualified table name is used as a path instead. Only
/// when both fail is the table reported as unresolved.
pub fn resolve_table_location(table: &CatalogTable) -> Result<Url, ExtractionError> {
    let primary = match table.location() {
        Ok(location) => match normalize_location(location) {
            Ok(url) => return Ok(url),
            Err(e) => AnalysisError::new(e.to_string()),
        },
        Err(analysis) => analysis,
    };

    let qualified = table.qualified_name();
    log::warn!(
        "[VISITORS] Falling back to qualified name '{}' for table location: {}",
        qualified,
        primary
    );

    if qualified.trim().is_empty() {
        return Err(ExtractionError::LocationUnresolved {
            table: qualified,
            primary,
            fallback: "table has no name".to_string(),
        });
    }

    normalize_location(&qualified).map_err(|e| ExtractionError::LocationUnresolved {
        table: qualified.clone(),
        primary,
        fallback: e.to_string(),
    })
}

/// `scheme://authority` when the URI has an authority, otherwise just `scheme`.
pub fn namespace_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) if !host.is_empty() => format!("{}://{}:{}", url.scheme(), host, port),
        (Some(host), None) if !host.is_empty() => format!("{}://{}", url.scheme(), host),
        _ => url.scheme().to_string(),
    }
}

/// Build a dataset for a storage URI with `schema` and `dataSource` facets.
pub fn dataset_from_uri(url: &Url, schema: &StructType) -> Dataset {
    let namespace = namespace_of(url);
    let name = decoded_path(url);
    let source_uri = if namespace.contains("://") {
        namespace.clone()
    } else {
        format!("{}://", namespace)
    };

    Dataset::new(namespace.clone(), name)
        .with_facet("schema", schema_facet(PRODUCER, &schema.to_schema_fields()))
        .with_facet("dataSource", datasource_facet(PRODUCER, &namespace, &source_uri))
}

/// `kafka://host:port` of the first bootstrap server, if any is listed.
pub fn kafka_namespace(bootstrap_servers: &str) -> Option<String> {
    bootstrap_servers
        .split(',')
        .map(str::trim)
        .find(|server| !server.is_empty())
        .map(|server| format!("kafka://{}", server))
}

/// Dataset for a Kafka topic, with `schema` and `dataSource` facets.
pub fn kafka_dataset(namespace: &str, topic: &str, schema: &StructType) -> Dataset {
    Dataset::new(namespace, topic)
        .with_facet("schema", schema_facet(PRODUCER, &schema.to_schema_fields()))
        .with_facet("dataSource", datasource_facet(PRODUCER, namespace, namespace))
}

/// Merge `found` into `acc`, folding datasets that share an identity into one.
pub fn merge_datasets(acc: &mut Vec<Dataset>, found: Vec<Dataset>) {
    for dataset in found {
        match acc.iter_mut().find(|existing| existing.same_identity(&dataset)) {
            Some(existing) => existing.merge_facets(dataset.facets()),
            None => acc.push(dataset),
        }
    }
}
