//! Batch generation driver.
//!
//! Tables are processed one at a time with no shared naming state. A failing
//! table is recorded and skipped unless the configuration asks for
//! all-or-nothing, in which case the first failure ends the run and no
//! artifacts are returned.

use crate::accessor::{AccessorSynthesizer, Operation};
use crate::active_model::TableMetaBuf;
use crate::config::GeneratorConfig;
use crate::enum_comment::{EnumCommentParser, EnumShape};
use crate::error::{GenerationError, Result, StatementError};
use crate::record::{MetadataHook, RecordShape, RecordSynthesizer};
use crate::schema::Table;
use crate::statement::RenderArgs;
use crate::types::{MysqlTypeResolver, TypeResolver};

/// Everything produced for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArtifacts {
    pub table: Table,
    pub record: RecordShape,
    pub operations: Vec<Operation>,
    pub enums: Vec<EnumShape>,
}

impl TableArtifacts {
    pub fn meta(&self) -> TableMetaBuf {
        self.record.meta(&self.table)
    }

    /// Sample statement text per operation, rendered with
    /// [`RenderArgs::sample`]
    pub fn preview(&self) -> Vec<(String, std::result::Result<String, StatementError>)> {
        self.meta().with_meta(|meta| {
            let args = RenderArgs::sample(meta);
            self.operations
                .iter()
                .map(|op| (op.name.clone(), op.template.render(meta, &args)))
                .collect()
        })
    }
}

/// A table that produced no artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFailure {
    pub table: String,
    pub error: GenerationError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub artifacts: Vec<TableArtifacts>,
    pub failures: Vec<TableFailure>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Generator {
    config: GeneratorConfig,
    resolver: Box<dyn TypeResolver>,
    hook: Option<Box<dyn MetadataHook>>,
}

impl Generator {
    /// Generator with the MySQL type resolver
    pub fn new(config: GeneratorConfig) -> Self {
        let resolver = MysqlTypeResolver::new(config.bigint_unsigned);
        Self {
            config,
            resolver: Box::new(resolver),
            hook: None,
        }
    }

    pub fn with_resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_hook(mut self, hook: impl MetadataHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Synthesize record, operations and enums for one table
    pub fn generate(&self, table: &Table) -> Result<TableArtifacts> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("generate_table", table = %table.id()).entered();

        let naming = &self.config.naming;
        let mut records = RecordSynthesizer::new(naming, self.resolver.as_ref(), self.config.dirty_tracking);
        if let Some(hook) = &self.hook {
            records = records.with_hook(hook.as_ref());
        }
        let record = records.synthesize(table)?;
        let operations = AccessorSynthesizer::new(naming, self.config.ordering).synthesize(table, &record)?;

        let parser = EnumCommentParser::new(self.config.enum_comment_prefix.as_str());
        let mut enums = Vec::new();
        for field in &record.fields {
            if let Some(shape) = parser.shape(naming, &record.type_name, field)? {
                enums.push(shape);
            }
        }

        log::debug!(
            "generated {}: {} fields, {} operations, {} enums",
            table.id(),
            record.fields.len(),
            operations.len(),
            enums.len()
        );
        Ok(TableArtifacts {
            table: table.clone(),
            record,
            operations,
            enums,
        })
    }

    /// Generate every table handed over by the schema provider.
    ///
    /// Provider failures arrive as `Err` items and are reported like
    /// generation failures.
    pub fn generate_all<I>(&self, tables: I) -> GenerationReport
    where
        I: IntoIterator<Item = Result<Table>>,
    {
        let mut report = GenerationReport::default();
        for item in tables {
            let outcome = match item {
                Ok(table) => self.generate(&table).map_err(|e| (table.id().to_string(), e)),
                Err(e) => Err((provider_table(&e), e)),
            };
            match outcome {
                Ok(artifacts) => report.artifacts.push(artifacts),
                Err((table, error)) => {
                    log::warn!("skipping table {}: {}", table, error);
                    report.failures.push(TableFailure { table, error });
                    if self.config.all_or_nothing {
                        log::error!(
                            "all-or-nothing generation aborted; discarding {} generated tables",
                            report.artifacts.len()
                        );
                        report.artifacts.clear();
                        break;
                    }
                }
            }
        }
        log::info!(
            "generation finished: {} tables generated, {} failed",
            report.artifacts.len(),
            report.failures.len()
        );
        report
    }
}

/// Best-effort table name for an error raised before a table existed
fn provider_table(error: &GenerationError) -> String {
    match error {
        GenerationError::TableUnavailable { table, .. }
        | GenerationError::NameCollision { table, .. }
        | GenerationError::UnsupportedColumnType { table, .. }
        | GenerationError::InvalidLockingRequest { table, .. }
        | GenerationError::MissingGeneratedKey { table } => table.clone(),
        GenerationError::MalformedIdentifier { name, .. } => name.clone(),
        GenerationError::UnsupportedEnumCodeType { column, .. } | GenerationError::InvalidEnumComment { column, .. } => {
            column.clone()
        }
    }
}
