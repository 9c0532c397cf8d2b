//! Code generation writer
//!
//! One file per table, containing:
//!
//! - the record struct with `ActiveValue` fields, its accessors and a `META`
//!   constant describing the table
//! - a `TableRecord` impl reporting assigned and null fields
//! - `<Type>SqlBuilder`, one function per operation returning statement text
//! - `<Type>Mapper`, the accessor trait a persistence layer implements
//! - one enum per enum-like column comment

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use daoforge::naming::camel_case;
use daoforge::{EnumCodeType, EnumShape, Operation, ParameterKind, RecordField, ReturnShape, StatementKind, TableArtifacts};
use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use crate::error::{CodegenError, Result};
use crate::idents::{host_type, parameter_type, snake_ident, to_snake_case};

const HEADER: &str = "// Generated by daoforge-codegen\n// This file is generated - do not edit manually\n\n";

pub struct TableWriter {
    format: bool,
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-table emission state
struct Emitter<'a> {
    artifacts: &'a TableArtifacts,
    ty: Ident,
}

impl<'a> Emitter<'a> {
    fn new(artifacts: &'a TableArtifacts) -> Result<Self> {
        let type_name = &artifacts.record.type_name;
        let ty = crate::idents::ident(type_name).map_err(|reason| emit_error(artifacts, type_name, reason))?;
        Ok(Self { artifacts, ty })
    }

    fn error(&self, item: &str, reason: String) -> CodegenError {
        emit_error(self.artifacts, item, reason)
    }

    fn snake(&self, name: &str) -> Result<Ident> {
        snake_ident(name).map_err(|reason| self.error(name, reason))
    }

    fn field_type(&self, field: &RecordField) -> Result<syn::Type> {
        host_type(field.host, field.nullable).map_err(|reason| self.error(&field.name, reason))
    }

    /// Record one inherent method name; two accessors with the same name would
    /// not compile.
    fn claim_method(&self, methods: &mut HashMap<String, String>, method: &Ident, field: &str) -> Result<()> {
        let name = method.to_string().trim_start_matches("r#").to_string();
        if let Some(first) = methods.get(&name) {
            return Err(self.error(
                field,
                format!("accessor `{}` collides with the one generated for field `{}`", name, first),
            ));
        }
        methods.insert(name, field.to_string());
        Ok(())
    }

    fn meta(&self) -> TokenStream {
        let table = self.artifacts.table.id().qualified();
        let columns = self.artifacts.record.fields.iter().map(|f| {
            let name = &f.column;
            let field = &f.name;
            quote! { ColumnMeta { name: #name, field: #field } }
        });
        let primary_key = self.artifacts.table.primary_key().column_names();
        let auto_increment = match self.artifacts.table.auto_increment_column() {
            Some(column) => {
                let name = &column.name;
                quote! { Some(#name) }
            }
            None => quote! { None },
        };
        quote! {
            pub const META: TableMeta<'static> = TableMeta {
                table: #table,
                columns: &[#(#columns),*],
                primary_key: &[#(#primary_key),*],
                auto_increment: #auto_increment,
            };
        }
    }

    fn record(&self) -> Result<TokenStream> {
        let ty = &self.ty;
        let meta = self.meta();
        let mut fields = Vec::new();
        let mut accessors = Vec::new();
        let mut assigned = Vec::new();
        let mut nulls = Vec::new();
        let mut methods = HashMap::new();

        for (position, field) in self.artifacts.record.fields.iter().enumerate() {
            let name = self.snake(&field.name)?;
            let field_ty = self.field_type(field)?;
            let doc = field.comment.as_deref().map(|c| {
                let c = format!(" {}", c);
                quote! { #[doc = #c] }
            });
            let attributes = field
                .attributes
                .iter()
                .map(|a| a.parse::<TokenStream>().map_err(|e| self.error(&field.name, e.to_string())))
                .collect::<Result<Vec<_>>>()?;
            fields.push(quote! {
                #doc
                #(#attributes)*
                pub #name: ActiveValue<#field_ty>,
            });

            let setter = format_ident!("set_{}", name);
            self.claim_method(&mut methods, &name, &field.name)?;
            self.claim_method(&mut methods, &setter, &field.name)?;
            let flag = match &field.dirty_flag {
                Some(flag) => {
                    let flag = self.snake(flag)?;
                    self.claim_method(&mut methods, &flag, &field.name)?;
                    Some(quote! {
                        pub fn #flag(&self) -> bool {
                            self.#name.is_set()
                        }
                    })
                }
                None => None,
            };
            accessors.push(quote! {
                pub fn #name(&self) -> Option<&#field_ty> {
                    self.#name.as_value()
                }

                pub fn #setter(&mut self, value: #field_ty) -> &mut Self {
                    self.#name = ActiveValue::Set(value);
                    self
                }

                #flag
            });

            let position = Literal::usize_unsuffixed(position);
            assigned.push(quote! {
                if self.#name.is_set() {
                    fields.insert(#position);
                }
            });
            let null_check = if field.nullable {
                quote! { self.#name.is_null() }
            } else {
                quote! { self.#name.is_not_set() }
            };
            nulls.push(quote! { #position => #null_check, });
        }

        Ok(quote! {
            #[derive(Debug, Clone, Default, PartialEq)]
            pub struct #ty {
                #(#fields)*
            }

            impl #ty {
                #meta

                #(#accessors)*
            }

            impl TableRecord for #ty {
                fn assigned_fields(&self) -> FieldSet {
                    let mut fields = FieldSet::new();
                    #(#assigned)*
                    fields
                }

                fn is_null(&self, position: usize) -> bool {
                    match position {
                        #(#nulls)*
                        _ => true,
                    }
                }
            }
        })
    }

    fn param_ident(&self, op: &Operation, kind: impl Fn(&ParameterKind) -> bool) -> Result<Ident> {
        let param = op
            .parameters()
            .iter()
            .find(|p| kind(&p.kind))
            .ok_or_else(|| self.error(&op.name, "missing parameter".to_string()))?;
        self.snake(&param.name)
    }

    fn builder_method(&self, op: &Operation, sql: Option<&str>) -> Result<TokenStream> {
        let ty = &self.ty;
        let t = &op.template;
        let method = self.snake(&op.name)?;
        let doc = sql.map(|s| {
            let s = format!(" `{}`", s);
            quote! { #[doc = #s] }
        });
        let key = &t.key_columns;
        let keys = quote! { &[#(#key),*] };
        let collection = t.collection.as_deref().unwrap_or_default();
        let paging = t.paging_enabled;

        let retrieve = || self.param_ident(op, |k| matches!(k, ParameterKind::RetrieveColumns));
        let ordering = || -> Result<(TokenStream, TokenStream)> {
            if t.ordering_enabled {
                let order_by = self.param_ident(op, |k| matches!(k, ParameterKind::OrderBy))?;
                Ok((quote! { #order_by: &[OrderBy], }, quote! { #order_by }))
            } else {
                Ok((TokenStream::new(), quote! { &[] }))
            }
        };

        let (params, body) = match t.kind {
            StatementKind::Insert | StatementKind::InsertUseGeneratedKeys => {
                let record = self.param_ident(op, |k| matches!(k, ParameterKind::Record))?;
                (
                    quote! { #record: &#ty },
                    quote! { render::insert(&#ty::META, &#record.assigned_fields()) },
                )
            }
            StatementKind::BatchInsert => {
                let list = self.param_ident(op, |k| matches!(k, ParameterKind::RecordList))?;
                (
                    quote! { #list: &[#ty] },
                    quote! { render::batch_insert(&#ty::META, #collection, #list.len()) },
                )
            }
            StatementKind::BatchInsertUseGeneratedKeys => {
                let list = self.param_ident(op, |k| matches!(k, ParameterKind::RecordList))?;
                (
                    quote! { #list: &[#ty] },
                    quote! { render::batch_insert_use_generated_keys(&#ty::META, #collection, #list) },
                )
            }
            StatementKind::Update => {
                let record = self.param_ident(op, |k| matches!(k, ParameterKind::Record))?;
                let parameter = &t.record_parameter;
                let excluded = &t.excluded_columns;
                (
                    quote! { #record: &#ty },
                    quote! {
                        render::update(&#ty::META, &#record.assigned_fields(), #parameter, #keys, &[#(#excluded),*])
                    },
                )
            }
            StatementKind::Delete => (TokenStream::new(), quote! { render::delete(&#ty::META, #keys) }),
            StatementKind::Count => (TokenStream::new(), quote! { render::count(&#ty::META, #keys) }),
            StatementKind::Select | StatementKind::SelectForUpdate => {
                let retrieve = retrieve()?;
                let (order_param, order_arg) = ordering()?;
                let for_update = t.locking_enabled;
                (
                    quote! { #order_param #retrieve: &[&str] },
                    quote! {
                        render::select(
                            &#ty::META,
                            &SelectSpec {
                                key: #keys,
                                retrieve: #retrieve,
                                order_by: #order_arg,
                                paging: #paging,
                                for_update: #for_update,
                            },
                        )
                    },
                )
            }
            StatementKind::BatchSelect => {
                let retrieve = retrieve()?;
                (
                    quote! { len: usize, #retrieve: &[&str] },
                    quote! { render::batch_select(&#ty::META, #keys, #collection, len, #retrieve) },
                )
            }
            StatementKind::SelectOneByExample | StatementKind::SelectListByExample => {
                let example = self.param_ident(op, |k| matches!(k, ParameterKind::Example))?;
                let retrieve = retrieve()?;
                let (order_param, order_arg) = ordering()?;
                (
                    quote! { #example: &str, #order_param #retrieve: &[&str] },
                    quote! { render::select_by_example(&#ty::META, #retrieve, #example, #order_arg, #paging) },
                )
            }
            StatementKind::CountByExample => {
                let example = self.param_ident(op, |k| matches!(k, ParameterKind::Example))?;
                (
                    quote! { #example: &str },
                    quote! { render::count_by_example(&#ty::META, #example) },
                )
            }
        };

        Ok(quote! {
            #doc
            pub fn #method(#params) -> RenderResult {
                #body
            }
        })
    }

    fn sql_builder(&self) -> Result<TokenStream> {
        let builder = format_ident!("{}SqlBuilder", self.ty);
        let preview = self.artifacts.preview();
        let methods = self
            .artifacts
            .operations
            .iter()
            .map(|op| {
                let sql = preview
                    .iter()
                    .find(|(name, _)| *name == op.name)
                    .and_then(|(_, sql)| sql.as_deref().ok());
                self.builder_method(op, sql)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(quote! {
            /// Statement text for each operation. Placeholders are `#{name}`.
            pub struct #builder;

            impl #builder {
                #(#methods)*
            }
        })
    }

    fn parameter_type(&self, op: &Operation, kind: &ParameterKind) -> Result<TokenStream> {
        let ty = &self.ty;
        let host = |host| parameter_type(host).map_err(|reason| self.error(&op.name, reason));
        Ok(match kind {
            ParameterKind::Key { host: h, .. } => host(*h)?,
            ParameterKind::Record => quote! { &#ty },
            ParameterKind::RecordList => quote! { &[#ty] },
            ParameterKind::KeyList { host: h, .. } => {
                let item = host_type(*h, false).map_err(|reason| self.error(&op.name, reason))?;
                quote! { &[#item] }
            }
            ParameterKind::Offset | ParameterKind::RowCount => quote! { u64 },
            ParameterKind::RetrieveColumns => quote! { &[&str] },
            ParameterKind::OrderBy => quote! { &[OrderBy] },
            ParameterKind::Example => quote! { &str },
        })
    }

    fn mapper(&self) -> Result<TokenStream> {
        let ty = &self.ty;
        let mapper = format_ident!("{}Mapper", ty);
        let mut methods = Vec::new();
        for op in &self.artifacts.operations {
            let method = self.snake(&op.name)?;
            let params = op
                .parameters()
                .iter()
                .map(|p| {
                    let name = self.snake(&p.name)?;
                    let param_ty = self.parameter_type(op, &p.kind)?;
                    Ok(quote! { #name: #param_ty })
                })
                .collect::<Result<Vec<_>>>()?;
            let returns = match op.returns() {
                ReturnShape::Record => quote! { Option<#ty> },
                ReturnShape::RecordList => quote! { Vec<#ty> },
                ReturnShape::RowCount | ReturnShape::Count => quote! { u64 },
            };
            let doc = format!(" `{}`", op.template);
            methods.push(quote! {
                #[doc = #doc]
                fn #method(&mut self, #(#params),*) -> Result<#returns, Self::Error>;
            });
        }

        Ok(quote! {
            /// Data access operations over the table
            pub trait #mapper {
                type Error;

                #(#methods)*
            }
        })
    }

    fn enum_type(&self, shape: &EnumShape) -> Result<TokenStream> {
        let name = crate::idents::ident(&shape.type_name).map_err(|reason| self.error(&shape.type_name, reason))?;
        let code_ty = format_ident!("{}", shape.code_type.rust_type());

        let mut seen = HashSet::new();
        let mut variants = Vec::new();
        for element in &shape.elements {
            let variant = camel_case(&element.name, '_', true)?;
            if !seen.insert(variant.clone()) {
                return Err(self.error(
                    &shape.type_name,
                    format!("elements map to the same variant `{}`", variant),
                ));
            }
            let variant = crate::idents::ident(&variant).map_err(|reason| self.error(&shape.type_name, reason))?;
            let code = match shape.code_type {
                EnumCodeType::Integer => i32::try_from(element.code)
                    .map(Literal::i32_unsuffixed)
                    .map_err(|e| self.error(&element.name, e.to_string()))?,
                EnumCodeType::Long => Literal::i64_unsuffixed(element.code),
            };
            variants.push((variant, code, element.description.as_str()));
        }

        let decls = variants.iter().map(|(v, code, description)| {
            let doc = format!(" {} ({})", description, code);
            quote! {
                #[doc = #doc]
                #v,
            }
        });
        let all = variants.iter().map(|(v, _, _)| quote! { Self::#v });
        let codes = variants.iter().map(|(v, code, _)| quote! { Self::#v => #code, });
        let descriptions = variants.iter().map(|(v, _, d)| quote! { Self::#v => #d, });
        let from_codes = variants.iter().map(|(v, code, _)| quote! { #code => Some(Self::#v), });
        let doc = format!(" Values of column `{}`", shape.column);

        Ok(quote! {
            #[doc = #doc]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum #name {
                #(#decls)*
            }

            impl #name {
                pub const ALL: &'static [Self] = &[#(#all),*];

                pub fn code(self) -> #code_ty {
                    match self {
                        #(#codes)*
                    }
                }

                pub fn description(self) -> &'static str {
                    match self {
                        #(#descriptions)*
                    }
                }

                pub fn from_code(code: #code_ty) -> Option<Self> {
                    match code {
                        #(#from_codes)*
                        _ => None,
                    }
                }
            }
        })
    }

    fn file(&self) -> Result<TokenStream> {
        let record = self.record()?;
        let builder = self.sql_builder()?;
        let mapper = self.mapper()?;
        let enums = self
            .artifacts
            .enums
            .iter()
            .map(|shape| self.enum_type(shape))
            .collect::<Result<Vec<_>>>()?;

        Ok(quote! {
            #![allow(unused_imports)]

            use daoforge::active_model::{ActiveValue, ColumnMeta, FieldSet, TableMeta, TableRecord};
            use daoforge::statement::render::{self, OrderBy, RenderResult, SelectSpec};

            #record

            #builder

            #mapper

            #(#enums)*
        })
    }
}

fn emit_error(artifacts: &TableArtifacts, item: &str, reason: String) -> CodegenError {
    CodegenError::Emit {
        table: artifacts.table.id().to_string(),
        item: item.to_string(),
        reason,
    }
}

impl TableWriter {
    pub fn new() -> Self {
        Self { format: true }
    }

    /// Skip `rustfmt`; output is a single token line per item
    pub fn without_formatting(mut self) -> Self {
        self.format = false;
        self
    }

    /// Module file name (without `.rs`) for a table
    pub fn module_name(artifacts: &TableArtifacts) -> String {
        to_snake_case(&artifacts.record.type_name)
    }

    /// Generate the complete source file for one table
    pub fn generate_table_code(&self, artifacts: &TableArtifacts) -> Result<String> {
        let code = Emitter::new(artifacts)?.file()?;
        Ok(format!("{}{}", HEADER, self.format_code(&code.to_string())))
    }

    /// `mod.rs` declaring and re-exporting every table module
    pub fn generate_mod_code(&self, artifacts: &[TableArtifacts]) -> String {
        let mut code = String::from(HEADER);
        for a in artifacts {
            code.push_str(&format!("pub mod {};\n", Self::module_name(a)));
        }
        code.push('\n');
        for a in artifacts {
            code.push_str(&format!("pub use {}::*;\n", Self::module_name(a)));
        }
        code
    }

    /// Write one file per table plus `mod.rs` into `output`.
    ///
    /// Every table is generated before anything is written, so an emit error
    /// leaves `output` untouched.
    pub fn write_all(&self, artifacts: &[TableArtifacts], output: &Path) -> Result<Vec<PathBuf>> {
        let files = artifacts
            .iter()
            .map(|a| Ok((Self::module_name(a), self.generate_table_code(a)?)))
            .collect::<Result<Vec<_>>>()?;

        fs::create_dir_all(output)?;
        let mut written = Vec::with_capacity(files.len() + 1);
        for (module, code) in files {
            let path = output.join(format!("{}.rs", module));
            fs::write(&path, code)?;
            log::info!("generated {}", path.display());
            written.push(path);
        }
        let path = output.join("mod.rs");
        fs::write(&path, self.generate_mod_code(artifacts))?;
        written.push(path);
        Ok(written)
    }

    fn format_code(&self, code: &str) -> String {
        if !self.format {
            return code.to_string();
        }
        match rustfmt(code) {
            Ok(formatted) => formatted,
            Err(e) => {
                log::debug!("rustfmt unavailable, writing unformatted code: {}", e);
                code.to_string()
            }
        }
    }
}

/// Format Rust code using rustfmt
fn rustfmt(code: &str) -> std::io::Result<String> {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new("rustfmt")
        .args(["--edition", "2021", "--emit", "stdout"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(code.as_bytes())?;
        stdin.flush()?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }
    String::from_utf8(output.stdout).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
