//! Turning synthesized names into Rust tokens.
//!
//! Record fields and operation names come out of the deriver in lower camel
//! case (`createTime`, `selectByPrimaryKey`). Emitted Rust uses snake case for
//! fields and methods, so the names are converted here. The camel-case names
//! remain the placeholder names inside statement text.

use daoforge::HostType;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::Type;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn", "else", "enum",
    "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "macro", "match", "mod",
    "move", "mut", "override", "priv", "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// `createTime` -> `create_time`
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Identifier for `name`, raw (`r#type`) when it is a keyword
pub fn ident(name: &str) -> Result<Ident, String> {
    if let Ok(ident) = syn::parse_str::<Ident>(name) {
        return Ok(ident);
    }
    if KEYWORDS.contains(&name) {
        return Ok(Ident::new_raw(name, Span::call_site()));
    }
    Err(format!("`{}` is not a valid Rust identifier", name))
}

/// Snake-case identifier for a camel-case name
pub fn snake_ident(name: &str) -> Result<Ident, String> {
    ident(&to_snake_case(name))
}

/// Field type as written in the record: the host type, wrapped in `Option`
/// when the column is nullable
pub fn host_type(host: HostType, nullable: bool) -> Result<Type, String> {
    let base: Type = syn::parse_str(host.rust_type()).map_err(|e| format!("type `{}`: {}", host.rust_type(), e))?;
    Ok(if nullable {
        syn::parse_quote!(Option<#base>)
    } else {
        base
    })
}

/// Type of a by-value parameter: `Copy` types by value, everything else borrowed
pub fn parameter_type(host: HostType) -> Result<TokenStream, String> {
    let base = host_type(host, false)?;
    Ok(match host {
        HostType::String => quote!(&str),
        HostType::Bytes => quote!(&[u8]),
        _ if host.is_copy() => quote!(#base),
        _ => quote!(&#base),
    })
}
