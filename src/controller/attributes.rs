//! Parsing of the attributes that mark up controllers.

use super::{HttpMethod, ParamSource};
use crate::metadata::SchemaAnnotation;
use syn::parse::ParseStream;
use syn::{Attribute, Ident, LitStr, Meta, Token};

/// Last path segment of the attribute, so `#[openapi::get]` reads as `get`.
fn name(attr: &Attribute) -> Option<String> {
    attr.path().segments.last().map(|s| s.ident.to_string())
}

pub(super) fn is_named(attr: &Attribute, expected: &str) -> bool {
    name(attr).as_deref() == Some(expected)
}

/// The string literal argument of `#[name("...")]`, if any.
fn string_arg(attr: &Attribute) -> Option<String> {
    match &attr.meta {
        Meta::List(_) => attr.parse_args::<LitStr>().ok().map(|lit| lit.value()),
        _ => None,
    }
}

/// `#[controller]` or `#[controller("/base")]`, yielding the base path.
pub(super) fn controller(attr: &Attribute) -> Option<String> {
    if !is_named(attr, "controller") {
        return None;
    }
    Some(string_arg(attr).unwrap_or_default())
}

/// A route attribute such as `#[get("/:id")]` or a bare `#[post]`.
pub(super) fn route(attr: &Attribute) -> Option<(HttpMethod, String)> {
    let method = HttpMethod::parse(&name(attr)?)?;
    Some((method, string_arg(attr).unwrap_or_default()))
}

/// The first string-valued method attribute called `attr_name`.
pub(super) fn string_attr(attrs: &[Attribute], attr_name: &str) -> Option<String> {
    attrs
        .iter()
        .filter(|attr| is_named(attr, attr_name))
        .find_map(string_arg)
}

/// Where a parameter is bound from, and its explicit name if one was given.
pub(super) fn param_source(attrs: &[Attribute]) -> Option<(ParamSource, Option<String>)> {
    attrs.iter().find_map(|attr| {
        let source = match name(attr)?.as_str() {
            "param" => ParamSource::Path,
            "query" => ParamSource::Query,
            "header" => ParamSource::Header,
            "body" => ParamSource::Body,
            _ => return None,
        };
        Some((source, string_arg(attr)))
    })
}

/// Parses `#[schema("Pet")]`, `#[schema(Pet)]`, `#[schema(id = "Pet")]` or
/// `#[schema(shape = r#"{...}"#)]`.
pub(super) fn schema_annotation(attr: &Attribute) -> syn::Result<SchemaAnnotation> {
    attr.parse_args_with(|input: ParseStream| {
        if input.peek(LitStr) {
            let id: LitStr = input.parse()?;
            return Ok(SchemaAnnotation::Id(id.value()));
        }

        let key: Ident = input.parse()?;
        if !input.peek(Token![=]) {
            return Ok(SchemaAnnotation::Id(key.to_string()));
        }
        input.parse::<Token![=]>()?;
        let value: LitStr = input.parse()?;

        match key.to_string().as_str() {
            "id" => Ok(SchemaAnnotation::Id(value.value())),
            "shape" => {
                let shape: serde_json::Value = serde_json::from_str(&value.value())
                    .map_err(|e| syn::Error::new(value.span(), format!("invalid shape: {}", e)))?;
                match shape.as_object().and_then(|o| o.get("id")).and_then(|id| id.as_str()) {
                    Some(id) => Ok(SchemaAnnotation::Id(id.to_string())),
                    None => Ok(SchemaAnnotation::Shape(shape)),
                }
            }
            other => Err(syn::Error::new(
                key.span(),
                format!("unknown schema key '{}', expected 'id' or 'shape'", other),
            )),
        }
    })
}
