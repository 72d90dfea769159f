// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement template parser
//!
//! Turns declarative template text into a dynamic SQL node tree. The
//! element vocabulary is the closed node set: `<if>`, `<choose>`/`<when>`/
//! `<otherwise>`, `<foreach>`, `<where>`, `<set>`, `<trim>`, `<bind>`.
//! Anything else fails the compile.
//!
//! Templates whose tree contains no dynamic node take the fast path: they
//! are rendered once here, at registration time, and become a
//! `StaticSqlSource` compiled per call only for descriptor resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::compile::marker;
use crate::compile::source::{DynamicSqlSource, SqlSource, StaticSqlSource};
use crate::error::CompileError;
use crate::sqlnode::{
    ChooseNode, ForEachNode, IfNode, MixedNode, RenderContext, SqlNode, StaticTextNode, TextNode,
    TrimNode, VarBindNode,
};
use crate::types::Value;

/// Parse a statement template into its node tree.
pub fn parse_template(template: &str) -> Result<Arc<dyn SqlNode>, CompileError> {
    let mut cursor = Cursor {
        input: template,
        pos: 0,
    };
    let children = parse_children(&mut cursor, None)?;
    Ok(Arc::new(MixedNode::new(children)))
}

/// Build the statement's `SqlSource`, choosing the static fast path when
/// nothing in the tree can vary between calls.
pub fn build_sql_source(template: &str) -> Result<Arc<dyn SqlSource>, CompileError> {
    let root = parse_template(template)?;
    if root.is_dynamic() {
        return Ok(Arc::new(DynamicSqlSource::new(root)));
    }
    // Static trees render identically for every argument; render once now.
    let mut ctx = RenderContext::new(&Value::Null);
    root.apply(&mut ctx)?;
    let (sql, _) = ctx.into_parts();
    Ok(Arc::new(StaticSqlSource::new(sql)?))
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, detail: impl Into<String>) -> CompileError {
        let detail = detail.into();
        let near: String = self.rest().chars().take(40).collect();
        CompileError::MalformedTemplate(format!("{} near '{}'", detail, near))
    }
}

/// Text with `${}` markers must re-render per call; anything else is a
/// plain static segment.
fn text_node(text: &str) -> Arc<dyn SqlNode> {
    if marker::contains_substitution(text) {
        Arc::new(TextNode::new(text))
    } else {
        Arc::new(StaticTextNode::new(text))
    }
}

fn parse_children(
    cursor: &mut Cursor<'_>,
    closing: Option<&str>,
) -> Result<Vec<Arc<dyn SqlNode>>, CompileError> {
    let mut children: Vec<Arc<dyn SqlNode>> = Vec::new();
    loop {
        let rest = cursor.rest();
        match rest.find('<') {
            None => {
                if let Some(tag) = closing {
                    return Err(cursor.error(format!("missing closing tag </{}>", tag)));
                }
                if !rest.is_empty() {
                    children.push(text_node(rest));
                    cursor.pos = cursor.input.len();
                }
                return Ok(children);
            }
            Some(lt) => {
                if lt > 0 {
                    children.push(text_node(&rest[..lt]));
                    cursor.pos += lt;
                }
                if cursor.rest().starts_with("</") {
                    let tag = closing
                        .ok_or_else(|| cursor.error("unexpected closing tag"))?;
                    consume_closing(cursor, tag)?;
                    return Ok(children);
                }
                children.push(parse_element(cursor)?);
            }
        }
    }
}

fn consume_closing(cursor: &mut Cursor<'_>, tag: &str) -> Result<(), CompileError> {
    let expected = format!("</{}>", tag);
    if cursor.rest().starts_with(expected.as_str()) {
        cursor.pos += expected.len();
        Ok(())
    } else {
        Err(cursor.error(format!("expected {}", expected)))
    }
}

struct Element {
    name: String,
    attrs: HashMap<String, String>,
    self_closing: bool,
}

fn parse_tag(cursor: &mut Cursor<'_>) -> Result<Element, CompileError> {
    debug_assert!(cursor.rest().starts_with('<'));
    cursor.pos += 1;
    let rest = cursor.rest();
    let name_len = rest
        .find(|c: char| !c.is_alphanumeric() && c != '_')
        .unwrap_or(rest.len());
    if name_len == 0 {
        return Err(cursor.error("expected element name"));
    }
    let name = rest[..name_len].to_string();
    cursor.pos += name_len;

    let mut attrs = HashMap::new();
    loop {
        let rest = cursor.rest().trim_start();
        cursor.pos = cursor.input.len() - rest.len();
        if rest.starts_with("/>") {
            cursor.pos += 2;
            return Ok(Element {
                name,
                attrs,
                self_closing: true,
            });
        }
        if let Some(stripped) = rest.strip_prefix('>') {
            cursor.pos = cursor.input.len() - stripped.len();
            return Ok(Element {
                name,
                attrs,
                self_closing: false,
            });
        }
        if rest.is_empty() {
            return Err(cursor.error(format!("unterminated <{}> tag", name)));
        }
        let eq = rest
            .find('=')
            .ok_or_else(|| cursor.error("expected attribute assignment"))?;
        let attr_name = rest[..eq].trim().to_string();
        let after_eq = &rest[eq + 1..];
        let quote = after_eq
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| cursor.error("expected quoted attribute value"))?;
        let value_body = &after_eq[1..];
        let end = value_body
            .find(quote)
            .ok_or_else(|| cursor.error("unterminated attribute value"))?;
        attrs.insert(attr_name, value_body[..end].to_string());
        let consumed = eq + 1 + 1 + end + 1;
        cursor.pos += consumed;
    }
}

fn require_attr(
    cursor: &Cursor<'_>,
    element: &Element,
    name: &str,
) -> Result<String, CompileError> {
    element
        .attrs
        .get(name)
        .cloned()
        .ok_or_else(|| cursor.error(format!("<{}> requires attribute '{}'", element.name, name)))
}

fn split_overrides(spec: Option<&String>) -> Vec<String> {
    match spec {
        Some(spec) => spec.split('|').map(str::to_string).collect(),
        None => Vec::new(),
    }
}

fn parse_element(cursor: &mut Cursor<'_>) -> Result<Arc<dyn SqlNode>, CompileError> {
    let element = parse_tag(cursor)?;
    match element.name.as_str() {
        "bind" => {
            if !element.self_closing {
                consume_closing(cursor, "bind")?;
            }
            let name = require_attr(cursor, &element, "name")?;
            let value = require_attr(cursor, &element, "value")?;
            Ok(Arc::new(VarBindNode::new(name, value)))
        }
        "if" => {
            let test = require_attr(cursor, &element, "test")?;
            let children = parse_children(cursor, Some("if"))?;
            Ok(Arc::new(IfNode::new(
                test,
                Arc::new(MixedNode::new(children)),
            )))
        }
        "where" => {
            let children = parse_children(cursor, Some("where"))?;
            Ok(Arc::new(TrimNode::where_node(Arc::new(MixedNode::new(
                children,
            )))))
        }
        "set" => {
            let children = parse_children(cursor, Some("set"))?;
            Ok(Arc::new(TrimNode::set_node(Arc::new(MixedNode::new(
                children,
            )))))
        }
        "trim" => {
            let prefix = element.attrs.get("prefix").cloned();
            let suffix = element.attrs.get("suffix").cloned();
            let prefix_overrides = split_overrides(element.attrs.get("prefixOverrides"));
            let suffix_overrides = split_overrides(element.attrs.get("suffixOverrides"));
            let children = parse_children(cursor, Some("trim"))?;
            Ok(Arc::new(TrimNode::new(
                Arc::new(MixedNode::new(children)),
                prefix,
                suffix,
                prefix_overrides,
                suffix_overrides,
            )))
        }
        "foreach" => {
            let collection = require_attr(cursor, &element, "collection")?;
            let children = parse_children(cursor, Some("foreach"))?;
            Ok(Arc::new(ForEachNode::new(
                collection,
                element.attrs.get("item").cloned(),
                element.attrs.get("index").cloned(),
                element.attrs.get("open").cloned(),
                element.attrs.get("close").cloned(),
                element.attrs.get("separator").cloned(),
                Arc::new(MixedNode::new(children)),
            )))
        }
        "choose" => parse_choose(cursor),
        other => Err(cursor.error(format!("unknown element <{}>", other))),
    }
}

fn parse_choose(cursor: &mut Cursor<'_>) -> Result<Arc<dyn SqlNode>, CompileError> {
    let mut whens = Vec::new();
    let mut otherwise: Option<Arc<dyn SqlNode>> = None;
    loop {
        let rest = cursor.rest();
        let lt = rest
            .find('<')
            .ok_or_else(|| cursor.error("missing closing tag </choose>"))?;
        if !rest[..lt].trim().is_empty() {
            return Err(cursor.error("<choose> allows only <when> and <otherwise> children"));
        }
        cursor.pos += lt;
        if cursor.rest().starts_with("</") {
            consume_closing(cursor, "choose")?;
            return Ok(Arc::new(ChooseNode::new(whens, otherwise)));
        }
        let element = parse_tag(cursor)?;
        match element.name.as_str() {
            "when" => {
                let test = require_attr(cursor, &element, "test")?;
                let children = parse_children(cursor, Some("when"))?;
                whens.push(IfNode::new(test, Arc::new(MixedNode::new(children))));
            }
            "otherwise" => {
                let children = parse_children(cursor, Some("otherwise"))?;
                if otherwise.is_some() {
                    return Err(cursor.error("<choose> allows a single <otherwise>"));
                }
                otherwise = Some(Arc::new(MixedNode::new(children)));
            }
            other => {
                return Err(cursor.error(format!("unexpected <{}> inside <choose>", other)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConverterRegistry;

    fn bind(template: &str, arg: serde_json::Value) -> crate::compile::BoundStatement {
        let source = build_sql_source(template).expect("template");
        source
            .bound_statement(&ConverterRegistry::default(), &Value::from(arg))
            .expect("compile")
    }

    #[test]
    fn conditional_template_renders_both_ways() {
        let template = r#"SELECT * FROM t WHERE 1=1 <if test="id != null">AND id = #{id}</if>"#;
        let bound = bind(template, serde_json::json!({ "id": 5 }));
        assert_eq!(bound.sql(), "SELECT * FROM t WHERE 1=1 AND id = ?");
        assert_eq!(bound.descriptors().len(), 1);

        let bound = bind(template, serde_json::json!({ "id": null }));
        assert_eq!(bound.sql(), "SELECT * FROM t WHERE 1=1");
        assert_eq!(bound.descriptors().len(), 0);
    }

    #[test]
    fn foreach_template_compiles_placeholders() {
        let template = r#"SELECT * FROM t WHERE id IN <foreach collection="ids" item="i" open="(" close=")" separator=",">#{i}</foreach>"#;
        let bound = bind(template, serde_json::json!({ "ids": [1, 2, 3] }));
        assert_eq!(bound.sql(), "SELECT * FROM t WHERE id IN (?,?,?)");
        assert_eq!(bound.descriptors().len(), 3);
        let params: Vec<Value> = bound
            .descriptors()
            .iter()
            .map(|d| bound.parameter_value(&d.property))
            .collect();
        assert_eq!(
            params,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn where_and_choose_compose() {
        let template = r#"SELECT * FROM t<where><choose><when test="id != null">id = #{id}</when><otherwise>1=1</otherwise></choose></where>"#;
        let bound = bind(template, serde_json::json!({ "id": 9 }));
        assert_eq!(bound.sql(), "SELECT * FROM t WHERE id = ?");
        let bound = bind(template, serde_json::json!({}));
        assert_eq!(bound.sql(), "SELECT * FROM t WHERE 1=1");
    }

    #[test]
    fn bind_introduces_side_binding() {
        let template =
            r#"<bind name="pattern" value="name"/>SELECT * FROM t WHERE name LIKE #{pattern}"#;
        let bound = bind(template, serde_json::json!({ "name": "ann" }));
        assert_eq!(bound.sql(), "SELECT * FROM t WHERE name LIKE ?");
        assert_eq!(bound.parameter_value("pattern"), Value::from("ann"));
        assert!(bound.has_side_binding("pattern"));
    }

    #[test]
    fn static_template_takes_fast_path() {
        let source = build_sql_source("SELECT * FROM t WHERE id = #{id}").expect("template");
        let a = source
            .bound_statement(
                &ConverterRegistry::default(),
                &Value::from(serde_json::json!({ "id": 1 })),
            )
            .expect("compile");
        let b = source
            .bound_statement(
                &ConverterRegistry::default(),
                &Value::from(serde_json::json!({ "id": 2 })),
            )
            .expect("compile");
        assert_eq!(a.sql(), b.sql());
    }

    #[test]
    fn text_segments_classify_by_substitution_markers() {
        let root = parse_template("SELECT 1").expect("template");
        assert!(!root.is_dynamic());
        let root = parse_template("ORDER BY ${col}").expect("template");
        assert!(root.is_dynamic());
    }

    #[test]
    fn unknown_element_is_a_compile_error() {
        assert!(matches!(
            build_sql_source("SELECT 1 <loop>x</loop>"),
            Err(CompileError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn missing_closing_tag_is_a_compile_error() {
        assert!(build_sql_source(r#"<if test="a != null">x"#).is_err());
    }
}
