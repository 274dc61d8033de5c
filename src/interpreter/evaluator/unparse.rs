use crate::{
    ast::{Ast, NodeId, NodeKind},
    interpreter::{
        evaluator::core::Evaluator,
        value::{
            chars::{CharString, QuoteStyle},
            core::Value,
            multiarray::MultiArray,
            real::MathContext,
            structure::Structure,
        },
    },
};

/// Marker emitted for structurally invalid nodes.
const INVALID: &str = "<INVALID>";
/// Marker emitted when rendering a value fails.
const ERROR: &str = "<ERROR>";

impl Evaluator {
    /// Renders a parsed program back into canonical surface text.
    ///
    /// Display must stay total: invalid structure renders as `<INVALID>`
    /// and rendering failures as `<ERROR>` instead of raising.
    #[must_use]
    pub fn unparse(&self, ast: &Ast) -> String {
        node_text(&self.context, ast, ast.root)
    }

    /// Renders a value in its canonical surface form.
    #[must_use]
    pub fn unparse_value(&self, value: &Value) -> String {
        value_text(&self.context, value)
    }
}

/// Renders one node; total.
pub(crate) fn node_text(ctx: &MathContext, ast: &Ast, id: NodeId) -> String {
    let children = ast.children(id);
    let child = |k: usize| {
        children.get(k)
                .map_or_else(|| INVALID.to_string(), |&c| node_text(ctx, ast, c))
    };

    match ast.kind(id) {
        NodeKind::Number(s) => s.to_display_string(ctx),
        NodeKind::Str { text, double_quoted } => {
            let quote = if *double_quoted { QuoteStyle::Double } else { QuoteStyle::Single };
            CharString::new(text.clone(), quote).to_source_string()
        },
        NodeKind::Ident(name) => name.clone(),
        NodeKind::End => "end".to_string(),
        NodeKind::Colon => ":".to_string(),
        NodeKind::Wildcard => "~".to_string(),
        NodeKind::Binary(op) => format!("{} {} {}", child(0), op.symbol(), child(1)),
        NodeKind::Prefix(op) => format!("{}{}", op.symbol(), child(0)),
        NodeKind::Postfix(op) => format!("{}{}", child(0), op.symbol()),
        NodeKind::Paren => format!("({})", child(0)),
        NodeKind::Assign(op) => {
            let symbol = op.map_or_else(|| "=".to_string(), |op| format!("{}=", op.symbol()));
            format!("{} {} {}", child(0), symbol, child(1))
        },
        NodeKind::Range { has_stride } => {
            if *has_stride {
                format!("{}:{}:{}", child(0), child(2), child(1))
            } else {
                format!("{}:{}", child(0), child(1))
            }
        },
        NodeKind::List { omit_output } => {
            let mut lines = Vec::with_capacity(children.len());
            for (i, &statement) in children.iter().enumerate() {
                let text = node_text(ctx, ast, statement);
                if omit_output.get(i).copied().unwrap_or(false) {
                    lines.push(format!("{text};"));
                } else {
                    lines.push(text);
                }
            }
            lines.join("\n")
        },
        NodeKind::Index { delimiter } => {
            let args: Vec<String> = children[1..].iter()
                                                 .map(|&c| node_text(ctx, ast, c))
                                                 .collect();
            let (open, close) = match delimiter {
                crate::ast::Delimiter::Paren => ("(", ")"),
                crate::ast::Delimiter::Brace => ("{", "}"),
            };
            format!("{}{open}{}{close}", child(0), args.join(","))
        },
        NodeKind::Field => {
            let mut text = child(0);
            for &designator in &children[1..] {
                match ast.kind(designator) {
                    NodeKind::Ident(name) => {
                        text.push('.');
                        text.push_str(name);
                    },
                    _ => {
                        text.push('.');
                        text.push_str(&node_text(ctx, ast, designator));
                    },
                }
            }
            text
        },
        NodeKind::Matrix { rows, cell } => {
            let mut rendered_rows = Vec::with_capacity(rows.len());
            let mut offset = 0usize;
            for &width in rows {
                let row: Vec<String> = children.get(offset..offset + width)
                                               .map(|slice| {
                                                   slice.iter()
                                                        .map(|&c| node_text(ctx, ast, c))
                                                        .collect()
                                               })
                                               .unwrap_or_default();
                if row.len() != width {
                    return INVALID.to_string();
                }
                rendered_rows.push(row.join(","));
                offset += width;
            }
            if *cell {
                format!("{{{}}}", rendered_rows.join(";"))
            } else {
                format!("[{}]", rendered_rows.join(";"))
            }
        },
        NodeKind::Command { name, words } => {
            if words.is_empty() {
                name.clone()
            } else {
                format!("{name} {}", words.join(" "))
            }
        },
        NodeKind::If { conditions, has_else } => {
            let mut text = String::new();
            for pair in 0..*conditions {
                let keyword = if pair == 0 { "IF" } else { "ELSEIF" };
                text.push_str(&format!("{keyword} {}\n{}\n", child(2 * pair), child(2 * pair + 1)));
            }
            if *has_else {
                text.push_str(&format!("ELSE\n{}\n", child(2 * conditions)));
            }
            text.push_str("ENDIF");
            text
        },
    }
}

/// Renders one value; total.
pub(crate) fn value_text(ctx: &MathContext, value: &Value) -> String {
    match value {
        Value::Scalar(s) => s.to_display_string(ctx),
        Value::CharString(s) => s.to_source_string(),
        Value::Array(a) => array_text(ctx, a),
        Value::Struct(s) => struct_text(ctx, s),
        Value::RetList(list) => match list.select(1, 0) {
            Some(first) => value_text(ctx, &first),
            None => ERROR.to_string(),
        },
    }
}

fn array_text(ctx: &MathContext, array: &MultiArray) -> String {
    let (open, close) = if array.cell { ("{", "}") } else { ("[", "]") };

    if array.rank() > 2 {
        // higher ranks have no literal form; fall back to a reshape of the
        // column-major element sequence
        let elements: Vec<String> = (0..array.numel()).map(|l| value_text(ctx, array.get_linear(l)))
                                                      .collect();
        let dims: Vec<String> = array.dims.iter().map(ToString::to_string).collect();
        return format!("reshape({open}{}{close},{})", elements.join(","), dims.join(","));
    }

    if array.is_empty() {
        return format!("{open}{close}");
    }

    let (rows, cols) = (array.dim(0), array.dim(1));
    let mut rendered = Vec::with_capacity(rows);
    for r in 0..rows {
        let row: Vec<String> = (0..cols).map(|c| value_text(ctx, &array.contents[r * cols + c]))
                                        .collect();
        rendered.push(row.join(","));
    }
    format!("{open}{}{close}", rendered.join(";"))
}

fn struct_text(ctx: &MathContext, structure: &Structure) -> String {
    let fields: Vec<String> = structure.iter()
                                       .map(|(name, value)| {
                                           format!("{name} = {}", value_text(ctx, value))
                                       })
                                       .collect();
    format!("struct({})", fields.join("; "))
}
