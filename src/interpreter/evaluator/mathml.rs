use crate::{
    ast::{Ast, BinaryOp, NodeId, NodeKind, PostfixOp},
    error::EvalError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{core::Value, multiarray::MultiArray, structure::Structure},
    },
};

/// The namespace of every emitted fragment.
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// The `display` attribute of an emitted fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMLDisplay {
    /// `display="inline"`
    Inline,
    /// `display="block"`
    Block,
}

impl MathMLDisplay {
    const fn attribute(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Block => "block",
        }
    }
}

impl Evaluator {
    /// Renders a parsed program as a self-contained MathML fragment.
    ///
    /// Rendering failures degrade to an error marker unless the debug flag
    /// is set, in which case they re-raise.
    ///
    /// # Errors
    /// Only with the debug flag set.
    pub fn unparse_mathml(&self, ast: &Ast, display: MathMLDisplay) -> EvalResult<String> {
        self.wrap_fragment(self.mathml_node(ast, ast.root), display)
    }

    /// Renders a value as a self-contained MathML fragment.
    ///
    /// # Errors
    /// Only with the debug flag set.
    pub fn unparse_value_mathml(&self,
                                value: &Value,
                                display: MathMLDisplay)
                                -> EvalResult<String> {
        self.wrap_fragment(self.mathml_value(value), display)
    }

    fn wrap_fragment(&self,
                     body: EvalResult<String>,
                     display: MathMLDisplay)
                     -> EvalResult<String> {
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                if self.debug {
                    return Err(e);
                }
                "<mi>error</mi>".to_string()
            },
        };
        Ok(format!("<math xmlns=\"{MATHML_NAMESPACE}\" display=\"{}\">{body}</math>",
                   display.attribute()))
    }

    /// Renders one node as a MathML fragment body.
    pub(crate) fn mathml_node(&self, ast: &Ast, id: NodeId) -> EvalResult<String> {
        let children = ast.children(id);
        let line = ast.line(id);
        let child = |k: usize| -> EvalResult<String> {
            let &node = children.get(k).ok_or(EvalError::MissingValue { line })?;
            self.mathml_node(ast, node)
        };

        match ast.kind(id) {
            NodeKind::Number(s) => Ok(scalar_markup(&s.to_display_string(&self.context))),
            NodeKind::Str { text, .. } => Ok(format!("<ms>{}</ms>", escape(text))),
            NodeKind::Ident(name) => Ok(identifier_markup(name)),
            NodeKind::End => Ok("<mi>end</mi>".to_string()),
            NodeKind::Colon => Ok("<mo>:</mo>".to_string()),
            NodeKind::Wildcard => Ok("<mo>~</mo>".to_string()),
            NodeKind::Binary(op) => {
                let left = child(0)?;
                let right = child(1)?;
                Ok(match op {
                       BinaryOp::Div | BinaryOp::ElemDiv => {
                           format!("<mfrac><mrow>{left}</mrow><mrow>{right}</mrow></mfrac>")
                       },
                       BinaryOp::Pow | BinaryOp::ElemPow => {
                           format!("<msup><mrow>{left}</mrow><mrow>{right}</mrow></msup>")
                       },
                       _ => format!("<mrow>{left}<mo>{}</mo>{right}</mrow>", escape(op.symbol())),
                   })
            },
            NodeKind::Prefix(op) => {
                Ok(format!("<mrow><mo>{}</mo>{}</mrow>", escape(op.symbol()), child(0)?))
            },
            NodeKind::Postfix(op) => {
                let operand = child(0)?;
                Ok(match op {
                       PostfixOp::Transpose => {
                           format!("<msup><mrow>{operand}</mrow><mi>T</mi></msup>")
                       },
                       PostfixOp::CTranspose => {
                           format!("<msup><mrow>{operand}</mrow><mi>H</mi></msup>")
                       },
                       _ => format!("<mrow>{operand}<mo>{}</mo></mrow>", escape(op.symbol())),
                   })
            },
            NodeKind::Paren => {
                Ok(format!("<mrow><mo>(</mo>{}<mo>)</mo></mrow>", child(0)?))
            },
            NodeKind::Assign(op) => {
                let symbol =
                    op.map_or_else(|| "=".to_string(), |op| format!("{}=", op.symbol()));
                Ok(format!("<mrow>{}<mo>{}</mo>{}</mrow>", child(0)?, escape(&symbol), child(1)?))
            },
            NodeKind::Range { has_stride } => {
                if *has_stride {
                    Ok(format!("<mrow>{}<mo>:</mo>{}<mo>:</mo>{}</mrow>",
                               child(0)?,
                               child(2)?,
                               child(1)?))
                } else {
                    Ok(format!("<mrow>{}<mo>:</mo>{}</mrow>", child(0)?, child(1)?))
                }
            },
            NodeKind::List { .. } => {
                let mut rows = String::new();
                for &statement in children {
                    rows.push_str(&format!("<mtr><mtd>{}</mtd></mtr>",
                                           self.mathml_node(ast, statement)?));
                }
                Ok(format!("<mtable>{rows}</mtable>"))
            },
            NodeKind::Index { delimiter } => self.index_markup(ast, id, *delimiter),
            NodeKind::Field => {
                let mut text = child(0)?;
                for &designator in &children[1..] {
                    text.push_str("<mo>.</mo>");
                    text.push_str(&self.mathml_node(ast, designator)?);
                }
                Ok(format!("<mrow>{text}</mrow>"))
            },
            NodeKind::Matrix { rows, cell } => {
                let mut body = String::new();
                let mut offset = 0usize;
                for &width in rows {
                    body.push_str("<mtr>");
                    for &element in
                        children.get(offset..offset + width)
                                .ok_or(EvalError::MissingValue { line })?
                    {
                        body.push_str(&format!("<mtd>{}</mtd>", self.mathml_node(ast, element)?));
                    }
                    body.push_str("</mtr>");
                    offset += width;
                }
                let (open, close) = if *cell { ("{", "}") } else { ("[", "]") };
                Ok(format!("<mrow><mo>{open}</mo><mtable>{body}</mtable><mo>{close}</mo></mrow>"))
            },
            NodeKind::Command { name, words } => {
                let mut text = escape(name);
                for word in words {
                    text.push(' ');
                    text.push_str(&escape(word));
                }
                Ok(format!("<mtext>{text}</mtext>"))
            },
            NodeKind::If { conditions, has_else } => {
                let mut rows = String::new();
                for pair in 0..*conditions {
                    let keyword = if pair == 0 { "if" } else { "elseif" };
                    rows.push_str(&format!("<mtr><mtd><mtext>{keyword}</mtext>{}</mtd></mtr>",
                                           child(2 * pair)?));
                    rows.push_str(&format!("<mtr><mtd>{}</mtd></mtr>", child(2 * pair + 1)?));
                }
                if *has_else {
                    rows.push_str("<mtr><mtd><mtext>else</mtext></mtd></mtr>");
                    rows.push_str(&format!("<mtr><mtd>{}</mtd></mtr>", child(2 * conditions)?));
                }
                Ok(format!("<mtable>{rows}</mtable>"))
            },
        }
    }

    /// An index/call: the registered decorative renderers take precedence
    /// over the generic `f(x, …)` form.
    fn index_markup(&self,
                    ast: &Ast,
                    id: NodeId,
                    delimiter: crate::ast::Delimiter)
                    -> EvalResult<String> {
        let children = ast.children(id);
        let head = children[0];
        let args = &children[1..];

        if let NodeKind::Ident(name) = ast.kind(head) {
            let canonical = self.resolve_alias(name);
            if let Some(entry) = self.base.get(&canonical) {
                if let Some(renderer) = entry.mathml {
                    return renderer(self, ast, args);
                }
            }
        }

        let (open, close) = match delimiter {
            crate::ast::Delimiter::Paren => ("(", ")"),
            crate::ast::Delimiter::Brace => ("{", "}"),
        };
        let mut body = self.mathml_node(ast, head)?;
        body.push_str(&format!("<mo>{open}</mo>"));
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                body.push_str("<mo>,</mo>");
            }
            body.push_str(&self.mathml_node(ast, arg)?);
        }
        body.push_str(&format!("<mo>{close}</mo>"));
        Ok(format!("<mrow>{body}</mrow>"))
    }

    /// Renders one value as a MathML fragment body.
    pub(crate) fn mathml_value(&self, value: &Value) -> EvalResult<String> {
        match value {
            Value::Scalar(s) => Ok(scalar_markup(&s.to_display_string(&self.context))),
            Value::CharString(s) => Ok(format!("<ms>{}</ms>", escape(&s.text))),
            Value::Array(a) => self.array_markup(a),
            Value::Struct(s) => self.struct_markup(s),
            Value::RetList(list) => match list.select(1, 0) {
                Some(first) => self.mathml_value(&first),
                None => Err(EvalError::MissingValue { line: 0 }),
            },
        }
    }

    fn array_markup(&self, array: &MultiArray) -> EvalResult<String> {
        let (open, close) = if array.cell { ("{", "}") } else { ("[", "]") };
        if array.rank() > 2 {
            return Err(EvalError::MissingValue { line: 0 });
        }

        let (rows, cols) = (array.dim(0), array.dim(1));
        let mut body = String::new();
        for r in 0..rows {
            body.push_str("<mtr>");
            for c in 0..cols {
                body.push_str(&format!("<mtd>{}</mtd>",
                                       self.mathml_value(&array.contents[r * cols + c])?));
            }
            body.push_str("</mtr>");
        }
        Ok(format!("<mrow><mo>{open}</mo><mtable>{body}</mtable><mo>{close}</mo></mrow>"))
    }

    fn struct_markup(&self, structure: &Structure) -> EvalResult<String> {
        let mut rows = String::new();
        for (name, value) in structure.iter() {
            rows.push_str(&format!("<mtr><mtd><mi>{}</mi></mtd><mtd><mo>=</mo></mtd><mtd>{}</mtd></mtr>",
                                   escape(name),
                                   self.mathml_value(value)?));
        }
        Ok(format!("<mrow><mi>struct</mi><mo>(</mo><mtable>{rows}</mtable><mo>)</mo></mrow>"))
    }
}

/// A scalar rendering split into `<mn>`/`<mo>`/`<mi>` pieces.
fn scalar_markup(text: &str) -> String {
    // complex renderings carry their sign and unit; keep the split simple
    if let Some(rest) = text.strip_suffix('i') {
        if let Some((re, im)) = rest.split_once(" + ") {
            return format!("<mn>{re}</mn><mo>+</mo><mn>{im}</mn><mi>i</mi>");
        }
        if let Some((re, im)) = rest.split_once(" - ") {
            return format!("<mn>{re}</mn><mo>-</mo><mn>{im}</mn><mi>i</mi>");
        }
        return format!("<mn>{rest}</mn><mi>i</mi>");
    }
    if text == "Inf" {
        return "<mi>&infin;</mi>".to_string();
    }
    if text == "-Inf" {
        return "<mo>-</mo><mi>&infin;</mi>".to_string();
    }
    format!("<mn>{}</mn>", escape(text))
}

/// Identifiers spelled `inf` or `Inf` render as the infinity symbol; all
/// other spellings (including `INF`) stay literal.
fn identifier_markup(name: &str) -> String {
    if name == "inf" || name == "Inf" {
        "<mi>&infin;</mi>".to_string()
    } else {
        format!("<mi>{}</mi>", escape(name))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `|x|` — absolute value bars.
pub(crate) fn abs_markup(ev: &Evaluator, ast: &Ast, args: &[NodeId]) -> EvalResult<String> {
    let inner = single_argument(ev, ast, args)?;
    Ok(format!("<mrow><mo>|</mo>{inner}<mo>|</mo></mrow>"))
}

/// `√x` — the square-root decoration.
pub(crate) fn sqrt_markup(ev: &Evaluator, ast: &Ast, args: &[NodeId]) -> EvalResult<String> {
    let inner = single_argument(ev, ast, args)?;
    Ok(format!("<msqrt><mrow>{inner}</mrow></msqrt>"))
}

/// `log₁₀(x)`.
pub(crate) fn log10_markup(ev: &Evaluator, ast: &Ast, args: &[NodeId]) -> EvalResult<String> {
    let inner = single_argument(ev, ast, args)?;
    Ok(format!("<mrow><msub><mi>log</mi><mn>10</mn></msub><mo>(</mo>{inner}<mo>)</mo></mrow>"))
}

/// `log_b(x)` — subscripted base.
pub(crate) fn logb_markup(ev: &Evaluator, ast: &Ast, args: &[NodeId]) -> EvalResult<String> {
    if args.len() != 2 {
        return Err(EvalError::MissingValue { line: 0 });
    }
    let base = ev.mathml_node(ast, args[0])?;
    let inner = ev.mathml_node(ast, args[1])?;
    Ok(format!("<mrow><msub><mi>log</mi><mrow>{base}</mrow></msub><mo>(</mo>{inner}<mo>)</mo></mrow>"))
}

/// `Γ(x)`.
pub(crate) fn gamma_markup(ev: &Evaluator, ast: &Ast, args: &[NodeId]) -> EvalResult<String> {
    let inner = single_argument(ev, ast, args)?;
    Ok(format!("<mrow><mi>&Gamma;</mi><mo>(</mo>{inner}<mo>)</mo></mrow>"))
}

/// `x!` — the postfix factorial decoration.
pub(crate) fn factorial_markup(ev: &Evaluator,
                               ast: &Ast,
                               args: &[NodeId])
                               -> EvalResult<String> {
    let inner = single_argument(ev, ast, args)?;
    Ok(format!("<mrow>{inner}<mo>!</mo></mrow>"))
}

fn single_argument(ev: &Evaluator, ast: &Ast, args: &[NodeId]) -> EvalResult<String> {
    let &first = args.first().ok_or(EvalError::MissingValue { line: 0 })?;
    ev.mathml_node(ast, first)
}
