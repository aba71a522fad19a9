use crate::ast::{Expr, ExprKind, FunctionDecl, LiteralValue, Stmt};

/// Converts syntax trees to the Crafting‑Interpreters prefix form, e.g.
/// `(+ 1.0 (* 2.0 3.0))`.  Ids and line numbers are not shown, so two trees
/// print the same iff they have the same shape.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match &expr.kind {
            // ── literals ────────────────────────────────────────────────
            ExprKind::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            ExprKind::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            ExprKind::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── names ───────────────────────────────────────────────────
            ExprKind::Variable { name } => name.lexeme.clone(),

            ExprKind::Assign { name, value } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            ExprKind::This { .. } => "this".into(),

            ExprKind::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── calls and properties ────────────────────────────────────
            ExprKind::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            ExprKind::Get { object, name } => {
                format!("(get {} {})", Self::print(object), name.lexeme)
            }

            ExprKind::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(stmts) => Self::tagged("block", stmts),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", Self::print(condition), Self::print_stmt(body))
            }

            Stmt::Break { .. } => "(break)".into(),

            Stmt::Return { value, .. } => match value {
                Some(v) => format!("(return {})", Self::print(v)),
                None => "(return)".into(),
            },

            Stmt::Function(decl) => Self::function(decl),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(sup) = superclass {
                    s.push_str(" < ");
                    s.push_str(&Self::print(sup));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::function(method));
                }
                s.push(')');
                s
            }
        }
    }

    /// One line per top‑level statement.
    pub fn print_program(stmts: &[Stmt]) -> String {
        stmts
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn function(decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
        let mut s = format!("(fun {} ({})", decl.name.lexeme, params.join(" "));
        for stmt in &decl.body {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    fn tagged(tag: &str, stmts: &[Stmt]) -> String {
        let mut s = format!("({}", tag);
        for stmt in stmts {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}

/// Renders a syntax tree back to Lox source.  Reparsing the output yields a
/// tree of the same shape: groupings are kept as written, and desugared `for`
/// loops come back as the equivalent block and `while`.
pub struct SourcePrinter {
    out: String,
    indent: usize,
}

impl SourcePrinter {
    pub fn print_program(stmts: &[Stmt]) -> String {
        let mut printer = SourcePrinter {
            out: String::new(),
            indent: 0,
        };

        for stmt in stmts {
            printer.stmt(stmt);
        }

        printer.out
    }

    pub fn expr(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),
                LiteralValue::Nil => "nil".into(),
                LiteralValue::Str(s) => format!("\"{}\"", s),
                LiteralValue::Number(n) => n.to_string(),
            },
            ExprKind::Grouping(inner) => format!("({})", Self::expr(inner)),
            ExprKind::Unary { operator, right } => {
                format!("{}{}", operator.lexeme, Self::expr(right))
            }
            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                Self::expr(left),
                operator.lexeme,
                Self::expr(right)
            ),
            ExprKind::Variable { name } => name.lexeme.clone(),
            ExprKind::Assign { name, value } => format!("{} = {}", name.lexeme, Self::expr(value)),
            ExprKind::This { .. } => "this".into(),
            ExprKind::Super { method, .. } => format!("super.{}", method.lexeme),
            ExprKind::Call {
                callee, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(Self::expr).collect();
                format!("{}({})", Self::expr(callee), args.join(", "))
            }
            ExprKind::Get { object, name } => format!("{}.{}", Self::expr(object), name.lexeme),
            ExprKind::Set {
                object,
                name,
                value,
            } => format!(
                "{}.{} = {}",
                Self::expr(object),
                name.lexeme,
                Self::expr(value)
            ),
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => self.line(&format!("{};", Self::expr(expr))),
            Stmt::Print(expr) => self.line(&format!("print {};", Self::expr(expr))),
            Stmt::Var { name, initializer } => match initializer {
                Some(init) => self.line(&format!("var {} = {};", name.lexeme, Self::expr(init))),
                None => self.line(&format!("var {};", name.lexeme)),
            },
            Stmt::Block(stmts) => self.block("", stmts),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.line(&format!("if ({})", Self::expr(condition)));
                self.nested(then_branch);
                if let Some(else_branch) = else_branch {
                    self.line("else");
                    self.nested(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.line(&format!("while ({})", Self::expr(condition)));
                self.nested(body);
            }
            Stmt::Break { .. } => self.line("break;"),
            Stmt::Return { value, .. } => match value {
                Some(v) => self.line(&format!("return {};", Self::expr(v))),
                None => self.line("return;"),
            },
            Stmt::Function(decl) => self.function("fun ", decl),
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                match superclass {
                    Some(sup) => self.line(&format!("class {} < {} {{", name.lexeme, Self::expr(sup))),
                    None => self.line(&format!("class {} {{", name.lexeme)),
                }
                self.indent += 1;
                for method in methods {
                    self.function("", method);
                }
                self.indent -= 1;
                self.line("}");
            }
        }
    }

    fn nested(&mut self, stmt: &Stmt) {
        self.indent += 1;
        self.stmt(stmt);
        self.indent -= 1;
    }

    fn function(&mut self, keyword: &str, decl: &FunctionDecl) {
        let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
        let header = format!("{}{}({}) ", keyword, decl.name.lexeme, params.join(", "));
        self.block(&header, &decl.body);
    }

    fn block(&mut self, header: &str, stmts: &[Stmt]) {
        self.line(&format!("{}{{", header));
        self.indent += 1;
        for stmt in stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }
}
