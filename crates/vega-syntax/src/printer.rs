//! Java source printer.
//!
//! Prints any [`SyntaxView`]: the plain tree, or an overlay that presents a
//! tree with pending edits applied. Output is normalized: four-space
//! indentation, one member or statement per line, no blank lines inside type
//! bodies.

use std::borrow::Cow;

use crate::tree::{Modifiers, NodeId, NodeKind, SyntaxTree};

/// A read-only view of a syntax tree.
pub trait SyntaxView {
    type Ref: Copy;

    fn view_kind(&self, node: Self::Ref) -> Cow<'_, NodeKind<Self::Ref>>;
}

impl SyntaxView for SyntaxTree {
    type Ref = NodeId;

    fn view_kind(&self, node: NodeId) -> Cow<'_, NodeKind> {
        Cow::Borrowed(self.kind(node))
    }
}

const INDENT: &str = "    ";

pub fn print<V: SyntaxView>(view: &V, node: V::Ref) -> String {
    print_at(view, node, 0)
}

/// Prints `node` as if it were nested `indent` levels deep.
pub fn print_at<V: SyntaxView>(view: &V, node: V::Ref, indent: usize) -> String {
    let mut printer = Printer {
        view,
        out: String::new(),
        indent,
    };
    printer.node(node);
    printer.out
}

struct Printer<'v, V: SyntaxView> {
    view: &'v V,
    out: String,
    indent: usize,
}

impl<'v, V: SyntaxView> Printer<'v, V> {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    fn node(&mut self, node: V::Ref) {
        let view = self.view;
        let kind = view.view_kind(node);
        match &*kind {
            NodeKind::CompilationUnit { .. } => self.unit(&kind),
            NodeKind::TypeDecl { .. }
            | NodeKind::FieldDecl { .. }
            | NodeKind::MethodDecl { .. }
            | NodeKind::Initializer { .. } => self.member(&kind),
            k if k.is_statement() => self.stmt(&kind),
            _ => self.inline(&kind),
        }
    }

    fn join(&mut self, items: &[V::Ref], sep: &str) {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.push(sep);
            }
            self.node(*item);
        }
    }

    fn inline_modifiers(&mut self, modifiers: &Modifiers) {
        for annotation in &modifiers.annotations {
            self.push("@");
            self.push(annotation);
            self.push(" ");
        }
        for keyword in modifiers.flags.keywords() {
            self.push(keyword);
            self.push(" ");
        }
    }

    fn member_modifiers(&mut self, modifiers: &Modifiers) {
        for annotation in &modifiers.annotations {
            self.write_indent();
            self.push("@");
            self.push(annotation);
            self.push("\n");
        }
        self.write_indent();
        for keyword in modifiers.flags.keywords() {
            self.push(keyword);
            self.push(" ");
        }
    }

    fn unit(&mut self, kind: &NodeKind<V::Ref>) {
        let NodeKind::CompilationUnit {
            package,
            imports,
            types,
        } = kind
        else {
            return;
        };
        if let Some(package) = package {
            self.node(*package);
        }
        if !imports.is_empty() {
            if package.is_some() {
                self.push("\n");
            }
            for import in imports {
                self.node(*import);
            }
        }
        for (idx, ty) in types.iter().enumerate() {
            if idx > 0 || package.is_some() || !imports.is_empty() {
                self.push("\n");
            }
            self.node(*ty);
        }
    }

    fn members(&mut self, members: &[V::Ref]) {
        self.push("{\n");
        self.indent += 1;
        for member in members {
            self.node(*member);
        }
        self.indent -= 1;
        self.write_indent();
        self.push("}");
    }

    fn member(&mut self, kind: &NodeKind<V::Ref>) {
        match kind {
            NodeKind::TypeDecl {
                modifiers,
                kind: decl_kind,
                name,
                type_params,
                superclass,
                interfaces,
                members,
            } => {
                self.member_modifiers(modifiers);
                let interface = matches!(decl_kind, crate::tree::TypeDeclKind::Interface);
                self.push(if interface { "interface " } else { "class " });
                self.node(*name);
                self.type_params(type_params);
                if let Some(superclass) = superclass {
                    self.push(" extends ");
                    self.node(*superclass);
                }
                if !interfaces.is_empty() {
                    self.push(if interface { " extends " } else { " implements " });
                    self.join(interfaces, ", ");
                }
                self.push(" ");
                self.members(members);
                self.push("\n");
            }
            NodeKind::FieldDecl {
                modifiers,
                ty,
                fragments,
            } => {
                self.member_modifiers(modifiers);
                self.node(*ty);
                self.push(" ");
                self.join(fragments, ", ");
                self.push(";\n");
            }
            NodeKind::MethodDecl {
                modifiers,
                type_params,
                return_type,
                name,
                params,
                thrown,
                body,
            } => {
                self.member_modifiers(modifiers);
                if !type_params.is_empty() {
                    self.type_params(type_params);
                    self.push(" ");
                }
                if let Some(return_type) = return_type {
                    self.node(*return_type);
                    self.push(" ");
                }
                self.node(*name);
                self.push("(");
                self.join(params, ", ");
                self.push(")");
                if !thrown.is_empty() {
                    self.push(" throws ");
                    self.join(thrown, ", ");
                }
                match body {
                    Some(body) => {
                        self.push(" ");
                        self.node_inline_block(*body);
                    }
                    None => self.push(";"),
                }
                self.push("\n");
            }
            NodeKind::Initializer { is_static, body } => {
                self.write_indent();
                if *is_static {
                    self.push("static ");
                }
                self.node_inline_block(*body);
                self.push("\n");
            }
            _ => {}
        }
    }

    fn type_params(&mut self, params: &[V::Ref]) {
        if params.is_empty() {
            return;
        }
        self.push("<");
        self.join(params, ", ");
        self.push(">");
    }

    /// Block braces starting at the current column; no trailing newline.
    fn block(&mut self, statements: &[V::Ref]) {
        self.push("{\n");
        self.indent += 1;
        for stmt in statements {
            self.node(*stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.push("}");
    }

    fn is_block(&self, node: V::Ref) -> bool {
        matches!(&*self.view.view_kind(node), NodeKind::Block { .. })
    }

    fn is_if(&self, node: V::Ref) -> bool {
        matches!(&*self.view.view_kind(node), NodeKind::If { .. })
    }

    /// Body of a control statement, after its header.
    fn branch(&mut self, body: V::Ref) {
        let view = self.view;
        let kind = view.view_kind(body);
        if let NodeKind::Block { statements } = &*kind {
            self.push(" ");
            self.block(statements);
        } else {
            self.push("\n");
            self.indent += 1;
            self.node(body);
            self.indent -= 1;
        }
    }

    fn end_branch(&mut self, body: V::Ref) {
        if self.is_block(body) {
            self.push("\n");
        }
    }

    fn if_chain(&mut self, kind: &NodeKind<V::Ref>) {
        let NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } = kind
        else {
            return;
        };
        self.push("if (");
        self.node(*condition);
        self.push(")");
        self.branch(*then_branch);
        let Some(else_branch) = else_branch else {
            self.end_branch(*then_branch);
            return;
        };
        if self.is_block(*then_branch) {
            self.push(" else");
        } else {
            self.write_indent();
            self.push("else");
        }
        if self.is_if(*else_branch) {
            self.push(" ");
            let view = self.view;
            let nested = view.view_kind(*else_branch);
            self.if_chain(&nested);
        } else {
            self.branch(*else_branch);
            self.end_branch(*else_branch);
        }
    }

    fn stmt(&mut self, kind: &NodeKind<V::Ref>) {
        self.write_indent();
        match kind {
            NodeKind::Block { statements } => {
                self.block(statements);
                self.push("\n");
            }
            NodeKind::LocalVarDecl {
                modifiers,
                ty,
                fragments,
            } => {
                self.inline_modifiers(modifiers);
                self.node(*ty);
                self.push(" ");
                self.join(fragments, ", ");
                self.push(";\n");
            }
            NodeKind::ExprStmt { expr } => {
                self.node(*expr);
                self.push(";\n");
            }
            NodeKind::If { .. } => self.if_chain(kind),
            NodeKind::While { condition, body } => {
                self.push("while (");
                self.node(*condition);
                self.push(")");
                self.branch(*body);
                self.end_branch(*body);
            }
            NodeKind::For {
                init,
                condition,
                updates,
                body,
            } => {
                self.push("for (");
                self.join(init, ", ");
                self.push(";");
                if let Some(condition) = condition {
                    self.push(" ");
                    self.node(*condition);
                }
                self.push(";");
                if !updates.is_empty() {
                    self.push(" ");
                    self.join(updates, ", ");
                }
                self.push(")");
                self.branch(*body);
                self.end_branch(*body);
            }
            NodeKind::ForEach {
                param,
                iterable,
                body,
            } => {
                self.push("for (");
                self.node(*param);
                self.push(" : ");
                self.node(*iterable);
                self.push(")");
                self.branch(*body);
                self.end_branch(*body);
            }
            NodeKind::Return { expr } => {
                self.push("return");
                if let Some(expr) = expr {
                    self.push(" ");
                    self.node(*expr);
                }
                self.push(";\n");
            }
            NodeKind::Throw { expr } => {
                self.push("throw ");
                self.node(*expr);
                self.push(";\n");
            }
            NodeKind::Break => self.push("break;\n"),
            NodeKind::Continue => self.push("continue;\n"),
            NodeKind::Empty => self.push(";\n"),
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                self.push("try ");
                if !resources.is_empty() {
                    self.push("(");
                    self.join(resources, "; ");
                    self.push(") ");
                }
                self.node_inline_block(*body);
                for catch in catches {
                    let view = self.view;
                    let catch_kind = view.view_kind(*catch);
                    if let NodeKind::CatchClause { param, body } = &*catch_kind {
                        self.push(" catch (");
                        self.node(*param);
                        self.push(") ");
                        self.node_inline_block(*body);
                    }
                }
                if let Some(finally) = finally {
                    self.push(" finally ");
                    self.node_inline_block(*finally);
                }
                self.push("\n");
            }
            _ => {}
        }
    }

    fn node_inline_block(&mut self, node: V::Ref) {
        let view = self.view;
        let kind = view.view_kind(node);
        match &*kind {
            NodeKind::Block { statements } => self.block(statements),
            _ => self.node(node),
        }
    }

    fn inline(&mut self, kind: &NodeKind<V::Ref>) {
        match kind {
            NodeKind::PackageDecl { name } => {
                self.push("package ");
                self.node(*name);
                self.push(";\n");
            }
            NodeKind::ImportDecl {
                is_static,
                on_demand,
                name,
            } => {
                self.push(if *is_static { "import static " } else { "import " });
                self.node(*name);
                if *on_demand {
                    self.push(".*");
                }
                self.push(";\n");
            }
            NodeKind::TypeParam { name, bounds } => {
                self.node(*name);
                if !bounds.is_empty() {
                    self.push(" extends ");
                    self.join(bounds, " & ");
                }
            }
            NodeKind::Parameter {
                modifiers,
                ty,
                varargs,
                name,
            } => {
                self.inline_modifiers(modifiers);
                if let Some(ty) = ty {
                    self.node(*ty);
                    self.push(if *varargs { "... " } else { " " });
                }
                self.node(*name);
            }
            NodeKind::VarFragment { name, initializer } => {
                self.node(*name);
                if let Some(initializer) = initializer {
                    self.push(" = ");
                    self.node(*initializer);
                }
            }
            NodeKind::AnonymousBody { members } => self.members(members),
            NodeKind::CatchClause { param, body } => {
                self.push("catch (");
                self.node(*param);
                self.push(") ");
                self.node_inline_block(*body);
            }
            NodeKind::SimpleName { ident } => self.push(ident),
            NodeKind::QualifiedName { qualifier, name } => {
                self.node(*qualifier);
                self.push(".");
                self.node(*name);
            }
            NodeKind::Literal { text, .. } => self.push(text),
            NodeKind::This { qualifier } => {
                if let Some(qualifier) = qualifier {
                    self.node(*qualifier);
                    self.push(".");
                }
                self.push("this");
            }
            NodeKind::FieldAccess { receiver, name } => {
                self.node(*receiver);
                self.push(".");
                self.node(*name);
            }
            NodeKind::MethodCall {
                receiver,
                type_args,
                name,
                args,
            } => {
                if let Some(receiver) = receiver {
                    self.node(*receiver);
                    self.push(".");
                    self.type_params(type_args);
                }
                self.node(*name);
                self.args(args);
            }
            NodeKind::SuperMethodCall {
                qualifier,
                type_args,
                name,
                args,
            } => {
                if let Some(qualifier) = qualifier {
                    self.node(*qualifier);
                    self.push(".");
                }
                self.push("super.");
                self.type_params(type_args);
                self.node(*name);
                self.args(args);
            }
            NodeKind::New { ty, args, body } => {
                self.push("new ");
                self.node(*ty);
                self.args(args);
                if let Some(body) = body {
                    self.push(" ");
                    self.node(*body);
                }
            }
            NodeKind::ArrayCreation {
                element_ty,
                dims,
                extra_dims,
                initializer,
            } => {
                self.push("new ");
                self.node(*element_ty);
                for dim in dims {
                    self.push("[");
                    self.node(*dim);
                    self.push("]");
                }
                for _ in 0..*extra_dims {
                    self.push("[]");
                }
                if let Some(initializer) = initializer {
                    self.push(" ");
                    self.node(*initializer);
                }
            }
            NodeKind::ArrayInit { elements } => {
                self.push("{");
                self.join(elements, ", ");
                self.push("}");
            }
            NodeKind::ArrayAccess { array, index } => {
                self.node(*array);
                self.push("[");
                self.node(*index);
                self.push("]");
            }
            NodeKind::Assign { op, lhs, rhs } => {
                self.node(*lhs);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.node(*rhs);
            }
            NodeKind::Binary { op, lhs, rhs } => {
                self.node(*lhs);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.node(*rhs);
            }
            NodeKind::Prefix { op, operand } => {
                self.push(op.as_str());
                self.node(*operand);
            }
            NodeKind::Postfix { op, operand } => {
                self.node(*operand);
                self.push(op.as_str());
            }
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.node(*condition);
                self.push(" ? ");
                self.node(*then_expr);
                self.push(" : ");
                self.node(*else_expr);
            }
            NodeKind::Cast { ty, expr } => {
                self.push("(");
                self.node(*ty);
                self.push(") ");
                self.node(*expr);
            }
            NodeKind::InstanceOf { expr, ty } => {
                self.node(*expr);
                self.push(" instanceof ");
                self.node(*ty);
            }
            NodeKind::Paren { expr } => {
                self.push("(");
                self.node(*expr);
                self.push(")");
            }
            NodeKind::Lambda {
                params,
                parenthesized,
                body,
            } => {
                if *parenthesized {
                    self.push("(");
                    self.join(params, ", ");
                    self.push(")");
                } else {
                    self.join(params, ", ");
                }
                self.push(" -> ");
                self.node_inline_block(*body);
            }
            NodeKind::ExprMethodRef {
                expr,
                type_args,
                name,
            } => {
                self.node(*expr);
                self.push("::");
                self.type_params(type_args);
                self.node(*name);
            }
            NodeKind::TypeMethodRef {
                ty,
                type_args,
                name,
            } => {
                self.node(*ty);
                self.push("::");
                self.type_params(type_args);
                self.node(*name);
            }
            NodeKind::SuperMethodRef {
                qualifier,
                type_args,
                name,
            } => {
                if let Some(qualifier) = qualifier {
                    self.node(*qualifier);
                    self.push(".");
                }
                self.push("super::");
                self.type_params(type_args);
                self.node(*name);
            }
            NodeKind::CreationRef { ty, type_args } => {
                self.node(*ty);
                self.push("::");
                self.type_params(type_args);
                self.push("new");
            }
            NodeKind::VarDeclExpr {
                modifiers,
                ty,
                fragments,
            } => {
                self.inline_modifiers(modifiers);
                self.node(*ty);
                self.push(" ");
                self.join(fragments, ", ");
            }
            NodeKind::PrimitiveType { keyword } => self.push(keyword.keyword()),
            NodeKind::SimpleType { name } => self.node(*name),
            NodeKind::ParameterizedType { base, args } => {
                self.node(*base);
                self.push("<");
                self.join(args, ", ");
                self.push(">");
            }
            NodeKind::ArrayType { element, dims } => {
                self.node(*element);
                self.join(dims, "");
            }
            NodeKind::Dimension => self.push("[]"),
            NodeKind::UnionType { alternatives } => self.join(alternatives, " | "),
            NodeKind::Wildcard { upper, bound } => {
                self.push("?");
                if let Some(bound) = bound {
                    self.push(if *upper { " extends " } else { " super " });
                    self.node(*bound);
                }
            }
            _ => {}
        }
    }

    fn args(&mut self, args: &[V::Ref]) {
        self.push("(");
        self.join(args, ", ");
        self.push(")");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use text_size::TextRange;

    use super::*;
    use crate::tree::{LiteralKind, Primitive, TreeBuilder};

    fn at(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn prints_nested_control_flow() {
        // if (ok) return 1;
        let text = "if (ok) return 1;";
        let mut b = TreeBuilder::new();
        let ok = b.alloc(NodeKind::SimpleName { ident: "ok".into() }, at(4, 6));
        let one = b.alloc(
            NodeKind::Literal {
                kind: LiteralKind::Int,
                text: "1".into(),
            },
            at(15, 16),
        );
        let ret = b.alloc(NodeKind::Return { expr: Some(one) }, at(8, 17));
        let stmt = b.alloc(
            NodeKind::If {
                condition: ok,
                then_branch: ret,
                else_branch: None,
            },
            at(0, 17),
        );
        let tree = b.finish(stmt, text).unwrap();

        assert_eq!(print(&tree, stmt), "if (ok)\n    return 1;\n");
        assert_eq!(print_at(&tree, stmt, 1), "    if (ok)\n        return 1;\n");
        assert_eq!(print(&tree, ok), "ok");
    }

    #[test]
    fn prints_array_types_and_declarations() {
        // int[] a;
        let text = "int[] a;";
        let mut b = TreeBuilder::new();
        let int = b.alloc(
            NodeKind::PrimitiveType {
                keyword: Primitive::Int,
            },
            at(0, 3),
        );
        let dim = b.alloc(NodeKind::Dimension, at(3, 5));
        let ty = b.alloc(
            NodeKind::ArrayType {
                element: int,
                dims: vec![dim],
            },
            at(0, 5),
        );
        let name = b.alloc(NodeKind::SimpleName { ident: "a".into() }, at(6, 7));
        let fragment = b.alloc(
            NodeKind::VarFragment {
                name,
                initializer: None,
            },
            at(6, 7),
        );
        let decl = b.alloc(
            NodeKind::LocalVarDecl {
                modifiers: Modifiers::default(),
                ty,
                fragments: vec![fragment],
            },
            at(0, 8),
        );
        let tree = b.finish(decl, text).unwrap();
        assert_eq!(print(&tree, decl), "int[] a;\n");
    }

    #[test]
    fn method_body_continues_the_header_line() {
        // void m() { return; }
        let text = "void m() { return; }";
        let mut b = TreeBuilder::new();
        let void = b.alloc(
            NodeKind::PrimitiveType {
                keyword: Primitive::Void,
            },
            at(0, 4),
        );
        let name = b.alloc(NodeKind::SimpleName { ident: "m".into() }, at(5, 6));
        let ret = b.alloc(NodeKind::Return { expr: None }, at(11, 18));
        let body = b.alloc(
            NodeKind::Block {
                statements: vec![ret],
            },
            at(9, 20),
        );
        let method = b.alloc(
            NodeKind::MethodDecl {
                modifiers: Modifiers::default(),
                type_params: Vec::new(),
                return_type: Some(void),
                name,
                params: Vec::new(),
                thrown: Vec::new(),
                body: Some(body),
            },
            at(0, 20),
        );
        let tree = b.finish(method, text).unwrap();

        assert_eq!(print(&tree, method), "void m() {\n    return;\n}\n");
        assert_eq!(
            print_at(&tree, method, 1),
            "    void m() {\n        return;\n    }\n"
        );
    }
}
