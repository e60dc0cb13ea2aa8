//! Recursive-descent parser for the fixture Java subset.
//!
//! Covers what assist fixtures need: packages, imports, classes and
//! interfaces (nested and anonymous), fields, methods, constructors,
//! initializers, the common statements, lambdas, method references and
//! generics. Ambiguous prefixes (local declaration vs. expression, cast vs.
//! parenthesized expression, lambda parameters) are resolved by parsing
//! speculatively and rewinding the tree builder.

use thiserror::Error;
use vega_syntax::{
    AssignOp, BinaryOp, LiteralKind, ModifierFlags, Modifiers, NodeId, NodeKind, PostfixOp,
    PrefixOp, Primitive, SyntaxTree, TextRange, TextSize, TreeBuilder, TreeError, TypeDeclKind,
};

use crate::lexer::{self, is_keyword, Token, TokenKind};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{message} at offset {offset:?}")]
    Lex {
        message: &'static str,
        offset: TextSize,
    },
    #[error("expected {expected} at offset {offset:?}, found `{found}`")]
    Unexpected {
        expected: &'static str,
        found: String,
        offset: TextSize,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

type PResult<T> = Result<T, ParseError>;

pub fn parse(text: &str) -> Result<SyntaxTree, ParseError> {
    let tokens = lexer::tokenize(text).map_err(|err| ParseError::Lex {
        message: err.message,
        offset: err.offset,
    })?;
    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
        builder: TreeBuilder::new(),
        last_end: TextSize::from(0),
    };
    let root = parser.compilation_unit()?;
    Ok(parser.builder.finish(root, text)?)
}

#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    last_end: TextSize,
    checkpoint: vega_syntax::tree::Checkpoint,
}

struct Parser<'t> {
    text: &'t str,
    tokens: Vec<Token>,
    pos: usize,
    builder: TreeBuilder,
    last_end: TextSize,
}

fn assign_op(text: &str) -> Option<AssignOp> {
    Some(match text {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::Add,
        "-=" => AssignOp::Sub,
        "*=" => AssignOp::Mul,
        "/=" => AssignOp::Div,
        "%=" => AssignOp::Rem,
        "&=" => AssignOp::And,
        "|=" => AssignOp::Or,
        "^=" => AssignOp::Xor,
        _ => return None,
    })
}

fn binary_op(text: &str) -> Option<BinaryOp> {
    Some(match text {
        "||" => BinaryOp::OrOr,
        "&&" => BinaryOp::AndAnd,
        "|" => BinaryOp::BitOr,
        "^" => BinaryOp::BitXor,
        "&" => BinaryOp::BitAnd,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        _ => return None,
    })
}

fn prefix_op(text: &str) -> Option<PrefixOp> {
    Some(match text {
        "+" => PrefixOp::Plus,
        "-" => PrefixOp::Minus,
        "!" => PrefixOp::Not,
        "~" => PrefixOp::BitNot,
        "++" => PrefixOp::Inc,
        "--" => PrefixOp::Dec,
        _ => return None,
    })
}

impl<'t> Parser<'t> {
    // --- token plumbing -------------------------------------------------

    fn token(&self, n: usize) -> Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    fn kind(&self) -> TokenKind {
        self.token(0).kind
    }

    fn peek(&self) -> &'t str {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &'t str {
        &self.text[self.token(n).range]
    }

    fn at(&self, text: &str) -> bool {
        self.kind() != TokenKind::Eof && self.peek() == text
    }

    fn at_ident(&self) -> bool {
        self.kind() == TokenKind::Ident && !is_keyword(self.peek())
    }

    fn bump(&mut self) -> Token {
        let token = self.token(0);
        if token.kind != TokenKind::Eof {
            self.pos += 1;
            self.last_end = token.range.end();
        }
        token
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::Unexpected {
            expected,
            found: self.peek().to_string(),
            offset: self.start(),
        }
    }

    fn expect(&mut self, text: &'static str) -> PResult<()> {
        if self.eat(text) {
            Ok(())
        } else {
            Err(self.unexpected(text))
        }
    }

    fn start(&self) -> TextSize {
        self.token(0).range.start()
    }

    fn alloc(&mut self, kind: NodeKind, start: TextSize) -> NodeId {
        let range = TextRange::new(start, self.last_end.max(start));
        self.builder.alloc(kind, range)
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            last_end: self.last_end,
            checkpoint: self.builder.checkpoint(),
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.last_end = mark.last_end;
        self.builder.rewind(mark.checkpoint);
    }

    fn ident(&mut self) -> PResult<NodeId> {
        if !self.at_ident() {
            return Err(self.unexpected("identifier"));
        }
        let start = self.start();
        let text = self.peek().to_string();
        self.bump();
        Ok(self.alloc(NodeKind::SimpleName { ident: text }, start))
    }

    fn qualified_name(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut name = self.ident()?;
        while self.at(".") && self.token(1).kind == TokenKind::Ident && !is_keyword(self.peek_at(1))
        {
            self.bump();
            let member = self.ident()?;
            name = self.alloc(
                NodeKind::QualifiedName {
                    qualifier: name,
                    name: member,
                },
                start,
            );
        }
        Ok(name)
    }

    // --- declarations ---------------------------------------------------

    fn compilation_unit(&mut self) -> PResult<NodeId> {
        let package = if self.at("package") {
            let start = self.start();
            self.bump();
            let name = self.qualified_name()?;
            self.expect(";")?;
            Some(self.alloc(NodeKind::PackageDecl { name }, start))
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.at("import") {
            imports.push(self.import()?);
        }

        let mut types = Vec::new();
        while self.kind() != TokenKind::Eof {
            if self.eat(";") {
                continue;
            }
            let start = self.start();
            let modifiers = self.modifiers()?;
            types.push(self.type_decl(modifiers, start)?);
        }

        let range = TextRange::new(0.into(), TextSize::of(self.text));
        Ok(self.builder.alloc(
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            },
            range,
        ))
    }

    fn import(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("import")?;
        let is_static = self.eat("static");
        let name = self.qualified_name()?;
        let on_demand = self.at(".") && self.peek_at(1) == "*";
        if on_demand {
            self.bump();
            self.bump();
        }
        self.expect(";")?;
        Ok(self.alloc(
            NodeKind::ImportDecl {
                is_static,
                on_demand,
                name,
            },
            start,
        ))
    }

    fn modifiers(&mut self) -> PResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        loop {
            if self.at("@") && self.peek_at(1) != "interface" {
                self.bump();
                let mut name = self.peek().to_string();
                self.bump();
                while self.at(".") {
                    self.bump();
                    name.push('.');
                    name.push_str(self.peek());
                    self.bump();
                }
                if self.at("(") {
                    self.skip_balanced()?;
                }
                modifiers.annotations.push(name);
            } else if let Some(flag) = ModifierFlags::from_keyword(self.peek()) {
                self.bump();
                modifiers.flags.insert(flag);
            } else {
                return Ok(modifiers);
            }
        }
    }

    fn skip_balanced(&mut self) -> PResult<()> {
        let mut depth = 0usize;
        loop {
            if self.kind() == TokenKind::Eof {
                return Err(self.unexpected(")"));
            }
            match self.peek() {
                "(" => depth += 1,
                ")" => depth -= 1,
                _ => {}
            }
            self.bump();
            if depth == 0 {
                return Ok(());
            }
        }
    }

    fn type_decl(&mut self, modifiers: Modifiers, start: TextSize) -> PResult<NodeId> {
        let kind = if self.eat("class") {
            TypeDeclKind::Class
        } else if self.eat("interface") {
            TypeDeclKind::Interface
        } else {
            return Err(self.unexpected("class or interface"));
        };
        let name = self.ident()?;
        let class_name = self.text[self.builder.range(name)].to_string();
        let type_params = if self.at("<") {
            self.type_params()?
        } else {
            Vec::new()
        };

        let mut superclass = None;
        let mut interfaces = Vec::new();
        if self.eat("extends") {
            match kind {
                TypeDeclKind::Class => superclass = Some(self.ty()?),
                TypeDeclKind::Interface => interfaces = self.type_list()?,
            }
        }
        if self.eat("implements") {
            interfaces = self.type_list()?;
        }

        self.expect("{")?;
        let mut members = Vec::new();
        while !self.at("}") {
            if self.kind() == TokenKind::Eof {
                return Err(self.unexpected("}"));
            }
            if let Some(member) = self.member(Some(&class_name))? {
                members.push(member);
            }
        }
        self.expect("}")?;

        Ok(self.alloc(
            NodeKind::TypeDecl {
                modifiers,
                kind,
                name,
                type_params,
                superclass,
                interfaces,
                members,
            },
            start,
        ))
    }

    fn type_params(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("<")?;
        let mut params = Vec::new();
        loop {
            let start = self.start();
            let name = self.ident()?;
            let mut bounds = Vec::new();
            if self.eat("extends") {
                bounds.push(self.ty()?);
                while self.eat("&") {
                    bounds.push(self.ty()?);
                }
            }
            params.push(self.alloc(NodeKind::TypeParam { name, bounds }, start));
            if !self.eat(",") {
                break;
            }
        }
        self.expect(">")?;
        Ok(params)
    }

    fn type_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut types = vec![self.ty()?];
        while self.eat(",") {
            types.push(self.ty()?);
        }
        Ok(types)
    }

    fn member(&mut self, class_name: Option<&str>) -> PResult<Option<NodeId>> {
        if self.eat(";") {
            return Ok(None);
        }
        let start = self.start();
        let modifiers = self.modifiers()?;
        if self.at("class") || self.at("interface") {
            return self.type_decl(modifiers, start).map(Some);
        }
        if self.at("{") {
            let body = self.block()?;
            let is_static = modifiers.is_static();
            return Ok(Some(
                self.alloc(NodeKind::Initializer { is_static, body }, start),
            ));
        }

        let type_params = if self.at("<") {
            self.type_params()?
        } else {
            Vec::new()
        };
        if self.at_ident() && self.peek_at(1) == "(" && class_name == Some(self.peek()) {
            let name = self.ident()?;
            return self
                .method_rest(modifiers, type_params, None, name, start)
                .map(Some);
        }

        let ty = self.ty()?;
        let name = self.ident()?;
        if self.at("(") {
            return self
                .method_rest(modifiers, type_params, Some(ty), name, start)
                .map(Some);
        }

        let fragments = self.fragments(name)?;
        self.expect(";")?;
        Ok(Some(self.alloc(
            NodeKind::FieldDecl {
                modifiers,
                ty,
                fragments,
            },
            start,
        )))
    }

    fn method_rest(
        &mut self,
        modifiers: Modifiers,
        type_params: Vec<NodeId>,
        return_type: Option<NodeId>,
        name: NodeId,
        start: TextSize,
    ) -> PResult<NodeId> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.at(")") {
            loop {
                params.push(self.param()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        let thrown = if self.eat("throws") {
            self.type_list()?
        } else {
            Vec::new()
        };
        let body = if self.at("{") {
            Some(self.block()?)
        } else {
            self.expect(";")?;
            None
        };
        Ok(self.alloc(
            NodeKind::MethodDecl {
                modifiers,
                type_params,
                return_type,
                name,
                params,
                thrown,
                body,
            },
            start,
        ))
    }

    fn param(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let modifiers = self.modifiers()?;
        let ty = self.ty()?;
        let varargs = self.eat("...");
        let name = self.ident()?;
        Ok(self.alloc(
            NodeKind::Parameter {
                modifiers,
                ty: Some(ty),
                varargs,
                name,
            },
            start,
        ))
    }

    /// Declarator list whose first name has already been parsed.
    fn fragments(&mut self, first: NodeId) -> PResult<Vec<NodeId>> {
        let mut fragments = vec![self.fragment_rest(first)?];
        while self.eat(",") {
            let name = self.ident()?;
            fragments.push(self.fragment_rest(name)?);
        }
        Ok(fragments)
    }

    fn fragment_rest(&mut self, name: NodeId) -> PResult<NodeId> {
        let start = self.builder.range(name).start();
        let initializer = if self.eat("=") {
            Some(self.var_init()?)
        } else {
            None
        };
        Ok(self.alloc(NodeKind::VarFragment { name, initializer }, start))
    }

    fn var_init(&mut self) -> PResult<NodeId> {
        if self.at("{") {
            self.array_init()
        } else {
            self.expr()
        }
    }

    fn array_init(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut elements = Vec::new();
        while !self.at("}") {
            elements.push(self.var_init()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect("}")?;
        Ok(self.alloc(NodeKind::ArrayInit { elements }, start))
    }

    // --- types ----------------------------------------------------------

    fn ty(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let element = self.ty_no_dims(false)?;
        self.dims(element, start)
    }

    fn dims(&mut self, element: NodeId, start: TextSize) -> PResult<NodeId> {
        let mut dims = Vec::new();
        while self.at("[") && self.peek_at(1) == "]" {
            let dim_start = self.start();
            self.bump();
            self.bump();
            dims.push(self.alloc(NodeKind::Dimension, dim_start));
        }
        if dims.is_empty() {
            return Ok(element);
        }
        Ok(self.alloc(NodeKind::ArrayType { element, dims }, start))
    }

    fn ty_no_dims(&mut self, allow_diamond: bool) -> PResult<NodeId> {
        let start = self.start();
        if let Some(keyword) = Primitive::from_keyword(self.peek()) {
            self.bump();
            return Ok(self.alloc(NodeKind::PrimitiveType { keyword }, start));
        }
        let name = self.qualified_name()?;
        let base = self.alloc(NodeKind::SimpleType { name }, start);
        if !self.at("<") {
            return Ok(base);
        }
        let args = self.type_args(allow_diamond)?;
        Ok(self.alloc(NodeKind::ParameterizedType { base, args }, start))
    }

    fn type_args(&mut self, allow_diamond: bool) -> PResult<Vec<NodeId>> {
        self.expect("<")?;
        let mut args = Vec::new();
        if allow_diamond && self.eat(">") {
            return Ok(args);
        }
        loop {
            if self.at("?") {
                let start = self.start();
                self.bump();
                let (upper, bound) = if self.eat("extends") {
                    (true, Some(self.ty()?))
                } else if self.eat("super") {
                    (false, Some(self.ty()?))
                } else {
                    (true, None)
                };
                args.push(self.alloc(NodeKind::Wildcard { upper, bound }, start));
            } else {
                args.push(self.ty()?);
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect(">")?;
        Ok(args)
    }

    // --- statements -----------------------------------------------------

    fn block(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut statements = Vec::new();
        while !self.at("}") {
            if self.kind() == TokenKind::Eof {
                return Err(self.unexpected("}"));
            }
            statements.push(self.statement()?);
        }
        self.expect("}")?;
        Ok(self.alloc(NodeKind::Block { statements }, start))
    }

    fn statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        match self.peek() {
            "{" if self.kind() == TokenKind::Punct => self.block(),
            ";" if self.kind() == TokenKind::Punct => {
                self.bump();
                Ok(self.alloc(NodeKind::Empty, start))
            }
            "if" => {
                self.bump();
                self.expect("(")?;
                let condition = self.expr()?;
                self.expect(")")?;
                let then_branch = self.statement()?;
                let else_branch = if self.eat("else") {
                    Some(self.statement()?)
                } else {
                    None
                };
                Ok(self.alloc(
                    NodeKind::If {
                        condition,
                        then_branch,
                        else_branch,
                    },
                    start,
                ))
            }
            "while" => {
                self.bump();
                self.expect("(")?;
                let condition = self.expr()?;
                self.expect(")")?;
                let body = self.statement()?;
                Ok(self.alloc(NodeKind::While { condition, body }, start))
            }
            "for" => self.for_statement(),
            "return" => {
                self.bump();
                let expr = if self.at(";") {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(";")?;
                Ok(self.alloc(NodeKind::Return { expr }, start))
            }
            "throw" => {
                self.bump();
                let expr = self.expr()?;
                self.expect(";")?;
                Ok(self.alloc(NodeKind::Throw { expr }, start))
            }
            "break" | "continue" => {
                let kind = if self.peek() == "break" {
                    NodeKind::Break
                } else {
                    NodeKind::Continue
                };
                self.bump();
                self.expect(";")?;
                Ok(self.alloc(kind, start))
            }
            "try" => self.try_statement(),
            _ if self.at_local_var_decl() => {
                let decl = self.var_decl(true)?;
                Ok(decl)
            }
            _ => {
                let expr = self.expr()?;
                self.expect(";")?;
                Ok(self.alloc(NodeKind::ExprStmt { expr }, start))
            }
        }
    }

    /// Speculatively checks for `Type name =`, `Type name,`, `Type name;` or
    /// `Type name :`.
    fn at_local_var_decl(&mut self) -> bool {
        if self.at("final") || self.at("@") {
            return true;
        }
        let mark = self.mark();
        let found = self.ty().is_ok()
            && self.at_ident()
            && matches!(self.peek_at(1), "=" | "," | ";" | ":");
        self.reset(mark);
        found
    }

    /// Local declaration statement (`statement`) or declaration expression.
    fn var_decl(&mut self, statement: bool) -> PResult<NodeId> {
        let start = self.start();
        let modifiers = self.modifiers()?;
        let ty = self.ty()?;
        let name = self.ident()?;
        let fragments = self.fragments(name)?;
        if statement {
            self.expect(";")?;
            Ok(self.alloc(
                NodeKind::LocalVarDecl {
                    modifiers,
                    ty,
                    fragments,
                },
                start,
            ))
        } else {
            Ok(self.alloc(
                NodeKind::VarDeclExpr {
                    modifiers,
                    ty,
                    fragments,
                },
                start,
            ))
        }
    }

    fn for_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("for")?;
        self.expect("(")?;

        let mark = self.mark();
        if let Ok(Some(param)) = self.foreach_param() {
            let iterable = self.expr()?;
            self.expect(")")?;
            let body = self.statement()?;
            return Ok(self.alloc(
                NodeKind::ForEach {
                    param,
                    iterable,
                    body,
                },
                start,
            ));
        }
        self.reset(mark);

        let mut init = Vec::new();
        if !self.at(";") {
            if self.at_local_var_decl() {
                init.push(self.var_decl(false)?);
            } else {
                init = self.expr_list()?;
            }
        }
        self.expect(";")?;
        let condition = if self.at(";") {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(";")?;
        let updates = if self.at(")") {
            Vec::new()
        } else {
            self.expr_list()?
        };
        self.expect(")")?;
        let body = self.statement()?;
        Ok(self.alloc(
            NodeKind::For {
                init,
                condition,
                updates,
                body,
            },
            start,
        ))
    }

    fn foreach_param(&mut self) -> PResult<Option<NodeId>> {
        let start = self.start();
        let modifiers = self.modifiers()?;
        let ty = self.ty()?;
        if !(self.at_ident() && self.peek_at(1) == ":") {
            return Ok(None);
        }
        let name = self.ident()?;
        let param = self.alloc(
            NodeKind::Parameter {
                modifiers,
                ty: Some(ty),
                varargs: false,
                name,
            },
            start,
        );
        self.expect(":")?;
        Ok(Some(param))
    }

    fn expr_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut exprs = vec![self.expr()?];
        while self.eat(",") {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    fn try_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("try")?;
        let mut resources = Vec::new();
        if self.eat("(") {
            while !self.at(")") {
                resources.push(self.var_decl(false)?);
                if !self.eat(";") {
                    break;
                }
            }
            self.expect(")")?;
        }
        let body = self.block()?;

        let mut catches = Vec::new();
        while self.at("catch") {
            let catch_start = self.start();
            self.bump();
            self.expect("(")?;
            let param_start = self.start();
            let modifiers = self.modifiers()?;
            let first = self.ty()?;
            let ty = if self.at("|") {
                let mut alternatives = vec![first];
                while self.eat("|") {
                    alternatives.push(self.ty()?);
                }
                let union_start = self.builder.range(first).start();
                self.alloc(NodeKind::UnionType { alternatives }, union_start)
            } else {
                first
            };
            let name = self.ident()?;
            let param = self.alloc(
                NodeKind::Parameter {
                    modifiers,
                    ty: Some(ty),
                    varargs: false,
                    name,
                },
                param_start,
            );
            self.expect(")")?;
            let body = self.block()?;
            catches.push(self.alloc(NodeKind::CatchClause { param, body }, catch_start));
        }

        let finally = if self.eat("finally") {
            Some(self.block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() && resources.is_empty() {
            return Err(self.unexpected("catch or finally"));
        }
        Ok(self.alloc(
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            },
            start,
        ))
    }

    // --- expressions ----------------------------------------------------

    fn expr(&mut self) -> PResult<NodeId> {
        if let Some(lambda) = self.lambda()? {
            return Ok(lambda);
        }
        let start = self.start();
        let lhs = self.conditional()?;
        if self.kind() == TokenKind::Punct {
            if let Some(op) = assign_op(self.peek()) {
                self.bump();
                let rhs = self.expr()?;
                return Ok(self.alloc(NodeKind::Assign { op, lhs, rhs }, start));
            }
        }
        Ok(lhs)
    }

    fn matching_paren(&self) -> Option<usize> {
        let mut depth = 0usize;
        for idx in self.pos..self.tokens.len() {
            let token = self.tokens[idx];
            if token.kind != TokenKind::Punct {
                continue;
            }
            match &self.text[token.range] {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn lambda(&mut self) -> PResult<Option<NodeId>> {
        let start = self.start();
        if self.at_ident() && self.peek_at(1) == "->" {
            let name = self.ident()?;
            let param = self.alloc(
                NodeKind::Parameter {
                    modifiers: Modifiers::default(),
                    ty: None,
                    varargs: false,
                    name,
                },
                start,
            );
            self.expect("->")?;
            let body = self.lambda_body()?;
            return Ok(Some(self.alloc(
                NodeKind::Lambda {
                    params: vec![param],
                    parenthesized: false,
                    body,
                },
                start,
            )));
        }

        if !self.at("(") {
            return Ok(None);
        }
        let Some(close) = self.matching_paren() else {
            return Ok(None);
        };
        let arrow = self.tokens.get(close + 1).map(|t| &self.text[t.range]);
        if arrow != Some("->") {
            return Ok(None);
        }

        self.expect("(")?;
        let mut params = Vec::new();
        if !self.at(")") {
            loop {
                let param_start = self.start();
                let param = if self.at_ident() && matches!(self.peek_at(1), "," | ")") {
                    let name = self.ident()?;
                    self.alloc(
                        NodeKind::Parameter {
                            modifiers: Modifiers::default(),
                            ty: None,
                            varargs: false,
                            name,
                        },
                        param_start,
                    )
                } else {
                    self.param()?
                };
                params.push(param);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        self.expect("->")?;
        let body = self.lambda_body()?;
        Ok(Some(self.alloc(
            NodeKind::Lambda {
                params,
                parenthesized: true,
                body,
            },
            start,
        )))
    }

    fn lambda_body(&mut self) -> PResult<NodeId> {
        if self.at("{") {
            self.block()
        } else {
            self.expr()
        }
    }

    fn conditional(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let condition = self.binary(1)?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let then_expr = self.expr()?;
        self.expect(":")?;
        let else_expr = match self.lambda()? {
            Some(lambda) => lambda,
            None => self.conditional()?,
        };
        Ok(self.alloc(
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            },
            start,
        ))
    }

    fn binary(&mut self, min_prec: u8) -> PResult<NodeId> {
        let start = self.start();
        let mut lhs = self.unary()?;
        loop {
            if self.at("instanceof") && min_prec <= 7 {
                self.bump();
                let ty = self.ty()?;
                lhs = self.alloc(NodeKind::InstanceOf { expr: lhs, ty }, start);
                continue;
            }
            if self.kind() != TokenKind::Punct {
                break;
            }
            let Some(op) = binary_op(self.peek()) else {
                break;
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.binary(prec + 1)?;
            lhs = self.alloc(NodeKind::Binary { op, lhs, rhs }, start);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if self.kind() == TokenKind::Punct {
            if let Some(op) = prefix_op(self.peek()) {
                self.bump();
                let operand = self.unary()?;
                return Ok(self.alloc(NodeKind::Prefix { op, operand }, start));
            }
            if self.at("(") {
                if let Some(cast) = self.cast()? {
                    return Ok(cast);
                }
            }
        }
        self.postfix()
    }

    fn starts_cast_operand(&self) -> bool {
        match self.kind() {
            TokenKind::Ident => {
                !is_keyword(self.peek())
                    || matches!(self.peek(), "this" | "new" | "super" | "true" | "false" | "null")
            }
            TokenKind::Punct => matches!(self.peek(), "(" | "!" | "~"),
            TokenKind::Eof => false,
            _ => true,
        }
    }

    fn cast(&mut self) -> PResult<Option<NodeId>> {
        let start = self.start();
        let mark = self.mark();
        self.expect("(")?;
        let primitive = Primitive::from_keyword(self.peek()).is_some();
        let ty = match self.ty() {
            Ok(ty) => ty,
            Err(_) => {
                self.reset(mark);
                return Ok(None);
            }
        };
        if !self.eat(")") || !(primitive || self.starts_cast_operand()) {
            self.reset(mark);
            return Ok(None);
        }
        let expr = match self.lambda()? {
            Some(lambda) => lambda,
            None => self.unary()?,
        };
        Ok(Some(self.alloc(NodeKind::Cast { ty, expr }, start)))
    }

    fn arguments(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if !self.at(")") {
            args = self.expr_list()?;
        }
        self.expect(")")?;
        Ok(args)
    }

    fn is_name(&self, node: NodeId) -> bool {
        self.builder.kind(node).is_name()
    }

    fn postfix(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut expr = self.primary()?;
        loop {
            if self.at(".") {
                match self.peek_at(1) {
                    "<" => {
                        self.bump();
                        let type_args = self.type_args(false)?;
                        let name = self.ident()?;
                        let args = self.arguments()?;
                        expr = self.alloc(
                            NodeKind::MethodCall {
                                receiver: Some(expr),
                                type_args,
                                name,
                                args,
                            },
                            start,
                        );
                    }
                    "this" if self.is_name(expr) => {
                        self.bump();
                        self.bump();
                        expr = self.alloc(
                            NodeKind::This {
                                qualifier: Some(expr),
                            },
                            start,
                        );
                    }
                    "super" if self.is_name(expr) => {
                        self.bump();
                        self.bump();
                        expr = self.super_suffix(Some(expr), start)?;
                    }
                    _ => {
                        self.bump();
                        let name = self.ident()?;
                        expr = if self.at("(") {
                            let args = self.arguments()?;
                            self.alloc(
                                NodeKind::MethodCall {
                                    receiver: Some(expr),
                                    type_args: Vec::new(),
                                    name,
                                    args,
                                },
                                start,
                            )
                        } else if self.is_name(expr) {
                            self.alloc(
                                NodeKind::QualifiedName {
                                    qualifier: expr,
                                    name,
                                },
                                start,
                            )
                        } else {
                            self.alloc(
                                NodeKind::FieldAccess {
                                    receiver: expr,
                                    name,
                                },
                                start,
                            )
                        };
                    }
                }
            } else if self.at("[") {
                self.bump();
                let index = self.expr()?;
                self.expect("]")?;
                expr = self.alloc(NodeKind::ArrayAccess { array: expr, index }, start);
            } else if self.at("::") {
                self.bump();
                let type_args = if self.at("<") {
                    self.type_args(false)?
                } else {
                    Vec::new()
                };
                if self.eat("new") {
                    if !self.is_name(expr) {
                        return Err(self.unexpected("type before ::new"));
                    }
                    let range = self.builder.range(expr);
                    let ty = self.builder.alloc(NodeKind::SimpleType { name: expr }, range);
                    expr = self.alloc(NodeKind::CreationRef { ty, type_args }, start);
                } else {
                    let name = self.ident()?;
                    expr = self.alloc(
                        NodeKind::ExprMethodRef {
                            expr,
                            type_args,
                            name,
                        },
                        start,
                    );
                }
            } else if self.at("++") || self.at("--") {
                let op = if self.peek() == "++" {
                    PostfixOp::Inc
                } else {
                    PostfixOp::Dec
                };
                self.bump();
                expr = self.alloc(NodeKind::Postfix { op, operand: expr }, start);
            } else {
                return Ok(expr);
            }
        }
    }

    /// After `super` (optionally qualified): `::name` or `.name(args)`.
    fn super_suffix(&mut self, qualifier: Option<NodeId>, start: TextSize) -> PResult<NodeId> {
        if self.eat("::") {
            let type_args = if self.at("<") {
                self.type_args(false)?
            } else {
                Vec::new()
            };
            let name = self.ident()?;
            return Ok(self.alloc(
                NodeKind::SuperMethodRef {
                    qualifier,
                    type_args,
                    name,
                },
                start,
            ));
        }
        self.expect(".")?;
        let type_args = if self.at("<") {
            self.type_args(false)?
        } else {
            Vec::new()
        };
        let name = self.ident()?;
        let args = self.arguments()?;
        Ok(self.alloc(
            NodeKind::SuperMethodCall {
                qualifier,
                type_args,
                name,
                args,
            },
            start,
        ))
    }

    /// `int[]::new`, `List<String>::size` and friends.
    fn type_method_ref(&mut self) -> PResult<Option<NodeId>> {
        let start = self.start();
        let primitive = Primitive::from_keyword(self.peek()).is_some();
        if !(primitive || matches!(self.peek_at(1), "<" | "[")) {
            return Ok(None);
        }
        let mark = self.mark();
        let ty = match self.ty() {
            Ok(ty) => ty,
            Err(_) => {
                self.reset(mark);
                return Ok(None);
            }
        };
        let plain = matches!(self.builder.kind(ty), NodeKind::SimpleType { .. });
        if plain || !self.eat("::") {
            self.reset(mark);
            return Ok(None);
        }
        let type_args = if self.at("<") {
            self.type_args(false)?
        } else {
            Vec::new()
        };
        if self.eat("new") {
            return Ok(Some(
                self.alloc(NodeKind::CreationRef { ty, type_args }, start),
            ));
        }
        let name = self.ident()?;
        Ok(Some(self.alloc(
            NodeKind::TypeMethodRef {
                ty,
                type_args,
                name,
            },
            start,
        )))
    }

    fn literal(&mut self, kind: LiteralKind) -> NodeId {
        let start = self.start();
        let text = self.peek().to_string();
        self.bump();
        self.alloc(NodeKind::Literal { kind, text }, start)
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        match self.kind() {
            TokenKind::Int => return Ok(self.literal(LiteralKind::Int)),
            TokenKind::Long => return Ok(self.literal(LiteralKind::Long)),
            TokenKind::Float => return Ok(self.literal(LiteralKind::Float)),
            TokenKind::Double => return Ok(self.literal(LiteralKind::Double)),
            TokenKind::Char => return Ok(self.literal(LiteralKind::Char)),
            TokenKind::String => return Ok(self.literal(LiteralKind::String)),
            TokenKind::Eof => return Err(self.unexpected("expression")),
            TokenKind::Punct => {
                if self.eat("(") {
                    let expr = self.expr()?;
                    self.expect(")")?;
                    return Ok(self.alloc(NodeKind::Paren { expr }, start));
                }
                return Err(self.unexpected("expression"));
            }
            TokenKind::Ident => {}
        }

        match self.peek() {
            "true" | "false" => Ok(self.literal(LiteralKind::Boolean)),
            "null" => Ok(self.literal(LiteralKind::Null)),
            "this" => {
                self.bump();
                Ok(self.alloc(NodeKind::This { qualifier: None }, start))
            }
            "super" => {
                self.bump();
                self.super_suffix(None, start)
            }
            "new" => self.creation(),
            _ => {
                if let Some(reference) = self.type_method_ref()? {
                    return Ok(reference);
                }
                let name = self.ident()?;
                if !self.at("(") {
                    return Ok(name);
                }
                let args = self.arguments()?;
                Ok(self.alloc(
                    NodeKind::MethodCall {
                        receiver: None,
                        type_args: Vec::new(),
                        name,
                        args,
                    },
                    start,
                ))
            }
        }
    }

    fn creation(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("new")?;
        let ty = self.ty_no_dims(true)?;

        if self.at("[") {
            let mut dims = Vec::new();
            while self.at("[") && self.peek_at(1) != "]" {
                self.bump();
                dims.push(self.expr()?);
                self.expect("]")?;
            }
            let mut extra_dims = 0;
            while self.at("[") && self.peek_at(1) == "]" {
                self.bump();
                self.bump();
                extra_dims += 1;
            }
            let initializer = if self.at("{") {
                Some(self.array_init()?)
            } else {
                None
            };
            return Ok(self.alloc(
                NodeKind::ArrayCreation {
                    element_ty: ty,
                    dims,
                    extra_dims,
                    initializer,
                },
                start,
            ));
        }

        let args = self.arguments()?;
        let body = if self.at("{") {
            let body_start = self.start();
            self.bump();
            let mut members = Vec::new();
            while !self.at("}") {
                if self.kind() == TokenKind::Eof {
                    return Err(self.unexpected("}"));
                }
                if let Some(member) = self.member(None)? {
                    members.push(member);
                }
            }
            self.expect("}")?;
            Some(self.alloc(NodeKind::AnonymousBody { members }, body_start))
        } else {
            None
        };
        Ok(self.alloc(NodeKind::New { ty, args, body }, start))
    }
}
