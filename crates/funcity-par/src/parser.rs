//! The FunCity parser: expression-level parsing (juxtaposition-as-
//! application, dot chains, the unit node) and block-level parsing (the
//! statement stack for `if`/`elseif`/`else`/`while`/`for`/`end`).

use crate::ast::{Block, DotSegment, Expr};
use funcity_lex::{tokenize_code, tokenize_template, Delimiter, EolSource, Token, TokenKind};
use funcity_util::{LogEntry, Range};

/// Output of a parse pass.
pub struct ParseResult {
    pub blocks: Vec<Block>,
    pub log: Vec<LogEntry>,
}

pub fn parse_template(source: &str) -> ParseResult {
    let tokenized = tokenize_template(source);
    let mut parser = Parser::new(&tokenized.tokens);
    parser.log.extend(tokenized.log);
    let blocks = parser.drive(true);
    ParseResult { blocks, log: parser.log }
}

pub fn parse_code(source: &str) -> ParseResult {
    let tokenized = tokenize_code(source);
    let mut parser = Parser::new(&tokenized.tokens);
    parser.log.extend(tokenized.log);
    let blocks = parser.drive(false);
    ParseResult { blocks, log: parser.log }
}

/// A value produced while parsing one primary expression: either a real
/// node, or the transient unit marker `()`, which only ever survives into
/// the final tree as a placeholder (see [`Expr::undefined_placeholder`]).
enum Partial {
    Node(Expr),
    Unit(Range),
}

/// Accumulated children of one branch of a statement (the `then` of an
/// `if`, the body of a `while`, etc.): completed block nodes, plus a
/// buffer of expressions from lines not yet flushed to a boundary.
#[derive(Default)]
struct BranchState {
    completed: Vec<Block>,
    buffer: Vec<Expr>,
}

impl BranchState {
    fn push_line(&mut self, expr: Expr) {
        self.buffer.push(expr);
    }

    /// Moves any buffered line expressions into `completed` as a single
    /// block: one expression becomes a direct child, several become one
    /// `Scope` node (satisfying the AST's two-or-more-nodes invariant).
    fn flush(&mut self) {
        match self.buffer.len() {
            0 => {}
            1 => {
                let expr = self.buffer.pop().unwrap();
                self.completed.push(Block::Expr(expr));
            }
            _ => {
                let nodes = std::mem::take(&mut self.buffer);
                let range = nodes.first().unwrap().range().widen(nodes.last().unwrap().range());
                self.completed.push(Block::Expr(Expr::Scope { nodes, range }));
            }
        }
    }
}

/// One open construct on the statement stack.
enum Frame {
    Root { branch: BranchState },
    If {
        start: Range,
        condition: Expr,
        then_branch: BranchState,
        elseifs: Vec<ElseIfArm>,
        else_branch: Option<BranchState>,
        active: IfActive,
    },
    While { start: Range, condition: Expr, body: BranchState },
    For { start: Range, bind: Expr, iterable: Expr, body: BranchState },
}

struct ElseIfArm {
    start: Range,
    condition: Expr,
    branch: BranchState,
}

#[derive(Clone, Copy, PartialEq)]
enum IfActive {
    Then,
    ElseIf,
    Else,
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    log: Vec<LogEntry>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0, log: Vec::new() }
    }

    // ---- token cursor -------------------------------------------------

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn take(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn skip(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn end_range(&self) -> Range {
        self.tokens.last().map(|t| Range::point(t.range.end)).unwrap_or_default()
    }

    fn error(&mut self, description: impl Into<String>, range: Range) {
        self.log.push(LogEntry::error(description, range));
    }

    // ---- expression-level parsing --------------------------------------

    /// Parses one primary expression (number/string/identifier/paren-group/
    /// list literal) followed by its dot chain.
    fn parse_primary(&mut self) -> Partial {
        let tok = match self.peek() {
            Some(t) => t,
            None => {
                let r = self.end_range();
                self.error("expected expression, found end of input", r);
                return Partial::Node(Expr::undefined_placeholder(r));
            }
        };
        match tok.kind.clone() {
            TokenKind::Number(n) => {
                let r = tok.range;
                self.skip();
                self.parse_dot_chain(Expr::Number(n, r))
            }
            TokenKind::Str(s) => {
                let r = tok.range;
                self.skip();
                self.parse_dot_chain(Expr::Str(s.to_string(), r))
            }
            TokenKind::Identity(name) => {
                let r = tok.range;
                self.skip();
                self.parse_dot_chain(Expr::Variable(name.to_string(), r))
            }
            TokenKind::Open(Delimiter::Paren) => {
                let open_range = tok.range;
                self.skip();
                self.parse_paren_group(open_range)
            }
            TokenKind::Open(Delimiter::Bracket) => {
                let open_range = tok.range;
                self.skip();
                Partial::Node(self.parse_list(open_range))
            }
            TokenKind::Dot { .. } => {
                let r = tok.range;
                self.error("invalid dot at this location", r);
                self.skip();
                Partial::Node(Expr::undefined_placeholder(r))
            }
            _ => {
                let r = tok.range;
                self.error("expected an expression", r);
                self.skip();
                Partial::Node(Expr::undefined_placeholder(r))
            }
        }
    }

    fn parse_dot_chain(&mut self, base: Expr) -> Partial {
        let mut segments: Vec<DotSegment> = Vec::new();
        loop {
            let Some(tok) = self.peek() else { break };
            let TokenKind::Dot { optional } = tok.kind else { break };
            let operator_range = tok.range;
            self.skip();
            match self.peek().map(|t| t.kind.clone()) {
                Some(TokenKind::Identity(name)) => {
                    let name_tok = self.take().unwrap();
                    segments.push(DotSegment {
                        name: name.to_string(),
                        optional,
                        range: name_tok.range,
                        operator_range,
                    });
                }
                _ => {
                    self.error("expected identifier after '.'", operator_range);
                    break;
                }
            }
        }
        if segments.is_empty() {
            Partial::Node(base)
        } else {
            let range = base.range().widen(segments.last().unwrap().range);
            Partial::Node(Expr::Dot { base: Box::new(base), segments, range })
        }
    }

    fn at_line_boundary(&self) -> bool {
        match self.peek() {
            None => true,
            Some(t) => matches!(
                t.kind,
                TokenKind::Eol { .. }
                    | TokenKind::Close(Delimiter::Paren)
                    | TokenKind::Close(Delimiter::Brace)
            ),
        }
    }

    /// Collects the partial nodes of one finalization group: everything up
    /// to an `eol` or a `)` that closes an enclosing paren group.
    fn parse_partials_until_boundary(&mut self) -> Vec<Partial> {
        let mut partials = Vec::new();
        while !self.is_at_end() && !self.at_line_boundary() {
            partials.push(self.parse_primary());
        }
        partials
    }

    fn resolve_partial(&mut self, partial: Partial) -> Expr {
        match partial {
            Partial::Node(e) => e,
            Partial::Unit(range) => {
                self.error("empty parentheses cannot be used as a value", range);
                Expr::undefined_placeholder(range)
            }
        }
    }

    /// Application finalization: 0 partials -> no expression (caller's
    /// problem); 1 -> that node; 2+ -> `apply(first, rest)`, with the
    /// explicit-unit-argument special case `f ()` -> `apply(f, [])`.
    fn finalize(&mut self, partials: Vec<Partial>) -> Expr {
        let mut iter = partials.into_iter();
        let Some(first) = iter.next() else {
            let r = self.end_range();
            self.error("expected an expression", r);
            return Expr::undefined_placeholder(r);
        };
        let rest: Vec<Partial> = iter.collect();
        if rest.is_empty() {
            return self.resolve_partial(first);
        }

        let func = match first {
            Partial::Unit(range) => {
                self.error("cannot apply the empty-parentheses value as a function", range);
                Expr::undefined_placeholder(range)
            }
            Partial::Node(e) => e,
        };

        if rest.len() == 1 {
            if let Partial::Unit(unit_range) = &rest[0] {
                let range = func.range().widen(*unit_range);
                return Expr::Apply { func: Box::new(func), args: Vec::new(), range };
            }
        }

        let mut range = func.range();
        let args: Vec<Expr> = rest
            .into_iter()
            .map(|p| {
                let e = self.resolve_partial(p);
                range = range.widen(e.range());
                e
            })
            .collect();
        Expr::Apply { func: Box::new(func), args, range }
    }

    /// Parses one line's worth of tokens into a single finalized
    /// expression, or `None` if the line is empty (nothing before the
    /// boundary).
    fn parse_line_expr(&mut self) -> Option<Expr> {
        let partials = self.parse_partials_until_boundary();
        if partials.is_empty() {
            None
        } else {
            Some(self.finalize(partials))
        }
    }

    fn parse_paren_group(&mut self, open_range: Range) -> Partial {
        let mut exprs: Vec<Expr> = Vec::new();
        loop {
            match self.peek() {
                Some(t) if matches!(t.kind, TokenKind::Close(Delimiter::Paren)) => {
                    let close_range = t.range;
                    self.skip();
                    let range = open_range.widen(close_range);
                    return match exprs.len() {
                        0 => Partial::Unit(range),
                        1 => Partial::Node(exprs.into_iter().next().unwrap()),
                        _ => Partial::Node(Expr::Scope { nodes: exprs, range }),
                    };
                }
                None => {
                    let r = self.end_range();
                    self.error("missing closing ')'", open_range.widen(r));
                    let range = open_range.widen(r);
                    return match exprs.len() {
                        0 => Partial::Unit(range),
                        1 => Partial::Node(exprs.into_iter().next().unwrap()),
                        _ => Partial::Node(Expr::Scope { nodes: exprs, range }),
                    };
                }
                _ => {}
            }
            if let Some(expr) = self.parse_line_expr() {
                exprs.push(expr);
            }
            match self.peek() {
                Some(t) if matches!(t.kind, TokenKind::Eol { .. }) => self.skip(),
                Some(t) if matches!(t.kind, TokenKind::Close(Delimiter::Paren)) => {}
                _ => {
                    // Neither eol nor close: parse_line_expr stopped because
                    // it ran out of recognizable partials. Force progress
                    // to avoid looping forever on malformed input.
                    if !self.is_at_end() {
                        self.skip();
                    }
                }
            }
        }
    }

    fn parse_list(&mut self, open_range: Range) -> Expr {
        let mut items: Vec<Expr> = Vec::new();
        loop {
            match self.peek() {
                Some(t) if matches!(t.kind, TokenKind::Close(Delimiter::Bracket)) => {
                    let range = open_range.widen(t.range);
                    self.skip();
                    return Expr::List { items, range };
                }
                Some(t) if matches!(t.kind, TokenKind::Eol { source: EolSource::Semicolon }) => {
                    self.error("';' is not allowed inside a list literal", t.range);
                    self.skip();
                }
                Some(t) if matches!(t.kind, TokenKind::Eol { source: EolSource::Newline }) => {
                    self.skip();
                }
                None => {
                    let r = self.end_range();
                    self.error("missing closing ']'", open_range.widen(r));
                    return Expr::List { items, range: open_range.widen(r) };
                }
                _ => {
                    let partial = self.parse_primary();
                    items.push(self.resolve_partial(partial));
                }
            }
        }
    }

    // ---- block-level / statement-stack parsing -------------------------

    /// Drives the single statement stack that spans the whole input. In
    /// template mode a `while`/`if`/`for` can open in one `{{ … }}` region
    /// and close in a later one, with literal text (and further code
    /// regions) in between belonging to whatever branch is active when
    /// they're encountered — so the stack, and the "which branch is
    /// active" state, must survive the `}}` ... `{{` gap rather than
    /// being rebuilt per region. `in_template` selects whether `{{`/`}}`
    /// toggle between text-scanning and code-parsing; code mode is
    /// always "inside" a region.
    fn drive(&mut self, in_template: bool) -> Vec<Block> {
        let mut stack: Vec<Frame> = vec![Frame::Root { branch: BranchState::default() }];
        let mut in_code = !in_template;

        loop {
            if !in_code {
                match self.peek().map(|t| t.kind.clone()) {
                    None => break,
                    Some(TokenKind::Text(text)) => {
                        let r = self.take().unwrap().range;
                        self.active_branch(&mut stack).completed.push(Block::Text(text, r));
                    }
                    Some(TokenKind::Open(Delimiter::Brace)) => {
                        self.skip();
                        in_code = true;
                    }
                    Some(_) => {
                        // Tokenizer bug: any other token outside a code
                        // region means it leaked out of one.
                        let r = self.take().unwrap().range;
                        self.error("tokenizer bug: unexpected token outside code region", r);
                    }
                }
                continue;
            }

            if in_template
                && matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Close(Delimiter::Brace)))
            {
                self.active_branch(&mut stack).flush();
                self.skip();
                in_code = false;
                continue;
            }
            if self.is_at_end() {
                break;
            }

            if let Some(keyword) = self.peek_keyword() {
                self.handle_keyword(&mut stack, keyword);
                continue;
            }

            match self.peek().map(|t| t.kind.clone()) {
                Some(TokenKind::Eol { .. }) => {
                    self.skip();
                }
                Some(TokenKind::Text(_)) => {
                    // Only reachable in template mode: the tokenizer
                    // never emits `text` inside a code region, so seeing
                    // one here is a tokenizer bug.
                    let r = self.take().unwrap().range;
                    self.error("tokenizer bug: text token inside code region", r);
                }
                _ => {
                    if let Some(expr) = self.parse_line_expr() {
                        self.active_branch(&mut stack).push_line(expr);
                    } else if !self.is_at_end() {
                        // parse_line_expr made no progress; avoid looping.
                        self.skip();
                    }
                }
            }
        }

        self.unwind_stack_at_end(stack)
    }

    fn peek_keyword(&self) -> Option<&'static str> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Identity(name)) => match name.as_str() {
                "if" => Some("if"),
                "elseif" => Some("elseif"),
                "else" => Some("else"),
                "while" => Some("while"),
                "for" => Some("for"),
                "end" => Some("end"),
                _ => None,
            },
            _ => None,
        }
    }

    fn active_branch<'s>(&mut self, stack: &'s mut [Frame]) -> &'s mut BranchState {
        match stack.last_mut().expect("statement stack is never empty") {
            Frame::Root { branch } => branch,
            Frame::If { then_branch, elseifs, else_branch, active, .. } => match active {
                IfActive::Then => then_branch,
                IfActive::ElseIf => &mut elseifs.last_mut().expect("elseif arm exists").branch,
                IfActive::Else => else_branch.as_mut().expect("else branch exists"),
            },
            Frame::While { body, .. } => body,
            Frame::For { body, .. } => body,
        }
    }

    fn handle_keyword(&mut self, stack: &mut Vec<Frame>, keyword: &'static str) {
        self.active_branch(stack).flush();
        let kw_range = self.take().unwrap().range;

        match keyword {
            "if" => {
                let cond = self.parse_required_condition("if", kw_range);
                stack.push(Frame::If {
                    start: kw_range,
                    condition: cond,
                    then_branch: BranchState::default(),
                    elseifs: Vec::new(),
                    else_branch: None,
                    active: IfActive::Then,
                });
            }
            "elseif" => {
                let cond = self.parse_required_condition("elseif", kw_range);
                match stack.last_mut() {
                    Some(Frame::If { active, .. }) if *active != IfActive::Else => {
                        if let Some(Frame::If { elseifs, active, .. }) = stack.last_mut() {
                            elseifs.push(ElseIfArm {
                                start: kw_range,
                                condition: cond,
                                branch: BranchState::default(),
                            });
                            *active = IfActive::ElseIf;
                        }
                    }
                    _ => {
                        self.error("'elseif' is only allowed inside an 'if' statement", kw_range);
                    }
                }
            }
            "else" => {
                self.reject_arguments("else", kw_range);
                match stack.last_mut() {
                    Some(Frame::If { active, else_branch, .. }) if *active != IfActive::Else => {
                        *else_branch = Some(BranchState::default());
                        *active = IfActive::Else;
                    }
                    _ => {
                        self.error(
                            "'else' is only allowed once, inside an 'if' statement",
                            kw_range,
                        );
                    }
                }
            }
            "while" => {
                let cond = self.parse_required_condition("while", kw_range);
                stack.push(Frame::While { start: kw_range, condition: cond, body: BranchState::default() });
            }
            "for" => {
                let bind = self.parse_required_bind(kw_range);
                let iterable = self.parse_required_condition("for", kw_range);
                stack.push(Frame::For { start: kw_range, bind, iterable, body: BranchState::default() });
            }
            "end" => {
                self.reject_arguments("end", kw_range);
                self.close_innermost(stack, kw_range);
            }
            _ => unreachable!(),
        }
    }

    fn reject_arguments(&mut self, keyword: &str, _kw_range: Range) {
        if !self.at_line_boundary() && self.peek_keyword().is_none() {
            if let Some(expr) = self.parse_line_expr() {
                self.error(format!("'{}' takes no arguments", keyword), expr.range());
            }
        }
    }

    fn parse_required_condition(&mut self, keyword: &str, kw_range: Range) -> Expr {
        match self.parse_line_expr() {
            Some(expr) => expr,
            None => {
                self.error(format!("'{}' requires a condition expression", keyword), kw_range);
                Expr::undefined_placeholder(kw_range)
            }
        }
    }

    fn parse_required_bind(&mut self, kw_range: Range) -> Expr {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Identity(name)) => {
                let r = self.take().unwrap().range;
                Expr::Variable(name.to_string(), r)
            }
            _ => {
                self.error("'for' requires an identifier to bind", kw_range);
                Expr::undefined_placeholder(kw_range)
            }
        }
    }

    fn close_innermost(&mut self, stack: &mut Vec<Frame>, end_range: Range) {
        if stack.len() <= 1 {
            self.error("'end' does not close any open statement", end_range);
            return;
        }
        self.active_branch(stack).flush();
        let frame = stack.pop().expect("checked len > 1");
        let block = self.build_block(frame, end_range);
        self.active_branch(stack).completed.push(block);
    }

    fn build_block(&mut self, frame: Frame, end_range: Range) -> Block {
        match frame {
            Frame::Root { .. } => unreachable!("root is never popped"),
            Frame::While { start, condition, mut body } => {
                body.flush();
                Block::While { condition, body: body.completed, range: start.widen(end_range) }
            }
            Frame::For { start, bind, iterable, mut body } => {
                body.flush();
                Block::For { bind, iterable, body: body.completed, range: start.widen(end_range) }
            }
            Frame::If { start, condition, mut then_branch, elseifs, else_branch, .. } => {
                then_branch.flush();
                let mut accumulator = match else_branch {
                    Some(mut else_branch) => {
                        else_branch.flush();
                        else_branch.completed
                    }
                    None => Vec::new(),
                };
                for arm in elseifs.into_iter().rev() {
                    let mut branch = arm.branch;
                    branch.flush();
                    accumulator = vec![Block::If {
                        condition: arm.condition,
                        then_branch: branch.completed,
                        else_branch: accumulator,
                        range: arm.start.widen(end_range),
                    }];
                }
                Block::If {
                    condition,
                    then_branch: then_branch.completed,
                    else_branch: accumulator,
                    range: start.widen(end_range),
                }
            }
        }
    }

    /// Reached true end of input while the statement stack still has open
    /// frames. Every open frame beyond root is an unclosed statement;
    /// fold them closed anyway so downstream stages still see a
    /// well-formed tree.
    fn unwind_stack_at_end(&mut self, mut stack: Vec<Frame>) -> Vec<Block> {
        if stack.len() > 1 {
            let unclosed_range = stack[1..]
                .iter()
                .map(|f| match f {
                    Frame::Root { .. } => unreachable!(),
                    Frame::If { start, .. } | Frame::While { start, .. } | Frame::For { start, .. } => *start,
                })
                .reduce(|a, b| a.widen(b))
                .unwrap_or_default();
            self.error("could not find statement closing", unclosed_range);
        }
        let end_range = self.end_range();
        while stack.len() > 1 {
            self.active_branch(&mut stack).flush();
            let frame = stack.pop().unwrap();
            let block = self.build_block(frame, end_range);
            self.active_branch(&mut stack).completed.push(block);
        }
        match stack.pop() {
            Some(Frame::Root { mut branch }) => {
                branch.flush();
                branch.completed
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcity_lex::NumberLiteral;

    fn blocks(src: &str) -> Vec<Block> {
        let result = parse_template(src);
        assert!(result.log.iter().all(|e| !e.is_error()), "unexpected errors: {:?}", result.log);
        result.blocks
    }

    #[test]
    fn template_splicing_builds_text_and_apply() {
        let bs = blocks("Hello{{add 123 456}}World");
        assert_eq!(bs.len(), 3);
        assert!(matches!(&bs[0], Block::Text(t, _) if t == "Hello"));
        match &bs[1] {
            Block::Expr(Expr::Apply { func, args, .. }) => {
                assert!(matches!(&**func, Expr::Variable(n, _) if n == "add"));
                assert_eq!(args.len(), 2);
                assert!(matches!(&args[0], Expr::Number(NumberLiteral::Int(n), _) if *n == 123.into()));
            }
            other => panic!("expected apply, got {other:?}"),
        }
        assert!(matches!(&bs[2], Block::Text(t, _) if t == "World"));
    }

    #[test]
    fn if_else_desugars_into_nested_blocks() {
        let bs = blocks("{{if flag}}THEN{{else}}ELSE{{end}}");
        assert_eq!(bs.len(), 1);
        match &bs[0] {
            Block::If { then_branch, else_branch, .. } => {
                assert!(matches!(&then_branch[0], Block::Text(t, _) if t == "THEN"));
                assert!(matches!(&else_branch[0], Block::Text(t, _) if t == "ELSE"));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn elseif_chain_collapses_right_to_left() {
        let bs = blocks("{{if a}}A{{elseif b}}B{{else}}C{{end}}");
        match &bs[0] {
            Block::If { else_branch, .. } => match &else_branch[0] {
                Block::If { condition, else_branch: inner_else, .. } => {
                    assert!(matches!(condition, Expr::Variable(n, _) if n == "b"));
                    assert!(matches!(&inner_else[0], Block::Text(t, _) if t == "C"));
                }
                other => panic!("expected nested if, got {other:?}"),
            },
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn for_over_list_literal() {
        let bs = blocks("{{for i [1 2 3]}}X{{end}}");
        match &bs[0] {
            Block::For { bind, iterable, body, .. } => {
                assert!(matches!(bind, Expr::Variable(n, _) if n == "i"));
                assert!(matches!(iterable, Expr::List { items, .. } if items.len() == 3));
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn multiple_statements_on_one_branch_form_a_scope() {
        let bs = blocks("{{set count 10\ncount}}");
        assert_eq!(bs.len(), 1);
        assert!(matches!(&bs[0], Block::Expr(Expr::Scope { nodes, .. }) if nodes.len() == 2));
    }

    #[test]
    fn dot_chain_with_optional_combine() {
        let bs = blocks("{{user?.name}}");
        match &bs[0] {
            Block::Expr(Expr::Dot { segments, .. }) => {
                assert_eq!(segments.len(), 1);
                assert!(segments[0].optional);
                assert_eq!(segments[0].name, "name");
            }
            other => panic!("expected dot, got {other:?}"),
        }
    }

    #[test]
    fn empty_parens_application_is_explicit_unit_call() {
        let bs = blocks("{{now ()}}");
        match &bs[0] {
            Block::Expr(Expr::Apply { args, .. }) => assert!(args.is_empty()),
            other => panic!("expected zero-arg apply, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_if_reports_error_but_builds_tree() {
        let result = parse_template("{{if a}}body");
        assert!(result.log.iter().any(|e| e.is_error()));
        assert_eq!(result.blocks.len(), 1);
    }

    #[test]
    fn while_body_spans_multiple_code_regions() {
        // The `while` opens in the first region and its `end` arrives in
        // a later one; the text and the second region's statement both
        // belong to the loop body.
        let bs = blocks("{{set count 10\nwhile count}}ABC{{set count (sub count 1)\nend}}");
        assert_eq!(bs.len(), 2, "{bs:?}");
        assert!(matches!(&bs[0], Block::Expr(Expr::Apply { .. })));
        match &bs[1] {
            Block::While { condition, body, .. } => {
                assert!(matches!(condition, Expr::Variable(n, _) if n == "count"));
                assert_eq!(body.len(), 2);
                assert!(matches!(&body[0], Block::Text(t, _) if t == "ABC"));
                assert!(matches!(&body[1], Block::Expr(Expr::Apply { .. })));
            }
            other => panic!("expected while, got {other:?}"),
        }
    }

    #[test]
    fn recursive_function_scenario_parses() {
        let src = "{{set foo (fun [n] (cond (eq n 0) 1 (mul n (foo (sub n 1)))))\nfoo 5}}";
        let result = parse_template(src);
        assert!(result.log.iter().all(|e| !e.is_error()), "{:?}", result.log);
        assert_eq!(result.blocks.len(), 1);
    }
}
