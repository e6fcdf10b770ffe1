//! The recursive-descent parser/type checker: one function per
//! non-terminal in the AMPL-2023 grammar, threading synthesized
//! `ValueType`s up through the expression productions and consulting the
//! symbol table at every definition and use. All shared mutable state
//! (the lexer's lookahead, the two scope levels, the current position,
//! the current subroutine's return type) lives on one `Parser` struct
//! rather than as module globals, per the redesign note in the design
//! notes: a clean port groups these into a single compiler-context
//! record threaded through the parser.

use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::position::Position;
use crate::symbol::{IdentProps, SymbolTable};
use crate::token::{self, Lexer, Token, TokenKind};
use crate::value_type::{BaseKind, ValueType};

type PResult<T> = Result<T, Diagnostic>;

/// The outcome of successfully parsing and type-checking one AMPL-2023
/// program: its name and the set of subroutines discovered, each with
/// its computed local frame width — exactly what a downstream code
/// generator (out of scope here) would need to lay out a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub program_name: String,
    pub subroutines: Vec<SubroutineInfo>,
    pub main_frame_width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineInfo {
    pub name: String,
    pub frame_width: u32,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
    symbols: SymbolTable,
    /// Set on entry to a subroutine (or `main`) body, cleared on exit.
    /// Already has the callable bit stripped (the "set-return-type"
    /// operation applied to the subroutine's own value-type) so a
    /// `return` statement can compare directly against it.
    current_return_type: Option<ValueType>,
}

impl<'a> Parser<'a> {
    /// # Errors
    /// Returns the first scanner error encountered while producing the
    /// initial lookahead token.
    pub fn new(source: &'a str) -> PResult<Self> {
        let mut lexer = Lexer::new(source);
        let lookahead = lexer.next_token()?;
        Ok(Self { lexer, lookahead, symbols: SymbolTable::new(), current_return_type: None })
    }

    fn bump(&mut self) -> PResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn err(&self, position: Position, kind: ErrorKind) -> Diagnostic {
        Diagnostic::new(position, kind)
    }

    fn err_here(&self, kind: ErrorKind) -> Diagnostic {
        self.err(self.lookahead.position, kind)
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.lookahead.kind == kind {
            self.bump()
        } else {
            Err(self.err_here(ErrorKind::Expect {
                expected: kind.name().to_owned(),
                found: self.lookahead.kind.name().to_owned(),
            }))
        }
    }

    fn expect_id(&mut self) -> PResult<(String, Position)> {
        if self.lookahead.kind == TokenKind::Identifier {
            let position = self.lookahead.position;
            let tok = self.bump()?;
            Ok((tok.lexeme, position))
        } else {
            Err(self.err_here(ErrorKind::Expect {
                expected: TokenKind::Identifier.name().to_owned(),
                found: self.lookahead.kind.name().to_owned(),
            }))
        }
    }

    // ---- program =============================================

    /// `program = "program" id ":" { subdef } "main" ":" body .`
    pub fn parse_program(&mut self) -> PResult<CompileUnit> {
        self.expect(TokenKind::Program)?;
        let (program_name, _) = self.expect_id()?;
        self.expect(TokenKind::Colon)?;

        let mut subroutines = Vec::new();
        while self.lookahead.kind == TokenKind::Identifier {
            subroutines.push(self.parse_subdef()?);
        }

        self.expect(TokenKind::Main)?;
        self.expect(TokenKind::Colon)?;
        self.symbols.open_local_scope();
        self.current_return_type = Some(ValueType::subroutine(None).return_type());
        self.parse_body()?;
        let main_frame_width = self.symbols.variables_width();
        self.symbols.close_subroutine();
        self.current_return_type = None;

        if self.lookahead.kind != TokenKind::Eof {
            return Err(self.err_here(ErrorKind::Unreachable(format!(
                "unexpected token {} after program end",
                self.lookahead.kind.name()
            ))));
        }

        Ok(CompileUnit { program_name, subroutines, main_frame_width })
    }

    /// `subdef = id "(" type id { "," type id } ")" [ "->" type ] ":" body .`
    fn parse_subdef(&mut self) -> PResult<SubroutineInfo> {
        let (name, name_pos) = self.expect_id()?;
        self.expect(TokenKind::LParen)?;

        let mut params: Vec<(String, ValueType, Position)> = Vec::new();
        if self.lookahead.kind != TokenKind::RParen {
            loop {
                let param_type = self.parse_type()?;
                let (param_name, param_pos) = self.expect_id()?;
                params.push((param_name, param_type, param_pos));
                if self.lookahead.kind == TokenKind::Comma {
                    self.bump()?;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let return_type = if self.lookahead.kind == TokenKind::Arrow {
            self.bump()?;
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Colon)?;

        let param_types: Vec<ValueType> = params.iter().map(|(_, t, _)| *t).collect();
        let value_type = ValueType::subroutine(return_type);
        let props = IdentProps::subroutine(value_type, param_types);

        if !self.symbols.open_subroutine(name.clone(), props) {
            return Err(self.err(name_pos, ErrorKind::MultipleDefinition(name)));
        }

        for (param_name, param_type, param_pos) in params {
            let props = IdentProps::variable(param_type);
            if !self.symbols.insert_name(param_name.clone(), props) {
                return Err(self.err(param_pos, ErrorKind::MultipleDefinition(param_name)));
            }
        }

        let prev_return_type = self.current_return_type.replace(value_type.return_type());
        self.parse_body()?;
        let frame_width = self.symbols.variables_width();
        self.symbols.close_subroutine();
        self.current_return_type = prev_return_type;

        Ok(SubroutineInfo { name, frame_width })
    }

    /// `type = ("bool" | "int") [ "array" ] .`
    fn parse_type(&mut self) -> PResult<ValueType> {
        let base = if self.lookahead.kind.is_type_keyword() {
            let kind = self.lookahead.kind;
            self.bump()?;
            match kind {
                TokenKind::Bool => BaseKind::Bool,
                TokenKind::Int => BaseKind::Int,
                _ => unreachable!("is_type_keyword guarantees Bool or Int"),
            }
        } else {
            return Err(self.err_here(ErrorKind::ExpectedTypeSpecifier { found: self.lookahead.kind.name().to_owned() }));
        };
        let array = if self.lookahead.kind == TokenKind::Array {
            self.bump()?;
            true
        } else {
            false
        };
        Ok(ValueType::from_type(base, array))
    }

    /// `body = { vardef } statements .`
    fn parse_body(&mut self) -> PResult<()> {
        while self.lookahead.kind.is_type_keyword() {
            self.parse_vardef()?;
        }
        self.parse_statements()
    }

    /// `vardef = type id { "," id } ";" .`
    fn parse_vardef(&mut self) -> PResult<()> {
        let var_type = self.parse_type()?;
        loop {
            let (name, pos) = self.expect_id()?;
            if !self.symbols.insert_name(name.clone(), IdentProps::variable(var_type)) {
                return Err(self.err(pos, ErrorKind::MultipleDefinition(name)));
            }
            if self.lookahead.kind == TokenKind::Comma {
                self.bump()?;
                continue;
            }
            break;
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    /// `statements = "chillax" | statement { ";" statement } .`
    fn parse_statements(&mut self) -> PResult<()> {
        if self.lookahead.kind == TokenKind::Chillax {
            self.bump()?;
            return Ok(());
        }
        self.parse_statement()?;
        while self.lookahead.kind == TokenKind::Semicolon {
            self.bump()?;
            self.parse_statement()?;
        }
        Ok(())
    }

    /// `statement = assign | call | if | input | output | return | while .`
    fn parse_statement(&mut self) -> PResult<()> {
        match self.lookahead.kind {
            TokenKind::Let => self.parse_assign(),
            TokenKind::Identifier => self.parse_call(),
            TokenKind::If => self.parse_if(),
            TokenKind::Input => self.parse_input(),
            TokenKind::Output => self.parse_output(),
            TokenKind::Return => self.parse_return(),
            TokenKind::While => self.parse_while(),
            _ => Err(self.err_here(ErrorKind::ExpectedStatement { found: self.lookahead.kind.name().to_owned() })),
        }
    }

    /// `assign = "let" id [ index ] "=" ( expr | "array" simple ) .`
    fn parse_assign(&mut self) -> PResult<()> {
        self.expect(TokenKind::Let)?;
        let (name, name_pos) = self.expect_id()?;
        let props = self.lookup(&name, name_pos)?;
        if props.value_type.is_callable() {
            return Err(self.err(name_pos, ErrorKind::NotAVariable(name)));
        }

        let has_index = self.lookahead.kind == TokenKind::LBracket;
        let target_type = if has_index {
            if !props.value_type.is_array() {
                return Err(self.err(name_pos, ErrorKind::NotAnArray(name)));
            }
            self.parse_index()?;
            props.value_type.element_type()
        } else {
            props.value_type
        };

        self.expect(TokenKind::Eq)?;

        if self.lookahead.kind == TokenKind::Array {
            self.bump()?;
            if !props.value_type.is_array() {
                return Err(self.err(name_pos, ErrorKind::NotAnArray(name)));
            }
            let size_pos = self.lookahead.position;
            let size_type = self.parse_simple()?;
            if !size_type.is_integer() {
                return Err(self.err(
                    size_pos,
                    ErrorKind::TypeMismatch {
                        expected: ValueType::INT.to_string(),
                        found: size_type.to_string(),
                        context: "for array allocation size".to_owned(),
                    },
                ));
            }
            return Ok(());
        }

        let rhs_pos = self.lookahead.position;
        let rhs_type = self.parse_expr()?;
        let compatible = if has_index {
            !rhs_type.is_array() && rhs_type.base == target_type.base
        } else {
            rhs_type.is_array() == target_type.is_array() && rhs_type.base == target_type.base
        };
        if !compatible {
            return Err(self.err(
                rhs_pos,
                ErrorKind::TypeMismatch {
                    expected: target_type.to_string(),
                    found: rhs_type.to_string(),
                    context: format!("for assignment to '{name}'"),
                },
            ));
        }
        Ok(())
    }

    /// `call = id arglist .` (statement position)
    fn parse_call(&mut self) -> PResult<()> {
        let (name, name_pos) = self.expect_id()?;
        let props = self.lookup(&name, name_pos)?;

        // Preserve the observable check ordering from the source: a
        // function name used in statement position is reported as "not
        // a procedure" rather than falling through to a generic
        // not-callable case.
        if props.value_type.is_function() {
            return Err(self.err(name_pos, ErrorKind::NotAProcedure(name)));
        }
        if !props.value_type.is_procedure() {
            return Err(self.err(name_pos, ErrorKind::NotAProcedure(name)));
        }

        let args = self.parse_arglist()?;
        self.check_args(&props, &args, name_pos, &name)
    }

    /// `arglist = "(" [ expr { "," expr } ] ")" .`
    fn parse_arglist(&mut self) -> PResult<Vec<(ValueType, Position)>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.lookahead.kind != TokenKind::RParen {
            loop {
                let pos = self.lookahead.position;
                let t = self.parse_expr()?;
                args.push((t, pos));
                if self.lookahead.kind == TokenKind::Comma {
                    self.bump()?;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn check_args(&self, props: &IdentProps, args: &[(ValueType, Position)], call_pos: Position, name: &str) -> PResult<()> {
        if args.len() < props.nparams {
            return Err(self.err(call_pos, ErrorKind::TooFewArguments(name.to_owned())));
        }
        if args.len() > props.nparams {
            return Err(self.err(call_pos, ErrorKind::TooManyArguments(name.to_owned())));
        }
        for (i, (arg_type, arg_pos)) in args.iter().enumerate() {
            let param_type = props.param_types[i];
            let compatible = if param_type.is_callable() && arg_type.is_callable() {
                true
            } else if param_type.is_array() && arg_type.is_array() {
                param_type.base == arg_type.base
            } else if !param_type.is_array() && !arg_type.is_array() && !param_type.is_callable() && !arg_type.is_callable() {
                param_type.base == arg_type.base
            } else {
                false
            };
            if !compatible {
                return Err(self.err(
                    *arg_pos,
                    ErrorKind::TypeMismatch {
                        expected: param_type.to_string(),
                        found: arg_type.to_string(),
                        context: format!("for argument {} of call to '{name}'", i + 1),
                    },
                ));
            }
        }
        Ok(())
    }

    /// `index = "[" simple "]" .`
    fn parse_index(&mut self) -> PResult<()> {
        self.expect(TokenKind::LBracket)?;
        let pos = self.lookahead.position;
        let t = self.parse_simple()?;
        if !t.is_integer() {
            return Err(self.err(
                pos,
                ErrorKind::TypeMismatch { expected: ValueType::INT.to_string(), found: t.to_string(), context: "for array index".to_owned() },
            ));
        }
        self.expect(TokenKind::RBracket)?;
        Ok(())
    }

    /// `if = "if" expr ":" statements { "elif" expr ":" statements } [ "else" ":" statements ] "end" .`
    fn parse_if(&mut self) -> PResult<()> {
        self.expect(TokenKind::If)?;
        self.parse_boolean_guard("'if' condition")?;
        self.expect(TokenKind::Colon)?;
        self.parse_statements()?;

        while self.lookahead.kind == TokenKind::Elif {
            self.bump()?;
            self.parse_boolean_guard("'elif' condition")?;
            self.expect(TokenKind::Colon)?;
            self.parse_statements()?;
        }

        if self.lookahead.kind == TokenKind::Else {
            self.bump()?;
            self.expect(TokenKind::Colon)?;
            self.parse_statements()?;
        }

        self.expect(TokenKind::End)?;
        Ok(())
    }

    /// `while = "while" expr ":" statements "end" .`
    fn parse_while(&mut self) -> PResult<()> {
        self.expect(TokenKind::While)?;
        self.parse_boolean_guard("'while' condition")?;
        self.expect(TokenKind::Colon)?;
        self.parse_statements()?;
        self.expect(TokenKind::End)?;
        Ok(())
    }

    fn parse_boolean_guard(&mut self, context: &str) -> PResult<()> {
        let pos = self.lookahead.position;
        let t = self.parse_expr()?;
        if !t.is_boolean() {
            return Err(self.err(
                pos,
                ErrorKind::TypeMismatch { expected: ValueType::BOOL.to_string(), found: t.to_string(), context: format!("for {context}") },
            ));
        }
        Ok(())
    }

    /// `input = "input" "(" id [ index ] ")" .`
    fn parse_input(&mut self) -> PResult<()> {
        self.expect(TokenKind::Input)?;
        self.expect(TokenKind::LParen)?;
        let (name, name_pos) = self.expect_id()?;
        let props = self.lookup(&name, name_pos)?;
        if props.value_type.is_callable() {
            return Err(self.err(name_pos, ErrorKind::NotAVariable(name)));
        }
        if self.lookahead.kind == TokenKind::LBracket {
            if !props.value_type.is_array() {
                return Err(self.err(name_pos, ErrorKind::NotAnArray(name)));
            }
            self.parse_index()?;
        } else if props.value_type.is_array() {
            return Err(self.err(name_pos, ErrorKind::ExpectedScalar(name)));
        }
        self.expect(TokenKind::RParen)?;
        Ok(())
    }

    /// `output = "output" "(" (string | expr) { ".." (string | expr) } ")" .`
    fn parse_output(&mut self) -> PResult<()> {
        self.expect(TokenKind::Output)?;
        self.expect(TokenKind::LParen)?;
        loop {
            if self.lookahead.kind == TokenKind::StringLiteral {
                self.bump()?;
            } else if token::starts_expr(self.lookahead.kind) {
                let pos = self.lookahead.position;
                let t = self.parse_expr()?;
                if t.is_array() {
                    return Err(self.err(pos, ErrorKind::IllegalArrayOperation("output".to_owned())));
                }
            } else {
                return Err(self.err_here(ErrorKind::ExpectedExpressionOrString { found: self.lookahead.kind.name().to_owned() }));
            }
            if self.lookahead.kind == TokenKind::DotDot {
                self.bump()?;
                continue;
            }
            break;
        }
        self.expect(TokenKind::RParen)?;
        Ok(())
    }

    /// `return = "return" [ expr ] .`
    fn parse_return(&mut self) -> PResult<()> {
        let return_pos = self.lookahead.position;
        self.expect(TokenKind::Return)?;
        let expected = self.current_return_type.expect("return only parsed inside a subroutine or main body");

        if token::starts_expr(self.lookahead.kind) {
            if expected == ValueType::NONE {
                return Err(self.err(return_pos, ErrorKind::ReturnExpressionNotAllowed));
            }
            let expr_pos = self.lookahead.position;
            let t = self.parse_expr()?;
            if t != expected {
                return Err(self.err(
                    expr_pos,
                    ErrorKind::TypeMismatch { expected: expected.to_string(), found: t.to_string(), context: "for 'return' statement".to_owned() },
                ));
            }
        } else if expected != ValueType::NONE {
            return Err(self.err(return_pos, ErrorKind::MissingReturnExpression));
        }
        Ok(())
    }

    // ---- expressions ==========================================

    /// `expr = simple [ relop simple ] .`
    fn parse_expr(&mut self) -> PResult<ValueType> {
        let lhs = self.parse_simple()?;
        if !token::is_relop(self.lookahead.kind) {
            return Ok(lhs);
        }
        let op_kind = self.lookahead.kind;
        let op_pos = self.lookahead.position;
        let op_name = op_kind.name().trim_matches('\'').to_owned();
        self.bump()?;
        let rhs = self.parse_simple()?;

        if lhs.is_array() || rhs.is_array() {
            return Err(self.err(op_pos, ErrorKind::IllegalArrayOperation(op_name)));
        }
        if token::is_ordop(op_kind) {
            if !lhs.is_integer() || !rhs.is_integer() {
                let (bad_expected, bad_found) = if !lhs.is_integer() { (ValueType::INT, lhs) } else { (ValueType::INT, rhs) };
                return Err(self.err(
                    op_pos,
                    ErrorKind::TypeMismatch {
                        expected: bad_expected.to_string(),
                        found: bad_found.to_string(),
                        context: format!("for operator {op_name}"),
                    },
                ));
            }
        } else if lhs.base != rhs.base {
            return Err(self.err(
                op_pos,
                ErrorKind::TypeMismatch { expected: lhs.to_string(), found: rhs.to_string(), context: format!("for operator {op_name}") },
            ));
        }
        Ok(ValueType::BOOL)
    }

    /// `simple = [ "-" ] term { addop term } .`
    fn parse_simple(&mut self) -> PResult<ValueType> {
        let negate = self.lookahead.kind == TokenKind::Minus;
        let neg_pos = self.lookahead.position;
        if negate {
            self.bump()?;
        }
        let mut t = self.parse_term()?;
        if negate {
            if !t.is_integer() {
                return Err(self.err(
                    neg_pos,
                    ErrorKind::TypeMismatch { expected: ValueType::INT.to_string(), found: t.to_string(), context: "for unary operator -".to_owned() },
                ));
            }
        }

        while token::is_addop(self.lookahead.kind) {
            let op_kind = self.lookahead.kind;
            let op_pos = self.lookahead.position;
            let op_name = op_kind.name().trim_matches('\'').to_owned();
            self.bump()?;
            let rhs = self.parse_term()?;

            if t.is_array() || rhs.is_array() {
                return Err(self.err(op_pos, ErrorKind::IllegalArrayOperation(op_name)));
            }
            let wants_bool = op_kind == TokenKind::Or;
            let lhs_ok = if wants_bool { t.is_boolean() } else { t.is_integer() };
            let rhs_ok = if wants_bool { rhs.is_boolean() } else { rhs.is_integer() };
            if !lhs_ok || !rhs_ok {
                let expected = if wants_bool { ValueType::BOOL } else { ValueType::INT };
                let found = if lhs_ok { rhs } else { t };
                return Err(self.err(
                    op_pos,
                    ErrorKind::TypeMismatch { expected: expected.to_string(), found: found.to_string(), context: format!("for operator {op_name}") },
                ));
            }
            t = if wants_bool { ValueType::BOOL } else { ValueType::INT };
        }
        Ok(t)
    }

    /// `term = factor { mulop factor } .`
    fn parse_term(&mut self) -> PResult<ValueType> {
        let mut t = self.parse_factor()?;
        while token::is_mulop(self.lookahead.kind) {
            let op_kind = self.lookahead.kind;
            let op_pos = self.lookahead.position;
            let op_name = op_kind.name().trim_matches('\'').to_owned();
            self.bump()?;
            let rhs = self.parse_factor()?;

            if t.is_array() || rhs.is_array() {
                return Err(self.err(op_pos, ErrorKind::IllegalArrayOperation(op_name)));
            }
            let wants_bool = op_kind == TokenKind::And;
            let lhs_ok = if wants_bool { t.is_boolean() } else { t.is_integer() };
            let rhs_ok = if wants_bool { rhs.is_boolean() } else { rhs.is_integer() };
            if !lhs_ok || !rhs_ok {
                let expected = if wants_bool { ValueType::BOOL } else { ValueType::INT };
                let found = if lhs_ok { rhs } else { t };
                return Err(self.err(
                    op_pos,
                    ErrorKind::TypeMismatch { expected: expected.to_string(), found: found.to_string(), context: format!("for operator {op_name}") },
                ));
            }
            t = if wants_bool { ValueType::BOOL } else { ValueType::INT };
        }
        Ok(t)
    }

    /// `factor = id [ index | arglist ] | num | "(" expr ")" | "not" factor | "true" | "false" .`
    fn parse_factor(&mut self) -> PResult<ValueType> {
        match self.lookahead.kind {
            TokenKind::Identifier => {
                let (name, name_pos) = self.expect_id()?;
                let props = self.lookup(&name, name_pos)?;
                if self.lookahead.kind == TokenKind::LBracket {
                    if !props.value_type.is_array() {
                        return Err(self.err(name_pos, ErrorKind::NotAnArray(name)));
                    }
                    self.parse_index()?;
                    Ok(props.value_type.element_type())
                } else if self.lookahead.kind == TokenKind::LParen {
                    if !props.value_type.is_function() {
                        return Err(self.err(name_pos, ErrorKind::NotAFunction(name)));
                    }
                    let args = self.parse_arglist()?;
                    self.check_args(&props, &args, name_pos, &name)?;
                    Ok(props.value_type.return_type())
                } else {
                    Ok(props.value_type)
                }
            }
            TokenKind::IntLiteral => {
                self.bump()?;
                Ok(ValueType::INT)
            }
            TokenKind::LParen => {
                self.bump()?;
                let t = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(t)
            }
            TokenKind::Not => {
                let pos = self.lookahead.position;
                self.bump()?;
                let t = self.parse_factor()?;
                if !t.is_boolean() {
                    return Err(self.err(
                        pos,
                        ErrorKind::TypeMismatch { expected: ValueType::BOOL.to_string(), found: t.to_string(), context: "for operator not".to_owned() },
                    ));
                }
                Ok(ValueType::BOOL)
            }
            TokenKind::True | TokenKind::False => {
                self.bump()?;
                Ok(ValueType::BOOL)
            }
            _ => Err(self.err_here(ErrorKind::ExpectedFactor { found: self.lookahead.kind.name().to_owned() })),
        }
    }

    fn lookup(&self, name: &str, pos: Position) -> PResult<IdentProps> {
        self.symbols.find_name(name).cloned().ok_or_else(|| self.err(pos, ErrorKind::UnknownIdentifier(name.to_owned())))
    }
}

/// Parses and type-checks one AMPL-2023 source file, returning the first
/// fatal diagnostic encountered, if any.
///
/// # Errors
/// Returns the first syntactic or semantic error, with its source
/// position, as soon as it is detected.
pub fn compile(source: &str) -> PResult<CompileUnit> {
    Parser::new(source)?.parse_program()
}
