use std::fmt::Display;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,

    // One or two character tokens.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    STRING,
    NUMBER,

    // Keywords.
    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    // never produced by the lexer, kept for hosts that split input by line
    EOL,
    EOF,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        line: usize,
    ) -> Self {
        Self {
            token_type,
            lexeme: lexeme.into(),
            literal,
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenType::EOF, "", None, line)
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            TokenType::LEFT_PAREN => write!(f, "("),
            TokenType::RIGHT_PAREN => write!(f, ")"),
            TokenType::LEFT_BRACE => write!(f, "{{"),
            TokenType::RIGHT_BRACE => write!(f, "}}"),
            TokenType::COMMA => write!(f, ","),
            TokenType::DOT => write!(f, "."),
            TokenType::MINUS => write!(f, "-"),
            TokenType::PLUS => write!(f, "+"),
            TokenType::SEMICOLON => write!(f, ";"),
            TokenType::SLASH => write!(f, "/"),
            TokenType::STAR => write!(f, "*"),
            TokenType::BANG => write!(f, "!"),
            TokenType::BANG_EQUAL => write!(f, "!="),
            TokenType::EQUAL => write!(f, "="),
            TokenType::EQUAL_EQUAL => write!(f, "=="),
            TokenType::GREATER => write!(f, ">"),
            TokenType::GREATER_EQUAL => write!(f, ">="),
            TokenType::LESS => write!(f, "<"),
            TokenType::LESS_EQUAL => write!(f, "<="),
            TokenType::IDENTIFIER => write!(f, "Identifier"),
            TokenType::STRING => write!(f, "String"),
            TokenType::NUMBER => write!(f, "Number"),
            TokenType::AND => write!(f, "And"),
            TokenType::CLASS => write!(f, "Class"),
            TokenType::ELSE => write!(f, "Else"),
            TokenType::FALSE => write!(f, "False"),
            TokenType::FUN => write!(f, "Function"),
            TokenType::FOR => write!(f, "For"),
            TokenType::IF => write!(f, "If"),
            TokenType::NIL => write!(f, "Nil"),
            TokenType::OR => write!(f, "Or"),
            TokenType::PRINT => write!(f, "Print"),
            TokenType::RETURN => write!(f, "Return"),
            TokenType::SUPER => write!(f, "Super"),
            TokenType::THIS => write!(f, "This"),
            TokenType::TRUE => write!(f, "True"),
            TokenType::VAR => write!(f, "Var"),
            TokenType::WHILE => write!(f, "While"),
            TokenType::EOL => write!(f, "Eol"),
            TokenType::EOF => write!(f, "Eof"),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{}", s),
            Literal::Number(x) => write!(f, "{}", x),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Nil => write!(f, "nil"),
        }
    }
}

impl From<&Token> for TokenType {
    fn from(token: &Token) -> Self {
        token.token_type
    }
}

// `TYPE lexeme literal`, handy when dumping the token stream
impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.literal {
            Some(literal) => write!(f, "{:?} {} {}", self.token_type, self.lexeme, literal),
            None => write!(f, "{:?} {}", self.token_type, self.lexeme),
        }
    }
}
