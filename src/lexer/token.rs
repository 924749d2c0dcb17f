use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Keywords
    #[token("abstract")]
    Abstract,
    #[token("assert")]
    Assert,
    #[token("boolean")]
    Boolean,
    #[token("break")]
    Break,
    #[token("byte")]
    Byte,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("char")]
    Char,
    #[token("class")]
    Class,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("do")]
    Do,
    #[token("double")]
    Double,
    #[token("else")]
    Else,
    #[token("enum")]
    Enum,
    #[token("extends")]
    Extends,
    #[token("final")]
    Final,
    #[token("finally")]
    Finally,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("if")]
    If,
    #[token("implements")]
    Implements,
    #[token("import")]
    Import,
    #[token("instanceof")]
    InstanceOf,
    #[token("int")]
    Int,
    #[token("interface")]
    Interface,
    #[token("long")]
    Long,
    #[token("native")]
    Native,
    #[token("new")]
    New,
    #[token("package")]
    Package,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("public")]
    Public,
    #[token("return")]
    Return,
    #[token("short")]
    Short,
    #[token("static")]
    Static,
    #[token("strictfp")]
    Strictfp,
    #[token("super")]
    Super,
    #[token("switch")]
    Switch,
    #[token("synchronized")]
    Synchronized,
    #[token("this")]
    This,
    #[token("throw")]
    Throw,
    #[token("throws")]
    Throws,
    #[token("transient")]
    Transient,
    #[token("try")]
    Try,
    #[token("void")]
    Void,
    #[token("volatile")]
    Volatile,
    #[token("while")]
    While,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Literals. The parser reads their text back from the source.
    #[regex(r"(0[xX][0-9a-fA-F_]+|[0-9][0-9_]*)[lL]")]
    LongLit,
    #[regex(r"0[xX][0-9a-fA-F_]+|[0-9][0-9_]*")]
    IntLit,
    #[regex(r"([0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?|\.[0-9][0-9_]*([eE][+-]?[0-9]+)?|[0-9][0-9_]*[eE][+-]?[0-9]+|[0-9][0-9_]*)[fF]")]
    FloatLit,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[dD]?|\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[dD]?|[0-9][0-9_]*[eE][+-]?[0-9]+[dD]?|[0-9][0-9_]*[dD]")]
    DoubleLit,
    #[regex(r"'([^'\\\n]|\\u[0-9a-fA-F]{4}|\\.)'")]
    CharLit,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    // Identifiers
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    // Operators
    #[token("++")]
    PlusPlus,
    #[token("+")]
    Plus,
    #[token("--")]
    MinusMinus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token(">>>=")]
    UShrEq,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<<")]
    Shl,
    #[token("<")]
    Lt,
    // `>>` and `>>>` are joined by the parser so `List<List<T>>` closes cleanly.
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token("->")]
    Arrow,
    #[token("...")]
    Ellipsis,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("@")]
    At,

    #[regex(r"//[^\n]*")]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,
}

impl Token {
    /// Primitive type keywords (`void` excluded).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Token::Boolean
                | Token::Byte
                | Token::Char
                | Token::Short
                | Token::Int
                | Token::Long
                | Token::Float
                | Token::Double
        )
    }

    /// Declaration modifiers, in any order before a member or type.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Token::Public
                | Token::Protected
                | Token::Private
                | Token::Static
                | Token::Final
                | Token::Abstract
                | Token::Native
                | Token::Synchronized
                | Token::Transient
                | Token::Volatile
                | Token::Strictfp
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::IntLit
                | Token::LongLit
                | Token::FloatLit
                | Token::DoubleLit
                | Token::CharLit
                | Token::StringLit
                | Token::True
                | Token::False
                | Token::Null
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Token::Abstract => "abstract",
            Token::Assert => "assert",
            Token::Boolean => "boolean",
            Token::Break => "break",
            Token::Byte => "byte",
            Token::Case => "case",
            Token::Catch => "catch",
            Token::Char => "char",
            Token::Class => "class",
            Token::Continue => "continue",
            Token::Default => "default",
            Token::Do => "do",
            Token::Double => "double",
            Token::Else => "else",
            Token::Enum => "enum",
            Token::Extends => "extends",
            Token::Final => "final",
            Token::Finally => "finally",
            Token::Float => "float",
            Token::For => "for",
            Token::If => "if",
            Token::Implements => "implements",
            Token::Import => "import",
            Token::InstanceOf => "instanceof",
            Token::Int => "int",
            Token::Interface => "interface",
            Token::Long => "long",
            Token::Native => "native",
            Token::New => "new",
            Token::Package => "package",
            Token::Private => "private",
            Token::Protected => "protected",
            Token::Public => "public",
            Token::Return => "return",
            Token::Short => "short",
            Token::Static => "static",
            Token::Strictfp => "strictfp",
            Token::Super => "super",
            Token::Switch => "switch",
            Token::Synchronized => "synchronized",
            Token::This => "this",
            Token::Throw => "throw",
            Token::Throws => "throws",
            Token::Transient => "transient",
            Token::Try => "try",
            Token::Void => "void",
            Token::Volatile => "volatile",
            Token::While => "while",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::LongLit => "long literal",
            Token::IntLit => "integer literal",
            Token::FloatLit => "float literal",
            Token::DoubleLit => "double literal",
            Token::CharLit => "char literal",
            Token::StringLit => "string literal",
            Token::Ident => "identifier",
            Token::PlusPlus => "++",
            Token::Plus => "+",
            Token::MinusMinus => "--",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::AmpEq => "&=",
            Token::PipeEq => "|=",
            Token::CaretEq => "^=",
            Token::ShlEq => "<<=",
            Token::ShrEq => ">>=",
            Token::UShrEq => ">>>=",
            Token::Eq => "=",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Shl => "<<",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Tilde => "~",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::Bang => "!",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Semi => ";",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::ColonColon => "::",
            Token::Arrow => "->",
            Token::Ellipsis => "...",
            Token::Dot => ".",
            Token::Question => "?",
            Token::At => "@",
            Token::Comment => "comment",
        };
        f.write_str(text)
    }
}
