use derive_more::{Display, From};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, From, Display)]
pub enum Error {
    #[from]
    Custom(String),

    Syntax(SyntaxErrors),

    #[from]
    Runtime(lox_interpreter::Error),

    #[from]
    StdIoError(std::io::Error),
}

impl Error {
    pub fn custom(val: impl std::fmt::Display) -> Self {
        Self::Custom(val.to_string())
    }

    /// Process exit status for a script that failed with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Custom(_) => 64,
            Self::Syntax(_) => 65,
            Self::Runtime(_) => 70,
            Self::StdIoError(_) => 74,
        }
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self::Custom(value.to_string())
    }
}

impl std::error::Error for Error {}

/// Every diagnostic the lexer and parser produced for one piece of source.
#[derive(Debug)]
pub struct SyntaxErrors(pub Vec<lox_syntax::Error>);

impl std::fmt::Display for SyntaxErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Prints an error the way the user should see it.
pub fn report(error: &Error) {
    eprintln!("{}", error);
}
