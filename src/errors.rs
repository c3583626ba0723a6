use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortloopError {
    InvalidUrl(String),
    InvalidExpiry(String),
    InvalidAlias(String),
    AliasTaken(String),
    CodeSpaceExhausted(String),
    NotFound(String),
    LinkExpired(String),
    Conflict(String),
    StoreUnavailable(String),
    CreateAmbiguous(String),
    CacheConnection(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    DateParse(String),
    Config(String),
}

impl ShortloopError {
    pub fn code(&self) -> &'static str {
        match self {
            ShortloopError::InvalidUrl(_) => "E001",
            ShortloopError::InvalidExpiry(_) => "E002",
            ShortloopError::InvalidAlias(_) => "E003",
            ShortloopError::AliasTaken(_) => "E004",
            ShortloopError::CodeSpaceExhausted(_) => "E005",
            ShortloopError::NotFound(_) => "E006",
            ShortloopError::LinkExpired(_) => "E007",
            ShortloopError::Conflict(_) => "E008",
            ShortloopError::StoreUnavailable(_) => "E009",
            ShortloopError::CreateAmbiguous(_) => "E010",
            ShortloopError::CacheConnection(_) => "E011",
            ShortloopError::DatabaseConnection(_) => "E012",
            ShortloopError::DatabaseOperation(_) => "E013",
            ShortloopError::Serialization(_) => "E014",
            ShortloopError::DateParse(_) => "E015",
            ShortloopError::Config(_) => "E016",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ShortloopError::InvalidUrl(_) => "Invalid URL",
            ShortloopError::InvalidExpiry(_) => "Invalid Expiration Time",
            ShortloopError::InvalidAlias(_) => "Invalid Alias",
            ShortloopError::AliasTaken(_) => "Alias Taken",
            ShortloopError::CodeSpaceExhausted(_) => "Code Space Exhausted",
            ShortloopError::NotFound(_) => "Link Not Found",
            ShortloopError::LinkExpired(_) => "Link Expired",
            ShortloopError::Conflict(_) => "Code Conflict",
            ShortloopError::StoreUnavailable(_) => "Store Unavailable",
            ShortloopError::CreateAmbiguous(_) => "Create Outcome Ambiguous",
            ShortloopError::CacheConnection(_) => "Cache Connection Error",
            ShortloopError::DatabaseConnection(_) => "Database Connection Error",
            ShortloopError::DatabaseOperation(_) => "Database Operation Error",
            ShortloopError::Serialization(_) => "Serialization Error",
            ShortloopError::DateParse(_) => "Date Parse Error",
            ShortloopError::Config(_) => "Configuration Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ShortloopError::InvalidUrl(msg)
            | ShortloopError::InvalidExpiry(msg)
            | ShortloopError::InvalidAlias(msg)
            | ShortloopError::AliasTaken(msg)
            | ShortloopError::CodeSpaceExhausted(msg)
            | ShortloopError::NotFound(msg)
            | ShortloopError::LinkExpired(msg)
            | ShortloopError::Conflict(msg)
            | ShortloopError::StoreUnavailable(msg)
            | ShortloopError::CreateAmbiguous(msg)
            | ShortloopError::CacheConnection(msg)
            | ShortloopError::DatabaseConnection(msg)
            | ShortloopError::DatabaseOperation(msg)
            | ShortloopError::Serialization(msg)
            | ShortloopError::DateParse(msg)
            | ShortloopError::Config(msg) => msg,
        }
    }

    /// Whether a read path may retry this error. Only transient backend
    /// unavailability qualifies; conflicts and validation failures are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShortloopError::StoreUnavailable(_))
    }
}

impl fmt::Display for ShortloopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for ShortloopError {}

// Convenience constructors
impl ShortloopError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        ShortloopError::InvalidUrl(msg.into())
    }

    pub fn invalid_expiry<T: Into<String>>(msg: T) -> Self {
        ShortloopError::InvalidExpiry(msg.into())
    }

    pub fn invalid_alias<T: Into<String>>(msg: T) -> Self {
        ShortloopError::InvalidAlias(msg.into())
    }

    pub fn alias_taken<T: Into<String>>(msg: T) -> Self {
        ShortloopError::AliasTaken(msg.into())
    }

    pub fn code_space_exhausted<T: Into<String>>(msg: T) -> Self {
        ShortloopError::CodeSpaceExhausted(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortloopError::NotFound(msg.into())
    }

    pub fn link_expired<T: Into<String>>(msg: T) -> Self {
        ShortloopError::LinkExpired(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        ShortloopError::Conflict(msg.into())
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        ShortloopError::StoreUnavailable(msg.into())
    }

    pub fn create_ambiguous<T: Into<String>>(msg: T) -> Self {
        ShortloopError::CreateAmbiguous(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        ShortloopError::CacheConnection(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortloopError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortloopError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortloopError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        ShortloopError::DateParse(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortloopError::Config(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortloopError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            // connection-level failures are transient and retriable on reads
            sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
                ShortloopError::StoreUnavailable(err.to_string())
            }
            other => ShortloopError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ShortloopError {
    fn from(err: serde_json::Error) -> Self {
        ShortloopError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for ShortloopError {
    fn from(err: chrono::ParseError) -> Self {
        ShortloopError::DateParse(err.to_string())
    }
}

impl From<redis::RedisError> for ShortloopError {
    fn from(err: redis::RedisError) -> Self {
        ShortloopError::CacheConnection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortloopError>;
