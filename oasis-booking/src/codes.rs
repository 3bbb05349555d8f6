use chrono::Utc;

/// Issues reservation codes at commit time.
///
/// Injected behind a trait so commit collision paths can be driven
/// deterministically in tests.
pub trait CodeIssuer: Send + Sync {
    fn issue(&self) -> String;
}

/// Production issuer: a configured prefix plus the current UTC clock at
/// second precision, e.g. `OASIS20250701184210`. Two commits inside the
/// same second collide; the store's unique key turns the second one into
/// an explicit conflict instead of a silent overwrite.
pub struct TimestampCodeIssuer {
    prefix: String,
}

impl TimestampCodeIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl CodeIssuer for TimestampCodeIssuer {
    fn issue(&self) -> String {
        format!("{}{}", self.prefix, Utc::now().format("%Y%m%d%H%M%S"))
    }
}

/// Issuer that always returns the same code; used to force collisions
/// in tests.
pub struct MockCodeIssuer(pub String);

impl CodeIssuer for MockCodeIssuer {
    fn issue(&self) -> String {
        self.0.clone()
    }
}
