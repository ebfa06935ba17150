use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

/// Keys masked by default before a context reaches the log output.
pub const DEFAULT_REDACTED_KEYS: &[&str] = &["senha", "password", "token", "secret"];

/// Structured security-event sink over `tracing`.
///
/// The redaction set is injected at construction rather than held in a
/// shared static, so tests can supply their own. Callers are expected not
/// to pass raw secrets; masking here is defense in depth.
#[derive(Clone)]
pub struct AuditLog {
    redacted: Arc<HashSet<String>>,
}

impl AuditLog {
    pub fn new<I, S>(redacted_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            redacted: Arc::new(redacted_keys.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_REDACTED_KEYS.iter().copied())
    }

    fn sanitize(&self, mut context: Value) -> Value {
        if let Value::Object(map) = &mut context {
            for (key, value) in map.iter_mut() {
                if self.redacted.contains(key.as_str()) {
                    *value = Value::String("***".into());
                }
            }
        }
        context
    }

    pub fn info(&self, event: &str, context: Value) {
        let context = self.sanitize(context);
        info!(event, context = %context, "security event");
    }

    pub fn warning(&self, event: &str, context: Value) {
        let context = self.sanitize(context);
        warn!(event, context = %context, "security event");
    }

    pub fn error(&self, event: &str, context: Value) {
        let context = self.sanitize(context);
        error!(event, context = %context, "security event");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_keys_are_masked() {
        let audit = AuditLog::with_defaults();
        let clean = audit.sanitize(json!({
            "email": "a@b.com",
            "senha": "hunter2",
            "token": "deadbeef",
        }));
        assert_eq!(clean["email"], "a@b.com");
        assert_eq!(clean["senha"], "***");
        assert_eq!(clean["token"], "***");
    }

    #[test]
    fn custom_redaction_set_replaces_defaults() {
        let audit = AuditLog::new(["cpf"]);
        let clean = audit.sanitize(json!({ "cpf": "123", "senha": "visible" }));
        assert_eq!(clean["cpf"], "***");
        assert_eq!(clean["senha"], "visible");
    }

    #[test]
    fn non_object_context_passes_through() {
        let audit = AuditLog::with_defaults();
        assert_eq!(audit.sanitize(json!("plain")), json!("plain"));
    }
}
