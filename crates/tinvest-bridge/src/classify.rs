use tinvest_client::{ClientError, Code};
use tracing::debug;

use crate::error::ToolError;

/// Map a collaborator failure onto the per-call error taxonomy.
///
/// Only the NotFound status is singled out; everything else keeps the
/// backend's message verbatim.
pub fn classify(operation: &'static str, err: &ClientError) -> ToolError {
    let failure = err.failure();
    debug!(%operation, code = %failure.code, "Classifying backend failure");
    match failure.code {
        Code::NotFound => ToolError::BackendNotFound {
            operation,
            message: failure.message,
        },
        _ => ToolError::Backend {
            operation,
            message: failure.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_gets_diagnostic() {
        let err = ClientError::status(Code::NotFound, "50004: account not found");
        let classified = classify("portfolio", &err);

        assert_eq!(
            classified,
            ToolError::BackendNotFound {
                operation: "portfolio",
                message: "50004: account not found".to_string(),
            }
        );
        let text = classified.to_string();
        assert!(text.contains("account id"));
        assert!(text.contains("sandbox"));
    }

    #[test]
    fn other_statuses_keep_message_verbatim() {
        let err = ClientError::status(Code::PermissionDenied, "40002: insufficient privileges");
        assert_eq!(
            classify("buy", &err),
            ToolError::Backend {
                operation: "buy",
                message: "40002: insufficient privileges".to_string(),
            }
        );
    }

    #[test]
    fn closed_client_is_a_generic_backend_error() {
        assert!(matches!(
            classify("last_price", &ClientError::Closed),
            ToolError::Backend { operation: "last_price", .. }
        ));
    }
}
