//! Failover decision engine.
//!
//! Turns health-check results into one of three outcomes: the active provider
//! is fine, the user must pick another provider (credits exhausted), or the
//! failure needs a manual fix that switching would not solve.

use tracing::{debug, info};

use relay_core::AuthMethod;

use crate::providers::HealthCheck;
use crate::providers::vertex::MISSING_PROJECT_MESSAGE;
use crate::types::{ErrorKind, PromptOption, PromptResponse, ProviderIdentity, ProviderStatus};

const QUESTION: &str = "Which provider would you like to use?";

/// What the caller should do after probing the active provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailoverOutcome {
    /// The active provider answered the probe.
    Healthy(ProviderStatus),
    /// Credits ran out; ask the user which provider to use next.
    NeedsDecision(PromptResponse),
    /// The active provider failed for a reason switching cannot fix.
    Blocked(ProviderStatus),
}

/// Build the four-option switch prompt for a provider that ran out of credits.
///
/// Both statuses must come from real health checks; the prompt does no
/// probing of its own.
pub fn build_prompt_response(failed: &ProviderStatus, alternative: &ProviderStatus) -> PromptResponse {
    let failed_name = failed.provider().display_name();
    let alt = alternative.provider();
    let alt_name = alt.display_name();

    let switch_description = if alternative.is_available() {
        format!("Use {alt_name} instead")
    } else {
        format!("Requires setup ({})", alternative.error().unwrap_or("unavailable"))
    };

    let options = vec![
        PromptOption {
            label: format!("Switch to {alt_name}"),
            value: alt.as_str().to_string(),
            description: Some(switch_description),
            available: alternative.is_available(),
        },
        PromptOption {
            label: "Use Claude subscription".into(),
            value: "subscription".into(),
            description: Some("Log in with Claude Pro/Max (run: claude login)".into()),
            available: true,
        },
        PromptOption {
            label: format!("Retry {failed_name}"),
            value: "retry".into(),
            description: Some("Try again (may be a transient error)".into()),
            available: true,
        },
        PromptOption {
            label: "Cancel".into(),
            value: "cancel".into(),
            description: Some("Stay with current provider".into()),
            available: true,
        },
    ];

    PromptResponse {
        prompt_user: true,
        reason: format!(
            "{failed_name} error: {}",
            failed.error().unwrap_or("Unknown error")
        ),
        question: QUESTION.into(),
        options,
    }
}

/// Probe `active`; if it ran out of credits, probe `alternative` and build a
/// prompt. The two probes run strictly one after the other.
pub async fn evaluate_failover(active: &dyn HealthCheck, alternative: &dyn HealthCheck) -> FailoverOutcome {
    let status = active.check().await;

    if status.is_available() {
        debug!(provider = %status.provider(), "active provider healthy");
        return FailoverOutcome::Healthy(status);
    }

    if !status.is_switch_worthy() {
        debug!(
            provider = %status.provider(),
            kind = ?status.error_kind(),
            "active provider blocked"
        );
        return FailoverOutcome::Blocked(status);
    }

    let alt_status = alternative.check().await;
    info!(
        failed = %status.provider(),
        alternative = %alt_status.provider(),
        alternative_available = alt_status.is_available(),
        "credits exhausted, asking user to choose a provider"
    );
    FailoverOutcome::NeedsDecision(build_prompt_response(&status, &alt_status))
}

/// Fix-it instructions for a failure that switching providers will not solve.
///
/// Returns `None` for an available provider.
pub fn remediation_hint(status: &ProviderStatus, auth_method: AuthMethod) -> Option<String> {
    let kind = status.error_kind()?;
    let hint = match (status.provider(), kind) {
        (ProviderIdentity::Vertex, ErrorKind::Auth) => match auth_method {
            AuthMethod::Adc => "Run \"gcloud auth application-default login\"".to_string(),
            AuthMethod::ServiceAccount => {
                "Check your service account key file path (relay setup --auth service-account --service-account-path <key.json>)"
                    .to_string()
            }
        },
        (ProviderIdentity::Vertex, ErrorKind::Config) => {
            if status.error() == Some(MISSING_PROJECT_MESSAGE) {
                "Run \"relay setup --project <PROJECT_ID>\" to configure".to_string()
            } else {
                "Enable the Claude model in Vertex AI Model Garden for your project and region, or run \"relay setup\" to change them"
                    .to_string()
            }
        }
        (ProviderIdentity::Vertex, ErrorKind::Credits) => {
            "Check billing and quota for your GCP project".to_string()
        }
        (ProviderIdentity::Anthropic, ErrorKind::Auth) => {
            "Set ANTHROPIC_API_KEY environment variable to a valid key".to_string()
        }
        (ProviderIdentity::Anthropic, ErrorKind::Credits) => {
            "Add credits to your Anthropic account".to_string()
        }
        // Usually a token failure: gcloud missing or no application-default credentials.
        (ProviderIdentity::Vertex, ErrorKind::Other) => {
            "Make sure gcloud is installed and on PATH, run \"gcloud auth application-default login\", then check your network connection"
                .to_string()
        }
        (ProviderIdentity::Anthropic, ErrorKind::Other | ErrorKind::Config) => {
            "Check your network connection and try again".to_string()
        }
    };
    Some(hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCheck {
        status: ProviderStatus,
        calls: AtomicUsize,
    }

    impl FixedCheck {
        fn new(status: ProviderStatus) -> Self {
            Self {
                status,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HealthCheck for FixedCheck {
        fn provider(&self) -> ProviderIdentity {
            self.status.provider()
        }

        async fn check(&self) -> ProviderStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.status.clone()
        }
    }

    fn vertex_out_of_credits() -> ProviderStatus {
        ProviderStatus::unavailable(ProviderIdentity::Vertex, "RESOURCE_EXHAUSTED", ErrorKind::Credits)
    }

    #[test]
    fn prompt_for_vertex_credits_with_anthropic_available() {
        let prompt = build_prompt_response(
            &vertex_out_of_credits(),
            &ProviderStatus::available(ProviderIdentity::Anthropic),
        );

        assert!(prompt.prompt_user);
        assert!(prompt.reason.contains("Vertex AI error: RESOURCE_EXHAUSTED"));
        assert_eq!(prompt.question, "Which provider would you like to use?");

        let first = &prompt.options[0];
        assert_eq!(first.label, "Switch to Anthropic");
        assert_eq!(first.value, "anthropic");
        assert!(first.available);
        assert_eq!(first.description.as_deref(), Some("Use Anthropic instead"));
    }

    #[test]
    fn prompt_has_four_options_in_fixed_order() {
        let prompt = build_prompt_response(
            &vertex_out_of_credits(),
            &ProviderStatus::available(ProviderIdentity::Anthropic),
        );

        let values: Vec<_> = prompt.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["anthropic", "subscription", "retry", "cancel"]);
        assert!(prompt.options[1..].iter().all(|o| o.available));
        assert_eq!(prompt.options[2].label, "Retry Vertex AI");
    }

    #[test]
    fn prompt_marks_unavailable_alternative() {
        let failed = ProviderStatus::unavailable(
            ProviderIdentity::Anthropic,
            "credit_balance_too_low",
            ErrorKind::Credits,
        );
        let alternative = ProviderStatus::unavailable(
            ProviderIdentity::Vertex,
            MISSING_PROJECT_MESSAGE,
            ErrorKind::Config,
        );

        let prompt = build_prompt_response(&failed, &alternative);
        assert_eq!(prompt.reason, "Anthropic error: credit_balance_too_low");

        let first = &prompt.options[0];
        assert_eq!(first.label, "Switch to Vertex AI");
        assert_eq!(first.value, "vertex");
        assert!(!first.available);
        assert!(first.description.as_deref().unwrap().contains(MISSING_PROJECT_MESSAGE));
        assert!(prompt.options[1..].iter().all(|o| o.available));
    }

    #[tokio::test]
    async fn healthy_active_skips_alternative() {
        let active = FixedCheck::new(ProviderStatus::available(ProviderIdentity::Vertex));
        let alternative = FixedCheck::new(ProviderStatus::available(ProviderIdentity::Anthropic));

        let outcome = evaluate_failover(&active, &alternative).await;
        assert!(matches!(outcome, FailoverOutcome::Healthy(ref s) if s.is_available()));
        assert_eq!(active.calls(), 1);
        assert_eq!(alternative.calls(), 0);
    }

    #[tokio::test]
    async fn auth_failure_is_blocked_without_probing_alternative() {
        let failed = ProviderStatus::unavailable(ProviderIdentity::Vertex, "UNAUTHENTICATED", ErrorKind::Auth);
        let active = FixedCheck::new(failed.clone());
        let alternative = FixedCheck::new(ProviderStatus::available(ProviderIdentity::Anthropic));

        let outcome = evaluate_failover(&active, &alternative).await;
        assert_eq!(outcome, FailoverOutcome::Blocked(failed));
        assert_eq!(alternative.calls(), 0);
    }

    #[tokio::test]
    async fn other_failure_is_blocked() {
        let failed = ProviderStatus::unavailable(ProviderIdentity::Anthropic, "Connection failed", ErrorKind::Other);
        let active = FixedCheck::new(failed);
        let alternative = FixedCheck::new(ProviderStatus::available(ProviderIdentity::Vertex));

        let outcome = evaluate_failover(&active, &alternative).await;
        assert!(matches!(outcome, FailoverOutcome::Blocked(_)));
        assert_eq!(alternative.calls(), 0);
    }

    #[tokio::test]
    async fn credits_failure_probes_alternative_and_prompts() {
        let active = FixedCheck::new(vertex_out_of_credits());
        let alternative = FixedCheck::new(ProviderStatus::available(ProviderIdentity::Anthropic));

        let outcome = evaluate_failover(&active, &alternative).await;
        let FailoverOutcome::NeedsDecision(prompt) = outcome else {
            panic!("expected a decision prompt");
        };
        assert_eq!(prompt.options[0].value, "anthropic");
        assert!(prompt.options[0].available);
        assert_eq!(active.calls(), 1);
        assert_eq!(alternative.calls(), 1);
    }

    #[test]
    fn no_hint_for_available_provider() {
        let status = ProviderStatus::available(ProviderIdentity::Vertex);
        assert!(remediation_hint(&status, AuthMethod::Adc).is_none());
    }

    #[test]
    fn vertex_auth_hint_depends_on_auth_method() {
        let status = ProviderStatus::unavailable(ProviderIdentity::Vertex, "UNAUTHENTICATED", ErrorKind::Auth);
        assert!(
            remediation_hint(&status, AuthMethod::Adc)
                .unwrap()
                .contains("gcloud auth application-default login")
        );
        assert!(
            remediation_hint(&status, AuthMethod::ServiceAccount)
                .unwrap()
                .contains("service account key file")
        );
    }

    #[test]
    fn vertex_config_hints() {
        let missing = ProviderStatus::unavailable(ProviderIdentity::Vertex, MISSING_PROJECT_MESSAGE, ErrorKind::Config);
        assert!(remediation_hint(&missing, AuthMethod::Adc).unwrap().contains("relay setup"));

        let no_model = ProviderStatus::unavailable(ProviderIdentity::Vertex, "NOT_FOUND: model", ErrorKind::Config);
        assert!(remediation_hint(&no_model, AuthMethod::Adc).unwrap().contains("Model Garden"));
    }

    #[test]
    fn vertex_other_hint_points_at_gcloud() {
        let status = ProviderStatus::unavailable(
            ProviderIdentity::Vertex,
            "Failed to obtain access token: failed to execute `gcloud`",
            ErrorKind::Other,
        );
        let hint = remediation_hint(&status, AuthMethod::Adc).unwrap();
        assert!(hint.contains("gcloud is installed and on PATH"));
        assert!(hint.contains("gcloud auth application-default login"));

        let anthropic = ProviderStatus::unavailable(ProviderIdentity::Anthropic, "Connection failed", ErrorKind::Other);
        assert!(remediation_hint(&anthropic, AuthMethod::Adc).unwrap().contains("network connection"));
    }

    #[test]
    fn anthropic_auth_hint_mentions_api_key() {
        let status = ProviderStatus::unavailable(ProviderIdentity::Anthropic, "invalid_api_key", ErrorKind::Auth);
        assert!(remediation_hint(&status, AuthMethod::Adc).unwrap().contains("ANTHROPIC_API_KEY"));
    }
}
