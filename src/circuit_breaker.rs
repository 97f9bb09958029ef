use failsafe::{backoff, failure_policy, Config};
use std::time::Duration;

/// Circuit breaker type guarding the remote text-classification service.
pub type ClassifierCircuitBreaker = failsafe::StateMachine<
    failsafe::failure_policy::ConsecutiveFailures<failsafe::backoff::Exponential>,
    (),
>;

/// Creates a circuit breaker for the remote text classifier so a flapping or
/// down classifier cannot stall every sentiment request.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// # States
///
/// - **CLOSED**: Normal operation, requests pass through.
/// - **OPEN**: Too many failures, requests fail fast and the sentiment engine
///   uses its keyword fallback.
/// - **HALF_OPEN**: Testing if the classifier recovered.
pub fn create_classifier_circuit_breaker() -> ClassifierCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
