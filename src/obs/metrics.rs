// self
use crate::obs::{Operation, Outcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(operation: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"helix_relay_call_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}
