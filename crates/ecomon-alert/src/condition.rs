use ecomon_common::types::{CompareOp, RuleCondition};

/// A stored condition that violates the operator shape invariant. Conditions
/// are validated at rule-save time, so meeting one here is fatal to that
/// rule's evaluation: the caller reports it and skips the rule.
#[derive(Debug, thiserror::Error)]
#[error("malformed condition on metric '{metric}' (operator {op})")]
pub struct MalformedCondition {
    pub metric: String,
    pub op: CompareOp,
}

/// Evaluates one condition against a measured value.
///
/// Comparison is exact (no epsilon). `between` is inclusive on both ends,
/// `not_between` is its negation. A missing measured value never satisfies
/// the condition (fails closed).
///
/// # Examples
///
/// ```
/// use ecomon_alert::condition::evaluate;
/// use ecomon_common::types::{CompareOp, RuleCondition};
///
/// let c = RuleCondition {
///     metric: "factor.ph".into(),
///     op: CompareOp::Lt,
///     threshold: Some(6.0),
///     min: None,
///     max: None,
/// };
/// assert!(evaluate(&c, Some(5.2)).unwrap());
/// assert!(!evaluate(&c, Some(6.0)).unwrap());
/// assert!(!evaluate(&c, None).unwrap());
/// ```
pub fn evaluate(
    condition: &RuleCondition,
    measured: Option<f64>,
) -> Result<bool, MalformedCondition> {
    let Some(value) = measured else {
        return Ok(false);
    };

    let malformed = || MalformedCondition {
        metric: condition.metric.clone(),
        op: condition.op,
    };

    if condition.op.is_range() {
        let (min, max) = match (condition.min, condition.max) {
            (Some(min), Some(max)) if min <= max => (min, max),
            _ => return Err(malformed()),
        };
        let inside = min <= value && value <= max;
        return Ok(match condition.op {
            CompareOp::Between => inside,
            _ => !inside,
        });
    }

    let threshold = condition.threshold.ok_or_else(malformed)?;
    Ok(match condition.op {
        CompareOp::Gt => value > threshold,
        CompareOp::Gte => value >= threshold,
        CompareOp::Lt => value < threshold,
        CompareOp::Lte => value <= threshold,
        CompareOp::Eq => value == threshold,
        CompareOp::Neq => value != threshold,
        CompareOp::Between | CompareOp::NotBetween => unreachable!("handled above"),
    })
}
