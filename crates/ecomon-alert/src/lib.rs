//! Rule-driven alert evaluation over pluggable metric collectors.
//!
//! The [`engine::RuleEngine`] runs one evaluation sweep per external
//! trigger: it pulls current measurements for every enabled rule through the
//! collector registry, AND-evaluates the rule's conditions per target,
//! applies quiet-period suppression at the persistence boundary and opens
//! [`AlertRecord`]s. The [`recovery::RecoveryMonitor`] re-checks open alerts
//! on its own cadence and transitions them to recovered when conditions
//! normalize. Both hand records off to the notification dispatcher via
//! non-blocking [`AlertSignal`]s.
//!
//! [`AlertRecord`]: ecomon_common::types::AlertRecord
//! [`AlertSignal`]: ecomon_common::types::AlertSignal

pub mod condition;
pub mod engine;
pub mod recovery;
