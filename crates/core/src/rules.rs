//! Ordered, validated, cancellable execution of generation rules.
//! Both the world pipeline and the room pipeline are a `RuleEngine` over
//! their own context type; rules only communicate through that context.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::control::{Cancelled, RunControl};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("{0}")]
    Failed(String),
    #[error("cancelled")]
    Cancelled,
}

impl From<Cancelled> for RuleError {
    fn from(_: Cancelled) -> Self {
        RuleError::Cancelled
    }
}

impl From<PipelineError> for RuleError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Cancelled { .. } => RuleError::Cancelled,
            other => RuleError::Failed(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("rule `{rule}` is misconfigured: {message}")]
    InvalidRule { rule: String, message: String },
    #[error("rule `{rule}` failed: {message}")]
    RuleFailed { rule: String, message: String },
    #[error("generation cancelled at rule `{rule}`")]
    Cancelled { rule: String },
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }

    pub fn rule(&self) -> &str {
        match self {
            PipelineError::InvalidRule { rule, .. }
            | PipelineError::RuleFailed { rule, .. }
            | PipelineError::Cancelled { rule } => rule,
        }
    }
}

/// One generation step. Rules read and write the shared context and must not
/// assume anything about rules that run after them.
pub trait Rule<C> {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    /// Ascending execution order; ties keep registration order.
    fn order(&self) -> i32;

    /// Static configuration check, run for every enabled rule before any executes.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn execute(&mut self, context: &mut C, control: &mut RunControl<'_>) -> Result<(), RuleError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct RuleEngine<C> {
    label: &'static str,
    rules: Vec<Box<dyn Rule<C>>>,
}

impl<C> RuleEngine<C> {
    pub fn new(label: &'static str) -> Self {
        Self { label, rules: Vec::new() }
    }

    pub fn register(&mut self, rule: impl Rule<C> + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn with(mut self, rule: impl Rule<C> + 'static) -> Self {
        self.register(rule);
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        for rule in self.rules.iter().filter(|rule| rule.enabled()) {
            rule.validate().map_err(|message| PipelineError::InvalidRule {
                rule: rule.name().to_string(),
                message,
            })?;
        }
        Ok(())
    }

    pub fn run(
        &mut self,
        context: &mut C,
        control: &mut RunControl<'_>,
    ) -> Result<PipelineReport, PipelineError> {
        self.validate()?;

        let mut report = PipelineReport::default();
        let mut schedule: Vec<usize> = Vec::with_capacity(self.rules.len());
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.enabled() {
                schedule.push(index);
            } else {
                debug!(pipeline = self.label, rule = rule.name(), "rule disabled, skipping");
                report.skipped.push(rule.name().to_string());
            }
        }
        schedule.sort_by_key(|&index| self.rules[index].order());

        for index in schedule {
            let rule = &mut self.rules[index];
            let name = rule.name().to_string();
            if control.poll().is_err() {
                info!(pipeline = self.label, rule = %name, "generation cancelled");
                return Err(PipelineError::Cancelled { rule: name });
            }

            debug!(pipeline = self.label, rule = %name, "executing rule");
            match rule.execute(context, control) {
                Ok(()) => report.executed.push(name),
                Err(RuleError::Cancelled) => {
                    info!(pipeline = self.label, rule = %name, "generation cancelled");
                    return Err(PipelineError::Cancelled { rule: name });
                }
                Err(RuleError::Failed(message)) => {
                    warn!(pipeline = self.label, rule = %name, %message, "rule failed");
                    return Err(PipelineError::RuleFailed { rule: name, message });
                }
            }
        }

        Ok(report)
    }
}
