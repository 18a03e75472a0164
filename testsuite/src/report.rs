use std::fmt;

#[derive(Debug, Clone)]
pub struct TestResult {
    /// The fixture file name.
    pub test: String,
    pub outcome: TestOutcome,
}

#[derive(Debug, Clone)]
pub enum TestOutcome {
    Passed,
    Failed { error: String },
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            TestOutcome::Passed => write!(f, "{}: passed", self.test),
            TestOutcome::Failed { error } => write!(f, "{}: failed with error {}", self.test, error),
        }
    }
}
