use crate::azure::SqlManagement;
use crate::traits::{InquireUserInput, Output, TerminalOutput, UserInput};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub input: Arc<dyn UserInput>,
    pub output: Arc<dyn Output>,
    /// Authenticated management client, shared by every stage of the run
    pub sql: Arc<dyn SqlManagement>,
}

impl Context {
    /// Create a context with the terminal prompt/output and an authenticated client
    pub fn new(sql: Arc<dyn SqlManagement>) -> Self {
        Self {
            input: Arc::new(InquireUserInput),
            output: Arc::new(TerminalOutput),
            sql,
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        input: Arc<dyn UserInput>,
        output: Arc<dyn Output>,
        sql: Arc<dyn SqlManagement>,
    ) -> Self {
        Self { input, output, sql }
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            input: Arc::clone(&self.input),
            output: Arc::clone(&self.output),
            sql: Arc::clone(&self.sql),
        }
    }
}
