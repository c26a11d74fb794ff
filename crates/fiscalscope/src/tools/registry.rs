//! Tool trait, session state and the registry agents invoke by name.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::{DataContext, ValidationCache};
use super::{eda, fiscal};
use crate::analysis::StatisticalAnalyzer;
use crate::config::ReportLimits;
use crate::error::{Result, ScopeError};
use crate::input::Dataset;
use crate::validation::{FiscalRuleEngine, ValidationResult};

/// Domain a tool belongs to. Picking the domain for a question happens
/// outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// NF-e auditing.
    Fiscal,
    /// Exploratory analysis of any table.
    Eda,
}

impl Domain {
    pub fn label(&self) -> &'static str {
        match self {
            Domain::Fiscal => "fiscal",
            Domain::Eda => "eda",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State shared by the tools of one conversation.
#[derive(Debug, Default)]
pub struct ToolSession {
    data: DataContext,
    cache: ValidationCache,
    analyzer: StatisticalAnalyzer,
    limits: ReportLimits,
}

impl ToolSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.load(dataset);
        self
    }

    pub fn with_analyzer(mut self, analyzer: StatisticalAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_engine(mut self, engine: FiscalRuleEngine) -> Self {
        self.cache = ValidationCache::with_engine(engine);
        self
    }

    pub fn with_limits(mut self, limits: ReportLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the dataset; cached validation results become stale.
    pub fn load(&mut self, dataset: Dataset) -> u64 {
        self.data.set_dataset(dataset)
    }

    pub fn data(&self) -> &DataContext {
        &self.data
    }

    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.data.require_dataset()
    }

    /// Validation results for the current dataset, computed at most once
    /// per generation.
    pub fn validation_results(&mut self) -> Result<Arc<Vec<ValidationResult>>> {
        self.cache.results(&self.data)
    }

    pub fn has_fresh_results(&self) -> bool {
        self.cache.is_fresh(&self.data)
    }

    pub fn analyzer(&self) -> &StatisticalAnalyzer {
        &self.analyzer
    }

    pub fn limits(&self) -> ReportLimits {
        self.limits
    }
}

/// Trait for agent tools.
pub trait Tool: Send + Sync {
    /// Identifier given to the agent.
    fn name(&self) -> &'static str;

    /// What the tool does, shown to the agent.
    fn description(&self) -> &'static str;

    fn domain(&self) -> Domain;

    /// Run the tool on free-text input.
    fn call(&self, session: &mut ToolSession, input: &str) -> Result<String>;
}

/// Handler signature of a [`FunctionTool`].
pub type ToolHandler = fn(&mut ToolSession, &str) -> Result<String>;

/// A tool backed by a plain function.
pub struct FunctionTool {
    name: &'static str,
    description: &'static str,
    domain: Domain,
    handler: ToolHandler,
}

impl FunctionTool {
    pub const fn new(name: &'static str, domain: Domain, description: &'static str, handler: ToolHandler) -> Self {
        Self {
            name,
            description,
            domain,
            handler,
        }
    }
}

impl Tool for FunctionTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn domain(&self) -> Domain {
        self.domain
    }

    fn call(&self, session: &mut ToolSession, input: &str) -> Result<String> {
        (self.handler)(session, input)
    }
}

/// Render an error as user-facing text.
pub fn render_error(error: &ScopeError) -> String {
    match error {
        ScopeError::MissingColumns(columns) => {
            format!("Colunas obrigatórias ausentes: {}.", columns.join(", "))
        }
        ScopeError::EmptyData(message) => message.clone(),
        other => format!("Não foi possível concluir a operação: {}", other),
    }
}

/// Every tool, looked up by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry with the fiscal and exploratory tools.
    pub fn new() -> Self {
        let mut tools: Vec<Box<dyn Tool>> = Vec::new();
        tools.extend(fiscal::tools().into_iter().map(|t| Box::new(t) as Box<dyn Tool>));
        tools.extend(eda::tools().into_iter().map(|t| Box::new(t) as Box<dyn Tool>));
        Self { tools }
    }

    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool; a tool with the same name is replaced.
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(Box::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn for_domain(&self, domain: Domain) -> impl Iterator<Item = &dyn Tool> {
        self.tools
            .iter()
            .filter(move |t| t.domain() == domain)
            .map(|t| t.as_ref())
    }

    /// Run a tool by name. Errors come back as text, never as a panic.
    pub fn invoke(&self, session: &mut ToolSession, name: &str, input: &str) -> String {
        let name = name.trim();
        let Some(tool) = self.get(name) else {
            return format!(
                "Ferramenta '{}' não encontrada. Ferramentas disponíveis: {}.",
                name,
                self.names().join(", ")
            );
        };

        debug!(tool = name, domain = %tool.domain(), "invoking tool");
        match tool.call(session, input) {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                render_error(&e)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}
