//! # folio-tools
//!
//! Tool registry and built-in tools for the Folio chat engine.
//!
//! The model never calls code directly: it names a function from the list of
//! advertised schemas and sends its arguments as a JSON object. This crate
//! turns such a [`FunctionCall`] into a handler invocation and a plain-text
//! result.
//!
//! ## Core Components
//!
//! - [`ToolImplementation`]: a schema plus an async handler
//! - [`ToolRegistry`]: name-keyed registry that remembers registration order
//! - [`ToolExecutor`]: parses, binds and dispatches a function call
//! - [`cards`]: the card store the built-in tools read and mutate
//!
//! ## Built-in Tools
//!
//! - [`AlertMessageTool`]: shows a message to the visitor through a [`Notifier`]
//! - [`GetCardsLayoutTool`], [`GetCardContentTool`]: read the card layout
//! - [`ExpandCardTool`], [`CollapseCardTool`]: toggle a card's expansion
//! - [`ReorderCardsTool`]: reorder (and filter) a card collection
//!
//! [`default_tools`] wires all of them to a store and a notifier.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use folio_common::tools::FunctionCall;
//! use folio_tools::cards::{Card, InMemoryCardStore, PROJECTS};
//! use folio_tools::{LogNotifier, ToolExecutor, default_tools};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = InMemoryCardStore::new()
//!     .with_collection(PROJECTS, [Card::new("Raytracer", "A toy path tracer.")])?;
//! let registry = default_tools(Arc::new(store), Arc::new(LogNotifier), false);
//! let executor = ToolExecutor::with_registry(registry);
//!
//! let call = FunctionCall::new("expand_card", r#"{"card_title": "Raytracer"}"#);
//! assert_eq!(executor.execute_tool(&call).await?, "Expanded card Raytracer.");
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use thiserror::Error;

use folio_common::tools::{FunctionCall, Tool};

mod alert_tool;
pub mod args;
mod card_tools;
pub mod cards;

pub use alert_tool::{AlertMessageTool, ChannelNotifier, LogNotifier, Notifier};
pub use args::{ArgumentError, ToolArguments};
pub use card_tools::{
    CollapseCardTool, ExpandCardTool, GetCardContentTool, GetCardsLayoutTool, ReorderCardsTool,
};

#[async_trait]
pub trait ToolImplementation: Send + Sync {
    fn get_definition(&self) -> Tool;

    /// Runs the tool with arguments already bound to its schema.
    ///
    /// Errors are reported back to the model as text; they do not abort the
    /// exchange.
    async fn execute(&self, args: &ToolArguments) -> anyhow::Result<String>;
}

/// Errors produced while dispatching a function call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{0}' not found.")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: ArgumentError,
    },

    #[error("Tool execution failed: {source}")]
    Execution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ToolError {
    /// Whether the exchange can continue by reporting this error to the model.
    ///
    /// Unknown tools and handler failures are recoverable; arguments that do
    /// not bind to the schema are not.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::Execution { .. })
    }

    /// Text appended to the transcript as the function result.
    #[must_use]
    pub fn to_function_result(&self) -> String {
        match self {
            Self::Execution { source, .. } => format!("Tool execution failed: {source:#}"),
            other => other.to_string(),
        }
    }
}

#[derive(Clone)]
struct RegisteredTool {
    schema: Tool,
    handler: Arc<dyn ToolImplementation>,
    advertised: bool,
}

/// Registry of tools keyed by function name.
///
/// Lookup goes through a `DashMap`; a separate name list keeps the order in
/// which tools were first registered so [`schemas`](Self::schemas) is stable.
pub struct ToolRegistry {
    tools: DashMap<String, RegisteredTool>,
    order: RwLock<Vec<String>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Registers a tool and advertises its schema to the model.
    ///
    /// Registering a name twice replaces the earlier tool but keeps its
    /// position.
    pub fn register(&self, tool: Arc<dyn ToolImplementation>) {
        self.insert(tool, true);
    }

    /// Registers a tool that can be dispatched but is left out of
    /// [`schemas`](Self::schemas).
    pub fn register_unadvertised(&self, tool: Arc<dyn ToolImplementation>) {
        self.insert(tool, false);
    }

    fn insert(&self, handler: Arc<dyn ToolImplementation>, advertised: bool) {
        let schema = handler.get_definition();
        let name = schema.name().to_string();

        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);
        if !order.contains(&name) {
            order.push(name.clone());
        }
        debug!("Registered tool '{name}' (advertised: {advertised})");
        self.tools.insert(
            name,
            RegisteredTool {
                schema,
                handler,
                advertised,
            },
        );
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ToolImplementation>> {
        self.tools.get(name).map(|entry| entry.handler.clone())
    }

    #[must_use]
    pub fn schema(&self, name: &str) -> Option<Tool> {
        self.tools.get(name).map(|entry| entry.schema.clone())
    }

    /// Schemas of all advertised tools, in registration order.
    #[must_use]
    pub fn schemas(&self) -> Vec<Tool> {
        self.ordered()
            .into_iter()
            .filter(|entry| entry.advertised)
            .map(|entry| entry.schema)
            .collect()
    }

    #[must_use]
    pub fn is_advertised(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|entry| entry.advertised)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn ToolImplementation>> {
        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);
        order.retain(|n| n != name);
        self.tools.remove(name).map(|(_, entry)| entry.handler)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of every registered tool, advertised or not, in registration order.
    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        self.order
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn ordered(&self) -> Vec<RegisteredTool> {
        let order = self.order.read().unwrap_or_else(PoisonError::into_inner);
        order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|entry| entry.value().clone()))
            .collect()
    }
}

pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(ToolRegistry::new())
    }

    #[must_use]
    pub const fn with_registry(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn add_tool<T: ToolImplementation + 'static>(&self, tool: T) {
        self.registry.register(Arc::new(tool));
    }

    #[must_use]
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Schemas to send to the model with every request.
    #[must_use]
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.registry.schemas()
    }

    /// Executes a function call requested by the model.
    ///
    /// The arguments are parsed before the tool is looked up, so malformed
    /// arguments are reported even for unknown names.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the arguments are not a JSON
    /// object or lack a required parameter, [`ToolError::UnknownTool`] if no
    /// tool has that name, and [`ToolError::Execution`] if the handler fails.
    pub async fn execute_tool(&self, call: &FunctionCall) -> Result<String, ToolError> {
        let invalid = |source| ToolError::InvalidArguments {
            tool: call.name.clone(),
            source,
        };

        let args = ToolArguments::parse(call.arguments_json()).map_err(invalid)?;

        let entry = self
            .registry
            .tools
            .get(&call.name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let args = args.bind(&entry.schema.function.parameters).map_err(invalid)?;

        debug!("Executing tool '{}'", call.name);
        entry
            .handler
            .execute(&args)
            .await
            .map_err(|source| ToolError::Execution {
                tool: call.name.clone(),
                source,
            })
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the registry of built-in tools over a card store and notifier.
///
/// Tools are registered in a fixed order, which is the order their schemas
/// are sent to the model. The skills-and-experience reorder tool is always
/// dispatchable but is only advertised when `expose_skills_reorder` is set.
#[must_use]
pub fn default_tools(
    store: Arc<dyn cards::CardStore>,
    notifier: Arc<dyn Notifier>,
    expose_skills_reorder: bool,
) -> ToolRegistry {
    let registry = ToolRegistry::new();

    registry.register(Arc::new(AlertMessageTool::new(notifier)));
    registry.register(Arc::new(GetCardsLayoutTool::new(store.clone())));
    registry.register(Arc::new(GetCardContentTool::new(store.clone())));
    registry.register(Arc::new(ExpandCardTool::new(store.clone())));
    registry.register(Arc::new(CollapseCardTool::new(store.clone())));
    registry.register(Arc::new(ReorderCardsTool::projects(store.clone())));

    let skills = Arc::new(ReorderCardsTool::skills_and_experience(store));
    if expose_skills_reorder {
        registry.register(skills);
    } else {
        registry.register_unadvertised(skills);
    }

    registry
}
