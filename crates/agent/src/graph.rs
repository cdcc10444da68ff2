//! Agent definitions and the handoff graph
//!
//! Agents reference each other by name only, so cyclic handoff
//! relationships (tracker → calculator → tracker) are ordinary data. All
//! name resolution happens once, at build time; a bad edge is a
//! configuration error and the graph refuses to exist.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use wei_provider::{enum_schema, Tool};

use crate::tools::{to_provider_tool, ToolRegistry, ToolTrait};

/// Name of the synthesized handoff tool.
pub const TRANSFER_TOOL_NAME: &str = "transfer_to_agent";

/// Graph construction errors. All of these are fatal: the process should
/// not start with a half-valid agent graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate agent name: {0}")]
    DuplicateAgent(String),

    #[error("agent '{agent}' declares unknown handoff target '{target}'")]
    UnknownHandoffTarget { agent: String, target: String },

    #[error("agent '{agent}' declares duplicate tool '{tool}'")]
    DuplicateTool { agent: String, tool: String },

    #[error("agent '{agent}' tool '{tool}' has a malformed parameter schema")]
    MalformedToolSchema { agent: String, tool: String },

    #[error("agent '{agent}' declares a tool named 'transfer_to_agent', which is reserved")]
    ReservedToolName { agent: String },
}

/// Declarative agent specification, before graph validation.
pub struct AgentDef {
    pub name: String,
    pub public_description: String,
    pub instructions: String,
    pub tools: Vec<Arc<dyn ToolTrait>>,
    pub handoff_targets: Vec<String>,
}

impl AgentDef {
    pub fn new(
        name: impl Into<String>,
        public_description: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            public_description: public_description.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            handoff_targets: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn ToolTrait>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_handoffs<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handoff_targets = targets.into_iter().map(Into::into).collect();
        self
    }
}

/// A finalized agent inside a validated graph.
pub struct Agent {
    name: String,
    public_description: String,
    instructions: String,
    tools: Vec<Arc<dyn ToolTrait>>,
    tool_defs: Vec<Tool>,
    handoff_targets: Vec<String>,
    transfer_tool: Option<Tool>,
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_description(&self) -> &str {
        &self.public_description
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn handoff_targets(&self) -> &[String] {
        &self.handoff_targets
    }

    pub fn can_handoff_to(&self, target: &str) -> bool {
        self.handoff_targets.iter().any(|t| t == target)
    }

    pub fn base_tools(&self) -> &[Arc<dyn ToolTrait>] {
        &self.tools
    }

    /// Tool set advertised to the model: base tools plus the transfer
    /// tool when this agent has anywhere to go.
    pub fn advertised_tools(&self) -> Vec<Tool> {
        let mut tools = self.tool_defs.clone();
        if let Some(transfer) = &self.transfer_tool {
            tools.push(transfer.clone());
        }
        tools
    }
}

/// Validated, immutable handoff graph.
pub struct AgentGraph {
    agents: HashMap<String, Agent>,
    order: Vec<String>,
}

impl AgentGraph {
    /// Validate definitions and synthesize each agent's transfer tool.
    pub fn build(defs: Vec<AgentDef>) -> Result<Self, GraphError> {
        let mut declared: Vec<String> = Vec::with_capacity(defs.len());
        for def in &defs {
            if declared.contains(&def.name) {
                return Err(GraphError::DuplicateAgent(def.name.clone()));
            }
            declared.push(def.name.clone());
        }

        let mut agents = HashMap::new();
        let mut order = Vec::with_capacity(defs.len());

        for def in defs {
            let mut tool_defs = Vec::with_capacity(def.tools.len());
            for tool in &def.tools {
                if tool.name() == TRANSFER_TOOL_NAME {
                    return Err(GraphError::ReservedToolName {
                        agent: def.name.clone(),
                    });
                }
                if tool_defs
                    .iter()
                    .any(|t: &Tool| t.function.name == tool.name())
                {
                    return Err(GraphError::DuplicateTool {
                        agent: def.name.clone(),
                        tool: tool.name().to_string(),
                    });
                }
                let schema = tool.parameters();
                if schema["type"] != "object" || !schema["properties"].is_object() {
                    return Err(GraphError::MalformedToolSchema {
                        agent: def.name.clone(),
                        tool: tool.name().to_string(),
                    });
                }
                tool_defs.push(to_provider_tool(tool.as_ref()));
            }

            for target in &def.handoff_targets {
                if !declared.contains(target) {
                    return Err(GraphError::UnknownHandoffTarget {
                        agent: def.name.clone(),
                        target: target.clone(),
                    });
                }
            }

            let transfer_tool = if def.handoff_targets.is_empty() {
                None
            } else {
                Some(synthesize_transfer_tool(&def.handoff_targets))
            };

            order.push(def.name.clone());
            agents.insert(
                def.name.clone(),
                Agent {
                    name: def.name,
                    public_description: def.public_description,
                    instructions: def.instructions,
                    tools: def.tools,
                    tool_defs,
                    handoff_targets: def.handoff_targets,
                    transfer_tool,
                },
            );
        }

        Ok(Self { agents, order })
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    /// Agent names in declaration order.
    pub fn agent_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Seed a registry with every agent's base tools.
    pub fn registry(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for agent in self.agents.values() {
            for tool in agent.base_tools() {
                registry.register(agent.name(), tool.clone());
            }
        }
        registry
    }
}

fn synthesize_transfer_tool(targets: &[String]) -> Tool {
    Tool::new(
        TRANSFER_TOOL_NAME,
        format!(
            "Hand the conversation off to another agent. Available agents: {}.",
            targets.join(", ")
        ),
        enum_schema(
            "destination",
            "Name of the agent to hand the conversation to.",
            targets,
        ),
    )
}
