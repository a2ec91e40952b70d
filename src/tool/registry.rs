//! Tool registry.

use super::{Tool, ToolDefinition, ToolDyn};

/// Holds the tools available to the agent, looked up by name at dispatch
/// time. Registration order is preserved in the definitions sent to the
/// model.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn ToolDyn>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed tool. A tool with the same name is replaced.
    pub fn register<T: Tool>(&mut self, tool: T) {
        self.register_dyn(Box::new(tool));
    }

    /// Register an already-erased tool.
    pub fn register_dyn(&mut self, tool: Box<dyn ToolDyn>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ToolDyn> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|tool| &**tool)
    }

    /// Definitions for every registered tool, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Registered tool names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolFailure;
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct NoArgs {}

    macro_rules! stub_tool {
        ($ty:ident, $name:literal, $reply:literal) => {
            struct $ty;

            #[async_trait]
            impl Tool for $ty {
                const NAME: &'static str = $name;
                type Args = NoArgs;
                type Output = &'static str;

                fn description(&self) -> &str {
                    "stub"
                }

                async fn call(
                    &self,
                    _args: Self::Args,
                ) -> std::result::Result<&'static str, ToolFailure> {
                    Ok($reply)
                }
            }
        };
    }

    stub_tool!(First, "first", "one");
    stub_tool!(Second, "second", "two");
    stub_tool!(FirstAgain, "first", "replaced");

    #[test]
    fn lookup_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(First);
        registry.register(Second);

        assert_eq!(registry.len(), 2);
        assert!(registry.get("first").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn duplicate_name_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(First);
        registry.register(FirstAgain);

        assert_eq!(registry.len(), 1);
        let out = registry
            .get("first")
            .unwrap()
            .call_json(serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(out, serde_json::json!("replaced"));
    }
}
