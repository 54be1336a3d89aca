//! Privilege level management with graph-based navigation.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{DriverError, Result};
use crate::platform::PrivilegeLevel;

/// Manages privilege level navigation using a graph structure.
///
/// Privilege levels form a bidirectional graph where each level connects
/// to its parent (previous_priv). This manager handles:
/// - Determining current privilege from a prompt
/// - Finding paths between privilege levels
/// - Tracking current privilege state
#[derive(Debug)]
pub struct PrivilegeManager {
    /// All defined privilege levels.
    levels: IndexMap<String, PrivilegeLevel>,

    /// Adjacency list for the privilege graph.
    graph: HashMap<String, HashSet<String>>,

    /// Current privilege level name.
    current: Option<String>,
}

impl PrivilegeManager {
    /// Create a new privilege manager from privilege level definitions.
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        let graph = Self::build_graph(&levels);

        // Find the root level (no previous_priv)
        let current = levels
            .iter()
            .find(|(_, l)| l.previous_priv.is_none())
            .map(|(name, _)| name.clone());

        Self {
            levels,
            graph,
            current,
        }
    }

    /// Build the bidirectional adjacency list from privilege definitions.
    fn build_graph(levels: &IndexMap<String, PrivilegeLevel>) -> HashMap<String, HashSet<String>> {
        let mut graph: HashMap<String, HashSet<String>> = HashMap::new();

        for (name, level) in levels {
            // Ensure this node exists in the graph
            graph.entry(name.clone()).or_default();

            // Add bidirectional edge to parent
            if let Some(ref parent) = level.previous_priv {
                graph.entry(name.clone()).or_default().insert(parent.clone());
                graph.entry(parent.clone()).or_default().insert(name.clone());
            }
        }

        graph
    }

    /// Determine the current privilege level from a prompt string.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        if let Some(level) = self.levels.values().find(|level| level.matches(prompt)) {
            return Ok(level);
        }

        Err(DriverError::UnknownPrivilege {
            prompt: prompt.to_string(),
        }
        .into())
    }

    /// Get the current privilege level.
    pub fn current(&self) -> Option<&PrivilegeLevel> {
        self.current.as_ref().and_then(|name| self.levels.get(name))
    }

    /// Set the current privilege level by name.
    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if self.levels.contains_key(name) {
            self.current = Some(name.to_string());
            Ok(())
        } else {
            Err(DriverError::UnknownPrivilege {
                prompt: name.to_string(),
            }
            .into())
        }
    }

    /// Find the shortest path from one privilege level to another.
    ///
    /// Returns a list of privilege level names to traverse, including
    /// both the start and end nodes.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        if from == to {
            return Ok(vec![from.to_string()]);
        }

        // BFS to find shortest path
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut parent: HashMap<String, String> = HashMap::new();

        queue.push_back(from.to_string());
        visited.insert(from.to_string());

        while let Some(current) = queue.pop_front() {
            if current == to {
                // Reconstruct path
                let mut path = vec![to.to_string()];
                let mut node = to.to_string();

                while let Some(prev) = parent.get(&node) {
                    path.push(prev.clone());
                    node = prev.clone();
                }

                path.reverse();
                return Ok(path);
            }

            if let Some(neighbors) = self.graph.get(&current) {
                for neighbor in neighbors {
                    if !visited.contains(neighbor) {
                        visited.insert(neighbor.clone());
                        parent.insert(neighbor.clone(), current.clone());
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }

        Err(DriverError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into())
    }

    /// Get the transition from one level to an adjacent level.
    pub fn get_transition(&self, from: &str, to: &str) -> Option<TransitionInfo> {
        let from_level = self.levels.get(from)?;
        let to_level = self.levels.get(to)?;

        // Check if we're escalating (going to a child of current)
        if to_level.previous_priv.as_deref() == Some(from) {
            return Some(TransitionInfo {
                command: to_level.escalate_command.clone()?,
                auth_prompt: to_level.escalate_prompt.clone(),
            });
        }

        // Check if we're de-escalating (going to parent)
        if from_level.previous_priv.as_deref() == Some(to) {
            return Some(TransitionInfo {
                command: from_level.deescalate_command.clone()?,
                auth_prompt: None,
            });
        }

        None
    }
}

/// Information about a privilege level transition.
#[derive(Debug, Clone)]
pub struct TransitionInfo {
    /// Command to execute for the transition.
    pub command: String,

    /// Pattern to match for auth prompt. If `Some`, authentication is required.
    pub auth_prompt: Option<Regex>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::cisco_ios;

    fn manager() -> PrivilegeManager {
        PrivilegeManager::new(cisco_ios::platform().privilege_levels)
    }

    #[test]
    fn test_starts_at_root_level() {
        let manager = manager();
        assert_eq!(manager.current().unwrap().name, "exec");
    }

    #[test]
    fn test_determine_privilege() {
        let manager = manager();

        let level = manager.determine_from_prompt("SW1>").unwrap();
        assert_eq!(level.name, "exec");

        let level = manager.determine_from_prompt("SW1#").unwrap();
        assert_eq!(level.name, "privilege_exec");

        let level = manager.determine_from_prompt("SW1(config)#").unwrap();
        assert_eq!(level.name, "configuration");

        assert!(manager.determine_from_prompt("Password:").is_err());
    }

    #[test]
    fn test_find_path() {
        let manager = manager();

        let path = manager.find_path("exec", "configuration").unwrap();
        assert_eq!(path, vec!["exec", "privilege_exec", "configuration"]);

        let path = manager.find_path("configuration", "privilege_exec").unwrap();
        assert_eq!(path, vec!["configuration", "privilege_exec"]);

        let path = manager.find_path("exec", "exec").unwrap();
        assert_eq!(path, vec!["exec"]);

        assert!(manager.find_path("exec", "shell").is_err());
    }

    #[test]
    fn test_get_transition() {
        let manager = manager();

        let trans = manager.get_transition("exec", "privilege_exec").unwrap();
        assert_eq!(trans.command, "enable");
        assert!(trans.auth_prompt.is_some());

        let trans = manager.get_transition("configuration", "privilege_exec").unwrap();
        assert_eq!(trans.command, "end");
        assert!(trans.auth_prompt.is_none());

        assert!(manager.get_transition("exec", "configuration").is_none());
    }

    #[test]
    fn test_set_current_unknown() {
        let mut manager = manager();
        assert!(manager.set_current("privilege_exec").is_ok());
        assert_eq!(manager.current().unwrap().name, "privilege_exec");
        assert!(manager.set_current("root_shell").is_err());
    }
}
