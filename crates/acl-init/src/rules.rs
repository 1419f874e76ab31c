//! Rendering of the agent policy rules.
//!
//! Output is deterministic for a given [`RuleOptions`], so re-applying the
//! policy with unchanged options leaves the cluster untouched.

use warden_common::AclInitError;

/// Inputs of the agent rule body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOptions {
    /// Wrap service rules in a `namespace_prefix` block
    pub enable_namespaces: bool,
    /// Wrap all rules in a `partition` block
    pub enable_partitions: bool,
    /// Admin partition name (required when partitions are enabled)
    pub partition_name: String,
}

/// Renders the rules every server agent token is bound to
pub fn render_agent_rules(options: &RuleOptions) -> Result<String, AclInitError> {
    let mut rules = RuleWriter::default();

    if options.enable_partitions {
        let name = options.partition_name.trim();
        if name.is_empty() {
            return Err(AclInitError::InvalidInput(
                "partitions are enabled but no partition name is set".to_string(),
            ));
        }
        if name.contains(['"', '\\', '\n']) {
            return Err(AclInitError::InvalidInput(format!(
                "invalid partition name {:?}",
                name
            )));
        }
        rules.open(&format!("partition \"{}\"", name));
    }

    rules.open("node_prefix \"\"");
    rules.line("policy = \"write\"");
    rules.close();

    if options.enable_namespaces {
        rules.open("namespace_prefix \"\"");
    }
    rules.open("service_prefix \"\"");
    rules.line("policy = \"read\"");
    rules.close();
    if options.enable_namespaces {
        rules.close();
    }

    if options.enable_partitions {
        rules.close();
    }

    Ok(rules.finish())
}

#[derive(Default)]
struct RuleWriter {
    out: String,
    depth: usize,
}

impl RuleWriter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{} {{", header));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = render_agent_rules(&RuleOptions::default()).unwrap();
        let expected = "\
node_prefix \"\" {
  policy = \"write\"
}
service_prefix \"\" {
  policy = \"read\"
}
";
        assert_eq!(rules, expected);
    }

    #[test]
    fn test_partitions_and_namespaces() {
        let options = RuleOptions {
            enable_namespaces: true,
            enable_partitions: true,
            partition_name: "team-a".to_string(),
        };
        let rules = render_agent_rules(&options).unwrap();
        let expected = "\
partition \"team-a\" {
  node_prefix \"\" {
    policy = \"write\"
  }
  namespace_prefix \"\" {
    service_prefix \"\" {
      policy = \"read\"
    }
  }
}
";
        assert_eq!(rules, expected);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let options = RuleOptions {
            enable_namespaces: true,
            ..Default::default()
        };
        assert_eq!(
            render_agent_rules(&options).unwrap(),
            render_agent_rules(&options).unwrap()
        );
    }

    #[test]
    fn test_missing_partition_name_is_rejected() {
        let options = RuleOptions {
            enable_partitions: true,
            ..Default::default()
        };
        assert!(matches!(
            render_agent_rules(&options),
            Err(AclInitError::InvalidInput(_))
        ));

        let quoted = RuleOptions {
            enable_partitions: true,
            partition_name: "bad\"name".to_string(),
            ..Default::default()
        };
        assert!(render_agent_rules(&quoted).is_err());
    }
}
