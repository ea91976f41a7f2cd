// src/artifacts/collate.rs

//! Assembles the final `TaskResult`.

use crate::types::{OutputArtifact, TaskResult};

/// Pure aggregation, always succeeds.
pub fn collate(
    output_artifacts: Vec<OutputArtifact>,
    command: impl Into<String>,
    workflow_id: impl Into<String>,
) -> TaskResult {
    TaskResult {
        output_files: output_artifacts,
        task_files: Vec::new(),
        workflow_id: workflow_id.into(),
        command: command.into(),
    }
}

/// Accumulates the products of several invocations in order.
#[derive(Debug, Clone, Default)]
pub struct OutputCollator {
    outputs: Vec<OutputArtifact>,
    task_files: Vec<OutputArtifact>,
    commands: Vec<String>,
}

impl OutputCollator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    pub fn add_outputs(&mut self, outputs: impl IntoIterator<Item = OutputArtifact>) {
        self.outputs.extend(outputs);
    }

    pub fn add_task_file(&mut self, file: OutputArtifact) {
        self.task_files.push(file);
    }

    pub fn outputs(&self) -> &[OutputArtifact] {
        &self.outputs
    }

    /// Commands of every invocation, `"; "`-separated.
    pub fn command(&self) -> String {
        self.commands.join("; ")
    }

    /// Outputs and task files collected so far, for reporting a partial
    /// failure.
    pub fn into_parts(self) -> (Vec<OutputArtifact>, Vec<OutputArtifact>) {
        (self.outputs, self.task_files)
    }

    pub fn finish(self, workflow_id: impl Into<String>) -> TaskResult {
        let command = self.command();
        let mut result = collate(self.outputs, command, workflow_id);
        result.task_files = self.task_files;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn artifact(name: &str) -> OutputArtifact {
        OutputArtifact {
            path: format!("/out/{name}").into(),
            display_name: name.to_string(),
            data_type: DataType::Single("ns:file".into()),
            source_file_id: "1".into(),
        }
    }

    #[test]
    fn empty_collation_is_a_valid_result() {
        let result = collate(Vec::new(), "", "wf1");
        assert!(result.output_files.is_empty());
        assert!(result.task_files.is_empty());
        assert_eq!(result.command, "");
        assert_eq!(result.workflow_id, "wf1");
    }

    #[test]
    fn collator_keeps_invocation_order() {
        let mut collator = OutputCollator::new();
        collator.add_command("tool --artifact_filters A in.dd");
        collator.add_outputs(vec![artifact("a")]);
        collator.add_command("tool --names x in.dd");
        collator.add_outputs(vec![artifact("b"), artifact("c")]);

        let result = collator.finish("wf");
        let names: Vec<_> = result.output_files.iter().map(|o| o.display_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(result.command, "tool --artifact_filters A in.dd; tool --names x in.dd");
    }
}
