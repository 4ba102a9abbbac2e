//! Edit pipeline: pre-passes, one coordinated node traversal, post-passes.

use std::fmt;

use crate::domain::coordinator::Coordinator;
use crate::domain::tree::SourceTree;
use crate::error::EditError;
use crate::ports::Inspector;

/// A whole-tree pass run before or after the node traversal.
pub trait TreeHook {
    fn run(&mut self, tree: &mut SourceTree) -> Result<(), EditError>;
}

impl<F> TreeHook for F
where
    F: FnMut(&mut SourceTree) -> Result<(), EditError>,
{
    fn run(&mut self, tree: &mut SourceTree) -> Result<(), EditError> {
        self(tree)
    }
}

/// Configuration function applied to a fresh pipeline.
pub type PipelineOption = fn(&mut EditPipeline);

pub struct EditPipeline {
    name: String,
    before: Vec<Box<dyn TreeHook>>,
    inspectors: Vec<Box<dyn Inspector>>,
    after: Vec<Box<dyn TreeHook>>,
}

impl EditPipeline {
    pub fn new(name: impl Into<String>, options: &[PipelineOption]) -> Self {
        let mut pipeline = Self {
            name: name.into(),
            before: Vec::new(),
            inspectors: Vec::new(),
            after: Vec::new(),
        };
        for option in options {
            option(&mut pipeline);
        }
        pipeline
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn before_edit<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&mut SourceTree) -> Result<(), EditError> + 'static,
    {
        self.before.push(Box::new(hook));
        self
    }

    pub fn node<I: Inspector + 'static>(&mut self, inspector: I) -> &mut Self {
        self.inspectors.push(Box::new(inspector));
        self
    }

    pub fn after_edit<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&mut SourceTree) -> Result<(), EditError> + 'static,
    {
        self.after.push(Box::new(hook));
        self
    }

    /// Runs every phase in order. The first failing hook aborts the edit; the tree
    /// may then be partially edited and should be discarded.
    pub fn edit(&mut self, tree: &mut SourceTree) -> Result<(), EditError> {
        for hook in self.before.iter_mut() {
            hook.run(tree)?;
        }

        if !self.inspectors.is_empty() {
            let mut coordinator = Coordinator::new(
                self.inspectors
                    .iter_mut()
                    .map(|inspector| &mut **inspector as &mut dyn Inspector),
            );
            coordinator.inspect(&mut tree.file);
            tracing::trace!(pipeline = %self.name, visits = coordinator.visits(), "node pass finished");
        }

        for hook in self.after.iter_mut() {
            hook.run(tree)?;
        }
        Ok(())
    }
}

impl fmt::Debug for EditPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditPipeline")
            .field("name", &self.name)
            .field("before", &self.before.len())
            .field("inspectors", &self.inspectors.len())
            .field("after", &self.after.len())
            .finish()
    }
}
