//! Depth of inheritance and number of children

use rustc_hash::{FxHashMap, FxHashSet};

use crate::classfile::TypeModel;

/// Superclass links of the analyzed types
#[derive(Debug, Default)]
pub struct InheritanceIndex {
    superclass: FxHashMap<String, Option<String>>,
    children: FxHashMap<String, usize>,
}

impl InheritanceIndex {
    pub fn new(models: &[TypeModel]) -> Self {
        let mut index = Self::default();
        for m in models {
            index.superclass.insert(m.name.clone(), m.superclass.clone());
            let parents = m.superclass.iter().chain(m.interfaces.iter());
            for parent in parents {
                *index.children.entry(parent.clone()).or_insert(0) += 1;
            }
        }
        index
    }

    /// Depth of inheritance tree.
    ///
    /// A type with no superclass has depth 0. Each superclass link adds one;
    /// the walk stops at the first superclass outside the analyzed set, which
    /// itself counts as one level.
    pub fn depth(&self, name: &str) -> usize {
        let mut depth = 0;
        let mut visited = FxHashSet::default();
        let mut current = name;
        visited.insert(current);
        while let Some(Some(parent)) = self.superclass.get(current) {
            depth += 1;
            if !visited.insert(parent.as_str()) {
                break;
            }
            current = parent;
        }
        depth
    }

    /// Direct subclasses plus direct implementors among the analyzed types
    pub fn children(&self, name: &str) -> usize {
        self.children.get(name).copied().unwrap_or(0)
    }
}
