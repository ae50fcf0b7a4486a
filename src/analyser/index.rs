use tracing::warn;

use super::{DeclId, DeclaredVariable};
use crate::json::{Component, JsonModel};

/// Read only view of a flattened model
///
/// Components are numbered in tree order (parents before children) and every
/// declared variable gets a [`DeclId`]. Equivalence classes are the transitive
/// closure of the model's connections, computed once with a union-find.
#[derive(Debug)]
pub struct ModelIndex<'a> {
    components: Vec<&'a Component>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    declarations: Vec<DeclaredVariable>,
    offsets: Vec<usize>,
    classes: Vec<usize>,
}

impl<'a> ModelIndex<'a> {
    pub fn new(model: &'a JsonModel) -> Self {
        let mut index = Self {
            components: Vec::new(),
            children: Vec::new(),
            roots: Vec::new(),
            declarations: Vec::new(),
            offsets: Vec::new(),
            classes: Vec::new(),
        };
        for component in &model.components {
            let id = index.add_component(component);
            index.roots.push(id);
        }

        let mut parents: Vec<usize> = (0..index.declarations.len()).collect();
        for connection in &model.connections {
            let (Some(c1), Some(c2)) = (
                index.component_id(&connection.component_1),
                index.component_id(&connection.component_2),
            ) else {
                warn!(
                    component_1 = %connection.component_1,
                    component_2 = %connection.component_2,
                    "connection between unknown components ignored"
                );
                continue;
            };
            for pair in &connection.variables {
                match (index.lookup(c1, &pair.variable_1), index.lookup(c2, &pair.variable_2)) {
                    (Some(a), Some(b)) => union(&mut parents, a, b),
                    _ => warn!(
                        variable_1 = %pair.variable_1,
                        variable_2 = %pair.variable_2,
                        "connection between unknown variables ignored"
                    ),
                }
            }
        }
        index.classes = (0..parents.len()).map(|id| find(&mut parents, id)).collect();
        index
    }

    fn add_component(&mut self, component: &'a Component) -> usize {
        let id = self.components.len();
        self.components.push(component);
        self.children.push(Vec::new());
        self.offsets.push(self.declarations.len());
        for variable in &component.variables {
            self.declarations.push(DeclaredVariable {
                component: component.name.clone(),
                name: variable.name.clone(),
                units: variable.units.clone(),
                initial_value: variable.initial_value.clone(),
            });
        }
        for child in &component.components {
            let child_id = self.add_component(child);
            self.children[id].push(child_id);
        }
        id
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, id: usize) -> &'a Component {
        self.components[id]
    }

    /// Top level components, in model order
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children(&self, id: usize) -> &[usize] {
        &self.children[id]
    }

    pub fn component_id(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name)
    }

    /// Variables declared by a component, in declaration order
    pub fn component_variables(&self, id: usize) -> impl Iterator<Item = DeclId> {
        let start = self.offsets[id];
        start..start + self.components[id].variables.len()
    }

    /// The declaration of `name` in component `id`
    pub fn lookup(&self, id: usize, name: &str) -> Option<DeclId> {
        self.components[id]
            .variable_index(name)
            .map(|position| self.offsets[id] + position)
    }

    pub fn declaration(&self, id: DeclId) -> &DeclaredVariable {
        &self.declarations[id]
    }

    pub fn declarations(&self) -> &[DeclaredVariable] {
        &self.declarations
    }

    /// Representative of the equivalence class of a declaration
    pub fn class(&self, id: DeclId) -> usize {
        self.classes[id]
    }

    /// Same declaration or equivalent, directly or transitively
    pub fn equivalent(&self, a: DeclId, b: DeclId) -> bool {
        self.classes[a] == self.classes[b]
    }

    /// First declaration equivalent to `id`, searching the subtree of
    /// `component` depth first
    pub fn first_occurrence(&self, id: DeclId, component: usize) -> Option<DeclId> {
        self.component_variables(component)
            .find(|&candidate| self.equivalent(id, candidate))
            .or_else(|| {
                self.children[component]
                    .iter()
                    .find_map(|&child| self.first_occurrence(id, child))
            })
    }
}

fn find(parents: &mut [usize], id: usize) -> usize {
    let mut root = id;
    while parents[root] != root {
        root = parents[root];
    }
    let mut current = id;
    while parents[current] != root {
        let next = parents[current];
        parents[current] = root;
        current = next;
    }
    root
}

fn union(parents: &mut [usize], a: usize, b: usize) {
    let root_a = find(parents, a);
    let root_b = find(parents, b);
    if root_a != root_b {
        // Keep the earliest declaration as representative
        let (low, high) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        parents[high] = low;
    }
}
