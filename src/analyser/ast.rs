//! Expression trees
//!
//! Every equation owns one [`Ast`]: an arena of nodes addressed by
//! [`NodeId`]. Children are owned through `left`/`right`, `parent` is a plain
//! back index used by the passes that need context (pre-pass checks, unit
//! scaling and rendering of rates).
//!
//! Shapes follow the MathML they come from:
//!
//! | Construct | left | right |
//! |-----------|------|-------|
//! | `a = b` | `a` | `b` |
//! | `op(a)` | `a` | none |
//! | `op(a, b, c)` | `a` | `op(b, c)` |
//! | `diff` | `bvar` | differentiated `ci` |
//! | `bvar` | `ci` | optional `degree` |
//! | `root`, `log` with qualifier | `degree` / `logbase` | argument |
//! | `piecewise` | first `piece` | rest of the chain |
//! | `piece` | value | condition |
//! | `otherwise` | value | none |

use std::fmt;

use super::DeclId;

/// Index of a node inside its [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Every construct an equation can hold
#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    Assignment,

    // Relational and logical operators
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    And,
    Or,
    Xor,
    Not,

    // Arithmetic operators
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Root,
    Abs,
    Exp,
    Ln,
    Log,
    Ceiling,
    Floor,
    Min,
    Max,
    Rem,

    // Calculus
    Diff,

    // Trigonometric operators
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    Asin,
    Acos,
    Atan,
    Asec,
    Acsc,
    Acot,
    Asinh,
    Acosh,
    Atanh,
    Asech,
    Acsch,
    Acoth,

    // Piecewise statement
    Piecewise,
    Piece,
    Otherwise,

    // Tokens
    Ci(DeclId),
    Cn(String),

    // Qualifiers
    Degree,
    Logbase,
    Bvar,

    // Constants
    True,
    False,
    E,
    Pi,
    Inf,
    Nan,
}

impl AstKind {
    /// The kind of an operator or constant element, by MathML name
    ///
    /// Token, qualifier and piecewise elements are not operators and yield `None`.
    pub fn from_operator(name: &str) -> Option<Self> {
        let kind = match name {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "lt" => Self::Lt,
            "leq" => Self::Leq,
            "gt" => Self::Gt,
            "geq" => Self::Geq,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "not" => Self::Not,
            "plus" => Self::Plus,
            "minus" => Self::Minus,
            "times" => Self::Times,
            "divide" => Self::Divide,
            "power" => Self::Power,
            "root" => Self::Root,
            "abs" => Self::Abs,
            "exp" => Self::Exp,
            "ln" => Self::Ln,
            "log" => Self::Log,
            "ceiling" => Self::Ceiling,
            "floor" => Self::Floor,
            "min" => Self::Min,
            "max" => Self::Max,
            "rem" => Self::Rem,
            "diff" => Self::Diff,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "sec" => Self::Sec,
            "csc" => Self::Csc,
            "cot" => Self::Cot,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "sech" => Self::Sech,
            "csch" => Self::Csch,
            "coth" => Self::Coth,
            "arcsin" => Self::Asin,
            "arccos" => Self::Acos,
            "arctan" => Self::Atan,
            "arcsec" => Self::Asec,
            "arccsc" => Self::Acsc,
            "arccot" => Self::Acot,
            "arcsinh" => Self::Asinh,
            "arccosh" => Self::Acosh,
            "arctanh" => Self::Atanh,
            "arcsech" => Self::Asech,
            "arccsch" => Self::Acsch,
            "arccoth" => Self::Acoth,
            "true" => Self::True,
            "false" => Self::False,
            "exponentiale" => Self::E,
            "pi" => Self::Pi,
            "infinity" => Self::Inf,
            "notanumber" => Self::Nan,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_ci(&self) -> bool {
        matches!(self, Self::Ci(_))
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ci(id) => write!(f, "ci#{}", id),
            Self::Cn(value) => write!(f, "cn({})", value),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Operators and functions a target language may only offer as a helper
/// function, in the order generated code declares them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MathFunction {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    And,
    Or,
    Xor,
    Not,
    Min,
    Max,
    Sec,
    Csc,
    Cot,
    Sech,
    Csch,
    Coth,
    Asec,
    Acsc,
    Acot,
    Asech,
    Acsch,
    Acoth,
}

impl MathFunction {
    pub fn from_kind(kind: &AstKind) -> Option<Self> {
        let function = match kind {
            AstKind::Eq => Self::Eq,
            AstKind::Neq => Self::Neq,
            AstKind::Lt => Self::Lt,
            AstKind::Leq => Self::Leq,
            AstKind::Gt => Self::Gt,
            AstKind::Geq => Self::Geq,
            AstKind::And => Self::And,
            AstKind::Or => Self::Or,
            AstKind::Xor => Self::Xor,
            AstKind::Not => Self::Not,
            AstKind::Min => Self::Min,
            AstKind::Max => Self::Max,
            AstKind::Sec => Self::Sec,
            AstKind::Csc => Self::Csc,
            AstKind::Cot => Self::Cot,
            AstKind::Sech => Self::Sech,
            AstKind::Csch => Self::Csch,
            AstKind::Coth => Self::Coth,
            AstKind::Asec => Self::Asec,
            AstKind::Acsc => Self::Acsc,
            AstKind::Acot => Self::Acot,
            AstKind::Asech => Self::Asech,
            AstKind::Acsch => Self::Acsch,
            AstKind::Acoth => Self::Acoth,
            _ => return None,
        };
        Some(function)
    }

    pub fn kind(self) -> AstKind {
        match self {
            Self::Eq => AstKind::Eq,
            Self::Neq => AstKind::Neq,
            Self::Lt => AstKind::Lt,
            Self::Leq => AstKind::Leq,
            Self::Gt => AstKind::Gt,
            Self::Geq => AstKind::Geq,
            Self::And => AstKind::And,
            Self::Or => AstKind::Or,
            Self::Xor => AstKind::Xor,
            Self::Not => AstKind::Not,
            Self::Min => AstKind::Min,
            Self::Max => AstKind::Max,
            Self::Sec => AstKind::Sec,
            Self::Csc => AstKind::Csc,
            Self::Cot => AstKind::Cot,
            Self::Sech => AstKind::Sech,
            Self::Csch => AstKind::Csch,
            Self::Coth => AstKind::Coth,
            Self::Asec => AstKind::Asec,
            Self::Acsc => AstKind::Acsc,
            Self::Acot => AstKind::Acot,
            Self::Asech => AstKind::Asech,
            Self::Acsch => AstKind::Acsch,
            Self::Acoth => AstKind::Acoth,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct AstNode {
    kind: AstKind,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

/// The expression tree of one equation
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: Option<NodeId>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
        if let Some(root) = root {
            self.nodes[root.0].parent = None;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> &AstKind {
        &self.nodes[id.0].kind
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].left
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].right
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Kind of the parent node, if any
    pub fn parent_kind(&self, id: NodeId) -> Option<&AstKind> {
        self.parent(id).map(|parent| self.kind(parent))
    }

    pub(crate) fn push(&mut self, kind: AstKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode {
            kind,
            left: None,
            right: None,
            parent,
        });
        id
    }

    pub(crate) fn set_left(&mut self, id: NodeId, child: Option<NodeId>) {
        self.nodes[id.0].left = child;
        if let Some(child) = child {
            self.nodes[child.0].parent = Some(id);
        }
    }

    pub(crate) fn set_right(&mut self, id: NodeId, child: Option<NodeId>) {
        self.nodes[id.0].right = child;
        if let Some(child) = child {
            self.nodes[child.0].parent = Some(id);
        }
    }

    /// Put `new` where `old` hangs in the tree; `old` is left detached
    pub(crate) fn replace(&mut self, old: NodeId, new: NodeId) {
        match self.parent(old) {
            Some(parent) if self.left(parent) == Some(old) => self.set_left(parent, Some(new)),
            Some(parent) => self.set_right(parent, Some(new)),
            None => self.set_root(Some(new)),
        }
    }

    /// Reachable nodes, children before their parent
    pub fn post_order(&self) -> Vec<NodeId> {
        fn walk(ast: &Ast, id: NodeId, out: &mut Vec<NodeId>) {
            if let Some(left) = ast.left(id) {
                walk(ast, left, out);
            }
            if let Some(right) = ast.right(id) {
                walk(ast, right, out);
            }
            out.push(id);
        }

        let mut out = Vec::with_capacity(self.nodes.len());
        if let Some(root) = self.root {
            walk(self, root, &mut out);
        }
        out
    }

    /// Reachable nodes, parents before their children
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(right) = self.right(id) {
                stack.push(right);
            }
            if let Some(left) = self.left(id) {
                stack.push(left);
            }
        }
        out
    }

    /// Whether any reachable node satisfies `predicate`
    pub fn any(&self, predicate: impl Fn(&AstKind) -> bool) -> bool {
        self.pre_order()
            .into_iter()
            .any(|id| predicate(self.kind(id)))
    }
}
