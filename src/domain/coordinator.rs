//! Traversal coordinator.
//!
//! Runs several inspectors over one syn tree in a single pre-order walk. Each node
//! produces an enter event, dispatched to every enabled inspector in registration
//! order, and a leave event that is never dispatched: it only re-enables the
//! inspectors that were switched off at that depth.
//!
//! Bookkeeping is an explicit table (one `enabled` flag per inspector plus a
//! depth → indices map), so sibling subtrees and nested coordinators stay
//! independent of each other.

use std::collections::BTreeMap;

use syn::visit_mut::{self, VisitMut};
use syn::{Attribute, Block, Expr, ExprCall, File, Ident, ImplItemFn, Item, ItemFn, ItemUse, Macro};

use crate::domain::node::Node;
use crate::ports::Inspector;

/// Adapts a closure into an [`Inspector`].
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&mut Node<'_>) -> bool,
{
    FromFn(f)
}

pub struct FromFn<F>(F);

impl<F> Inspector for FromFn<F>
where
    F: FnMut(&mut Node<'_>) -> bool,
{
    fn inspect(&mut self, node: &mut Node<'_>) -> bool {
        (self.0)(node)
    }
}

struct Slot<'a> {
    inspector: &'a mut dyn Inspector,
    enabled: bool,
}

pub struct Coordinator<'a> {
    slots: Vec<Slot<'a>>,
    depth: usize,
    // depth -> inspectors switched off by the node entered at that depth
    disabled: BTreeMap<usize, Vec<usize>>,
    active: usize,
    visits: usize,
}

impl<'a> Coordinator<'a> {
    pub fn new<I>(inspectors: I) -> Self
    where
        I: IntoIterator<Item = &'a mut dyn Inspector>,
    {
        let slots: Vec<Slot<'a>> = inspectors
            .into_iter()
            .map(|inspector| Slot { inspector, enabled: true })
            .collect();
        let active = slots.len();
        Self {
            slots,
            depth: 0,
            disabled: BTreeMap::new(),
            active,
            visits: 0,
        }
    }

    /// Walks `target` and everything below it.
    pub fn inspect<W: Walk + ?Sized>(&mut self, target: &mut W) {
        target.walk(self);
    }

    /// Number of enter events so far.
    pub fn visits(&self) -> usize {
        self.visits
    }

    /// Number of inspectors currently enabled.
    pub fn active(&self) -> usize {
        self.active
    }

    fn enter(&mut self, mut node: Node<'_>) -> bool {
        self.depth += 1;
        self.visits += 1;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.enabled {
                continue;
            }
            if !slot.inspector.inspect(&mut node) {
                slot.enabled = false;
                self.active -= 1;
                self.disabled.entry(self.depth).or_default().push(index);
            }
        }

        // Nobody left to see the children: skip the subtree.
        self.active > 0
    }

    fn leave(&mut self) {
        if let Some(indices) = self.disabled.remove(&self.depth) {
            for index in indices {
                self.slots[index].enabled = true;
                self.active += 1;
            }
        }
        self.depth -= 1;
    }
}

impl VisitMut for Coordinator<'_> {
    fn visit_file_mut(&mut self, file: &mut File) {
        if self.enter(Node::File(&mut *file)) {
            visit_mut::visit_file_mut(self, file);
        }
        self.leave();
    }

    fn visit_item_mut(&mut self, item: &mut Item) {
        // Functions and imports have their own node kinds.
        if matches!(item, Item::Fn(_) | Item::Use(_)) {
            visit_mut::visit_item_mut(self, item);
            return;
        }
        if self.enter(Node::Declaration(&mut *item)) {
            visit_mut::visit_item_mut(self, item);
        }
        self.leave();
    }

    fn visit_item_fn_mut(&mut self, function: &mut ItemFn) {
        if self.enter(Node::Function(&mut *function)) {
            visit_mut::visit_item_fn_mut(self, function);
        }
        self.leave();
    }

    fn visit_impl_item_fn_mut(&mut self, method: &mut ImplItemFn) {
        if self.enter(Node::Method(&mut *method)) {
            visit_mut::visit_impl_item_fn_mut(self, method);
        }
        self.leave();
    }

    fn visit_item_use_mut(&mut self, import: &mut ItemUse) {
        if self.enter(Node::Import(&mut *import)) {
            visit_mut::visit_item_use_mut(self, import);
        }
        self.leave();
    }

    fn visit_expr_call_mut(&mut self, call: &mut ExprCall) {
        if self.enter(Node::Call(&mut *call)) {
            visit_mut::visit_expr_call_mut(self, call);
        }
        self.leave();
    }

    fn visit_macro_mut(&mut self, mac: &mut Macro) {
        if self.enter(Node::Macro(&mut *mac)) {
            visit_mut::visit_macro_mut(self, mac);
        }
        self.leave();
    }

    fn visit_attribute_mut(&mut self, attr: &mut Attribute) {
        if !attr.path().is_ident("doc") {
            if self.enter(Node::Attribute(&mut *attr)) {
                visit_mut::visit_attribute_mut(self, attr);
            }
            self.leave();
            return;
        }
        // Doc comments are leaves.
        self.enter(Node::Comment(&mut *attr));
        self.leave();
    }

    fn visit_ident_mut(&mut self, ident: &mut Ident) {
        self.enter(Node::Ident(&mut *ident));
        self.leave();
    }
}

/// Something a coordinator can start a walk at.
pub trait Walk {
    fn walk(&mut self, coordinator: &mut Coordinator<'_>);
}

impl Walk for File {
    fn walk(&mut self, coordinator: &mut Coordinator<'_>) {
        coordinator.visit_file_mut(self);
    }
}

impl Walk for Item {
    fn walk(&mut self, coordinator: &mut Coordinator<'_>) {
        coordinator.visit_item_mut(self);
    }
}

impl Walk for Block {
    fn walk(&mut self, coordinator: &mut Coordinator<'_>) {
        coordinator.visit_block_mut(self);
    }
}

impl Walk for Expr {
    fn walk(&mut self, coordinator: &mut Coordinator<'_>) {
        coordinator.visit_expr_mut(self);
    }
}

// A walk started at a node enters that node again, so nested inspectors see it too.
impl Walk for Node<'_> {
    fn walk(&mut self, coordinator: &mut Coordinator<'_>) {
        match self {
            Node::File(file) => coordinator.visit_file_mut(file),
            Node::Declaration(item) => coordinator.visit_item_mut(item),
            Node::Function(function) => coordinator.visit_item_fn_mut(function),
            Node::Method(method) => coordinator.visit_impl_item_fn_mut(method),
            Node::Import(import) => coordinator.visit_item_use_mut(import),
            Node::Call(call) => coordinator.visit_expr_call_mut(call),
            Node::Macro(mac) => coordinator.visit_macro_mut(mac),
            Node::Attribute(attr) | Node::Comment(attr) => coordinator.visit_attribute_mut(attr),
            Node::Ident(ident) => coordinator.visit_ident_mut(ident),
        }
    }
}

/// Several inspectors registered as one.
///
/// On every node it is given, a composite runs its own nested coordinator over that
/// node's subtree, then answers "stop" so the outer walk does not cover the same
/// subtree twice. Composites nest.
#[derive(Default)]
pub struct Composite {
    inspectors: Vec<Box<dyn Inspector>>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, inspector: impl Inspector + 'static) -> Self {
        self.inspectors.push(Box::new(inspector));
        self
    }

    pub fn len(&self) -> usize {
        self.inspectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inspectors.is_empty()
    }
}

impl Inspector for Composite {
    fn inspect(&mut self, node: &mut Node<'_>) -> bool {
        let mut nested = Coordinator::new(
            self.inspectors
                .iter_mut()
                .map(|inspector| &mut **inspector as &mut dyn Inspector),
        );
        nested.inspect(node);
        false
    }
}

/// Restricts an inspector to the direct items of a file.
pub struct TopLevel<I> {
    inner: I,
}

impl<I: Inspector> TopLevel<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I: Inspector> Inspector for TopLevel<I> {
    fn inspect(&mut self, node: &mut Node<'_>) -> bool {
        if let Node::File(file) = node {
            for item in file.items.iter_mut() {
                self.inner.inspect(&mut Node::from_item(item));
            }
        }
        false
    }
}
