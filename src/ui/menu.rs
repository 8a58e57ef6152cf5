//! Menu walker.
//!
//! Menus are static slices of [`MenuNode`]; the slice length is the sibling
//! count. Descending pushes the current level on a bounded ancestor stack
//! and ORs the node's flags into the session flags, so leaf handlers can
//! tell which branch they were reached through.
//!
//! A level can also be a [`RecordList`], a dynamic list backed by the
//! context (the loco library). Selecting a record either deletes it or
//! folds its index into the flags and starts the list's wizard, depending
//! on the action flag contributed by the parent node.

use crate::config::{MAX_CHILD_LEVEL, MAX_MENU_LEVEL, STRING_LEN};
use crate::error::Error;
use crate::ui::input_logic::{select_next, select_prev};
use crate::ui::sequence::WizardField;
use crate::ui::{flags, label_text, Align, Display, Fault, Label, Page, Value};
use heapless::{String, Vec};

/// Leaf action run directly from a menu node.
pub trait MenuAction<C>: Sync {
    /// Returns true when handled; the menu then steps back one level.
    fn run(&self, ctx: &mut C, flags: u32) -> bool;
}

/// A dynamically populated menu level.
pub trait RecordList<C: 'static>: Sync {
    fn count(&self, ctx: &C) -> usize;
    fn label(&self, ctx: &C, index: usize, out: &mut String<STRING_LEN>);
    fn delete(&self, ctx: &mut C, index: usize) -> Result<(), Fault>;
    /// Wizard started when a record is selected for editing.
    fn fields(&self) -> &'static [WizardField<C>];

    /// Shown instead of entering the list while it has no records.
    fn empty_fault(&self) -> Option<Fault> {
        None
    }
}

pub enum NodeTarget<C: 'static> {
    Submenu(&'static [MenuNode<C>]),
    Records(&'static dyn RecordList<C>),
    Wizard(&'static [WizardField<C>]),
    Action(&'static dyn MenuAction<C>),
}

/// One static menu entry.
pub struct MenuNode<C: 'static> {
    pub name: Option<&'static Label>,
    /// ORed into the session flags while this node is on the path.
    pub flags: u32,
    /// Child-lock level required to enter.
    pub lock: u8,
    /// Backing out onto this node continues one more level up.
    pub skip_on_return: bool,
    pub target: NodeTarget<C>,
}

impl<C: 'static> MenuNode<C> {
    pub const fn new(name: &'static Label, target: NodeTarget<C>) -> Self {
        Self {
            name: Some(name),
            flags: 0,
            lock: 0,
            skip_on_return: false,
            target,
        }
    }
}

/// The array a cursor points into.
pub enum MenuLevel<C: 'static> {
    Nodes(&'static [MenuNode<C>]),
    Records(&'static dyn RecordList<C>),
}

impl<C: 'static> Clone for MenuLevel<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: 'static> Copy for MenuLevel<C> {}

impl<C: 'static> MenuLevel<C> {
    pub fn len(&self, ctx: &C) -> usize {
        match self {
            MenuLevel::Nodes(nodes) => nodes.len(),
            MenuLevel::Records(list) => list.count(ctx),
        }
    }

    pub fn is_empty(&self, ctx: &C) -> bool {
        self.len(ctx) == 0
    }

    /// Flags contributed by the entry at `pos` while it is on the path.
    fn flags(&self, pos: usize) -> u32 {
        match self {
            MenuLevel::Nodes(nodes) => nodes.get(pos).map_or(0, |n| n.flags),
            MenuLevel::Records(_) => flags::RECORD_MASK,
        }
    }

    fn skip_on_return(&self, pos: usize) -> bool {
        match self {
            MenuLevel::Nodes(nodes) => nodes.get(pos).is_some_and(|n| n.skip_on_return),
            MenuLevel::Records(_) => true,
        }
    }

    fn label(&self, ctx: &C, pos: usize, lang: usize, out: &mut String<STRING_LEN>) {
        match self {
            MenuLevel::Nodes(nodes) => {
                let name = nodes.get(pos).and_then(|n| n.name);
                push_truncated(out, label_text(name, lang));
            }
            MenuLevel::Records(list) => list.label(ctx, pos, out),
        }
    }
}

/// Bounded stack of (level, cursor) pairs above the current level.
pub struct AncestorStack<C: 'static> {
    entries: Vec<(MenuLevel<C>, usize), MAX_MENU_LEVEL>,
}

impl<C: 'static> AncestorStack<C> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, level: MenuLevel<C>, pos: usize) -> Result<(), Error> {
        self.entries
            .push((level, pos))
            .map_err(|_| Error::MenuTooDeep)
    }

    pub fn pop(&mut self) -> Option<(MenuLevel<C>, usize)> {
        self.entries.pop()
    }

    pub fn last(&self) -> Option<&(MenuLevel<C>, usize)> {
        self.entries.last()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<C: 'static> Default for AncestorStack<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// What the engine should do after `enter`.
pub enum MenuStep<C: 'static> {
    Redraw,
    Ignore,
    /// Ask for the child-lock password before continuing.
    Challenge(&'static WizardField<C>),
    /// Start a wizard; the menu level was already pushed.
    Wizard {
        fields: &'static [WizardField<C>],
        flags: u32,
    },
    /// Handled; step back one level.
    Back,
    Fault(Fault),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuBack {
    Redraw,
    /// Backed out of the root; return to this page.
    Exit(Page),
}

/// Navigation session over the menu tree.
pub struct MenuState<C: 'static> {
    caller: Page,
    level: Option<MenuLevel<C>>,
    pos: usize,
    stack: AncestorStack<C>,
    flags: u32,
    unlock_level: u8,
    password: Option<&'static WizardField<C>>,
    pin: u16,
    /// Cursor of the node waiting behind a password challenge.
    pending: Option<usize>,
}

impl<C: 'static> MenuState<C> {
    pub const fn new() -> Self {
        Self {
            caller: Page::None,
            level: None,
            pos: 0,
            stack: AncestorStack::new(),
            flags: 0,
            unlock_level: MAX_CHILD_LEVEL,
            password: None,
            pin: 0,
            pending: None,
        }
    }

    pub fn start(&mut self, caller: Page, root: &'static [MenuNode<C>]) {
        self.caller = caller;
        self.level = Some(MenuLevel::Nodes(root));
        self.pos = 0;
        self.stack.clear();
        self.flags = 0;
        self.pending = None;
    }

    /// Leave the menu from any depth; returns the page that opened it.
    pub fn exit(&mut self) -> Page {
        self.level = None;
        self.pos = 0;
        self.stack.clear();
        self.flags = 0;
        self.pending = None;
        self.caller
    }

    pub fn is_active(&self) -> bool {
        self.level.is_some()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Configure the gate: nodes with a lock above `MAX_CHILD_LEVEL - level`
    /// ask for `pin` through `password` first.
    pub fn set_child_lock(&mut self, level: u8, pin: u16, password: &'static WizardField<C>) {
        self.unlock_level = if level < MAX_CHILD_LEVEL {
            MAX_CHILD_LEVEL - level
        } else {
            0
        };
        self.pin = pin;
        self.password = Some(password);
    }

    pub fn next(&mut self, ctx: &C) {
        if let Some(level) = self.level {
            self.pos = select_next(self.pos, level.len(ctx));
        }
    }

    pub fn prev(&mut self, ctx: &C) {
        if let Some(level) = self.level {
            self.pos = select_prev(self.pos, level.len(ctx));
        }
    }

    /// Draw the selected entry, with the parent's entry on the bottom line.
    pub fn render(&mut self, ctx: &C, lang: usize, lcd: &mut dyn Display) {
        let Some(level) = self.level else {
            return;
        };
        let count = level.len(ctx);
        if self.pos >= count {
            self.pos = count.saturating_sub(1);
        }

        let mut text: String<STRING_LEN> = String::new();
        level.label(ctx, self.pos, lang, &mut text);
        lcd.show_main(&text, None, Align::Center);

        match self.stack.last() {
            Some((parent, pos)) => {
                text.clear();
                parent.label(ctx, *pos, lang, &mut text);
                lcd.show_bottom(Some(&text), Align::Center);
            }
            None => lcd.show_bottom(None, Align::Center),
        }
    }

    /// Activate the selected entry, subject to the child lock.
    pub fn enter(&mut self, ctx: &mut C) -> MenuStep<C> {
        if let Some(MenuLevel::Nodes(nodes)) = self.level {
            if let (Some(node), Some(password)) = (nodes.get(self.pos), self.password) {
                if node.lock > self.unlock_level {
                    debug!("node {} locked at level {}", self.pos, node.lock);
                    self.pending = Some(self.pos);
                    return MenuStep::Challenge(password);
                }
            }
        }
        self.enter_unlocked(ctx)
    }

    /// Resolve a password challenge. A wrong or missing answer leaves the
    /// menu exactly where it was.
    pub fn answer_challenge(&mut self, ctx: &mut C, answer: Option<&Value>) -> MenuStep<C> {
        let pending = self.pending.take();
        let matched = answer.and_then(Value::as_integer) == Some(self.pin as u32);
        match pending {
            Some(pos) if matched => {
                self.pos = pos;
                self.enter_unlocked(ctx)
            }
            _ => {
                if !matched {
                    warn!("child lock password mismatch");
                }
                MenuStep::Redraw
            }
        }
    }

    /// Activate the selected entry without the child-lock check.
    pub fn enter_unlocked(&mut self, ctx: &mut C) -> MenuStep<C> {
        self.pending = None;
        let Some(level) = self.level else {
            return MenuStep::Ignore;
        };
        match level {
            MenuLevel::Nodes(nodes) => {
                let Some(node) = nodes.get(self.pos) else {
                    return MenuStep::Ignore;
                };
                match node.target {
                    NodeTarget::Action(action) => {
                        if action.run(ctx, self.flags | node.flags) {
                            MenuStep::Back
                        } else {
                            MenuStep::Ignore
                        }
                    }
                    NodeTarget::Submenu(children) => {
                        self.descend(ctx, MenuLevel::Nodes(children), node.flags)
                    }
                    NodeTarget::Records(list) => {
                        self.descend(ctx, MenuLevel::Records(list), node.flags)
                    }
                    NodeTarget::Wizard(fields) => {
                        if let Err(e) = self.stack.push(level, self.pos) {
                            error!("cannot start wizard: {}", e);
                            return MenuStep::Ignore;
                        }
                        self.flags |= node.flags;
                        MenuStep::Wizard {
                            fields,
                            flags: self.flags,
                        }
                    }
                }
            }
            MenuLevel::Records(list) => self.enter_record(ctx, list),
        }
    }

    fn enter_record(&mut self, ctx: &mut C, list: &'static dyn RecordList<C>) -> MenuStep<C> {
        if self.pos >= list.count(ctx) {
            return MenuStep::Ignore;
        }
        match flags::action(self.flags) {
            flags::DELETE_RECORD => {
                return match list.delete(ctx, self.pos) {
                    Ok(()) => MenuStep::Back,
                    Err(fault) => MenuStep::Fault(fault),
                };
            }
            flags::EDIT_RECORD => {
                self.flags &= !flags::RECORD_MASK;
                self.flags |= ((self.pos as u32) << flags::RECORD_SHIFT) & flags::RECORD_MASK;
            }
            _ => {}
        }
        if let Err(e) = self.stack.push(MenuLevel::Records(list), self.pos) {
            error!("cannot start wizard: {}", e);
            return MenuStep::Ignore;
        }
        MenuStep::Wizard {
            fields: list.fields(),
            flags: self.flags,
        }
    }

    fn descend(&mut self, ctx: &C, into: MenuLevel<C>, node_flags: u32) -> MenuStep<C> {
        let Some(level) = self.level else {
            return MenuStep::Ignore;
        };
        if into.is_empty(ctx) {
            debug!("submenu of node {} is empty", self.pos);
            return match into {
                MenuLevel::Records(list) => list.empty_fault().map_or(MenuStep::Ignore, MenuStep::Fault),
                MenuLevel::Nodes(_) => MenuStep::Ignore,
            };
        }
        if let Err(e) = self.stack.push(level, self.pos) {
            error!("cannot descend: {}", e);
            return MenuStep::Ignore;
        }
        self.flags |= node_flags;
        self.level = Some(into);
        self.pos = 0;
        MenuStep::Redraw
    }

    /// Step back one level, or two when the entry returned to is marked
    /// skip-on-return. Backing out of the root exits the menu.
    pub fn back(&mut self) -> MenuBack {
        let mut pops = 0;
        loop {
            let Some((level, pos)) = self.stack.pop() else {
                return MenuBack::Exit(self.exit());
            };
            self.level = Some(level);
            self.pos = pos;
            self.flags &= !level.flags(pos);
            pops += 1;
            if pops == 2 || !level.skip_on_return(pos) {
                return MenuBack::Redraw;
            }
        }
    }
}

impl<C: 'static> Default for MenuState<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn push_truncated(out: &mut String<STRING_LEN>, s: &str) {
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
}
