//! Page dispatcher.
//!
//! Routes each input edge to whatever owns the current page: the engine's
//! menu, editor, wizard and error page, or one of the two throttle pages
//! (loco and turnout) behind [`ThrottlePage`]. Every event is drawn as a
//! single display batch.
//!
//! | Page          | next/prev      | enter (release) | back (press) | digit (release) | timeout        |
//! |---------------|----------------|-----------------|--------------|-----------------|----------------|
//! | Menu          | cursor step    | descend / act   | pop level    |                 |                |
//! | Edit          | field step     | commit          | cancel       | insert / spin   | commit char    |
//! | Sequence      |                |                 | abort wizard |                 |                |
//! | Loco, Turnout | page action    | page action     | stop         | page action     |                |
//! | Error         |                | dismiss         | dismiss      |                 |                |

use crate::ui::engine::Ui;
use crate::ui::menu::MenuNode;
use crate::ui::{Display, Event, Fault, Page, Value};

/// Bound on engine hand-offs delivered for a single event.
const HANDOFF_LIMIT: usize = 4;

/// Everything a throttle page may touch while handling one event.
pub struct Frame<'a, C: 'static, D> {
    pub ui: &'a mut Ui<C>,
    pub ctx: &'a mut C,
    pub lcd: &'a mut D,
    pub now: u64,
}

/// A page implemented outside the engine.
pub trait ThrottlePage<C: 'static, D: Display> {
    /// The page became current.
    fn begin(&mut self, f: &mut Frame<'_, C, D>);

    /// Control came back from the engine, with the editor's value if the
    /// page opened it.
    fn resume(&mut self, f: &mut Frame<'_, C, D>, value: Option<Value>) {
        let _ = value;
        self.begin(f);
    }

    /// The page is about to be left.
    fn exit(&mut self, f: &mut Frame<'_, C, D>);

    fn next(&mut self, f: &mut Frame<'_, C, D>, pressed: bool);
    fn prev(&mut self, f: &mut Frame<'_, C, D>, pressed: bool);

    fn enter(&mut self, _f: &mut Frame<'_, C, D>) {}

    fn stop(&mut self, f: &mut Frame<'_, C, D>);
    fn digit(&mut self, f: &mut Frame<'_, C, D>, digit: u8);

    fn shift(&mut self, _f: &mut Frame<'_, C, D>, _pressed: bool) {}

    /// Whether next/prev are also delivered on release.
    fn repeats_on_release(&self) -> bool {
        false
    }
}

pub struct Dispatcher<C: 'static, L, T> {
    ui: Ui<C>,
    loco: L,
    turnout: T,
    root: &'static [MenuNode<C>],
}

impl<C: 'static, L, T> Dispatcher<C, L, T> {
    pub fn new(ui: Ui<C>, loco: L, turnout: T, root: &'static [MenuNode<C>]) -> Self {
        Self {
            ui,
            loco,
            turnout,
            root,
        }
    }

    pub fn page(&self) -> Page {
        self.ui.page()
    }

    pub fn ui(&self) -> &Ui<C> {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut Ui<C> {
        &mut self.ui
    }

    pub fn loco(&self) -> &L {
        &self.loco
    }

    pub fn loco_mut(&mut self) -> &mut L {
        &mut self.loco
    }

    pub fn turnout(&self) -> &T {
        &self.turnout
    }

    pub fn turnout_mut(&mut self) -> &mut T {
        &mut self.turnout
    }
}

impl<C: 'static, L, T> Dispatcher<C, L, T> {
    /// Run `op` on the throttle page for `page`, if it is one.
    fn on_page<D, F>(&mut self, ctx: &mut C, lcd: &mut D, now: u64, page: Page, op: F)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
        F: FnOnce(&mut dyn ThrottlePage<C, D>, &mut Frame<'_, C, D>),
    {
        let target: &mut dyn ThrottlePage<C, D> = match page {
            Page::Loco => &mut self.loco,
            Page::Turnout => &mut self.turnout,
            _ => return,
        };
        let mut frame = Frame {
            ui: &mut self.ui,
            ctx,
            lcd,
            now,
        };
        op(target, &mut frame);
    }

    /// Make `page` current and draw it.
    pub fn start<D>(&mut self, ctx: &mut C, lcd: &mut D, page: Page, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        lcd.begin_batch();
        self.ui.set_page(page);
        self.on_page(ctx, lcd, now, page, |p, f| p.begin(f));
        lcd.commit_batch();
    }

    /// Handle one input event to completion.
    pub fn handle<D>(&mut self, ctx: &mut C, lcd: &mut D, event: Event, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        lcd.begin_batch();
        self.route(ctx, lcd, event, now);
        self.settle(ctx, lcd, now);
        lcd.commit_batch();
    }

    fn route<D>(&mut self, ctx: &mut C, lcd: &mut D, event: Event, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        let page = self.ui.page();
        match event {
            Event::Next(pressed) | Event::Prev(pressed) => {
                let forward = matches!(event, Event::Next(_));
                match page {
                    Page::Menu if pressed => {
                        if forward {
                            self.ui.menu_next(ctx, lcd)
                        } else {
                            self.ui.menu_prev(ctx, lcd)
                        }
                    }
                    Page::Edit if pressed => {
                        if forward {
                            self.ui.edit_next(lcd)
                        } else {
                            self.ui.edit_prev(lcd)
                        }
                    }
                    Page::Loco | Page::Turnout => {
                        let repeats = match page {
                            Page::Loco => self.loco.repeats_on_release(),
                            _ => self.turnout.repeats_on_release(),
                        };
                        if pressed || repeats {
                            self.on_page(ctx, lcd, now, page, |p, f| {
                                if forward {
                                    p.next(f, pressed)
                                } else {
                                    p.prev(f, pressed)
                                }
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::Enter(false) => match page {
                Page::Menu => self.ui.menu_enter(ctx, lcd, now),
                Page::Edit => self.ui.edit_enter(ctx, lcd, now),
                Page::Loco | Page::Turnout => self.on_page(ctx, lcd, now, page, |p, f| p.enter(f)),
                Page::Error => self.ui.dismiss_error(ctx, lcd, now),
                _ => {}
            },
            Event::Back(true) => match page {
                Page::Menu => self.ui.menu_back(ctx, lcd, now),
                Page::Edit => self.ui.edit_cancel(ctx, lcd, now),
                Page::Sequence => self.ui.abort_wizard(ctx, lcd, now),
                Page::Loco | Page::Turnout => self.on_page(ctx, lcd, now, page, |p, f| p.stop(f)),
                Page::Error => self.ui.dismiss_error(ctx, lcd, now),
                _ => {}
            },
            Event::Digit(digit, false) => match page {
                Page::Edit => self.ui.edit_digit(lcd, digit, now),
                Page::Loco | Page::Turnout => {
                    self.on_page(ctx, lcd, now, page, |p, f| p.digit(f, digit))
                }
                _ => {}
            },
            Event::Shift(pressed) => match page {
                Page::Edit => self.ui.edit_shift(lcd, pressed),
                Page::Loco | Page::Turnout => {
                    self.on_page(ctx, lcd, now, page, |p, f| p.shift(f, pressed))
                }
                _ => {}
            },
            Event::Mode(true) => {
                let other = match page {
                    Page::Loco => Page::Turnout,
                    Page::Turnout => Page::Loco,
                    _ => return,
                };
                self.on_page(ctx, lcd, now, page, |p, f| p.exit(f));
                self.ui.set_page(other);
                self.on_page(ctx, lcd, now, other, |p, f| p.begin(f));
            }
            Event::Menu(true) => match page {
                Page::Loco | Page::Turnout => {
                    self.on_page(ctx, lcd, now, page, |p, f| p.exit(f));
                    self.ui.start_menu(ctx, lcd, page, self.root);
                }
                _ => self.ui.exit_menu(ctx, lcd, now),
            },
            Event::Timeout => {
                if page == Page::Edit {
                    self.ui.edit_timeout(lcd, now);
                }
                self.ui.check_pending(lcd, now);
            }
            _ => {}
        }
    }

    /// Deliver engine results addressed to the throttle pages.
    fn settle<D>(&mut self, ctx: &mut C, lcd: &mut D, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        for _ in 0..HANDOFF_LIMIT {
            let Some(handoff) = self.ui.take_handoff() else {
                return;
            };
            let value = handoff.value;
            self.on_page(ctx, lcd, now, handoff.page, |p, f| p.resume(f, value));
        }
        warn!("hand-offs still pending after {} rounds", HANDOFF_LIMIT);
    }

    /// Interrupt the current page with an error.
    pub fn raise<D>(&mut self, ctx: &mut C, lcd: &mut D, fault: Fault, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        let page = self.ui.page();
        self.on_page(ctx, lcd, now, page, |p, f| p.exit(f));
        self.ui.show_error(lcd, fault);
    }

    /// A parked wizard's operation completed.
    pub fn complete_pending<D>(&mut self, ctx: &mut C, lcd: &mut D, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        self.ui.complete_pending(ctx, lcd, now);
        self.settle(ctx, lcd, now);
    }

    /// Send the running wizard back to field `index`.
    pub fn resume_at<D>(&mut self, ctx: &mut C, lcd: &mut D, index: usize, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        self.ui.resume_at(ctx, lcd, index, now);
        self.settle(ctx, lcd, now);
    }

    /// Repaint the current page after a global change such as the language.
    pub fn redraw<D>(&mut self, ctx: &mut C, lcd: &mut D, now: u64)
    where
        D: Display,
        L: ThrottlePage<C, D>,
        T: ThrottlePage<C, D>,
    {
        let page = self.ui.page();
        match page {
            Page::Loco | Page::Turnout => self.on_page(ctx, lcd, now, page, |p, f| p.begin(f)),
            _ => self.ui.redraw(ctx, lcd),
        }
    }
}
