//! Demo command set: a pretend motor controller.

use std::cell::RefCell;
use std::rc::Rc;

use cmdr_terminal::{CommandTable, Context, Outcome, Result};

/// State the demo commands read and change.
#[derive(Debug, Default)]
pub struct Motor {
    pub speed: i32,
    pub gain: f32,
    pub position: (i32, f32),
    pub received: usize,
    /// A `load` transfer is in progress.
    pub loading: bool,
}

pub type Shared = Rc<RefCell<Motor>>;

/// Top-level command table.
pub fn commands(motor: &Shared) -> CommandTable {
    let sub = Rc::new(motor_commands(motor));
    let status = Rc::clone(motor);
    let mover = Rc::clone(motor);
    let quick = Rc::clone(motor);
    let getter = Rc::clone(motor);
    let loader = Rc::clone(motor);

    CommandTable::new()
        .command("st", "short status", |ctx: &mut Context<'_, '_>| {
            ctx.println("ok");
            Ok(Outcome::Handled)
        })
        .command("status", "motor state", move |ctx: &mut Context<'_, '_>| {
            let m = status.borrow();
            ctx.println(&format!(
                "speed {} gain {} at ({}, {})",
                m.speed, m.gain, m.position.0, m.position.1
            ));
            Ok(Outcome::Handled)
        })
        .command("move", "move <x> <y>", move |ctx: &mut Context<'_, '_>| {
            let (Some(x), Some(y)) = (ctx.get_int(), ctx.get_float()) else {
                ctx.println("usage: move <x> <y>");
                return Ok(Outcome::Handled);
            };
            mover.borrow_mut().position = (x, y);
            ctx.println(&format!("moved to ({x}, {y})"));
            Ok(Outcome::Handled)
        })
        .command("set", "set speed <n> gain <f> (set help)", move |ctx: &mut Context<'_, '_>| {
            ctx.quick_set_help();
            let mut m = quick.borrow_mut();
            let mut changed = ctx.quick_set("speed", &mut m.speed);
            changed |= ctx.quick_set("gain", &mut m.gain);
            if changed {
                ctx.println("updated");
            }
            Ok(Outcome::Handled)
        })
        .command("get", "get speed|gain", move |ctx: &mut Context<'_, '_>| {
            ctx.quick_set_help();
            let m = getter.borrow();
            ctx.quick_get("speed", m.speed);
            ctx.quick_get("gain", m.gain);
            Ok(Outcome::Handled)
        })
        .command("load", "receive raw bytes until EOT (0x04)", move |ctx: &mut Context<'_, '_>| {
            let mut m = loader.borrow_mut();
            m.received = 0;
            m.loading = true;
            ctx.println("send data, end with EOT (0x04)");
            ctx.start_stream();
            Ok(Outcome::Handled)
        })
        .command("motor", "enter the motor menu", move |ctx: &mut Context<'_, '_>| {
            ctx.transfer_to(Rc::clone(&sub), "motor");
            Ok(Outcome::Handled)
        })
}

/// Sub-menu reached through `motor`.
fn motor_commands(motor: &Shared) -> CommandTable {
    let speed = Rc::clone(motor);
    CommandTable::new()
        .command("speed", "speed <n>", move |ctx: &mut Context<'_, '_>| {
            match ctx.get_int() {
                Some(v) => {
                    speed.borrow_mut().speed = v;
                    ctx.println(&format!("speed {v}"));
                },
                None => ctx.println(&format!("speed {}", speed.borrow().speed)),
            }
            Ok(Outcome::Handled)
        })
        .command("stop", "speed 0", {
            let motor = Rc::clone(motor);
            move |ctx: &mut Context<'_, '_>| {
                motor.borrow_mut().speed = 0;
                ctx.println("stopped");
                Ok(Outcome::Handled)
            }
        })
}

/// Numeric lines set the speed; passthrough chunks are counted.
pub fn fallback(motor: &Shared) -> impl Fn(&mut Context<'_, '_>) -> Result<Outcome> + 'static {
    let motor = Rc::clone(motor);
    move |ctx: &mut Context<'_, '_>| {
        let mut m = motor.borrow_mut();
        if ctx.is_streaming() {
            m.received += ctx.line().len();
            return Ok(Outcome::Handled);
        }
        if m.loading {
            m.loading = false;
            m.received += ctx.line().len();
            ctx.println(&format!("received {} bytes", m.received));
            return Ok(Outcome::Handled);
        }
        match ctx.get_int() {
            Some(v) => {
                m.speed = v;
                ctx.println(&format!("speed {v}"));
                Ok(Outcome::Handled)
            },
            None => Ok(Outcome::NotHandled),
        }
    }
}
