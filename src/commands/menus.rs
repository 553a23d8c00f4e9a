use anyhow::Result;

use crate::commands::{CommandReport, Session};
use crate::coordinator::dispatcher::{BINDINGS, TriggerSource};
use crate::coordinator::host::{MenuContext, MenuList};

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("menus");
    let session = Session::open(None, false)?;

    let mut menus = MenuList::default();
    session.coordinator().startup(&mut menus);
    for (id, title, context) in &menus.items {
        let context = match context {
            MenuContext::Selection => "selection",
            MenuContext::Page => "page",
        };
        report.detail(format!("menu:{id} context={context} title={title}"));
    }
    for binding in BINDINGS
        .iter()
        .filter(|binding| binding.source == TriggerSource::Command)
    {
        report.detail(format!("command:{} title={}", binding.id, binding.title));
    }
    report.detail("action-click");
    report.detail(format!("router_actions={}", session.router.actions().join(",")));
    Ok(report)
}
