//! Build a small component tree, react to a DOM click and print the markup.
//!
//! Run with `RUST_LOG=debug` to see lifecycle logging.

use cnext::{listener, Config, DomContext, Event, Runtime, View};
use serde_json::json;

struct Greeting;

impl View for Greeting {
    fn tag_name(&self) -> &str {
        "h1"
    }

    fn create_dom(&self, cx: &mut DomContext<'_>) -> anyhow::Result<()> {
        let name = cx.state().get("name").and_then(|v| v.as_str().map(str::to_string));
        cx.set_text(&format!("Hello, {}!", name.as_deref().unwrap_or("world")))?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let runtime = Runtime::with_logging(Config {
        pretty_markup: true,
        ..Config::default()
    });

    let app = runtime.component();
    app.set_id("app")?;
    let greeting = runtime.component_with_view(Greeting);
    app.add_child(&greeting)?;
    app.render(None)?;

    let handle = greeting.clone();
    greeting.add_event_listener(
        "click",
        listener(move |_| {
            handle.set_state(json!({"name": "cnext"}))?;
            Ok(())
        }),
    );

    if let Some(element) = greeting.get_element() {
        runtime.dom().dispatch_event(element, &mut Event::new("click"));
    }

    println!("{}", runtime.markup());

    app.dispose();
    Ok(())
}
