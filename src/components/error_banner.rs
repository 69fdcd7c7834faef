use dioxus::prelude::*;

/// Dismissible inline error message
#[component]
pub fn ErrorBanner(message: Option<String>, on_dismiss: EventHandler<()>) -> Element {
    let Some(message) = message else {
        return rsx! {};
    };

    rsx! {
        div {
            class: "flex items-start justify-between gap-3 bg-red-50 border border-red-200 text-red-800 rounded-lg px-4 py-3 mb-4",
            span { class: "text-sm", "{message}" }
            button {
                class: "text-red-600 hover:text-red-800 text-sm font-medium",
                onclick: move |_| on_dismiss.call(()),
                "Dismiss"
            }
        }
    }
}
