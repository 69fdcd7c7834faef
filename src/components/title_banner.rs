use dioxus::prelude::*;

#[component]
pub fn TitleBanner(identity: Option<String>) -> Element {
    rsx! {
        div {
            class: "bg-slate-800 text-white py-5 text-center shadow-md mb-6",
            div {
                class: "font-semibold text-2xl tracking-wide",
                "Voice Dialer"
            }
            if let Some(identity) = identity {
                div {
                    class: "text-sm text-slate-300 mt-1",
                    "Signed in as {identity}"
                }
            }
        }
    }
}
