use dioxus::prelude::*;

use voice_dialer::presentation::DIAL_KEYS;

#[component]
pub fn DialPad(
    value: String,
    enabled: bool,
    validation_error: Option<String>,
    on_key: EventHandler<char>,
    on_input: EventHandler<String>,
    on_backspace: EventHandler<()>,
) -> Element {
    let key_class = if enabled {
        "flex flex-col items-center justify-center h-16 rounded-full bg-gray-100 hover:bg-gray-200 active:bg-gray-300 transition-colors"
    } else {
        "flex flex-col items-center justify-center h-16 rounded-full bg-gray-50 text-gray-300 cursor-not-allowed"
    };

    rsx! {
        div {
            class: "bg-white rounded-xl p-6 shadow-sm border border-gray-200",

            div {
                class: "flex items-center gap-2 mb-2",
                input {
                    r#type: "tel",
                    placeholder: "Enter phone number",
                    class: "flex-grow px-4 py-3 text-2xl text-center tracking-wider border border-gray-300 rounded-lg focus:outline-none focus:ring-2 focus:ring-blue-500",
                    disabled: !enabled,
                    value: "{value}",
                    oninput: move |evt| on_input.call(evt.value()),
                }
                button {
                    class: "px-3 py-3 text-gray-500 hover:text-gray-800",
                    disabled: !enabled || value.is_empty(),
                    onclick: move |_| on_backspace.call(()),
                    "⌫"
                }
            }

            if let Some(error) = validation_error {
                p { class: "text-sm text-red-600 mb-2", "{error}" }
            }

            div {
                class: "grid grid-cols-3 gap-3 mt-4",
                for dial_key in DIAL_KEYS {
                    button {
                        key: "{dial_key.symbol}",
                        class: key_class,
                        disabled: !enabled,
                        onclick: move |_| on_key.call(dial_key.symbol),
                        span { class: "text-2xl font-medium", "{dial_key.symbol}" }
                        span { class: "text-xs text-gray-500 h-4", "{dial_key.letters}" }
                    }
                }
            }
        }
    }
}
