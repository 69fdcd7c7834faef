use dioxus::prelude::*;
use lucide_dioxus::{Mic, MicOff};

use voice_dialer::session::MicrophoneSnapshot;

#[component]
pub fn MicrophoneTest(
    microphone: MicrophoneSnapshot,
    on_start: EventHandler<()>,
    on_stop: EventHandler<()>,
) -> Element {
    let level = microphone.level.clamp(0.0, 100.0).round() as u32;
    let bar_class = if level > 60 {
        "bg-green-500"
    } else if level > 20 {
        "bg-yellow-400"
    } else {
        "bg-gray-400"
    };

    rsx! {
        div {
            class: "bg-white rounded-xl p-6 shadow-sm border border-gray-200",

            div {
                class: "flex items-center justify-between mb-3",
                h3 { class: "text-lg font-semibold text-gray-800", "Microphone test" }
                if microphone.tested {
                    button {
                        class: "flex items-center gap-2 px-4 py-2 bg-gray-200 hover:bg-gray-300 rounded-lg text-sm",
                        onclick: move |_| on_stop.call(()),
                        MicOff { size: 16, stroke_width: 2 }
                        "Stop"
                    }
                } else {
                    button {
                        class: "flex items-center gap-2 px-4 py-2 bg-blue-600 hover:bg-blue-700 text-white rounded-lg text-sm",
                        onclick: move |_| on_start.call(()),
                        Mic { size: 16, stroke_width: 2 }
                        "Test microphone"
                    }
                }
            }

            div {
                class: "w-full h-3 bg-gray-100 rounded-full overflow-hidden",
                div {
                    class: "h-full {bar_class} transition-all duration-75",
                    style: "width: {level}%",
                }
            }

            if let Some(error) = microphone.error.clone() {
                p { class: "text-sm text-red-600 mt-2", "{error}" }
            } else if microphone.tested {
                p { class: "text-sm text-gray-500 mt-2", "Speak to see the level move" }
            }
        }
    }
}
