use dioxus::prelude::*;
use lucide_dioxus::{Mic, MicOff, Phone, PhoneOff};

use voice_dialer::presentation::{ButtonStyle, CallControlState};

#[component]
pub fn CallControlButtons(
    control_state: CallControlState,
    on_make_call: EventHandler<()>,
    on_mute_toggle: EventHandler<()>,
    on_end_call: EventHandler<()>,
) -> Element {
    let make_call_enabled = control_state.make_call_enabled;
    let muted = control_state.mute_style == ButtonStyle::Muted;
    let make_call_class = control_state.make_call_style().class();
    let mute_class = control_state.mute_style.class();
    let end_call_class = ButtonStyle::Danger.class();

    rsx! {
        div {
            class: "flex gap-3 justify-center",

            if control_state.make_call_visible {
                button {
                    class: "flex items-center gap-2 {make_call_class}",
                    disabled: !make_call_enabled,
                    onclick: move |_| if make_call_enabled { on_make_call.call(()) },
                    Phone { size: 20, stroke_width: 2 }
                    "Call"
                }
            }

            if control_state.mute_visible {
                button {
                    class: "flex items-center gap-2 {mute_class}",
                    onclick: move |_| on_mute_toggle.call(()),
                    if muted {
                        MicOff { size: 20, stroke_width: 2 }
                    } else {
                        Mic { size: 20, stroke_width: 2 }
                    }
                    "{control_state.mute_label}"
                }
            }

            if control_state.end_call_visible {
                button {
                    class: "flex items-center gap-2 {end_call_class}",
                    onclick: move |_| on_end_call.call(()),
                    PhoneOff { size: 20, stroke_width: 2 }
                    "{control_state.end_call_label}"
                }
            }
        }
    }
}
