use dioxus::prelude::*;

use voice_dialer::presentation::CallControlState;
use voice_dialer::CallSnapshot;

use crate::components::call_control_buttons::CallControlButtons;

#[component]
pub fn CallControls(
    call: CallSnapshot,
    on_make_call: EventHandler<()>,
    on_mute_toggle: EventHandler<()>,
    on_end_call: EventHandler<()>,
) -> Element {
    let control_state = CallControlState::from_snapshot(&call);

    rsx! {
        div {
            class: "bg-white rounded-xl p-6 shadow-sm border border-gray-200",
            CallControlButtons {
                control_state: control_state,
                on_make_call: on_make_call,
                on_mute_toggle: on_mute_toggle,
                on_end_call: on_end_call
            }
        }
    }
}
