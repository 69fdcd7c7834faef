use dioxus::prelude::*;

use voice_dialer::presentation::{format_duration, CallControlState};
use voice_dialer::{CallSnapshot, PhaseKind};

#[component]
pub fn CallStatus(call: CallSnapshot) -> Element {
    let control_state = CallControlState::from_snapshot(&call);

    let status_text = match call.phase {
        PhaseKind::Active => format!("Connected • {}", format_duration(call.duration_secs)),
        _ => control_state.status_label.to_string(),
    };
    let indicator = match call.phase {
        PhaseKind::Active => "bg-green-500",
        PhaseKind::Connecting => "bg-yellow-400 animate-pulse",
        PhaseKind::Ready if call.is_ready => "bg-green-500",
        _ => "bg-gray-400",
    };

    rsx! {
        div {
            class: "bg-white rounded-xl p-6 shadow-sm border border-gray-200 text-center",

            if let Some(destination) = call.destination.clone() {
                h2 {
                    class: "text-2xl font-semibold text-gray-900 mb-2",
                    "{destination}"
                }
            }

            div {
                class: "flex items-center justify-center gap-2",
                span { class: "inline-block w-3 h-3 rounded-full {indicator}" }
                span {
                    class: "text-lg text-gray-600",
                    "{status_text}"
                }
            }

            if call.is_muted {
                div {
                    class: "mt-2",
                    span {
                        class: "inline-flex items-center px-3 py-1 rounded-full text-sm font-medium bg-red-100 text-red-800",
                        "Muted"
                    }
                }
            }
        }
    }
}
