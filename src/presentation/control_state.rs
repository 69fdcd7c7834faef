use crate::call::{CallSnapshot, PhaseKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Call,
    Normal,
    Muted,
    Danger,
    Disabled,
}

impl ButtonStyle {
    pub fn class(self) -> &'static str {
        match self {
            ButtonStyle::Call => "px-6 py-3 bg-green-600 hover:bg-green-700 text-white rounded-full font-medium transition-all duration-200 shadow-md hover:shadow-lg",
            ButtonStyle::Normal => "px-6 py-3 bg-gray-200 hover:bg-gray-300 text-gray-800 rounded-full font-medium transition-all duration-200 shadow-sm hover:shadow-md",
            ButtonStyle::Muted => "px-6 py-3 bg-yellow-500 hover:bg-yellow-600 text-white rounded-full font-medium transition-all duration-200 shadow-sm hover:shadow-md",
            ButtonStyle::Danger => "px-6 py-3 bg-red-600 hover:bg-red-700 text-white rounded-full font-medium transition-all duration-200 shadow-md hover:shadow-lg",
            ButtonStyle::Disabled => "px-6 py-3 bg-gray-100 text-gray-400 rounded-full font-medium cursor-not-allowed",
        }
    }
}

/// What the call controls show for a given controller snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CallControlState {
    pub status_label: &'static str,
    pub dial_pad_enabled: bool,
    pub make_call_visible: bool,
    pub make_call_enabled: bool,
    pub mute_visible: bool,
    pub mute_label: &'static str,
    pub mute_style: ButtonStyle,
    pub end_call_visible: bool,
    pub end_call_label: &'static str,
}

impl CallControlState {
    pub fn from_snapshot(snapshot: &CallSnapshot) -> Self {
        match snapshot.phase {
            PhaseKind::Uninitialized => Self::idle("Initializing...", false),
            PhaseKind::Ready if !snapshot.is_ready => Self::idle("Device offline", false),
            PhaseKind::Ready => Self::idle("Ready", true),
            PhaseKind::Connecting => Self {
                status_label: "Connecting...",
                dial_pad_enabled: false,
                make_call_visible: false,
                make_call_enabled: false,
                mute_visible: false,
                mute_label: "Mute",
                mute_style: ButtonStyle::Disabled,
                end_call_visible: true,
                end_call_label: "Cancel",
            },
            PhaseKind::Active => Self {
                status_label: "Call in progress",
                dial_pad_enabled: false,
                make_call_visible: false,
                make_call_enabled: false,
                mute_visible: true,
                mute_label: if snapshot.is_muted { "Unmute" } else { "Mute" },
                mute_style: if snapshot.is_muted {
                    ButtonStyle::Muted
                } else {
                    ButtonStyle::Normal
                },
                end_call_visible: true,
                end_call_label: "End Call",
            },
        }
    }

    fn idle(status_label: &'static str, ready: bool) -> Self {
        Self {
            status_label,
            dial_pad_enabled: true,
            make_call_visible: true,
            make_call_enabled: ready,
            mute_visible: false,
            mute_label: "Mute",
            mute_style: ButtonStyle::Disabled,
            end_call_visible: false,
            end_call_label: "End Call",
        }
    }

    pub fn make_call_style(&self) -> ButtonStyle {
        if self.make_call_enabled {
            ButtonStyle::Call
        } else {
            ButtonStyle::Disabled
        }
    }
}
